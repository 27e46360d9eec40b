//! Output types: the PNG file handle and the conversion result.

use crate::error::Pdf2PngError;
use crate::pipeline::encode::{self, PNG_MIME};
use crate::surface::Blob;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use std::path::Path;

/// An encoded PNG paired with its derived file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    name: String,
    blob: Blob,
}

impl ImageFile {
    /// Wrap `data` as an `image/png` file called `name`.
    pub fn png(name: impl Into<String>, data: impl Into<std::sync::Arc<[u8]>>) -> Self {
        Self {
            name: name.into(),
            blob: Blob::new(data, PNG_MIME),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mime_type(&self) -> &str {
        self.blob.mime_type()
    }

    pub fn size(&self) -> usize {
        self.blob.size()
    }

    pub fn bytes(&self) -> &[u8] {
        self.blob.bytes()
    }

    pub fn blob(&self) -> &Blob {
        &self.blob
    }

    /// `data:image/png;base64,…` form of the file.
    pub fn to_data_url(&self) -> String {
        encode::to_data_url(self.bytes(), self.mime_type())
    }

    /// Write the PNG to `path`.
    ///
    /// Uses atomic write (temp file + rename) to prevent partial files.
    pub async fn persist(&self, path: impl AsRef<Path>) -> Result<(), Pdf2PngError> {
        let path = path.as_ref();
        let write_err = |source: std::io::Error| Pdf2PngError::OutputWriteFailed {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
        }

        let tmp_path = path.with_extension("png.tmp");
        tokio::fs::write(&tmp_path, self.bytes())
            .await
            .map_err(write_err)?;
        tokio::fs::rename(&tmp_path, path).await.map_err(write_err)?;
        Ok(())
    }
}

/// Serialised like a browser `File`: `{ "name", "type", "size" }`.
impl Serialize for ImageFile {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("ImageFile", 3)?;
        s.serialize_field("name", &self.name)?;
        s.serialize_field("type", self.mime_type())?;
        s.serialize_field("size", &self.size())?;
        s.end()
    }
}

/// Outcome of a conversion: either a success triple or a failure pair.
///
/// The fields are private so the two shapes cannot be mixed:
///
/// | Field | Success | Failure |
/// |-------|---------|---------|
/// | `image_url` | non-empty object URL | `""` |
/// | `file` | `Some(ImageFile)` | `None` |
/// | `error` | `None` | `Some(message)` |
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionResult {
    image_url: String,
    file: Option<ImageFile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl ConversionResult {
    pub fn success(image_url: impl Into<String>, file: ImageFile) -> Self {
        Self {
            image_url: image_url.into(),
            file: Some(file),
            error: None,
        }
    }

    pub fn failure(error: &Pdf2PngError) -> Self {
        Self {
            image_url: String::new(),
            file: None,
            error: Some(error.to_string()),
        }
    }

    pub fn image_url(&self) -> &str {
        &self.image_url
    }

    pub fn file(&self) -> Option<&ImageFile> {
        self.file.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Split into `(image_url, file)` or the error message.
    pub fn into_result(self) -> Result<(String, ImageFile), String> {
        match (self.file, self.error) {
            (Some(file), None) => Ok((self.image_url, file)),
            (_, Some(error)) => Err(error),
            (None, None) => Err("conversion produced no file".to_string()),
        }
    }
}
