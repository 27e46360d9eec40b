//! Input documents: PDF bytes plus the file name they arrived under.
//!
//! [`InputDocument`] is what the rasterizer consumes. [`resolve_input`]
//! builds one from a local path or an HTTP/HTTPS URL for the CLI and for
//! callers that do not already hold the bytes in memory.

use crate::error::Pdf2PngError;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Raw PDF bytes and their original file name. Cheap to clone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputDocument {
    name: String,
    bytes: Arc<[u8]>,
}

impl InputDocument {
    pub fn new(name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Copy the full payload into an owned buffer for the engine.
    pub fn read_all(&self) -> Vec<u8> {
        self.bytes.to_vec()
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve the input string to an [`InputDocument`].
///
/// URLs are downloaded with `timeout_secs`; anything else is read as a
/// local file.
pub async fn resolve_input(input: &str, timeout_secs: u64) -> Result<InputDocument, Pdf2PngError> {
    if input.trim().is_empty() {
        return Err(Pdf2PngError::InvalidInput {
            input: input.to_string(),
        });
    }
    if is_url(input) {
        download_url(input, timeout_secs).await
    } else {
        read_local(Path::new(input)).await
    }
}

/// Read a local file fully into memory.
pub async fn read_local(path: &Path) -> Result<InputDocument, Pdf2PngError> {
    let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::PermissionDenied => Pdf2PngError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => Pdf2PngError::FileNotFound {
            path: path.to_path_buf(),
        },
    })?;

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document.pdf".to_string());

    debug!("Read local PDF: {} ({} bytes)", path.display(), bytes.len());
    Ok(InputDocument::new(name, bytes))
}

/// Download a URL into memory.
async fn download_url(url: &str, timeout_secs: u64) -> Result<InputDocument, Pdf2PngError> {
    info!("Downloading PDF from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| Pdf2PngError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            Pdf2PngError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            Pdf2PngError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(Pdf2PngError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let name = filename_from_url(url);
    let bytes = response
        .bytes()
        .await
        .map_err(|e| Pdf2PngError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    info!("Downloaded {} bytes as '{}'", bytes.len(), name);
    Ok(InputDocument::new(name, bytes.to_vec()))
}

/// Last path segment of the URL when it looks like a file name.
fn filename_from_url(url: &str) -> String {
    if let Ok(parsed) = reqwest::Url::parse(url) {
        if let Some(mut segments) = parsed.path_segments() {
            if let Some(last) = segments.next_back() {
                if !last.is_empty() && last.contains('.') {
                    return last.to_string();
                }
            }
        }
    }

    "downloaded.pdf".to_string()
}
