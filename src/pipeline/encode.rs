//! Image encoding: surface pixels → PNG (or JPEG) bytes, and data URLs.
//!
//! PNG is lossless, so the quality argument only matters for `image/jpeg`.
//! Unknown MIME types fall back to PNG, the way canvas exports do.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat, RgbaImage};
use std::io::Cursor;
use tracing::debug;

pub const PNG_MIME: &str = "image/png";
pub const JPEG_MIME: &str = "image/jpeg";

/// Bytes produced by [`encode_surface`] and the MIME type actually used.
#[derive(Debug, Clone)]
pub struct EncodedImage {
    pub bytes: Vec<u8>,
    pub mime_type: &'static str,
}

/// Encode `pixels` as `mime_type`.
pub fn encode_surface(
    pixels: &RgbaImage,
    mime_type: &str,
    quality: f32,
) -> Result<EncodedImage, image::ImageError> {
    if mime_type.eq_ignore_ascii_case(JPEG_MIME) {
        return Ok(EncodedImage {
            bytes: encode_jpeg(pixels, quality)?,
            mime_type: JPEG_MIME,
        });
    }
    Ok(EncodedImage {
        bytes: encode_png(pixels)?,
        mime_type: PNG_MIME,
    })
}

pub fn encode_png(pixels: &RgbaImage) -> Result<Vec<u8>, image::ImageError> {
    let mut buf = Vec::new();
    pixels.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)?;
    debug!(
        "Encoded {}x{} → {} bytes PNG",
        pixels.width(),
        pixels.height(),
        buf.len()
    );
    Ok(buf)
}

/// JPEG has no alpha channel; pixels are flattened to RGB first.
fn encode_jpeg(pixels: &RgbaImage, quality: f32) -> Result<Vec<u8>, image::ImageError> {
    let q = (quality.clamp(0.0, 1.0) * 100.0).round().max(1.0) as u8;
    let rgb = DynamicImage::ImageRgba8(pixels.clone()).into_rgb8();
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, q).encode_image(&rgb)?;
    Ok(buf)
}

/// `data:<mime>;base64,<payload>`
pub fn to_data_url(bytes: &[u8], mime_type: &str) -> String {
    format!("data:{};base64,{}", mime_type, STANDARD.encode(bytes))
}
