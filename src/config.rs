//! Configuration types for first-page rasterisation.
//!
//! Conversion behaviour is controlled through [`RasterConfig`], built via
//! [`RasterConfigBuilder`]. The defaults reproduce the fixed behaviour of the
//! conversion contract (3× oversampling, PNG at quality 1.0); the builder only
//! exists so callers can trade resolution for memory.

use crate::error::Pdf2PngError;
use serde::{Deserialize, Serialize};

/// Default oversampling factor applied to the page's native point size.
pub const DEFAULT_SCALE: f32 = 3.0;

/// Default encoder quality. Inert for PNG; honoured by lossy surface exports.
pub const DEFAULT_QUALITY: f32 = 1.0;

/// Configuration for a [`crate::convert::PdfPageRasterizer`].
///
/// # Example
/// ```rust
/// use edgequake_pdf2png::RasterConfig;
///
/// let config = RasterConfig::builder().scale(2.0).build().unwrap();
/// assert_eq!(config.scale, 2.0);
/// assert_eq!(config.quality, 1.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RasterConfig {
    /// Viewport scale factor. Range: 0.1–10.0. Default: 3.0.
    ///
    /// One PDF point maps to `scale` pixels, so a US Letter page
    /// (612 × 792 pt) renders to 1836 × 2376 px at the default.
    pub scale: f32,

    /// Encoder quality passed to the surface export. Range: 0.0–1.0. Default: 1.0.
    pub quality: f32,
}

impl Default for RasterConfig {
    fn default() -> Self {
        Self {
            scale: DEFAULT_SCALE,
            quality: DEFAULT_QUALITY,
        }
    }
}

impl RasterConfig {
    /// Create a new builder for `RasterConfig`.
    pub fn builder() -> RasterConfigBuilder {
        RasterConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`RasterConfig`].
#[derive(Debug)]
pub struct RasterConfigBuilder {
    config: RasterConfig,
}

impl RasterConfigBuilder {
    pub fn scale(mut self, scale: f32) -> Self {
        self.config.scale = scale.clamp(0.1, 10.0);
        self
    }

    pub fn quality(mut self, quality: f32) -> Self {
        self.config.quality = quality.clamp(0.0, 1.0);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<RasterConfig, Pdf2PngError> {
        let c = &self.config;
        if !c.scale.is_finite() || c.scale <= 0.0 {
            return Err(Pdf2PngError::InvalidConfig(format!(
                "Scale must be a positive number, got {}",
                c.scale
            )));
        }
        if !c.quality.is_finite() {
            return Err(Pdf2PngError::InvalidConfig(format!(
                "Quality must be within 0.0–1.0, got {}",
                c.quality
            )));
        }
        Ok(self.config)
    }
}
