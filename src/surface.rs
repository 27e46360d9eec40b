//! 2D render surfaces: a pixel buffer the engine draws into and the encoder
//! exports from.
//!
//! [`RasterSurface`] is the native implementation, backed by an
//! [`image::RgbaImage`]. Like a canvas element it starts transparent, is
//! cleared whenever its dimensions change, and exports through a completion
//! callback rather than returning bytes directly.

use crate::pipeline::encode;
use image::{imageops, RgbaImage};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Drawing context handed to the engine's render call.
pub trait RenderContext2d: Send {
    /// `(width, height)` of the backing surface in pixels.
    fn canvas_size(&self) -> (u32, u32);

    /// Composite `image` with its top-left corner at (`dx`, `dy`).
    fn draw_image(&mut self, image: &RgbaImage, dx: i64, dy: i64);
}

/// Completion callback for [`RenderSurface::to_blob`]. `None` means the
/// encoder produced no data.
pub type BlobCallback = Box<dyn FnOnce(Option<Blob>) + Send + 'static>;

/// A pixel surface with canvas semantics.
pub trait RenderSurface: Send {
    /// Resize the surface. Any existing pixels are discarded.
    fn set_dimensions(&mut self, width: u32, height: u32);

    fn dimensions(&self) -> (u32, u32);

    /// Acquire the 2D drawing context, or `None` if the surface cannot back one.
    fn context_2d(&mut self) -> Option<&mut dyn RenderContext2d>;

    /// Encode the current pixels as `mime_type` and pass the result to `callback`.
    fn to_blob(&self, mime_type: &str, quality: f32, callback: BlobCallback);
}

/// Immutable binary payload tagged with a MIME type.
#[derive(Clone, PartialEq, Eq)]
pub struct Blob {
    data: Arc<[u8]>,
    mime_type: String,
}

impl Blob {
    pub fn new(data: impl Into<Arc<[u8]>>, mime_type: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            mime_type: mime_type.into(),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    /// Shared handle to the payload, without copying.
    pub fn shared(&self) -> Arc<[u8]> {
        Arc::clone(&self.data)
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }
}

impl fmt::Debug for Blob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Blob")
            .field("size", &self.data.len())
            .field("mime_type", &self.mime_type)
            .finish()
    }
}

/// Allocation limits for native surfaces.
///
/// Mirrors the limits browsers put on canvas elements: a surface beyond
/// them refuses to hand out a context instead of aborting the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanvasLimits {
    /// Maximum width or height in pixels. Default: 32 767.
    pub max_dimension: u32,
    /// Maximum `width × height`. Default: 268 435 456 (16 384²).
    pub max_area: u64,
}

impl Default for CanvasLimits {
    fn default() -> Self {
        Self {
            max_dimension: 32_767,
            max_area: 268_435_456,
        }
    }
}

impl CanvasLimits {
    pub fn allows(&self, width: u32, height: u32) -> bool {
        width > 0
            && height > 0
            && width <= self.max_dimension
            && height <= self.max_dimension
            && (width as u64) * (height as u64) <= self.max_area
    }
}

/// The 2D context of a [`RasterSurface`].
///
/// Pixels are shared with in-flight exports; drawing copies them only while
/// an export still holds the previous frame.
pub struct Canvas2d {
    pixels: Arc<RgbaImage>,
}

impl Canvas2d {
    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }
}

impl RenderContext2d for Canvas2d {
    fn canvas_size(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    fn draw_image(&mut self, image: &RgbaImage, dx: i64, dy: i64) {
        imageops::overlay(Arc::make_mut(&mut self.pixels), image, dx, dy);
    }
}

/// `RgbaImage`-backed surface used by the native host.
pub struct RasterSurface {
    width: u32,
    height: u32,
    limits: CanvasLimits,
    canvas: Option<Canvas2d>,
}

impl RasterSurface {
    pub fn new(limits: CanvasLimits) -> Self {
        Self {
            width: 0,
            height: 0,
            limits,
            canvas: None,
        }
    }

    /// Pixels drawn so far, if a context has been acquired.
    pub fn pixels(&self) -> Option<&RgbaImage> {
        self.canvas.as_ref().map(Canvas2d::pixels)
    }

    fn snapshot(&self) -> Option<Arc<RgbaImage>> {
        match &self.canvas {
            Some(canvas) => Some(Arc::clone(&canvas.pixels)),
            None if self.limits.allows(self.width, self.height) => {
                Some(Arc::new(RgbaImage::new(self.width, self.height)))
            }
            None => None,
        }
    }
}

impl Default for RasterSurface {
    fn default() -> Self {
        Self::new(CanvasLimits::default())
    }
}

impl RenderSurface for RasterSurface {
    fn set_dimensions(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.canvas = None;
    }

    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn context_2d(&mut self) -> Option<&mut dyn RenderContext2d> {
        if self.canvas.is_none() {
            if !self.limits.allows(self.width, self.height) {
                warn!(
                    "Refusing 2D context for {}x{} surface (limits: {:?})",
                    self.width, self.height, self.limits
                );
                return None;
            }
            self.canvas = Some(Canvas2d {
                pixels: Arc::new(RgbaImage::new(self.width, self.height)),
            });
        }
        self.canvas
            .as_mut()
            .map(|c| c as &mut dyn RenderContext2d)
    }

    fn to_blob(&self, mime_type: &str, quality: f32, callback: BlobCallback) {
        let Some(pixels) = self.snapshot() else {
            callback(None);
            return;
        };
        let mime_type = mime_type.to_string();
        let job = move || {
            let blob = match encode::encode_surface(&pixels, &mime_type, quality) {
                Ok(encoded) => {
                    debug!("Surface exported → {} bytes {}", encoded.bytes.len(), encoded.mime_type);
                    Some(Blob::new(encoded.bytes, encoded.mime_type))
                }
                Err(e) => {
                    warn!("Surface export failed: {}", e);
                    None
                }
            };
            callback(blob);
        };

        // Encoding is CPU-bound; keep it off the async workers when a runtime exists.
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let _ = handle.spawn_blocking(job);
            }
            Err(_) => job(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use tokio::sync::oneshot;

    fn export(surface: &RasterSurface, mime: &str) -> Option<Blob> {
        tokio_test::block_on(async {
            let (tx, rx) = oneshot::channel();
            surface.to_blob(
                mime,
                1.0,
                Box::new(move |b| {
                    let _ = tx.send(b);
                }),
            );
            rx.await.ok().flatten()
        })
    }

    #[test]
    fn limits_reject_zero_and_oversize() {
        let limits = CanvasLimits::default();
        assert!(!limits.allows(0, 10));
        assert!(!limits.allows(40_000, 10));
        assert!(!limits.allows(20_000, 20_000));
        assert!(limits.allows(1836, 2376));
    }

    #[test]
    fn context_unavailable_for_empty_surface() {
        let mut surface = RasterSurface::default();
        assert!(surface.context_2d().is_none());
    }

    #[test]
    fn resize_clears_pixels() {
        let mut surface = RasterSurface::default();
        surface.set_dimensions(4, 4);
        let red = RgbaImage::from_pixel(4, 4, Rgba([255, 0, 0, 255]));
        surface.context_2d().unwrap().draw_image(&red, 0, 0);
        assert_eq!(surface.pixels().unwrap().get_pixel(1, 1), &Rgba([255, 0, 0, 255]));

        surface.set_dimensions(4, 4);
        assert!(surface.pixels().is_none());
        let ctx = surface.context_2d().unwrap();
        assert_eq!(ctx.canvas_size(), (4, 4));
    }

    #[test]
    fn exports_png_blob() {
        let mut surface = RasterSurface::default();
        surface.set_dimensions(3, 2);
        surface.context_2d().unwrap();
        let blob = export(&surface, "image/png").expect("blob");
        assert_eq!(blob.mime_type(), "image/png");
        assert_eq!(&blob.bytes()[..4], b"\x89PNG");
    }

    #[test]
    fn export_of_zero_sized_surface_yields_none() {
        let surface = RasterSurface::default();
        assert!(export(&surface, "image/png").is_none());
    }

    #[test]
    fn export_without_runtime_runs_inline() {
        let mut surface = RasterSurface::default();
        surface.set_dimensions(2, 2);
        let slot = std::sync::Arc::new(std::sync::Mutex::new(None));
        let sink = std::sync::Arc::clone(&slot);
        surface.to_blob(
            "image/png",
            1.0,
            Box::new(move |b| {
                *sink.lock().unwrap() = b;
            }),
        );
        assert!(slot.lock().unwrap().is_some());
    }

    #[test]
    fn export_shares_pixels_until_next_draw() {
        let mut surface = RasterSurface::default();
        surface.set_dimensions(2, 2);
        let blue = RgbaImage::from_pixel(2, 2, Rgba([0, 0, 255, 255]));
        surface.context_2d().unwrap().draw_image(&blue, 0, 0);

        let frame = surface.snapshot().unwrap();
        let canvas = &surface.canvas.as_ref().unwrap().pixels;
        assert!(Arc::ptr_eq(&frame, canvas));

        let red = RgbaImage::from_pixel(2, 2, Rgba([255, 0, 0, 255]));
        surface.context_2d().unwrap().draw_image(&red, 0, 0);
        assert_eq!(frame.get_pixel(0, 0), &Rgba([0, 0, 255, 255]));
        assert_eq!(surface.pixels().unwrap().get_pixel(0, 0), &Rgba([255, 0, 0, 255]));
    }
}
