//! PDF engine capability traits and the global worker-source slot.
//!
//! The rasterizer never parses or draws PDF content itself. It talks to an
//! engine through three object-safe traits mirroring the engine's
//! document/page model:
//!
//! ```text
//! PdfEngine ──load_document──▶ PdfDocumentHandle ──get_page──▶ PdfPageHandle
//!                                                             ├─ viewport(scale)
//!                                                             └─ render(ctx, viewport)
//! ```
//!
//! Async methods return [`BoxFuture`] so the traits stay usable as
//! `Arc<dyn PdfEngine>` from a host environment.

use crate::error::EngineError;
use crate::surface::RenderContext2d;
use futures::future::BoxFuture;
use std::path::PathBuf;
use std::sync::{PoisonError, RwLock};
use tracing::debug;

/// Environment variable naming an existing pdfium shared library.
pub const PDFIUM_LIB_PATH_ENV: &str = "PDFIUM_LIB_PATH";

/// Location of the library the engine loads to do its work.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum WorkerSource {
    /// Search `./lib`, then the platform's default library path.
    #[default]
    System,
    /// An explicit library file, or a directory containing the platform library.
    Library(PathBuf),
}

impl WorkerSource {
    /// `Library` when `PDFIUM_LIB_PATH` is set and non-empty, else `System`.
    pub fn from_env() -> Self {
        match std::env::var(PDFIUM_LIB_PATH_ENV) {
            Ok(p) if !p.is_empty() => WorkerSource::Library(PathBuf::from(p)),
            _ => WorkerSource::System,
        }
    }
}

static GLOBAL_WORKER_SRC: RwLock<Option<WorkerSource>> = RwLock::new(None);

/// Record `src` as the process-wide worker source.
///
/// Every call overwrites the previous value. Engines read their own copy of
/// the source first, so this slot only matters to engines that were never
/// given one.
pub fn register_worker_src(src: WorkerSource) {
    debug!("Registering engine worker source: {:?}", src);
    *GLOBAL_WORKER_SRC
        .write()
        .unwrap_or_else(PoisonError::into_inner) = Some(src);
}

/// The most recently registered worker source, if any.
pub fn worker_src() -> Option<WorkerSource> {
    GLOBAL_WORKER_SRC
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

/// Serialises unit tests that write the process-wide slot.
#[cfg(test)]
pub(crate) static WORKER_SRC_TEST_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

/// Pixel-space rectangle a page is rendered into.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
    pub scale: f32,
}

impl Viewport {
    /// Viewport for a page of `width_pt` × `height_pt` points at `scale`.
    pub fn from_points(width_pt: f32, height_pt: f32, scale: f32) -> Self {
        Self {
            width: width_pt * scale,
            height: height_pt * scale,
            scale,
        }
    }

    /// Surface width in whole pixels (fractional pixels are truncated).
    pub fn pixel_width(&self) -> u32 {
        to_pixels(self.width)
    }

    /// Surface height in whole pixels (fractional pixels are truncated).
    pub fn pixel_height(&self) -> u32 {
        to_pixels(self.height)
    }
}

fn to_pixels(v: f32) -> u32 {
    if v.is_finite() && v > 0.0 {
        v.trunc().min(u32::MAX as f32) as u32
    } else {
        0
    }
}

/// A PDF parsing/rendering engine.
pub trait PdfEngine: Send + Sync {
    /// Store `src` in the engine's global configuration.
    fn register_worker_src(&self, src: WorkerSource);

    /// Parse `bytes` into a document handle.
    fn load_document(
        &self,
        bytes: Vec<u8>,
    ) -> BoxFuture<'_, Result<Box<dyn PdfDocumentHandle>, EngineError>>;
}

/// A parsed document.
pub trait PdfDocumentHandle: Send + Sync {
    fn page_count(&self) -> u16;

    /// Fetch a page by 1-based number.
    fn get_page(
        &self,
        page_number: u16,
    ) -> BoxFuture<'_, Result<Box<dyn PdfPageHandle>, EngineError>>;
}

/// A single page of a parsed document.
pub trait PdfPageHandle: Send + Sync {
    fn viewport(&self, scale: f32) -> Viewport;

    /// Rasterise the page into `context`, resolving once drawing completes.
    fn render<'a>(
        &'a self,
        context: &'a mut dyn RenderContext2d,
        viewport: &'a Viewport,
    ) -> BoxFuture<'a, Result<(), EngineError>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn letter_page_at_default_scale() {
        let vp = Viewport::from_points(612.0, 792.0, 3.0);
        assert_eq!(vp.pixel_width(), 1836);
        assert_eq!(vp.pixel_height(), 2376);
    }

    #[test]
    fn fractional_pixels_truncate() {
        let vp = Viewport::from_points(100.5, 10.9, 1.0);
        assert_eq!(vp.pixel_width(), 100);
        assert_eq!(vp.pixel_height(), 10);
    }

    #[test]
    fn degenerate_viewport_is_zero_sized() {
        let vp = Viewport::from_points(-5.0, f32::NAN, 3.0);
        assert_eq!(vp.pixel_width(), 0);
        assert_eq!(vp.pixel_height(), 0);
    }

    #[test]
    fn worker_src_latest_registration_wins() {
        let _guard = WORKER_SRC_TEST_LOCK
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        register_worker_src(WorkerSource::Library(PathBuf::from("/first/libpdfium.so")));
        register_worker_src(WorkerSource::Library(PathBuf::from("/second/libpdfium.so")));
        assert_eq!(
            worker_src(),
            Some(WorkerSource::Library(PathBuf::from("/second/libpdfium.so")))
        );
    }
}
