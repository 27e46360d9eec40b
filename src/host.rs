//! Host environments: the capabilities a conversion needs from its runtime.
//!
//! The rasterizer is written against [`HostEnvironment`] only. The host
//! decides whether a graphics-capable environment exists and, if so, hands
//! out the PDF engine, render surfaces and object URLs.
//!
//! * [`NativeHost`]: in-process pdfium engine, `RgbaImage` surfaces and a
//!   [`BlobRegistry`] for object URLs.
//! * [`DetachedHost`]: no document, no window. Every conversion reports
//!   the environment as unavailable and the engine is never constructed.

use crate::engine::{PdfEngine, WorkerSource};
use crate::error::EngineError;
use crate::pipeline::render::PdfiumEngine;
use crate::surface::{Blob, CanvasLimits, RasterSurface, RenderSurface};
use once_cell::sync::OnceCell;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Capabilities a conversion draws from its environment.
pub trait HostEnvironment: Send + Sync {
    /// A document (DOM) equivalent is present.
    fn has_document(&self) -> bool;

    /// A global window equivalent is present.
    fn has_window(&self) -> bool;

    /// Where the engine should load its worker library from.
    fn worker_src(&self) -> WorkerSource;

    /// The PDF engine, constructed on first use.
    fn pdf_engine(&self) -> Result<Arc<dyn PdfEngine>, EngineError>;

    /// A fresh, zero-sized render surface.
    fn create_surface(&self) -> Box<dyn RenderSurface>;

    /// Register `blob` and return a URL addressing it.
    fn create_object_url(&self, blob: &Blob) -> String;
}

// ── Object URLs ──────────────────────────────────────────────────────────

/// Registry of blobs addressable through `blob:` URLs.
///
/// Entries live until [`BlobRegistry::revoke`] is called or the registry is
/// dropped; nothing is revoked automatically.
#[derive(Debug)]
pub struct BlobRegistry {
    origin: String,
    next_id: AtomicU64,
    entries: Mutex<HashMap<String, Blob>>,
}

impl BlobRegistry {
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            next_id: AtomicU64::new(1),
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn create_object_url(&self, blob: &Blob) -> String {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let url = format!("blob:{}/{:016x}", self.origin, id);
        self.lock().insert(url.clone(), blob.clone());
        debug!("Created object URL {} ({} bytes)", url, blob.size());
        url
    }

    pub fn resolve(&self, url: &str) -> Option<Blob> {
        self.lock().get(url).cloned()
    }

    /// Returns `true` if `url` was registered.
    pub fn revoke(&self, url: &str) -> bool {
        self.lock().remove(url).is_some()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // A poisoned map is still consistent: every mutation is a single insert/remove.
    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Blob>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for BlobRegistry {
    fn default() -> Self {
        Self::new("pdf2png")
    }
}

// ── Native host ──────────────────────────────────────────────────────────

/// In-process host backed by pdfium and `RgbaImage` surfaces.
pub struct NativeHost {
    worker_src: WorkerSource,
    limits: CanvasLimits,
    registry: Arc<BlobRegistry>,
    engine: OnceCell<Arc<dyn PdfEngine>>,
}

impl NativeHost {
    /// Worker source from `PDFIUM_LIB_PATH`, default canvas limits.
    pub fn new() -> Self {
        Self {
            worker_src: WorkerSource::from_env(),
            limits: CanvasLimits::default(),
            registry: Arc::new(BlobRegistry::default()),
            engine: OnceCell::new(),
        }
    }

    pub fn with_worker_src(mut self, src: WorkerSource) -> Self {
        self.worker_src = src;
        self
    }

    pub fn with_canvas_limits(mut self, limits: CanvasLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Share an object-URL registry with other hosts or the caller.
    pub fn with_registry(mut self, registry: Arc<BlobRegistry>) -> Self {
        self.registry = registry;
        self
    }

    pub fn registry(&self) -> &Arc<BlobRegistry> {
        &self.registry
    }
}

impl Default for NativeHost {
    fn default() -> Self {
        Self::new()
    }
}

impl HostEnvironment for NativeHost {
    fn has_document(&self) -> bool {
        true
    }

    fn has_window(&self) -> bool {
        true
    }

    fn worker_src(&self) -> WorkerSource {
        self.worker_src.clone()
    }

    fn pdf_engine(&self) -> Result<Arc<dyn PdfEngine>, EngineError> {
        let engine = self.engine.get_or_init(|| {
            debug!("Constructing pdfium engine");
            Arc::new(PdfiumEngine::new()) as Arc<dyn PdfEngine>
        });
        Ok(Arc::clone(engine))
    }

    fn create_surface(&self) -> Box<dyn RenderSurface> {
        Box::new(RasterSurface::new(self.limits))
    }

    fn create_object_url(&self, blob: &Blob) -> String {
        self.registry.create_object_url(blob)
    }
}

// ── Detached host ────────────────────────────────────────────────────────

/// Host without document or window, e.g. a server-side render pass.
#[derive(Debug, Default, Clone, Copy)]
pub struct DetachedHost;

impl HostEnvironment for DetachedHost {
    fn has_document(&self) -> bool {
        false
    }

    fn has_window(&self) -> bool {
        false
    }

    fn worker_src(&self) -> WorkerSource {
        WorkerSource::System
    }

    fn pdf_engine(&self) -> Result<Arc<dyn PdfEngine>, EngineError> {
        Err(EngineError::Unavailable(
            "no graphics-capable environment".to_string(),
        ))
    }

    fn create_surface(&self) -> Box<dyn RenderSurface> {
        Box::new(RasterSurface::new(CanvasLimits {
            max_dimension: 0,
            max_area: 0,
        }))
    }

    fn create_object_url(&self, _blob: &Blob) -> String {
        String::new()
    }
}
