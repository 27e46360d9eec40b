//! pdfium-backed [`PdfEngine`]: parse documents and rasterise pages.
//!
//! ## Why spawn_blocking?
//!
//! The `pdfium-render` crate wraps the pdfium C++ library, which uses
//! thread-local state internally and is not safe to call from async contexts.
//! Every pdfium call runs inside `tokio::task::spawn_blocking`.
//!
//! ## Why reopen the document to render?
//!
//! A pdfium `PdfDocument` borrows the `Pdfium` bindings it was loaded with
//! and cannot leave the blocking thread. Loading binds once, records the
//! page count and every page size (read without loading the pages), and
//! hands back plain data. Rendering binds and opens the bytes a second time.
//! Nothing else crosses back to the async side.

use crate::engine::{self, PdfDocumentHandle, PdfEngine, PdfPageHandle, Viewport, WorkerSource};
use crate::error::EngineError;
use crate::surface::RenderContext2d;
use futures::future::{BoxFuture, FutureExt};
use image::RgbaImage;
use pdfium_render::prelude::*;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info};

/// [`PdfEngine`] backed by the pdfium library.
///
/// Each engine keeps the worker source it was last given, so hosts with
/// different library paths never read each other's configuration.
#[derive(Debug, Default)]
pub struct PdfiumEngine {
    source: RwLock<Option<WorkerSource>>,
}

impl PdfiumEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// This engine's source, else the process-wide one, else the system search.
    fn current_source(&self) -> WorkerSource {
        self.source
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .or_else(engine::worker_src)
            .unwrap_or_default()
    }
}

impl PdfEngine for PdfiumEngine {
    fn register_worker_src(&self, src: WorkerSource) {
        engine::register_worker_src(src.clone());
        *self.source.write().unwrap_or_else(PoisonError::into_inner) = Some(src);
    }

    fn load_document(
        &self,
        bytes: Vec<u8>,
    ) -> BoxFuture<'_, Result<Box<dyn PdfDocumentHandle>, EngineError>> {
        async move {
            let source = self.current_source();
            let bytes: Arc<[u8]> = bytes.into();

            let data = Arc::clone(&bytes);
            let src = source.clone();
            let page_sizes = run_blocking(move || page_sizes_blocking(&src, &data)).await?;
            info!("PDF loaded: {} pages", page_sizes.len());

            Ok(Box::new(PdfiumDocument {
                bytes,
                page_sizes,
                source,
            }) as Box<dyn PdfDocumentHandle>)
        }
        .boxed()
    }
}

struct PdfiumDocument {
    bytes: Arc<[u8]>,
    /// `(width, height)` in points, indexed by page number - 1.
    page_sizes: Vec<(f32, f32)>,
    source: WorkerSource,
}

impl PdfDocumentHandle for PdfiumDocument {
    fn page_count(&self) -> u16 {
        self.page_sizes.len() as u16
    }

    fn get_page(
        &self,
        page_number: u16,
    ) -> BoxFuture<'_, Result<Box<dyn PdfPageHandle>, EngineError>> {
        async move {
            let total = self.page_count();
            let (width_pt, height_pt) = page_number
                .checked_sub(1)
                .and_then(|i| self.page_sizes.get(i as usize).copied())
                .ok_or(EngineError::PageOutOfRange {
                    page: page_number,
                    total,
                })?;
            debug!(
                "Page {} is {:.1} × {:.1} pt",
                page_number, width_pt, height_pt
            );

            Ok(Box::new(PdfiumPage {
                bytes: Arc::clone(&self.bytes),
                source: self.source.clone(),
                page_number,
                width_pt,
                height_pt,
            }) as Box<dyn PdfPageHandle>)
        }
        .boxed()
    }
}

struct PdfiumPage {
    bytes: Arc<[u8]>,
    source: WorkerSource,
    page_number: u16,
    width_pt: f32,
    height_pt: f32,
}

impl PdfPageHandle for PdfiumPage {
    fn viewport(&self, scale: f32) -> Viewport {
        Viewport::from_points(self.width_pt, self.height_pt, scale)
    }

    fn render<'a>(
        &'a self,
        context: &'a mut dyn RenderContext2d,
        viewport: &'a Viewport,
    ) -> BoxFuture<'a, Result<(), EngineError>> {
        async move {
            let (width, height) = context.canvas_size();
            let (target_w, target_h) = (
                viewport.pixel_width().min(width),
                viewport.pixel_height().min(height),
            );

            let data = Arc::clone(&self.bytes);
            let src = self.source.clone();
            let page_number = self.page_number;
            let pixels = run_blocking(move || {
                render_page_blocking(&src, &data, page_number, target_w, target_h)
            })
            .await?;

            debug!(
                "Rendered page {} → {}x{} px",
                page_number,
                pixels.width(),
                pixels.height()
            );
            context.draw_image(&pixels, 0, 0);
            Ok(())
        }
        .boxed()
    }
}

// ── Blocking helpers ─────────────────────────────────────────────────────

async fn run_blocking<T, F>(f: F) -> Result<T, EngineError>
where
    F: FnOnce() -> Result<T, EngineError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| EngineError::Task(format!("pdfium task panicked: {}", e)))?
}

/// Bind to the pdfium library named by `source`.
pub fn bind_pdfium(source: &WorkerSource) -> Result<Pdfium, EngineError> {
    let bindings = match source {
        WorkerSource::Library(path) => {
            let lib = if path.is_dir() {
                Pdfium::pdfium_platform_library_name_at_path(path)
            } else {
                path.clone()
            };
            Pdfium::bind_to_library(&lib)
                .map_err(|e| EngineError::Bind(format!("{}: {:?}", lib.display(), e)))?
        }
        WorkerSource::System => {
            Pdfium::bind_to_library(&Pdfium::pdfium_platform_library_name_at_path("./lib"))
                .or_else(|_| Pdfium::bind_to_system_library())
                .map_err(|e| EngineError::Bind(format!("{:?}", e)))?
        }
    };
    Ok(Pdfium::new(bindings))
}

fn open_document<'a>(pdfium: &'a Pdfium, data: &'a [u8]) -> Result<PdfDocument<'a>, EngineError> {
    pdfium
        .load_pdf_from_byte_slice(data, None)
        .map_err(|e| EngineError::InvalidPdf(format!("{:?}", e)))
}

fn page_at<'a>(document: &PdfDocument<'a>, page_number: u16) -> Result<PdfPage<'a>, EngineError> {
    let total = document.pages().len() as u16;
    if page_number == 0 || page_number > total {
        return Err(EngineError::PageOutOfRange {
            page: page_number,
            total,
        });
    }
    document
        .pages()
        .get(page_number - 1)
        .map_err(|e| EngineError::Render {
            page: page_number,
            detail: format!("{:?}", e),
        })
}

fn page_sizes_blocking(source: &WorkerSource, data: &[u8]) -> Result<Vec<(f32, f32)>, EngineError> {
    let pdfium = bind_pdfium(source)?;
    let document = open_document(&pdfium, data)?;
    let sizes = document
        .pages()
        .page_sizes()
        .map_err(|e| EngineError::InvalidPdf(format!("{:?}", e)))?;
    Ok(sizes
        .iter()
        .map(|rect| (rect.width().value, rect.height().value))
        .collect())
}

fn render_page_blocking(
    source: &WorkerSource,
    data: &[u8],
    page_number: u16,
    width: u32,
    height: u32,
) -> Result<RgbaImage, EngineError> {
    if width == 0 || height == 0 {
        return Err(EngineError::Render {
            page: page_number,
            detail: format!("empty target size {}x{}", width, height),
        });
    }

    let pdfium = bind_pdfium(source)?;
    let document = open_document(&pdfium, data)?;
    let page = page_at(&document, page_number)?;

    let render_config = PdfRenderConfig::new()
        .set_target_width(width as i32)
        .set_target_height(height as i32);

    let bitmap = page
        .render_with_config(&render_config)
        .map_err(|e| EngineError::Render {
            page: page_number,
            detail: format!("{:?}", e),
        })?;

    Ok(bitmap.as_image().into_rgba8())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn bind_to_missing_library_reports_bind_error() {
        let src = WorkerSource::Library(PathBuf::from("/definitely/not/libpdfium.so"));
        match bind_pdfium(&src) {
            Err(EngineError::Bind(msg)) => assert!(msg.contains("/definitely/not")),
            Err(other) => panic!("unexpected error: {other:?}"),
            Ok(_) => panic!("binding a missing library must fail"),
        }
    }

    #[tokio::test]
    async fn zero_sized_render_is_rejected_before_binding() {
        let err = run_blocking(|| {
            render_page_blocking(&WorkerSource::System, b"%PDF-1.4", 1, 0, 10)
        })
        .await
        .unwrap_err();
        assert!(matches!(err, EngineError::Render { page: 1, .. }));
    }

    async fn bind_error_of(engine: &PdfiumEngine) -> String {
        match engine.load_document(b"%PDF-1.4".to_vec()).await {
            Err(EngineError::Bind(msg)) => msg,
            Err(other) => panic!("unexpected error: {other:?}"),
            Ok(_) => panic!("binding a missing library must fail"),
        }
    }

    #[tokio::test]
    async fn engine_binds_the_latest_registered_source() {
        let _guard = engine::WORKER_SRC_TEST_LOCK
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let pdfium = PdfiumEngine::new();

        pdfium.register_worker_src(WorkerSource::Library(PathBuf::from("/first/libpdfium.so")));
        assert!(bind_error_of(&pdfium).await.contains("/first/"));

        pdfium.register_worker_src(WorkerSource::Library(PathBuf::from("/second/libpdfium.so")));
        let msg = bind_error_of(&pdfium).await;
        assert!(msg.contains("/second/") && !msg.contains("/first/"), "got: {msg}");
    }

    #[tokio::test]
    async fn engines_keep_their_own_source() {
        let _guard = engine::WORKER_SRC_TEST_LOCK
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let a = PdfiumEngine::new();
        let b = PdfiumEngine::new();
        a.register_worker_src(WorkerSource::Library(PathBuf::from("/first/libpdfium.so")));
        b.register_worker_src(WorkerSource::Library(PathBuf::from("/second/libpdfium.so")));

        assert!(bind_error_of(&a).await.contains("/first/"));
        assert!(bind_error_of(&b).await.contains("/second/"));
    }

    #[tokio::test]
    async fn get_page_uses_sizes_recorded_at_load() {
        // A missing library proves no bind happens here.
        let doc = PdfiumDocument {
            bytes: Arc::from(&b"%PDF-1.4"[..]),
            page_sizes: vec![(612.0, 792.0), (100.0, 50.0)],
            source: WorkerSource::Library(PathBuf::from("/definitely/not/libpdfium.so")),
        };
        assert_eq!(doc.page_count(), 2);

        let page = doc.get_page(1).await.unwrap();
        let vp = page.viewport(3.0);
        assert_eq!((vp.pixel_width(), vp.pixel_height()), (1836, 2376));

        assert!(matches!(
            doc.get_page(0).await,
            Err(EngineError::PageOutOfRange { page: 0, total: 2 })
        ));
        assert!(matches!(
            doc.get_page(3).await,
            Err(EngineError::PageOutOfRange { page: 3, total: 2 })
        ));
    }
}
