//! First-page conversion entry points.
//!
//! [`PdfPageRasterizer::convert`] is total: it always resolves to a
//! [`ConversionResult`] and never returns `Err` or panics on bad input.
//! Every failure is folded into the result's `error` field, with
//! `image_url` emptied and `file` cleared.

use crate::config::RasterConfig;
use crate::error::Pdf2PngError;
use crate::host::{HostEnvironment, NativeHost};
use crate::output::{ConversionResult, ImageFile};
use crate::pipeline::encode::PNG_MIME;
use crate::pipeline::input::InputDocument;
use crate::surface::{Blob, RenderSurface};
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

/// Pages are 1-indexed; only the first is ever rendered.
const FIRST_PAGE: u16 = 1;

static RE_PDF_EXTENSION: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\.pdf$").unwrap());

/// Derive the PNG file name: drop a trailing `.pdf` (any case), append `.png`.
///
/// ```rust
/// use edgequake_pdf2png::png_file_name;
///
/// assert_eq!(png_file_name("invoice.PDF"), "invoice.png");
/// assert_eq!(png_file_name("report"), "report.png");
/// ```
pub fn png_file_name(original: &str) -> String {
    format!("{}.png", RE_PDF_EXTENSION.replace(original, ""))
}

/// Renders the first page of a PDF into a PNG through a host environment.
#[derive(Clone)]
pub struct PdfPageRasterizer {
    host: Arc<dyn HostEnvironment>,
    config: RasterConfig,
}

impl PdfPageRasterizer {
    pub fn new(host: Arc<dyn HostEnvironment>) -> Self {
        Self::with_config(host, RasterConfig::default())
    }

    pub fn with_config(host: Arc<dyn HostEnvironment>, config: RasterConfig) -> Self {
        Self { host, config }
    }

    /// Rasterizer over a fresh [`NativeHost`].
    pub fn native() -> Self {
        Self::new(Arc::new(NativeHost::new()))
    }

    pub fn config(&self) -> &RasterConfig {
        &self.config
    }

    pub fn host(&self) -> &Arc<dyn HostEnvironment> {
        &self.host
    }

    /// Convert the first page of `document` to PNG.
    pub async fn convert(&self, document: &InputDocument) -> ConversionResult {
        let start = Instant::now();
        info!("Starting conversion: {}", document.name());

        match self.rasterize(document).await {
            Ok((image_url, file)) => {
                info!(
                    "Conversion complete: {} ({} bytes) in {}ms",
                    file.name(),
                    file.size(),
                    start.elapsed().as_millis()
                );
                ConversionResult::success(image_url, file)
            }
            Err(e) => {
                warn!("Conversion of '{}' failed: {}", document.name(), e);
                ConversionResult::failure(&e)
            }
        }
    }

    /// Synchronous wrapper around [`PdfPageRasterizer::convert`].
    ///
    /// Creates a temporary tokio runtime internally, so it must not be
    /// called from inside an async context.
    pub fn convert_sync(&self, document: &InputDocument) -> ConversionResult {
        match tokio::runtime::Runtime::new() {
            Ok(rt) => rt.block_on(self.convert(document)),
            Err(e) => ConversionResult::failure(&Pdf2PngError::Internal(format!(
                "Failed to create tokio runtime: {}",
                e
            ))),
        }
    }

    async fn rasterize(&self, document: &InputDocument) -> Result<(String, ImageFile), Pdf2PngError> {
        // ── Step 1: Environment check ────────────────────────────────────
        if !(self.host.has_document() && self.host.has_window()) {
            return Err(Pdf2PngError::EnvironmentUnavailable);
        }

        // ── Step 2: Engine + worker source ───────────────────────────────
        let engine = self.host.pdf_engine()?;
        engine.register_worker_src(self.host.worker_src());

        // ── Step 3: Load document, fetch first page ──────────────────────
        let bytes = document.read_all();
        debug!("Loading {} bytes", bytes.len());
        let pdf = engine.load_document(bytes).await?;
        let page = pdf.get_page(FIRST_PAGE).await?;

        // ── Step 4: Viewport + surface ───────────────────────────────────
        let viewport = page.viewport(self.config.scale);
        let mut surface = self.host.create_surface();
        surface.set_dimensions(viewport.pixel_width(), viewport.pixel_height());
        debug!(
            "Surface {}x{} px at scale {}",
            viewport.pixel_width(),
            viewport.pixel_height(),
            viewport.scale
        );

        // ── Step 5: Render ───────────────────────────────────────────────
        {
            let context = surface
                .context_2d()
                .ok_or(Pdf2PngError::GraphicsContextUnavailable)?;
            page.render(context, &viewport).await?;
        }

        // ── Step 6: Export PNG ───────────────────────────────────────────
        let exported = request_blob(surface.as_ref(), PNG_MIME, self.config.quality);
        // A dropped callback counts as "no data".
        let blob = exported
            .await
            .ok()
            .flatten()
            .filter(|b| b.size() > 0)
            .ok_or(Pdf2PngError::EncodingFailure)?;

        // ── Step 7: Wrap result ──────────────────────────────────────────
        let file = ImageFile::png(png_file_name(document.name()), blob.shared());
        let image_url = self.host.create_object_url(file.blob());
        Ok((image_url, file))
    }
}

/// Start the callback-style surface export; the receiver resolves when the
/// callback fires.
fn request_blob(
    surface: &dyn RenderSurface,
    mime_type: &str,
    quality: f32,
) -> oneshot::Receiver<Option<Blob>> {
    let (tx, rx) = oneshot::channel();
    surface.to_blob(
        mime_type,
        quality,
        Box::new(move |blob| {
            let _ = tx.send(blob);
        }),
    );
    rx
}

/// Convert the first page of `document` with a [`NativeHost`] and default config.
pub async fn convert_first_page(document: &InputDocument) -> ConversionResult {
    PdfPageRasterizer::native().convert(document).await
}
