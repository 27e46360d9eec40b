//! # edgequake-pdf2png
//!
//! Rasterise the first page of a PDF into a PNG, returned as a file handle
//! plus an object URL for upload or preview.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF bytes
//!  │
//!  ├─ 1. Host     environment check, engine + worker source
//!  ├─ 2. Load     parse via pdfium (spawn_blocking), fetch page 1
//!  ├─ 3. Render   viewport at 3× onto a fresh 2D surface
//!  ├─ 4. Encode   surface → PNG through the export callback
//!  └─ 5. Wrap     `<name>.png` file + `blob:` object URL
//! ```
//!
//! Conversion never returns `Err`: failures land in
//! [`ConversionResult::error`] with an empty URL and no file.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_pdf2png::{convert_first_page, InputDocument};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let bytes = std::fs::read("invoice.pdf")?;
//!     let result = convert_first_page(&InputDocument::new("invoice.pdf", bytes)).await;
//!     match result.file() {
//!         Some(file) => println!("{} → {} ({} bytes)", result.image_url(), file.name(), file.size()),
//!         None => eprintln!("{}", result.error().unwrap_or_default()),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2png` binary (clap + anyhow + tracing-subscriber) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod engine;
pub mod error;
pub mod host;
pub mod output;
pub mod pipeline;
pub mod surface;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{RasterConfig, RasterConfigBuilder};
pub use convert::{convert_first_page, png_file_name, PdfPageRasterizer};
pub use engine::{PdfDocumentHandle, PdfEngine, PdfPageHandle, Viewport, WorkerSource};
pub use error::{EngineError, Pdf2PngError};
pub use host::{BlobRegistry, DetachedHost, HostEnvironment, NativeHost};
pub use output::{ConversionResult, ImageFile};
pub use pipeline::input::{resolve_input, InputDocument};
pub use surface::{Blob, CanvasLimits, RasterSurface, RenderContext2d, RenderSurface};
