//! Error types for the edgequake-pdf2png library.
//!
//! Two distinct error types reflect two distinct layers:
//!
//! * [`EngineError`]: raised by the PDF engine collaborator (bind failure,
//!   malformed document, missing page, render failure). Always surfaced to
//!   callers wrapped in [`Pdf2PngError::Upstream`].
//!
//! * [`Pdf2PngError`]: every failure the library reports. The conversion
//!   variants are never thrown at callers of
//!   [`crate::convert::PdfPageRasterizer::convert`]; they are folded into
//!   [`crate::output::ConversionResult::error`] via their `Display` text.
//!   Input and output variants come from the helpers around the core
//!   conversion (path/URL resolution, writing PNGs to disk).

use std::path::PathBuf;
use thiserror::Error;

/// All errors reported by the edgequake-pdf2png library.
#[derive(Debug, Error)]
pub enum Pdf2PngError {
    // ── Conversion errors ─────────────────────────────────────────────────
    /// The host has no document/window equivalents, so no surface can exist.
    #[error("PDF conversion must run in the browser (DOM APIs not available).")]
    EnvironmentUnavailable,

    /// The surface refused to hand out a 2D drawing context.
    #[error("Failed to convert PDF: Failed to get 2D canvas context")]
    GraphicsContextUnavailable,

    /// The surface export produced no bytes.
    #[error("Failed to create image blob")]
    EncodingFailure,

    /// The PDF engine failed (malformed bytes, missing page, bind failure).
    #[error("Failed to convert PDF: {0}")]
    Upstream(#[from] EngineError),

    /// Unexpected runtime failure outside the engine.
    #[error("Failed to convert PDF: {0}")]
    Internal(String),

    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is neither a readable path nor an HTTP/HTTPS URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    // ── Output errors ─────────────────────────────────────────────────────
    /// Could not create or write the output PNG file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Failures reported by a [`crate::engine::PdfEngine`] implementation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EngineError {
    /// The host cannot provide an engine at all.
    #[error("PDF engine unavailable: {0}")]
    Unavailable(String),

    /// Could not bind to the pdfium library named by the worker source.
    #[error("Failed to bind to pdfium library: {0}")]
    Bind(String),

    /// The bytes could not be parsed as a PDF.
    #[error("Invalid PDF structure: {0}")]
    InvalidPdf(String),

    /// Requested page number is outside the document.
    #[error("Invalid page request: page {page} of {total}")]
    PageOutOfRange { page: u16, total: u16 },

    /// Rasterisation of a page failed.
    #[error("Rendering page {page} failed: {detail}")]
    Render { page: u16, detail: String },

    /// A blocking engine task panicked or was cancelled.
    #[error("Engine task failed: {0}")]
    Task(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn environment_message_is_exact() {
        assert_eq!(
            Pdf2PngError::EnvironmentUnavailable.to_string(),
            "PDF conversion must run in the browser (DOM APIs not available)."
        );
    }

    #[test]
    fn encoding_failure_has_no_prefix() {
        assert_eq!(
            Pdf2PngError::EncodingFailure.to_string(),
            "Failed to create image blob"
        );
    }

    #[test]
    fn upstream_is_prefixed() {
        let e: Pdf2PngError = EngineError::InvalidPdf("bad xref".into()).into();
        let msg = e.to_string();
        assert!(msg.starts_with("Failed to convert PDF: "), "got: {msg}");
        assert!(msg.ends_with("bad xref"), "got: {msg}");
    }

    #[test]
    fn page_out_of_range_display() {
        let e = EngineError::PageOutOfRange { page: 1, total: 0 };
        assert!(e.to_string().contains("page 1 of 0"));
    }
}
