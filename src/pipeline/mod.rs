//! Pipeline stages for first-page PDF-to-PNG conversion.
//!
//! Each submodule implements exactly one step, so the native engine or
//! encoder can be swapped without touching the orchestration in
//! [`crate::convert`].
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ render ──▶ encode
//! (bytes)   (pdfium)   (PNG)
//! ```
//!
//! 1. [`input`]: the PDF bytes and file name, from memory, a path or a URL
//! 2. [`render`]: pdfium implementation of [`crate::engine::PdfEngine`];
//!    every pdfium call runs in `spawn_blocking`
//! 3. [`encode`]: PNG (or JPEG) encoding of surface pixels, plus data URLs

pub mod encode;
pub mod input;
pub mod render;
