//! CLI binary for edgequake-pdf2png.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `RasterConfig`, converts the first page and writes the PNG.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_pdf2png::{
    resolve_input, NativeHost, PdfPageRasterizer, RasterConfig, WorkerSource,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # invoice.pdf → invoice.png in the current directory
  pdf2png invoice.pdf

  # Explicit output path, lower resolution
  pdf2png --scale 1.5 report.PDF -o thumbs/report.png

  # Convert from URL and print the result object as JSON
  pdf2png --json https://arxiv.org/pdf/1706.03762.pdf

  # Emit a data URL for embedding
  pdf2png --data-url slides.pdf > slides.txt

ENVIRONMENT VARIABLES:
  PDFIUM_LIB_PATH         Path to libpdfium (file or directory)
  RUST_LOG                Override log filtering (e.g. edgequake_pdf2png=debug)
"#;

/// Render the first page of a PDF to PNG.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2png",
    version,
    about = "Render the first page of a PDF (file or URL) to PNG",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF file path or HTTP/HTTPS URL.
    input: String,

    /// Write the PNG here instead of `<name>.png` in the current directory.
    #[arg(short, long, env = "PDF2PNG_OUTPUT")]
    output: Option<PathBuf>,

    /// Viewport scale factor (0.1–10.0).
    #[arg(long, env = "PDF2PNG_SCALE", default_value_t = 3.0)]
    scale: f32,

    /// Encoder quality (0.0–1.0). No effect on PNG output.
    #[arg(long, env = "PDF2PNG_QUALITY", default_value_t = 1.0)]
    quality: f32,

    /// Path to the pdfium library (file or directory).
    #[arg(long, env = "PDFIUM_LIB_PATH")]
    pdfium: Option<PathBuf>,

    /// Print the conversion result as JSON on stdout.
    #[arg(long, env = "PDF2PNG_JSON")]
    json: bool,

    /// Print a `data:image/png;base64,…` URL on stdout instead of writing a file.
    #[arg(long)]
    data_url: bool,

    /// Disable the spinner.
    #[arg(long, env = "PDF2PNG_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF2PNG_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDF2PNG_QUIET")]
    quiet: bool,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "PDF2PNG_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.data_url;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build rasterizer ─────────────────────────────────────────────────
    let config = RasterConfig::builder()
        .scale(cli.scale)
        .quality(cli.quality)
        .build()
        .context("Invalid configuration")?;

    let mut host = NativeHost::new();
    if let Some(ref path) = cli.pdfium {
        host = host.with_worker_src(WorkerSource::Library(path.clone()));
    }
    let rasterizer = PdfPageRasterizer::with_config(Arc::new(host), config);

    // ── Resolve input ────────────────────────────────────────────────────
    let document = resolve_input(&cli.input, cli.download_timeout)
        .await
        .with_context(|| format!("Failed to read '{}'", cli.input))?;

    // ── Convert ──────────────────────────────────────────────────────────
    let spinner = show_progress.then(|| {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
        bar.set_prefix("Rendering");
        bar.set_message(document.name().to_string());
        bar.enable_steady_tick(Duration::from_millis(80));
        bar
    });

    let result = rasterizer.convert(&document).await;

    if let Some(bar) = spinner {
        bar.finish_and_clear();
    }

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&result).context("Failed to serialise result")?
        );
    }

    let (_image_url, file) = match result.into_result() {
        Ok(ok) => ok,
        Err(message) => {
            if !cli.quiet {
                eprintln!("{} {}", red("✘"), message);
            }
            anyhow::bail!(message);
        }
    };

    if cli.data_url {
        println!("{}", file.to_data_url());
        return Ok(());
    }

    let output_path = cli
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(file.name()));
    file.persist(&output_path)
        .await
        .context("Failed to write PNG")?;

    if !cli.quiet {
        eprintln!(
            "{} {}  {} bytes  →  {}",
            green("✔"),
            document.name(),
            file.size(),
            bold(&output_path.display().to_string()),
        );
    }

    Ok(())
}
