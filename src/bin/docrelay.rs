//! CLI binary for docrelay.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `RelayConfig` and prints results.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use docrelay::{
    compose_images_to_pdf, convert_image_to_pdf, rasterize_pdf_to_images, stitch_pdf_to_image,
    Artifact, ConversionProgressCallback, PageSizeMode, ProgressCallback, RelayConfig,
};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
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
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a live bar plus one log line per item.
struct CliProgressCallback {
    bar: ProgressBar,
    /// Noun shown next to the counter ("images", "pages").
    unit: &'static str,
}

impl CliProgressCallback {
    fn new(unit: &'static str) -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Reading input…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            unit,
        })
    }

    fn activate_bar(&self, total: usize) {
        let template = format!(
            "{{spinner:.cyan}} {{prefix:.bold}}  \
             [{{bar:42.green/238}}] {{pos:>3}}/{{len}} {}  \
             ⏱ {{elapsed_precise}}",
            self.unit
        );
        let progress_style = ProgressStyle::with_template(&template)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  ")
            .tick_strings(TICKS);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Converting");
        self.bar.reset_eta();
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_conversion_start(&self, total_items: usize) {
        self.activate_bar(total_items);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Processing {total_items} {}…", self.unit))
        ));
    }

    fn on_item_complete(&self, item: usize, total_items: usize) {
        self.bar
            .println(format!("  {} {:>3}/{:<3}", green("✓"), item, total_items));
        self.bar.inc(1);
    }

    fn on_item_error(&self, item: usize, total_items: usize, error: &str) {
        let msg = if error.chars().count() > 80 {
            let head: String = error.chars().take(79).collect();
            format!("{head}\u{2026}")
        } else {
            error.to_string()
        };

        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {}",
            red("✗"),
            item,
            total_items,
            red(&msg)
        ));
        self.bar.inc(1);
    }

    fn on_conversion_complete(&self, total_items: usize, success_count: usize) {
        let failed = total_items.saturating_sub(success_count);
        self.bar.finish_and_clear();

        if failed == 0 {
            eprintln!(
                "{} {} {} processed",
                green("✔"),
                bold(&success_count.to_string()),
                self.unit
            );
        } else {
            eprintln!(
                "{} {}/{} {} processed  ({} skipped)",
                cyan("⚠"),
                bold(&success_count.to_string()),
                total_items,
                self.unit,
                red(&failed.to_string()),
            );
        }
    }
}

impl Drop for CliProgressCallback {
    fn drop(&mut self) {
        // Failed runs never reach on_conversion_complete.
        if !self.bar.is_finished() {
            self.bar.finish_and_clear();
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Images → PDF on US Letter pages with a 40pt margin
  docrelay images-to-pdf scan-1.jpg scan-2.png scan-3.png

  # Images → PDF, each page the size of its image
  docrelay images-to-pdf --page-size auto *.png

  # One image → PDF
  docrelay image-to-pdf photo.jpg

  # PDF → one tall PNG at 150 DPI
  docrelay --dpi 150 pdf-to-long-image report.pdf

  # PDF (URL) → one PNG per page, with public URLs in the JSON result
  docrelay --json --base-url http://192.168.0.106:3000 pdf-to-images https://example.com/a.pdf

OUTPUT LAYOUT (under --output-dir):
  document/pdf/pdf_<id>.pdf         composed PDFs
  pdf-images/long_pdf_<id>.png      stitched long images
  pdf-images/pdf_<id>/page-<n>.png  per-page images

ENVIRONMENT VARIABLES:
  DOCRELAY_*        Every flag, e.g. DOCRELAY_OUTPUT_DIR, DOCRELAY_DPI
  PDFIUM_LIB_PATH   Path to libpdfium (file or directory)
  RUST_LOG          Overrides the log filter
"#;

/// Relay documents between image and PDF formats.
#[derive(Parser, Debug)]
#[command(
    name = "docrelay",
    version,
    about = "Compose images into PDFs and turn PDFs into images",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Root folder for all artifacts.
    #[arg(long, global = true, env = "DOCRELAY_OUTPUT_DIR", default_value = "output")]
    output_dir: PathBuf,

    /// Margin in points around images on fixed-size pages.
    #[arg(long, global = true, env = "DOCRELAY_MARGIN", default_value_t = 40.0)]
    margin: f64,

    /// Rasterisation DPI (72–600).
    #[arg(long, global = true, env = "DOCRELAY_DPI", default_value_t = 300,
          value_parser = clap::value_parser!(u32).range(72..=600))]
    dpi: u32,

    /// Base URL under which the output folder is served.
    #[arg(long, global = true, env = "DOCRELAY_BASE_URL")]
    base_url: Option<String>,

    /// Number of images probed concurrently.
    #[arg(short, long, global = true, env = "DOCRELAY_CONCURRENCY", default_value_t = 8)]
    concurrency: usize,

    /// PDF user password for encrypted documents.
    #[arg(long, global = true, env = "DOCRELAY_PASSWORD")]
    password: Option<String>,

    /// HTTP download timeout in seconds.
    #[arg(long, global = true, env = "DOCRELAY_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Print the result as JSON on stdout.
    #[arg(long, global = true, env = "DOCRELAY_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, global = true, env = "DOCRELAY_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "DOCRELAY_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "DOCRELAY_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compose several images into one PDF, one page per image.
    ImagesToPdf {
        /// Image files in page order.
        #[arg(required = true)]
        images: Vec<PathBuf>,

        /// Page size: letter, a4, auto or WIDTHxHEIGHT in points.
        #[arg(long, env = "DOCRELAY_PAGE_SIZE", default_value = "letter")]
        page_size: PageSizeMode,
    },
    /// Convert one image into a PDF page of the same size.
    ImageToPdf {
        image: PathBuf,
    },
    /// Rasterise a PDF and stitch all pages into one tall PNG.
    PdfToLongImage {
        /// Local PDF file path or HTTP/HTTPS URL.
        input: String,
    },
    /// Rasterise a PDF into one PNG per page.
    PdfToImages {
        /// Local PDF file path or HTTP/HTTPS URL.
        input: String,
    },
}

impl Command {
    fn unit(&self) -> &'static str {
        match self {
            Command::ImagesToPdf { .. } | Command::ImageToPdf { .. } => "images",
            Command::PdfToLongImage { .. } | Command::PdfToImages { .. } => "pages",
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the progress bar is active.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
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

    let progress_cb: Option<ProgressCallback> = if show_progress {
        let cb = CliProgressCallback::new(cli.command.unit());
        Some(cb as Arc<dyn ConversionProgressCallback>)
    } else {
        None
    };

    let config = build_config(&cli, progress_cb)?;

    // ── Run ──────────────────────────────────────────────────────────────
    match &cli.command {
        Command::ImagesToPdf { images, page_size } => {
            let out = compose_images_to_pdf(images.as_slice(), *page_size, &config)
                .await
                .context("Conversion failed")?;
            if !cli.json && !cli.quiet {
                for d in &out.diagnostics {
                    eprintln!("  {} {}", cyan("⚠"), dim(&d.to_string()));
                }
                eprintln!(
                    "{}  {}/{} pages  {}ms",
                    if out.skipped == 0 { green("✔") } else { cyan("⚠") },
                    out.page_count,
                    out.page_count + out.skipped,
                    out.duration_ms
                );
            }
            report(&cli, &out, &out.artifact)?;
        }
        Command::ImageToPdf { image } => {
            let out = convert_image_to_pdf(image, &config)
                .await
                .context("Conversion failed")?;
            report(&cli, &out, &out.artifact)?;
        }
        Command::PdfToLongImage { input } => {
            let out = stitch_pdf_to_image(input, &config)
                .await
                .context("Conversion failed")?;
            if !cli.json && !cli.quiet {
                eprintln!(
                    "{}  {} pages  {}x{} px  {}ms",
                    green("✔"),
                    out.page_count,
                    out.plan.canvas_width,
                    out.plan.canvas_height,
                    out.duration_ms
                );
            }
            report(&cli, &out, &out.artifact)?;
        }
        Command::PdfToImages { input } => {
            let out = rasterize_pdf_to_images(input, &config)
                .await
                .context("Conversion failed")?;
            if cli.json {
                print_json(&out)?;
            } else if !cli.quiet {
                eprintln!("{}  {} pages", green("✔"), out.page_count);
                for page in &out.pages {
                    println!(
                        "{}",
                        page.url
                            .clone()
                            .unwrap_or_else(|| page.image_path.display().to_string())
                    );
                }
            }
        }
    }

    Ok(())
}

/// Print the result as JSON, or the artifact location on stdout.
fn report<T: Serialize>(cli: &Cli, output: &T, artifact: &Artifact) -> Result<()> {
    if cli.json {
        return print_json(output);
    }
    if !cli.quiet {
        eprintln!("   →  {}", bold(&artifact.path.display().to_string()));
    }
    if let Some(ref url) = artifact.url {
        println!("{url}");
    } else {
        println!("{}", artifact.path.display());
    }
    Ok(())
}

fn print_json<T: Serialize>(output: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(output).context("Failed to serialise output")?;
    println!("{json}");
    Ok(())
}

/// Map CLI args to `RelayConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<RelayConfig> {
    let mut builder = RelayConfig::builder()
        .output_dir(&cli.output_dir)
        .margin_points(cli.margin)
        .resolution(cli.dpi)
        .concurrency(cli.concurrency)
        .download_timeout_secs(cli.download_timeout);

    if let Some(ref url) = cli.base_url {
        builder = builder.public_base_url(url.clone());
    }
    if let Some(ref pwd) = cli.password {
        builder = builder.password(pwd.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
