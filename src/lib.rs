//! # docrelay
//!
//! Document format relay: turn sequences of images into PDFs and PDFs into
//! images.
//!
//! ## Pipelines
//!
//! ```text
//! images ──▶ Composer ──▶ document/pdf/pdf_<id>.pdf      (one page per image)
//! pages  ──▶ Stitcher ──▶ pdf-images/long_pdf_<id>.png   (one tall image)
//! PDF    ──▶ pdfium   ──▶ pdf-images/pdf_<id>/page-N.png (one image per page)
//! ```
//!
//! The Composer skips unreadable images and reports them; the Stitcher
//! aborts on the first unreadable page. Artifacts are written atomically, so
//! a failed call never leaves a partial file behind.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use docrelay::{compose_images_to_pdf, PageSizeMode, RelayConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = RelayConfig::builder().output_dir("output").build()?;
//!     let out = compose_images_to_pdf(
//!         &["scan-1.jpg", "scan-2.png"],
//!         PageSizeMode::default(),
//!         &config,
//!     )
//!     .await?;
//!     println!("{} pages → {}", out.page_count, out.artifact.path.display());
//!     for skipped in &out.diagnostics {
//!         eprintln!("skipped: {skipped}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `docrelay` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! docrelay = { version = "0.1", default-features = false }
//! ```
//!
//! ## pdfium
//!
//! Rasterising PDFs needs the pdfium shared library at runtime. Point
//! `PDFIUM_LIB_PATH` at the library file or its directory, or install it
//! where the system loader finds it. Composition and stitching of existing
//! images do not need pdfium.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod compose;
pub mod config;
pub mod convert;
pub mod error;
pub mod naming;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod stitch;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use compose::compose_images_to_pdf;
pub use config::{PageSize, PageSizeMode, RelayConfig, RelayConfigBuilder};
pub use convert::{convert_image_to_pdf, rasterize_pdf_to_images};
pub use error::{ImageError, RelayError};
pub use naming::{ArtifactNamer, SequenceNamer, TimestampNamer, UuidNamer};
pub use output::{Artifact, ComposeOutput, ComposedPage, RasterOutput, RasterPage, StitchOutput};
pub use pipeline::layout::PageLayout;
pub use pipeline::plan::StitchPlan;
pub use pipeline::render::{PdfiumRasterizer, Rasterizer};
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
pub use stitch::{stitch_pages_to_image, stitch_pdf_to_image};
