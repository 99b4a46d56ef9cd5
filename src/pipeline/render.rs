//! PDF rasterisation: render every page of a PDF to `page-<n>.png` files.
//!
//! The pipelines only depend on the [`Rasterizer`] trait; the default
//! [`PdfiumRasterizer`] wraps pdfium-render. pdfium is a blocking C++
//! library, so [`rasterize_pdf`] runs the rasteriser on the blocking pool
//! and the async caller does not resume until every page file exists.

use crate::error::RelayError;
use image::ImageFormat;
use pdfium_render::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// One rasterised page on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RasterPage {
    /// 1-based page number.
    pub page_index: u32,
    pub image_path: PathBuf,
    /// Public URL of the image, when a base URL is configured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Converts a PDF into one image file per page.
///
/// Implementations must number pages from 1, contiguously, write one file
/// per page into `out_dir`, and render every page of a document at the same
/// pixel width for a uniform page size.
pub trait Rasterizer: Send + Sync {
    fn rasterize(
        &self,
        pdf_path: &Path,
        dpi: u32,
        out_dir: &Path,
    ) -> Result<Vec<RasterPage>, RelayError>;
}

/// File name used for page `n`.
pub fn page_file_name(page_index: u32) -> String {
    format!("page-{page_index}.png")
}

/// Run `rasterizer` on the blocking pool.
pub async fn rasterize_pdf(
    rasterizer: Arc<dyn Rasterizer>,
    pdf_path: &Path,
    dpi: u32,
    out_dir: &Path,
) -> Result<Vec<RasterPage>, RelayError> {
    let pdf = pdf_path.to_path_buf();
    let out = out_dir.to_path_buf();

    let pages = tokio::task::spawn_blocking(move || rasterizer.rasterize(&pdf, dpi, &out))
        .await
        .map_err(|e| RelayError::Internal(format!("Render task panicked: {}", e)))??;

    check_numbering(&pages)?;
    Ok(pages)
}

/// Pages must be numbered 1..=n in order.
fn check_numbering(pages: &[RasterPage]) -> Result<(), RelayError> {
    if pages.is_empty() {
        return Err(RelayError::conversion_failed("rasteriser produced no pages"));
    }
    for (i, page) in pages.iter().enumerate() {
        let expected = i as u32 + 1;
        if page.page_index != expected {
            return Err(RelayError::conversion_failed(format!(
                "rasteriser returned page {} where page {expected} was expected",
                page.page_index
            )));
        }
    }
    Ok(())
}

// ── pdfium ───────────────────────────────────────────────────────────────

/// pdfium-backed [`Rasterizer`].
///
/// The library is located through `PDFIUM_LIB_PATH` (a library file or the
/// directory containing it) and falls back to the system loader.
#[derive(Debug, Clone, Default)]
pub struct PdfiumRasterizer {
    password: Option<String>,
}

impl PdfiumRasterizer {
    /// Rasteriser that opens encrypted documents with `password`.
    pub fn with_password(password: impl Into<String>) -> Self {
        Self {
            password: Some(password.into()),
        }
    }
}

/// Bind to the pdfium shared library.
fn bind_pdfium() -> Result<Pdfium, RelayError> {
    let bindings = match std::env::var("PDFIUM_LIB_PATH") {
        Ok(path) if !path.is_empty() => {
            let p = PathBuf::from(&path);
            let lib = if p.is_dir() {
                Pdfium::pdfium_platform_library_name_at_path(&p)
            } else {
                p
            };
            Pdfium::bind_to_library(&lib).map_err(|e| {
                RelayError::PdfiumBindingFailed(format!("{}: {}", lib.display(), e))
            })?
        }
        _ => Pdfium::bind_to_system_library()
            .map_err(|e| RelayError::PdfiumBindingFailed(e.to_string()))?,
    };
    Ok(Pdfium::new(bindings))
}

impl Rasterizer for PdfiumRasterizer {
    fn rasterize(
        &self,
        pdf_path: &Path,
        dpi: u32,
        out_dir: &Path,
    ) -> Result<Vec<RasterPage>, RelayError> {
        let pdfium = bind_pdfium()?;
        let password = self.password.as_deref();

        let document = pdfium.load_pdf_from_file(pdf_path, password).map_err(|e| {
            let err_str = format!("{:?}", e);
            if err_str.contains("Password") || err_str.contains("password") {
                if password.is_some() {
                    RelayError::WrongPassword {
                        path: pdf_path.to_path_buf(),
                    }
                } else {
                    RelayError::PasswordRequired {
                        path: pdf_path.to_path_buf(),
                    }
                }
            } else {
                RelayError::CorruptPdf {
                    path: pdf_path.to_path_buf(),
                    detail: err_str,
                }
            }
        })?;

        std::fs::create_dir_all(out_dir).map_err(|e| RelayError::StorageFailure {
            path: out_dir.to_path_buf(),
            source: e,
        })?;

        let pages = document.pages();
        info!("PDF loaded: {} pages, rendering at {} DPI", pages.len(), dpi);

        let mut results = Vec::with_capacity(pages.len() as usize);
        for (idx, page) in pages.iter().enumerate() {
            let page_num = idx + 1;

            // 1 pt = 1/72 inch, so a page is `points × dpi / 72` pixels.
            let width_px = (page.width().value * dpi as f32 / 72.0).round().max(1.0) as i32;
            let height_px = (page.height().value * dpi as f32 / 72.0).round().max(1.0) as i32;

            let config = PdfRenderConfig::new()
                .set_target_width(width_px)
                .set_target_height(height_px);

            let bitmap = page.render_with_config(&config).map_err(|e| {
                RelayError::RasterisationFailed {
                    page: page_num,
                    detail: format!("{:?}", e),
                }
            })?;

            let image = bitmap.as_image();
            let image_path = out_dir.join(page_file_name(page_num as u32));
            image
                .save_with_format(&image_path, ImageFormat::Png)
                .map_err(|e| RelayError::RasterisationFailed {
                    page: page_num,
                    detail: format!("PNG encoding failed: {}", e),
                })?;

            debug!(
                "Rendered page {} → {}x{} px → {}",
                page_num,
                image.width(),
                image.height(),
                image_path.display()
            );

            results.push(RasterPage {
                page_index: page_num as u32,
                image_path,
                url: None,
            });
        }

        Ok(results)
    }
}
