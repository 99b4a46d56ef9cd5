//! Image-sequence-to-PDF composition.
//!
//! Every input image becomes one page, in input order. A bad image never
//! sinks the batch: it is skipped, logged and reported in
//! [`ComposeOutput::diagnostics`]. Only when nothing at all could be embedded
//! does the call fail, and in that case no file is written.

use crate::config::{PageSizeMode, RelayConfig};
use crate::error::{ImageError, RelayError};
use crate::output::{Artifact, ComposeOutput, ComposedPage};
use crate::pipeline::encode;
use crate::pipeline::layout::{self, PageLayout};
use crate::pipeline::pdf::PdfComposer;
use crate::pipeline::probe::{self, SourceImage};
use crate::pipeline::storage::{self, ArtifactKind};
use crate::progress::ProgressCallback;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Compose `images` into a single PDF, one page per image.
///
/// # Arguments
/// * `images`: image files in page order
/// * `page_size`: fixed page size (images fitted inside the margin and
///   centred) or [`PageSizeMode::Auto`] (page = native image size)
/// * `config`: output folder, margin, concurrency, collaborators
///
/// # Returns
/// `Ok(ComposeOutput)` when at least one image was embedded, even if others
/// were skipped (check `output.skipped` and `output.diagnostics`).
///
/// # Errors
/// - [`RelayError::InvalidInput`] for an empty image list
/// - [`RelayError::InvalidConfig`] when the margin leaves no room on the page
/// - [`RelayError::ConversionFailed`] when every image failed
/// - [`RelayError::StorageFailure`] when the PDF could not be written
pub async fn compose_images_to_pdf<P: AsRef<Path>>(
    images: &[P],
    page_size: PageSizeMode,
    config: &RelayConfig,
) -> Result<ComposeOutput, RelayError> {
    let start = Instant::now();

    if images.is_empty() {
        return Err(RelayError::invalid_input("no images supplied"));
    }
    layout::validate_mode(page_size, config.margin_points)?;

    let total = images.len();
    let paths: Vec<PathBuf> = images.iter().map(|p| p.as_ref().to_path_buf()).collect();
    info!("Composing {} images into a PDF ({:?})", total, page_size);

    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_start(total);
    }

    // ── Step 1: Probe dimensions ─────────────────────────────────────────
    let mut diagnostics = Vec::new();
    let mut sources = Vec::with_capacity(total);
    for (idx, probed) in probe::probe_all(paths.clone(), config.concurrency).await {
        match probed {
            Ok(source) => sources.push(source),
            Err(e) => {
                warn!("Skipping image {} ('{}'): {}", idx, paths[idx].display(), e);
                if let Some(ref cb) = config.progress_callback {
                    cb.on_item_error(idx + 1, total, &e.to_string());
                }
                diagnostics.push(ImageError::Unreadable {
                    index: idx,
                    path: paths[idx].clone(),
                    detail: error_detail(e),
                });
            }
        }
    }

    // ── Step 2: Encode and lay out pages ─────────────────────────────────
    let margin = config.margin_points;
    let progress = config.progress_callback.clone();
    let built = tokio::task::spawn_blocking(move || {
        build_document(sources, page_size, margin, progress, total)
    })
    .await
    .map_err(|e| RelayError::Internal(format!("Compose task panicked: {}", e)))?;

    diagnostics.extend(built.errors);
    diagnostics.sort_by_key(ImageError::index);

    let bytes = match built.bytes {
        Some(bytes) => bytes?,
        None => {
            let first = diagnostics
                .first()
                .map(|d| d.to_string())
                .unwrap_or_else(|| "Unknown error".to_string());
            return Err(RelayError::conversion_failed(format!(
                "all {total} images failed; first error: {first}"
            )));
        }
    };

    // ── Step 3: Store ────────────────────────────────────────────────────
    let id = config.namer.next_id();
    let path = storage::artifact_path(&config.output_dir, ArtifactKind::ComposedPdf, &id);
    storage::write_artifact(&path, &bytes).await?;

    let page_count = built.pages.len();
    let skipped = total - page_count;
    let duration_ms = start.elapsed().as_millis() as u64;
    info!(
        "Composed {}/{} pages → {} ({}ms)",
        page_count,
        total,
        path.display(),
        duration_ms
    );

    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_complete(total, page_count);
    }

    Ok(ComposeOutput {
        artifact: Artifact::new(path, &config.output_dir, config.public_base_url.as_deref()),
        page_count,
        skipped,
        pages: built.pages,
        diagnostics,
        duration_ms,
    })
}

struct BuiltDocument {
    /// `None` when no page could be added.
    bytes: Option<Result<Vec<u8>, RelayError>>,
    pages: Vec<ComposedPage>,
    errors: Vec<ImageError>,
}

/// Embed every probed image in sequence order. Runs on the blocking pool.
fn build_document(
    sources: Vec<SourceImage>,
    page_size: PageSizeMode,
    margin: f64,
    progress: Option<ProgressCallback>,
    total: usize,
) -> BuiltDocument {
    let mut composer = PdfComposer::new();
    let mut pages = Vec::with_capacity(sources.len());
    let mut errors = Vec::new();

    for source in sources {
        let idx = source.sequence_index;
        let placed = PageLayout::for_mode(page_size, margin, source.width, source.height)
            .and_then(|layout| {
                encode::load_embedded_image(&source.path).map(|image| (image, layout))
            });

        match placed {
            Ok((image, layout)) => {
                composer.add_image_page(&image, &layout);
                debug!(
                    "Page {} ← image {} at scale {:.4}",
                    composer.page_count(),
                    idx,
                    layout.scale
                );
                if let Some(ref cb) = progress {
                    cb.on_item_complete(idx + 1, total);
                }
                pages.push(ComposedPage {
                    sequence_index: idx,
                    source: source.path,
                    layout,
                });
            }
            Err(e) => {
                warn!("Skipping image {} ('{}'): {}", idx, source.path.display(), e);
                if let Some(ref cb) = progress {
                    cb.on_item_error(idx + 1, total, &e.to_string());
                }
                errors.push(ImageError::EncodeFailed {
                    index: idx,
                    path: source.path,
                    detail: error_detail(e),
                });
            }
        }
    }

    let bytes = (composer.page_count() > 0).then(|| composer.finish());
    BuiltDocument {
        bytes,
        pages,
        errors,
    }
}

/// The message of an image error without the path, which the diagnostic
/// already carries.
fn error_detail(e: RelayError) -> String {
    match e {
        RelayError::UnreadableImage { detail, .. } => detail,
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn build_document_skips_unreadable_sources() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.png");
        RgbImage::from_pixel(8, 4, Rgb([0, 0, 0])).save(&good).unwrap();
        let bad = dir.path().join("bad.png");
        std::fs::write(&bad, b"junk").unwrap();

        let sources = vec![
            SourceImage {
                path: good.clone(),
                width: 8,
                height: 4,
                sequence_index: 0,
            },
            SourceImage {
                path: bad,
                width: 8,
                height: 4,
                sequence_index: 1,
            },
        ];
        let built = build_document(sources, PageSizeMode::default(), 40.0, None, 2);
        assert!(matches!(built.bytes, Some(Ok(_))));
        assert_eq!(built.pages.len(), 1);
        assert_eq!(built.pages[0].source, good);
        assert_eq!(built.errors.len(), 1);
        assert_eq!(built.errors[0].index(), 1);
    }

    #[test]
    fn build_document_with_nothing_embeddable_has_no_bytes() {
        let built = build_document(Vec::new(), PageSizeMode::Auto, 0.0, None, 0);
        assert!(built.bytes.is_none());
    }

    #[test]
    fn error_detail_strips_path() {
        let e = RelayError::UnreadableImage {
            path: PathBuf::from("/a/b.png"),
            detail: "bad header".into(),
        };
        assert_eq!(error_detail(e), "bad header");
    }
}
