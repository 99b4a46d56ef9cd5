//! Single-document conversions built on the Composer and the rasteriser.

use crate::compose::compose_images_to_pdf;
use crate::config::{PageSizeMode, RelayConfig};
use crate::error::RelayError;
use crate::output::{ComposeOutput, RasterOutput};
use crate::pipeline::storage::{self, ArtifactKind};
use crate::pipeline::{input, render};
use std::path::Path;
use tracing::{info, warn};

/// Convert one image into a single-page PDF whose page is exactly the size
/// of the image (1 px = 1 pt, no margin).
///
/// A single unreadable image means nothing can be embedded, so this fails
/// with [`RelayError::ConversionFailed`] rather than returning a skip.
pub async fn convert_image_to_pdf(
    image: impl AsRef<Path>,
    config: &RelayConfig,
) -> Result<ComposeOutput, RelayError> {
    compose_images_to_pdf(&[image.as_ref()], PageSizeMode::Auto, config).await
}

/// Rasterise every page of a PDF (path or URL) into
/// `<output_dir>/pdf-images/pdf_<id>/page-<n>.png`.
///
/// All-or-nothing: if any page fails, the folder is removed and the error
/// is returned. Progress events are emitted once every page is on disk.
pub async fn rasterize_pdf_to_images(
    input_str: impl AsRef<str>,
    config: &RelayConfig,
) -> Result<RasterOutput, RelayError> {
    let input_str = input_str.as_ref();
    info!("Rasterising PDF: {}", input_str);

    let resolved = input::resolve_input(input_str, config.download_timeout_secs).await?;

    let id = config.namer.next_id();
    let folder = storage::artifact_path(&config.output_dir, ArtifactKind::PageImages, &id);

    let rendered = render::rasterize_pdf(
        config.rasterizer.clone(),
        resolved.path(),
        config.resolution,
        &folder,
    )
    .await;

    let mut pages = match rendered {
        Ok(pages) => pages,
        Err(e) => {
            if folder.exists() {
                if let Err(rm) = tokio::fs::remove_dir_all(&folder).await {
                    warn!("Failed to remove partial output {}: {}", folder.display(), rm);
                }
            }
            return Err(e);
        }
    };

    let base = config.public_base_url.as_deref();
    for page in &mut pages {
        page.url = base.and_then(|b| storage::public_url(b, &config.output_dir, &page.image_path));
    }
    let folder_url = base.and_then(|b| storage::public_url(b, &config.output_dir, &folder));

    let total = pages.len();
    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_start(total);
        for item in 1..=total {
            cb.on_item_complete(item, total);
        }
        cb.on_conversion_complete(total, total);
    }

    info!("Rasterised {} pages → {}", total, folder.display());

    Ok(RasterOutput {
        page_count: total,
        folder,
        folder_url,
        pages,
    })
}
