//! Page-image stitching: a stack of equal-width page images → one tall PNG.
//!
//! Unlike composition, stitching is all-or-nothing. A tall image with a
//! missing page in the middle silently misrepresents the document, so any
//! page that cannot be read aborts the whole stitch.

use crate::config::RelayConfig;
use crate::error::RelayError;
use crate::output::{Artifact, StitchOutput};
use crate::pipeline::plan::{self, StitchPlan};
use crate::pipeline::storage::{self, ArtifactKind};
use crate::pipeline::{input, probe, render};
use crate::progress::ProgressCallback;
use image::{imageops, DynamicImage, ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Stitch page images vertically into one PNG.
///
/// Pages are ordered by the number in their file name (`page-2.png` before
/// `page-10.png`), placed top to bottom without gaps or scaling on an opaque
/// white canvas, and the result is written to
/// `<output_dir>/pdf-images/long_pdf_<id>.png`. The page files themselves are
/// left in place.
///
/// # Errors
/// - [`RelayError::InvalidInput`] for an empty list, a file name without a
///   page number, a duplicated page number, or pages of different widths
/// - [`RelayError::ConversionFailed`] when any page cannot be read
/// - [`RelayError::StorageFailure`] when the PNG could not be written
pub async fn stitch_pages_to_image<P: AsRef<Path>>(
    pages: &[P],
    config: &RelayConfig,
) -> Result<StitchOutput, RelayError> {
    if pages.is_empty() {
        return Err(RelayError::invalid_input("no pages to stitch"));
    }
    let ordered = plan::order_pages(pages)?;
    stitch_ordered(ordered, config).await
}

/// Stitch pages whose order is already known, as `(page number, path)`
/// sorted by page number.
async fn stitch_ordered(
    ordered: Vec<(u32, PathBuf)>,
    config: &RelayConfig,
) -> Result<StitchOutput, RelayError> {
    let start = Instant::now();
    let total = ordered.len();
    info!("Stitching {} pages", total);

    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_start(total);
    }

    let progress = config.progress_callback.clone();
    let (png, plan) = tokio::task::spawn_blocking(move || render_long_image(&ordered, progress))
        .await
        .map_err(|e| RelayError::Internal(format!("Stitch task panicked: {}", e)))??;

    let id = config.namer.next_id();
    let path = storage::artifact_path(&config.output_dir, ArtifactKind::LongImage, &id);
    storage::write_artifact(&path, &png).await?;

    let duration_ms = start.elapsed().as_millis() as u64;
    info!(
        "Stitched {} pages → {} ({}x{} px, {}ms)",
        total,
        path.display(),
        plan.canvas_width,
        plan.canvas_height,
        duration_ms
    );

    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_complete(total, total);
    }

    Ok(StitchOutput {
        artifact: Artifact::new(path, &config.output_dir, config.public_base_url.as_deref()),
        page_count: plan.page_count(),
        plan,
        duration_ms,
    })
}

/// Rasterise a PDF (path or URL) and stitch its pages into one tall PNG.
///
/// Pages are rendered at `config.resolution` into a temporary folder that is
/// removed before returning. They are stacked in the page order reported by
/// the rasteriser, whatever it names its files.
pub async fn stitch_pdf_to_image(
    input_str: impl AsRef<str>,
    config: &RelayConfig,
) -> Result<StitchOutput, RelayError> {
    let input_str = input_str.as_ref();
    info!("Stitching PDF: {}", input_str);

    let resolved = input::resolve_input(input_str, config.download_timeout_secs).await?;

    let scratch = tempfile::Builder::new()
        .prefix("docrelay-pages-")
        .tempdir()
        .map_err(|e| RelayError::Internal(format!("tempdir: {e}")))?;

    let rendered = render::rasterize_pdf(
        config.rasterizer.clone(),
        resolved.path(),
        config.resolution,
        scratch.path(),
    )
    .await?;
    debug!("Rasterised {} pages into {}", rendered.len(), scratch.path().display());

    let ordered: Vec<(u32, PathBuf)> = rendered
        .into_iter()
        .map(|p| (p.page_index, p.image_path))
        .collect();
    let result = stitch_ordered(ordered, config).await;

    if let Err(e) = scratch.close() {
        warn!("Failed to remove temporary page folder: {}", e);
    }
    result
}

/// Decode, place and PNG-encode every page. Runs on the blocking pool.
fn render_long_image(
    ordered: &[(u32, PathBuf)],
    progress: Option<ProgressCallback>,
) -> Result<(Vec<u8>, StitchPlan), RelayError> {
    let total = ordered.len();

    // Probe every page before decoding any so width mismatches fail fast.
    let mut dims = Vec::with_capacity(total);
    for (item, (index, path)) in ordered.iter().enumerate() {
        let d = probe::probe(path)
            .map_err(|e| page_failure(item + 1, *index, e, &progress, total))?;
        dims.push(d);
    }
    let plan = StitchPlan::from_dimensions(&dims)?;

    let mut canvas = RgbaImage::from_pixel(
        plan.canvas_width,
        plan.canvas_height,
        Rgba([255, 255, 255, 255]),
    );

    for (item, ((index, path), &offset)) in ordered.iter().zip(&plan.offsets).enumerate() {
        let page = probe::decode(path)
            .map_err(|e| page_failure(item + 1, *index, e, &progress, total))?
            .to_rgba8();

        imageops::overlay(&mut canvas, &page, 0, offset as i64);
        debug!("Placed page {} at y={}", index, offset);

        if let Some(ref cb) = progress {
            cb.on_item_complete(item + 1, total);
        }
    }

    let mut buf = Vec::new();
    DynamicImage::ImageRgba8(canvas)
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .map_err(|e| RelayError::conversion_failed(format!("PNG encoding failed: {}", e)))?;

    Ok((buf, plan))
}

/// Report a failed page as item `item` of `total` and turn it into the
/// stitch-aborting error, which names the page number.
fn page_failure(
    item: usize,
    index: u32,
    err: RelayError,
    progress: &Option<ProgressCallback>,
    total: usize,
) -> RelayError {
    if let Some(cb) = progress {
        cb.on_item_error(item, total, &err.to_string());
    }
    RelayError::conversion_failed(format!("page {index} could not be read: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use image::RgbImage;

    #[test]
    fn long_image_stacks_pages_top_to_bottom() {
        let dir = tempfile::tempdir().unwrap();
        let colours = [[255, 0, 0], [0, 255, 0], [0, 0, 255]];
        let mut ordered = Vec::new();
        for (i, c) in colours.iter().enumerate() {
            let p = dir.path().join(format!("page-{}.png", i + 1));
            RgbImage::from_pixel(6, 2 + i as u32, Rgb(*c)).save(&p).unwrap();
            ordered.push((i as u32 + 1, p));
        }

        let (png, plan) = render_long_image(&ordered, None).unwrap();
        assert_eq!(plan.offsets, vec![0, 2, 5]);

        let img = image::load_from_memory(&png).unwrap().to_rgba8();
        assert_eq!(img.dimensions(), (6, 9));
        assert_eq!(img.get_pixel(0, 0).0, [255, 0, 0, 255]);
        assert_eq!(img.get_pixel(5, 2).0, [0, 255, 0, 255]);
        assert_eq!(img.get_pixel(3, 8).0, [0, 0, 255, 255]);
    }

    #[test]
    fn unreadable_page_aborts() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("page-1.png");
        RgbImage::from_pixel(4, 4, Rgb([0, 0, 0])).save(&good).unwrap();
        let bad = dir.path().join("page-2.png");
        std::fs::write(&bad, b"junk").unwrap();

        let err = render_long_image(&[(1, good), (2, bad)], None).unwrap_err();
        assert!(matches!(err, RelayError::ConversionFailed { .. }));
        assert!(err.to_string().contains("page 2"));
    }
}
