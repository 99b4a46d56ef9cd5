//! Image metadata reader: `(width, height)` of a raster file without decoding
//! its pixels.
//!
//! Probing is I/O-bound and every image is independent, so [`probe_all`]
//! runs the probes on the blocking pool with bounded concurrency. Results
//! come back in completion order and are re-sorted by `sequence_index`
//! before returning; completion order never leaks into page order.

use crate::error::RelayError;
use futures::stream::{self, StreamExt};
use image::{DynamicImage, ImageReader};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::debug;

/// One input raster with known pixel dimensions and sequence position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceImage {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub sequence_index: usize,
}

fn unreadable(path: &Path, detail: impl ToString) -> RelayError {
    RelayError::UnreadableImage {
        path: path.to_path_buf(),
        detail: detail.to_string(),
    }
}

/// Open `path` with the format taken from its leading bytes. The extension
/// is only a fallback: uploads often have none, and some are mislabelled.
fn reader(path: &Path) -> Result<ImageReader<BufReader<File>>, RelayError> {
    ImageReader::open(path)
        .and_then(|r| r.with_guessed_format())
        .map_err(|e| unreadable(path, e))
}

/// Read the pixel dimensions of a raster image.
///
/// Fails with [`RelayError::UnreadableImage`] if the file is missing, is not
/// a decodable raster format, or reports a zero dimension.
pub fn probe(path: &Path) -> Result<(u32, u32), RelayError> {
    let (width, height) = reader(path)?
        .into_dimensions()
        .map_err(|e| unreadable(path, e))?;

    if width == 0 || height == 0 {
        return Err(RelayError::UnreadableImage {
            path: path.to_path_buf(),
            detail: format!("image reports zero dimension ({width}x{height})"),
        });
    }

    debug!("Probed {} → {}x{} px", path.display(), width, height);
    Ok((width, height))
}

/// Decode a raster image in full, detecting the format the same way as
/// [`probe`].
pub fn decode(path: &Path) -> Result<DynamicImage, RelayError> {
    reader(path)?.decode().map_err(|e| unreadable(path, e))
}

/// Probe every path concurrently.
///
/// Returns one entry per input, sorted by sequence index (the position in
/// `paths`), each either the probed [`SourceImage`] or the probe error.
pub async fn probe_all(
    paths: Vec<PathBuf>,
    concurrency: usize,
) -> Vec<(usize, Result<SourceImage, RelayError>)> {
    let mut results: Vec<(usize, Result<SourceImage, RelayError>)> =
        stream::iter(paths.into_iter().enumerate().map(|(idx, path)| async move {
            let probed = tokio::task::spawn_blocking(move || {
                probe(&path).map(|(width, height)| SourceImage {
                    path,
                    width,
                    height,
                    sequence_index: idx,
                })
            })
            .await
            .map_err(|e| RelayError::Internal(format!("Probe task panicked: {}", e)))
            .and_then(|r| r);
            (idx, probed)
        }))
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;

    results.sort_by_key(|(idx, _)| *idx);
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn probe_reads_png_dimensions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.png");
        RgbImage::from_pixel(7, 3, Rgb([1, 2, 3])).save(&path).unwrap();
        assert_eq!(probe(&path).unwrap(), (7, 3));
    }

    #[test]
    fn probe_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.png");
        std::fs::write(&path, b"definitely not an image").unwrap();
        let err = probe(&path).unwrap_err();
        assert!(matches!(err, RelayError::UnreadableImage { .. }));
    }

    #[test]
    fn format_comes_from_content_not_extension() {
        let dir = tempfile::tempdir().unwrap();
        let bare = dir.path().join("3f9a1c0e7b");
        RgbImage::from_pixel(9, 4, Rgb([1, 2, 3]))
            .save_with_format(&bare, image::ImageFormat::Png)
            .unwrap();
        assert_eq!(probe(&bare).unwrap(), (9, 4));

        let mislabelled = dir.path().join("photo.png");
        RgbImage::from_pixel(12, 5, Rgb([200, 100, 50]))
            .save_with_format(&mislabelled, image::ImageFormat::Jpeg)
            .unwrap();
        assert_eq!(probe(&mislabelled).unwrap(), (12, 5));
        assert_eq!(decode(&mislabelled).unwrap().width(), 12);
    }

    #[test]
    fn probe_rejects_missing_file() {
        let err = probe(Path::new("/no/such/image.png")).unwrap_err();
        assert!(matches!(err, RelayError::UnreadableImage { .. }));
    }

    #[tokio::test]
    async fn probe_all_keeps_sequence_order() {
        let dir = tempfile::tempdir().unwrap();
        let mut paths = Vec::new();
        for (i, w) in [30u32, 10, 20, 40].iter().enumerate() {
            let p = dir.path().join(format!("img{i}.png"));
            RgbImage::from_pixel(*w, 5, Rgb([0, 0, 0])).save(&p).unwrap();
            paths.push(p);
        }
        paths.insert(2, dir.path().join("missing.png"));

        let results = probe_all(paths, 3).await;
        let indices: Vec<usize> = results.iter().map(|(i, _)| *i).collect();
        assert_eq!(indices, vec![0, 1, 2, 3, 4]);

        let widths: Vec<Option<u32>> = results
            .iter()
            .map(|(_, r)| r.as_ref().ok().map(|s| s.width))
            .collect();
        assert_eq!(widths, vec![Some(30), Some(10), None, Some(20), Some(40)]);
        assert_eq!(results[4].1.as_ref().unwrap().sequence_index, 4);
    }
}
