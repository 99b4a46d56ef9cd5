//! Artifact storage: output layout, atomic writes and public URLs.
//!
//! Layout under `output_dir`:
//!
//! ```text
//! document/pdf/pdf_<id>.pdf        composed PDFs
//! pdf-images/long_pdf_<id>.png     stitched long images
//! pdf-images/pdf_<id>/page-<n>.png rasterised pages
//! ```

use crate::error::RelayError;
use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};

/// What kind of artifact is being stored; decides folder and file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    ComposedPdf,
    LongImage,
    /// A folder of per-page images.
    PageImages,
}

impl ArtifactKind {
    /// Path of the artifact relative to the output root.
    pub fn relative_path(self, id: &str) -> PathBuf {
        match self {
            ArtifactKind::ComposedPdf => Path::new("document")
                .join("pdf")
                .join(format!("pdf_{id}.pdf")),
            ArtifactKind::LongImage => Path::new("pdf-images").join(format!("long_pdf_{id}.png")),
            ArtifactKind::PageImages => Path::new("pdf-images").join(format!("pdf_{id}")),
        }
    }
}

/// Absolute location of an artifact.
pub fn artifact_path(output_dir: &Path, kind: ArtifactKind, id: &str) -> PathBuf {
    output_dir.join(kind.relative_path(id))
}

/// Write `bytes` to `path` atomically: parent folders are created, the data
/// goes to `<path>.tmp` and is renamed into place, so readers never observe
/// a partial artifact.
pub async fn write_artifact(path: &Path, bytes: &[u8]) -> Result<(), RelayError> {
    let storage_err = |source| RelayError::StorageFailure {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(storage_err)?;
    }

    let mut tmp: OsString = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp_path = PathBuf::from(tmp);

    if let Err(e) = tokio::fs::write(&tmp_path, bytes).await {
        discard_partial(&tmp_path).await;
        return Err(storage_err(e));
    }
    if let Err(e) = tokio::fs::rename(&tmp_path, path).await {
        discard_partial(&tmp_path).await;
        return Err(storage_err(e));
    }

    debug!("Wrote {} bytes → {}", bytes.len(), path.display());
    Ok(())
}

/// Remove a half-written temp file. A file that was never created is fine.
async fn discard_partial(tmp_path: &Path) {
    match tokio::fs::remove_file(tmp_path).await {
        Ok(()) => debug!("Removed partial file {}", tmp_path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to remove partial file {}: {}", tmp_path.display(), e),
    }
}

/// Public URL of `path` when `output_dir` is served at `base`.
///
/// Returns `None` when `path` is not inside `output_dir`.
pub fn public_url(base: &str, output_dir: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(output_dir).ok()?;
    let mut segments = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(seg) => segments.push(seg.to_str()?.to_string()),
            Component::CurDir => {}
            _ => return None,
        }
    }
    Some(format!("{}/{}", base.trim_end_matches('/'), segments.join("/")))
}
