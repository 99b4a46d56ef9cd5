//! Error types for the docrelay library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`RelayError`]: **Fatal**: no artifact can be produced (empty input,
//!   every image unreadable, a stitched page missing, the output could not
//!   be written). Returned as `Err(RelayError)` from the top-level functions.
//!
//! * [`ImageError`]: **Non-fatal**: one image of a composition batch was
//!   skipped while the others still became pages. Stored in
//!   [`crate::output::ComposeOutput::diagnostics`] so callers can see exactly
//!   what was dropped.
//!
//! Only the Composer produces [`ImageError`]s. The Stitcher escalates any
//! page failure to [`RelayError::ConversionFailed`] because a tall image
//! with a hole in it has no meaningful representation.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the docrelay library.
#[derive(Debug, Error)]
pub enum RelayError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The input set is empty or malformed (no images, duplicate page
    /// numbers, mismatched page widths, …).
    #[error("Invalid input: {reason}")]
    InvalidInput { reason: String },

    /// A single source image could not be probed or decoded.
    #[error("Unreadable image '{path}': {detail}")]
    UnreadableImage { path: PathBuf, detail: String },

    /// Input file was not found at the given path.
    #[error("File not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{path}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { path: PathBuf },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    /// pdfium-render returned an error for a specific page.
    #[error("Rasterisation failed for page {page}: {detail}")]
    RasterisationFailed { page: usize, detail: String },

    // ── Conversion errors ─────────────────────────────────────────────────
    /// No artifact could be produced.
    #[error("Conversion failed: {reason}")]
    ConversionFailed { reason: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// The artifact could not be written to durable storage.
    #[error("Failed to write artifact '{path}': {source}")]
    StorageFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium (file or directory) or install\n\
libpdfium where the system loader can find it.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl RelayError {
    pub(crate) fn invalid_input(reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            reason: reason.into(),
        }
    }

    pub(crate) fn conversion_failed(reason: impl Into<String>) -> Self {
        Self::ConversionFailed {
            reason: reason.into(),
        }
    }
}

/// A non-fatal error for a single image of a composition batch.
///
/// The image is left out of the document; the remaining images still
/// produce their pages.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum ImageError {
    /// Dimensions could not be read (missing file, unknown format, zero size).
    #[error("Image {index} ('{path}'): unreadable: {detail}")]
    Unreadable {
        index: usize,
        path: PathBuf,
        detail: String,
    },

    /// Header was fine but decoding or embedding the pixels failed.
    #[error("Image {index} ('{path}'): could not be embedded: {detail}")]
    EncodeFailed {
        index: usize,
        path: PathBuf,
        detail: String,
    },
}

impl ImageError {
    /// Sequence index of the skipped image.
    pub fn index(&self) -> usize {
        match self {
            ImageError::Unreadable { index, .. } | ImageError::EncodeFailed { index, .. } => *index,
        }
    }
}
