//! Result types returned by the pipelines.
//!
//! All of them serialise with serde so the CLI can print them as JSON and
//! callers can hand them to whatever transport they use.

use crate::error::ImageError;
use crate::pipeline::layout::PageLayout;
use crate::pipeline::plan::StitchPlan;
use crate::pipeline::storage;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub use crate::pipeline::render::RasterPage;

/// A file written to the output folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    pub path: PathBuf,
    pub file_name: String,
    /// Public URL, present when a base URL is configured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Artifact {
    pub(crate) fn new(path: PathBuf, output_dir: &Path, base_url: Option<&str>) -> Self {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let url = base_url.and_then(|base| storage::public_url(base, output_dir, &path));
        Self {
            path,
            file_name,
            url,
        }
    }
}

/// One page of a composed PDF.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComposedPage {
    /// Position of the source image in the input list.
    pub sequence_index: usize,
    pub source: PathBuf,
    pub layout: PageLayout,
}

/// Result of composing images into a PDF.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComposeOutput {
    pub artifact: Artifact,
    /// Pages in the document (= images that were embedded).
    pub page_count: usize,
    /// Images left out because they could not be read or embedded.
    pub skipped: usize,
    pub pages: Vec<ComposedPage>,
    pub diagnostics: Vec<ImageError>,
    pub duration_ms: u64,
}

/// Result of stitching pages into one tall image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StitchOutput {
    pub artifact: Artifact,
    pub page_count: usize,
    pub plan: StitchPlan,
    pub duration_ms: u64,
}

/// Result of rasterising a PDF into a folder of page images.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RasterOutput {
    pub folder: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder_url: Option<String>,
    pub pages: Vec<RasterPage>,
    pub page_count: usize,
}
