//! Configuration types for the composition pipelines.
//!
//! Everything a pipeline invocation needs besides its inputs lives in
//! [`RelayConfig`]: where artifacts go, how wide the margins are, which
//! resolution PDFs are rasterised at, and the injected collaborators
//! (identifier generator, rasteriser, progress callback). Nothing is read
//! from process-wide state, so two calls with different configs never
//! interfere.

use crate::error::RelayError;
use crate::naming::{ArtifactNamer, UuidNamer};
use crate::pipeline::render::{PdfiumRasterizer, Rasterizer};
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

/// Lowest accepted rasterisation resolution.
pub const MIN_RESOLUTION: u32 = 72;
/// Highest accepted rasterisation resolution.
pub const MAX_RESOLUTION: u32 = 600;

/// Configuration shared by every pipeline.
///
/// Built via [`RelayConfig::builder()`] or using [`RelayConfig::default()`].
///
/// # Example
/// ```rust
/// use docrelay::RelayConfig;
///
/// let config = RelayConfig::builder()
///     .output_dir("/srv/relay")
///     .margin_points(36.0)
///     .resolution(200)
///     .build()
///     .unwrap();
/// assert_eq!(config.resolution, 200);
/// ```
#[derive(Clone)]
pub struct RelayConfig {
    /// Root folder for every artifact. Default: `./output`.
    pub output_dir: PathBuf,

    /// Uniform margin, in PDF points, around images on fixed-size pages.
    /// Default: 40.
    pub margin_points: f64,

    /// Resolution (DPI) used when rasterising PDF pages. Range: 72–600.
    /// Default: 300.
    pub resolution: u32,

    /// Maximum number of images probed at the same time. Default: 8.
    pub concurrency: usize,

    /// Base URL under which `output_dir` is served, e.g.
    /// `http://192.168.0.106:3000`. When set, outputs carry artifact URLs.
    pub public_base_url: Option<String>,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Identifier generator for artifact names. Default: [`UuidNamer`].
    pub namer: Arc<dyn ArtifactNamer>,

    /// PDF rasteriser. Default: [`PdfiumRasterizer`].
    pub rasterizer: Arc<dyn Rasterizer>,

    /// Optional per-item progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("output"),
            margin_points: 40.0,
            resolution: 300,
            concurrency: 8,
            public_base_url: None,
            password: None,
            download_timeout_secs: 120,
            namer: Arc::new(UuidNamer),
            rasterizer: Arc::new(PdfiumRasterizer::default()),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for RelayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelayConfig")
            .field("output_dir", &self.output_dir)
            .field("margin_points", &self.margin_points)
            .field("resolution", &self.resolution)
            .field("concurrency", &self.concurrency)
            .field("public_base_url", &self.public_base_url)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("download_timeout_secs", &self.download_timeout_secs)
            .field("namer", &"<dyn ArtifactNamer>")
            .field("rasterizer", &"<dyn Rasterizer>")
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ConversionProgressCallback>"),
            )
            .finish()
    }
}

impl RelayConfig {
    /// Create a new builder for `RelayConfig`.
    pub fn builder() -> RelayConfigBuilder {
        RelayConfigBuilder {
            config: Self::default(),
            custom_rasterizer: false,
        }
    }
}

/// Builder for [`RelayConfig`].
pub struct RelayConfigBuilder {
    config: RelayConfig,
    custom_rasterizer: bool,
}

impl fmt::Debug for RelayConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelayConfigBuilder")
            .field("config", &self.config)
            .field("custom_rasterizer", &self.custom_rasterizer)
            .finish()
    }
}

impl RelayConfigBuilder {
    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    pub fn margin_points(mut self, margin: f64) -> Self {
        self.config.margin_points = margin;
        self
    }

    pub fn resolution(mut self, dpi: u32) -> Self {
        self.config.resolution = dpi.clamp(MIN_RESOLUTION, MAX_RESOLUTION);
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn public_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.public_base_url = Some(url.into());
        self
    }

    /// Password for encrypted PDFs. Applied to the default pdfium
    /// rasteriser; a rasteriser set through [`Self::rasterizer`] is used as-is.
    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn namer(mut self, namer: Arc<dyn ArtifactNamer>) -> Self {
        self.config.namer = namer;
        self
    }

    pub fn rasterizer(mut self, rasterizer: Arc<dyn Rasterizer>) -> Self {
        self.config.rasterizer = rasterizer;
        self.custom_rasterizer = true;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(mut self) -> Result<RelayConfig, RelayError> {
        let c = &self.config;
        if !c.margin_points.is_finite() || c.margin_points < 0.0 {
            return Err(RelayError::InvalidConfig(format!(
                "Margin must be a non-negative number of points, got {}",
                c.margin_points
            )));
        }
        if 2.0 * c.margin_points >= PageSize::LETTER.width.min(PageSize::LETTER.height) {
            return Err(RelayError::InvalidConfig(format!(
                "Margin {}pt leaves no content area on a letter page",
                c.margin_points
            )));
        }
        if c.resolution < MIN_RESOLUTION || c.resolution > MAX_RESOLUTION {
            return Err(RelayError::InvalidConfig(format!(
                "Resolution must be {MIN_RESOLUTION}–{MAX_RESOLUTION} DPI, got {}",
                c.resolution
            )));
        }
        if c.concurrency == 0 {
            return Err(RelayError::InvalidConfig(
                "Concurrency must be ≥ 1".into(),
            ));
        }
        if c.output_dir.as_os_str().is_empty() {
            return Err(RelayError::InvalidConfig(
                "Output directory must not be empty".into(),
            ));
        }
        if !self.custom_rasterizer {
            if let Some(pwd) = &self.config.password {
                self.config.rasterizer = Arc::new(PdfiumRasterizer::with_password(pwd.clone()));
            }
        }
        Ok(self.config)
    }
}

// ── Page sizes ───────────────────────────────────────────────────────────

/// A page size in PDF points (1/72 inch).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageSize {
    pub width: f64,
    pub height: f64,
}

impl PageSize {
    /// US Letter, 612 × 792 pt.
    pub const LETTER: PageSize = PageSize {
        width: 612.0,
        height: 792.0,
    };

    /// ISO A4, 595.28 × 841.89 pt.
    pub const A4: PageSize = PageSize {
        width: 595.28,
        height: 841.89,
    };

    pub fn new(width: f64, height: f64) -> Result<Self, RelayError> {
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            return Err(RelayError::InvalidConfig(format!(
                "Page size must be positive, got {width}x{height}"
            )));
        }
        Ok(Self { width, height })
    }
}

/// How the Composer sizes each page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PageSizeMode {
    /// Every page has this size; images are fitted inside the margins and centred.
    Fixed(PageSize),
    /// Every page takes the native pixel size of its image, with no margin.
    Auto,
}

impl Default for PageSizeMode {
    fn default() -> Self {
        PageSizeMode::Fixed(PageSize::LETTER)
    }
}

impl FromStr for PageSizeMode {
    type Err = RelayError;

    /// Accepts `letter`, `a4`, `auto` or `<width>x<height>` in points.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        match s.as_str() {
            "letter" => Ok(PageSizeMode::Fixed(PageSize::LETTER)),
            "a4" => Ok(PageSizeMode::Fixed(PageSize::A4)),
            "auto" => Ok(PageSizeMode::Auto),
            other => {
                let (w, h) = other.split_once('x').ok_or_else(|| {
                    RelayError::InvalidConfig(format!(
                        "Unknown page size '{other}': use letter, a4, auto or WIDTHxHEIGHT"
                    ))
                })?;
                let parse = |v: &str| {
                    v.trim().parse::<f64>().map_err(|_| {
                        RelayError::InvalidConfig(format!("Invalid page dimension '{}'", v.trim()))
                    })
                };
                Ok(PageSizeMode::Fixed(PageSize::new(parse(w)?, parse(h)?)?))
            }
        }
    }
}
