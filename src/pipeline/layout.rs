//! Page geometry for the Composer.
//!
//! Fixed-size pages fit the image inside a uniform margin and centre it:
//!
//! ```text
//! scale  = min((page_w − 2m) / img_w, (page_h − 2m) / img_h)
//! x      = (page_w − img_w·scale) / 2
//! y      = (page_h − img_h·scale) / 2
//! ```
//!
//! The scale may exceed 1: small images grow until one axis touches the
//! margin. Auto-size pages take the native pixel dimensions (1 px = 1 pt)
//! with the image at the origin.

use crate::config::{PageSize, PageSizeMode};
use crate::error::RelayError;
use serde::{Deserialize, Serialize};

/// Where one image lands on its page, in PDF points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageLayout {
    pub page_width: f64,
    pub page_height: f64,
    pub content_x: f64,
    pub content_y: f64,
    pub content_width: f64,
    pub content_height: f64,
    pub scale: f64,
}

impl PageLayout {
    /// Fit an image of `width × height` pixels on a fixed page.
    ///
    /// Fails with [`RelayError::InvalidConfig`] when the margins leave no
    /// content area, and [`RelayError::InvalidInput`] for a zero-sized image.
    pub fn fitted(page: PageSize, margin: f64, width: u32, height: u32) -> Result<Self, RelayError> {
        if width == 0 || height == 0 {
            return Err(RelayError::invalid_input(format!(
                "image has zero dimension ({width}x{height})"
            )));
        }

        let max_width = page.width - 2.0 * margin;
        let max_height = page.height - 2.0 * margin;
        if max_width <= 0.0 || max_height <= 0.0 {
            return Err(RelayError::InvalidConfig(format!(
                "Margin {margin}pt leaves no content area on a {}x{}pt page",
                page.width, page.height
            )));
        }

        let scale = (max_width / width as f64).min(max_height / height as f64);
        let content_width = width as f64 * scale;
        let content_height = height as f64 * scale;

        Ok(Self {
            page_width: page.width,
            page_height: page.height,
            content_x: (page.width - content_width) / 2.0,
            content_y: (page.height - content_height) / 2.0,
            content_width,
            content_height,
            scale,
        })
    }

    /// A page exactly the size of the image.
    pub fn native(width: u32, height: u32) -> Result<Self, RelayError> {
        if width == 0 || height == 0 {
            return Err(RelayError::invalid_input(format!(
                "image has zero dimension ({width}x{height})"
            )));
        }
        Ok(Self {
            page_width: width as f64,
            page_height: height as f64,
            content_x: 0.0,
            content_y: 0.0,
            content_width: width as f64,
            content_height: height as f64,
            scale: 1.0,
        })
    }

    /// Layout for `mode`.
    pub fn for_mode(
        mode: PageSizeMode,
        margin: f64,
        width: u32,
        height: u32,
    ) -> Result<Self, RelayError> {
        match mode {
            PageSizeMode::Fixed(page) => Self::fitted(page, margin, width, height),
            PageSizeMode::Auto => Self::native(width, height),
        }
    }
}

/// Check up front that `mode` leaves room for content, so a bad margin is
/// reported once instead of as a skip for every image.
pub fn validate_mode(mode: PageSizeMode, margin: f64) -> Result<(), RelayError> {
    match mode {
        PageSizeMode::Fixed(page) => PageLayout::fitted(page, margin, 1, 1).map(|_| ()),
        PageSizeMode::Auto => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn letter(w: u32, h: u32) -> PageLayout {
        PageLayout::fitted(PageSize::LETTER, 40.0, w, h).unwrap()
    }

    #[test]
    fn landscape_image_is_width_bound() {
        let l = letter(800, 600);
        assert!((l.scale - 0.665).abs() < EPS);
        assert!((l.content_width - 532.0).abs() < EPS);
        assert!((l.content_height - 399.0).abs() < EPS);
        assert!((l.content_x - 40.0).abs() < EPS);
        assert!((l.content_y - 196.5).abs() < EPS);
    }

    #[test]
    fn small_square_image_is_scaled_up() {
        let l = letter(400, 400);
        assert!((l.scale - 1.33).abs() < EPS);
        assert!((l.content_width - 532.0).abs() < EPS);
    }

    #[test]
    fn wide_strip_image() {
        let l = letter(1200, 300);
        assert!((l.scale - 532.0 / 1200.0).abs() < EPS);
        assert!((l.scale - 0.4433).abs() < 1e-4);
    }

    #[test]
    fn content_stays_inside_margins_and_centred() {
        for (w, h) in [(1, 1), (5000, 10), (10, 5000), (612, 792), (3, 7)] {
            let l = letter(w, h);
            assert!(l.content_width <= 532.0 + EPS, "{w}x{h}");
            assert!(l.content_height <= 712.0 + EPS, "{w}x{h}");
            let right = l.page_width - (l.content_x + l.content_width);
            let top = l.page_height - (l.content_y + l.content_height);
            assert!((right - l.content_x).abs() < EPS, "{w}x{h}");
            assert!((top - l.content_y).abs() < EPS, "{w}x{h}");
        }
    }

    #[test]
    fn native_layout_fills_page() {
        let l = PageLayout::native(640, 480).unwrap();
        assert_eq!(l.page_width, 640.0);
        assert_eq!(l.page_height, 480.0);
        assert_eq!((l.content_x, l.content_y), (0.0, 0.0));
        assert_eq!(l.scale, 1.0);
    }

    #[test]
    fn oversized_margin_is_config_error() {
        let err = PageLayout::fitted(PageSize::LETTER, 400.0, 10, 10).unwrap_err();
        assert!(matches!(err, RelayError::InvalidConfig(_)));
        assert!(validate_mode(PageSizeMode::Fixed(PageSize::LETTER), 400.0).is_err());
        assert!(validate_mode(PageSizeMode::Auto, 400.0).is_ok());
    }

    #[test]
    fn zero_dimension_is_invalid_input() {
        assert!(matches!(
            PageLayout::native(0, 10).unwrap_err(),
            RelayError::InvalidInput { .. }
        ));
    }
}
