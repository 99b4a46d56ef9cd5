//! Stitch planning: page ordering and vertical offsets for the Stitcher.
//!
//! Rasterisers name their outputs `page-1.png`, `page-2.png`, …,
//! `page-10.png`. Sorting those names as strings puts `page-10` before
//! `page-2`, so the page number is parsed out of the file stem and compared
//! as an integer.

use crate::error::RelayError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

static RE_TRAILING_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+)\D*$").unwrap());

/// Extract the page number embedded in a file name: the last run of digits
/// in the file stem (`page-10.png` → 10, `scan_007.jpg` → 7).
pub fn page_index(path: &Path) -> Option<u32> {
    page_digits(path)?.parse().ok()
}

fn page_digits(path: &Path) -> Option<&str> {
    let stem = path.file_stem()?.to_str()?;
    let caps = RE_TRAILING_NUMBER.captures(stem)?;
    caps.get(1).map(|m| m.as_str())
}

/// Order page files numerically by their embedded page number.
///
/// Fails with [`RelayError::InvalidInput`] when a file has no page number or
/// two files carry the same number.
pub fn order_pages<P: AsRef<Path>>(pages: &[P]) -> Result<Vec<(u32, PathBuf)>, RelayError> {
    let mut seen: HashMap<u32, &Path> = HashMap::with_capacity(pages.len());
    let mut ordered = Vec::with_capacity(pages.len());

    for page in pages {
        let path = page.as_ref();
        let index = match (page_index(path), page_digits(path)) {
            (Some(index), _) => index,
            (None, Some(digits)) => {
                return Err(RelayError::invalid_input(format!(
                    "page number {digits} in '{}' is out of range",
                    path.display()
                )));
            }
            (None, None) => {
                return Err(RelayError::invalid_input(format!(
                    "'{}' has no page number in its file name",
                    path.display()
                )));
            }
        };
        if let Some(previous) = seen.insert(index, path) {
            return Err(RelayError::invalid_input(format!(
                "page {index} appears twice ('{}' and '{}')",
                previous.display(),
                path.display()
            )));
        }
        ordered.push((index, path.to_path_buf()));
    }

    ordered.sort_by_key(|(index, _)| *index);
    Ok(ordered)
}

/// Canvas size and per-page vertical offsets of a stitched image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StitchPlan {
    pub canvas_width: u32,
    pub canvas_height: u32,
    /// `offsets[i]` is the sum of the heights of pages `0..i`.
    pub offsets: Vec<u32>,
}

impl StitchPlan {
    /// Plan a gap-free vertical stack of pages given their `(width, height)`
    /// in stitch order.
    ///
    /// Every page must have the width of the first page; the canvas height
    /// must fit in a `u32`.
    pub fn from_dimensions(dims: &[(u32, u32)]) -> Result<Self, RelayError> {
        let (canvas_width, _) = *dims
            .first()
            .ok_or_else(|| RelayError::invalid_input("no pages to stitch"))?;

        let mut offsets = Vec::with_capacity(dims.len());
        let mut cursor: u32 = 0;
        for (i, &(width, height)) in dims.iter().enumerate() {
            if width != canvas_width {
                return Err(RelayError::invalid_input(format!(
                    "page {} is {width}px wide but page 1 is {canvas_width}px; \
                     all pages must share one width",
                    i + 1
                )));
            }
            offsets.push(cursor);
            cursor = cursor.checked_add(height).ok_or_else(|| {
                RelayError::invalid_input("stitched image would exceed the maximum height")
            })?;
        }

        Ok(Self {
            canvas_width,
            canvas_height: cursor,
            offsets,
        })
    }

    /// Number of pages in the plan.
    pub fn page_count(&self) -> usize {
        self.offsets.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_index_parses_trailing_number() {
        assert_eq!(page_index(Path::new("page-1.png")), Some(1));
        assert_eq!(page_index(Path::new("/tmp/x/page-10.png")), Some(10));
        assert_eq!(page_index(Path::new("scan_007.jpg")), Some(7));
        assert_eq!(page_index(Path::new("page-03-final.png")), Some(3));
        assert_eq!(page_index(Path::new("cover.png")), None);
    }

    #[test]
    fn ordering_is_numeric_not_lexicographic() {
        let ordered = order_pages(&["page-2.png", "page-10.png", "page-1.png"]).unwrap();
        let names: Vec<String> = ordered
            .iter()
            .map(|(_, p)| p.display().to_string())
            .collect();
        assert_eq!(names, vec!["page-1.png", "page-2.png", "page-10.png"]);
    }

    #[test]
    fn ordering_rejects_missing_and_duplicate_numbers() {
        assert!(matches!(
            order_pages(&["page-1.png", "cover.png"]).unwrap_err(),
            RelayError::InvalidInput { .. }
        ));
        assert!(matches!(
            order_pages(&["page-1.png", "page-01.png"]).unwrap_err(),
            RelayError::InvalidInput { .. }
        ));
    }

    #[test]
    fn oversized_page_number_is_out_of_range() {
        let err = order_pages(&["page-1.png", "page-99999999999.png"]).unwrap_err();
        assert!(matches!(err, RelayError::InvalidInput { .. }));
        assert!(err.to_string().contains("out of range"), "{err}");
        assert!(!err.to_string().contains("no page number"));
    }

    #[test]
    fn plan_offsets_are_cumulative_heights() {
        let heights = [100u32, 250, 75, 300];
        let dims: Vec<(u32, u32)> = heights.iter().map(|&h| (50, h)).collect();
        let plan = StitchPlan::from_dimensions(&dims).unwrap();

        assert_eq!(plan.canvas_width, 50);
        assert_eq!(plan.canvas_height, heights.iter().sum::<u32>());
        assert_eq!(plan.offsets, vec![0, 100, 350, 425]);
        for i in 0..heights.len() - 1 {
            assert_eq!(plan.offsets[i + 1] - plan.offsets[i], heights[i]);
        }
        for (i, &h) in heights.iter().enumerate() {
            assert!(plan.offsets[i] + h <= plan.canvas_height);
        }
        assert_eq!(plan.page_count(), 4);
    }

    #[test]
    fn plan_rejects_mismatched_widths() {
        let err = StitchPlan::from_dimensions(&[(50, 10), (51, 10)]).unwrap_err();
        assert!(err.to_string().contains("page 2"));
    }

    #[test]
    fn plan_rejects_empty_and_overflow() {
        assert!(StitchPlan::from_dimensions(&[]).is_err());
        assert!(StitchPlan::from_dimensions(&[(1, u32::MAX), (1, 1)]).is_err());
    }
}
