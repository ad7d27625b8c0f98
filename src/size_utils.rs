//! Paper size classification and A4-equivalent accounting.

use crate::schema::{PageSize, PageSizeMap};

/// Millimeters per PDF point (1 pt = 1/72 inch).
pub const MM_PER_PT: f64 = 0.352778;

/// Upper area bounds (exclusive, in mm²) for the A4, A3 and A2 buckets.
///
/// These are deliberately looser than the ISO sheet areas so that scanned
/// or slightly trimmed pages still land in the intended bucket.
const A4_MAX_AREA_MM2: f64 = 80_000.0;
const A3_MAX_AREA_MM2: f64 = 150_000.0;
const A2_MAX_AREA_MM2: f64 = 300_000.0;

/// Converts points to millimeters.
///
/// # Example
///
/// ```
/// use pdf_print_estimator::size_utils::mm_from_pt;
/// let mm = mm_from_pt(72.0); // one inch
/// assert!((mm - 25.4).abs() < 0.001);
/// ```
pub fn mm_from_pt(pt: f64) -> f64 {
    pt * MM_PER_PT
}

/// Buckets a page area given in mm².
///
/// Anything below the A4 bound, including zero or negative areas from
/// degenerate media boxes, is A4.
pub fn classify_area_mm2(area: f64) -> PageSize {
    if area < A4_MAX_AREA_MM2 {
        PageSize::A4
    } else if area < A3_MAX_AREA_MM2 {
        PageSize::A3
    } else if area < A2_MAX_AREA_MM2 {
        PageSize::A2
    } else {
        PageSize::A1
    }
}

/// Classifies a page from its media-box width and height in points.
///
/// Only the area is considered, so portrait and landscape pages of the
/// same sheet classify identically.
///
/// # Arguments
///
/// * `width_pt` - Media-box width in points
/// * `height_pt` - Media-box height in points
pub fn classify_page_size(width_pt: f64, height_pt: f64) -> PageSize {
    classify_area_mm2(mm_from_pt(width_pt) * mm_from_pt(height_pt))
}

/// Counts pages per size bucket, indexed in `PageSize::ALL` order.
pub fn size_counts(pages: &PageSizeMap) -> [usize; 4] {
    let mut counts = [0usize; 4];
    for size in pages.values() {
        counts[*size as usize] += 1;
    }
    counts
}

/// Converts a set of classified pages into an A4-equivalent page count.
///
/// A3 counts as two A4 sheets, A2 as four and A1 as eight. An empty map
/// yields zero.
pub fn a4_equivalent(pages: &PageSizeMap) -> u64 {
    size_counts(pages)
        .iter()
        .zip(PageSize::ALL)
        .map(|(count, size)| *count as u64 * size.a4_multiplier())
        .sum()
}
