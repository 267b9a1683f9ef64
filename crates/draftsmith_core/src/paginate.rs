//! crates/draftsmith_core/src/paginate.rs
//!
//! The page split planner: maps a tall rendered raster onto a sequence of
//! fixed-size print pages.
//!
//! Geometry: A4 portrait with fixed margins. The raster is scaled to the
//! content-box width, so one page consumes a fixed number of source pixels
//! of vertical extent regardless of how tall the document is. Slices are
//! ordered, gapless and non-overlapping; slice order is authoritative for
//! the final PDF page order.

pub const PAGE_WIDTH_MM: f32 = 210.0;
pub const PAGE_HEIGHT_MM: f32 = 297.0;
pub const PAGE_MARGIN_MM: f32 = 10.0;
pub const CONTENT_WIDTH_MM: f32 = PAGE_WIDTH_MM - 2.0 * PAGE_MARGIN_MM;
pub const CONTENT_HEIGHT_MM: f32 = PAGE_HEIGHT_MM - 2.0 * PAGE_MARGIN_MM;

/// Hard ceiling on emitted pages. A degenerate height computation must
/// surface as an error, never as a runaway loop or a silent truncation.
pub const MAX_PAGES: usize = 50;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SplitError {
    #[error("rendered surface has zero width; nothing to paginate")]
    ZeroWidth,
    #[error("document spans {required} pages, over the {MAX_PAGES}-page export limit")]
    PageCeiling { required: usize },
}

/// One vertical band of the source raster, bound to one output page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSlice {
    pub page_index: usize,
    pub source_offset_px: u32,
    pub source_height_px: u32,
}

/// The full, ephemeral plan for one export. Recomputed on every export and
/// never cached across edits.
#[derive(Debug, Clone, PartialEq)]
pub struct PageSplitPlan {
    pub slices: Vec<PageSlice>,
    /// Vertical millimeters one source pixel maps to on the page.
    pub mm_per_px: f32,
    /// Source pixels of vertical extent one page consumes.
    pub capacity_px: u32,
}

impl PageSplitPlan {
    pub fn page_count(&self) -> usize {
        self.slices.len()
    }
}

/// Source pixels of vertical extent that fit on one page, for a raster of
/// the given width mapped to the content-box width.
pub fn page_capacity_px(width_px: u32) -> u32 {
    let capacity = width_px as f32 * CONTENT_HEIGHT_MM / CONTENT_WIDTH_MM;
    (capacity.floor() as u32).max(1)
}

/// Splits a source extent of `height_px` into per-page bands of at most
/// `capacity_px`. `ceil(H/C)` pages for a positive height; a zero height
/// still yields one (empty) page, since downstream consumers expect at
/// least one page to exist.
pub fn slice_pages(height_px: u32, capacity_px: u32) -> Result<Vec<PageSlice>, SplitError> {
    debug_assert!(capacity_px > 0);

    if height_px == 0 {
        return Ok(vec![PageSlice {
            page_index: 0,
            source_offset_px: 0,
            source_height_px: 0,
        }]);
    }

    let required = (height_px as usize).div_ceil(capacity_px as usize);
    if required > MAX_PAGES {
        return Err(SplitError::PageCeiling { required });
    }

    let mut slices = Vec::with_capacity(required);
    let mut offset = 0u32;
    for page_index in 0..required {
        let remaining = height_px - offset;
        let band = remaining.min(capacity_px);
        slices.push(PageSlice {
            page_index,
            source_offset_px: offset,
            source_height_px: band,
        });
        offset += band;
    }
    Ok(slices)
}

/// Plans the export of a `width_px` × `height_px` raster.
pub fn plan_pages(width_px: u32, height_px: u32) -> Result<PageSplitPlan, SplitError> {
    if width_px == 0 {
        return Err(SplitError::ZeroWidth);
    }
    let capacity_px = page_capacity_px(width_px);
    let slices = slice_pages(height_px, capacity_px)?;
    Ok(PageSplitPlan {
        slices,
        mm_per_px: CONTENT_WIDTH_MM / width_px as f32,
        capacity_px,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// The union of the slices must cover `[0, height)` exactly: in order,
    /// gapless, non-overlapping.
    fn assert_covers(slices: &[PageSlice], height: u32) {
        let mut expected_offset = 0u32;
        for (i, slice) in slices.iter().enumerate() {
            assert_eq!(slice.page_index, i);
            assert_eq!(slice.source_offset_px, expected_offset);
            expected_offset += slice.source_height_px;
        }
        assert_eq!(expected_offset, height);
    }

    #[test]
    fn page_count_is_the_ceiling_of_height_over_capacity() {
        let slices = slice_pages(1000, 400).unwrap();
        assert_eq!(slices.len(), 3);
        assert_covers(&slices, 1000);
        // The last page shows the final partial band.
        assert_eq!(slices[2].source_offset_px, 800);
        assert_eq!(slices[2].source_height_px, 200);
    }

    #[test]
    fn exact_multiple_yields_no_trailing_blank_page() {
        let slices = slice_pages(1200, 400).unwrap();
        assert_eq!(slices.len(), 3);
        assert_covers(&slices, 1200);
        assert_eq!(slices[2].source_height_px, 400);
    }

    #[test]
    fn zero_height_yields_exactly_one_empty_page() {
        let slices = slice_pages(0, 400).unwrap();
        assert_eq!(slices.len(), 1);
        assert_eq!(slices[0].source_height_px, 0);
    }

    #[test]
    fn single_short_page() {
        let slices = slice_pages(150, 400).unwrap();
        assert_eq!(slices.len(), 1);
        assert_covers(&slices, 150);
    }

    #[test]
    fn ceiling_breach_is_a_reported_error_not_a_truncation() {
        let err = slice_pages(400 * (MAX_PAGES as u32) + 1, 400).unwrap_err();
        assert_eq!(
            err,
            SplitError::PageCeiling {
                required: MAX_PAGES + 1
            }
        );
        // Exactly at the ceiling is still fine.
        let slices = slice_pages(400 * MAX_PAGES as u32, 400).unwrap();
        assert_eq!(slices.len(), MAX_PAGES);
    }

    #[test]
    fn zero_width_raster_is_degenerate() {
        assert_eq!(plan_pages(0, 1000).unwrap_err(), SplitError::ZeroWidth);
    }

    #[test]
    fn capacity_follows_the_content_box_aspect() {
        // 190mm of width maps one page to 277mm of height, so a 1900px-wide
        // raster consumes 2770px per page.
        assert_eq!(page_capacity_px(1900), 2770);
        assert!(page_capacity_px(1) >= 1);
    }

    #[test]
    fn plan_carries_the_px_to_mm_mapping() {
        let plan = plan_pages(1900, 2770 * 2).unwrap();
        assert_eq!(plan.page_count(), 2);
        assert!((plan.mm_per_px - 0.1).abs() < 1e-6);
        assert_eq!(plan.capacity_px, 2770);
    }

    #[test]
    fn coverage_holds_for_awkward_heights() {
        for height in [1, 399, 400, 401, 799, 800, 801, 12345] {
            let slices = slice_pages(height, 400).unwrap();
            assert_eq!(slices.len(), (height as usize).div_ceil(400));
            assert_covers(&slices, height);
        }
    }
}
