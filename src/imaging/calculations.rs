//! Pure calculation functions for crop windows and placement.
//!
//! All functions here are pure and testable without any I/O or images.

use super::params::{CropRect, Placement};

/// Why a crop window could not be produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CropIssue {
    /// `finish <= start` on at least one axis.
    Degenerate,
    /// The window lies entirely outside the source image.
    OutsideSource,
}

/// Validate the offset window `(x_start, y_start) → (x_finish, y_finish)`
/// against a source of `source` dimensions.
///
/// The window is intersected with the source bounds, so a window that
/// overhangs the edge is trimmed rather than rejected.
///
/// ```
/// # use mfd_compose::imaging::crop_window;
/// let rect = crop_window((0, 0, 256, 256), (512, 512)).unwrap();
/// assert_eq!((rect.width, rect.height), (256, 256));
/// assert!(crop_window((10, 0, 10, 100), (512, 512)).is_err());
/// ```
pub fn crop_window(
    (x_start, y_start, x_finish, y_finish): (i32, i32, i32, i32),
    source: (u32, u32),
) -> Result<CropRect, CropIssue> {
    if x_finish <= x_start || y_finish <= y_start {
        return Err(CropIssue::Degenerate);
    }
    let (sw, sh) = (i64::from(source.0), i64::from(source.1));
    let x0 = i64::from(x_start).clamp(0, sw);
    let y0 = i64::from(y_start).clamp(0, sh);
    let x1 = i64::from(x_finish).clamp(0, sw);
    let y1 = i64::from(y_finish).clamp(0, sh);
    if x1 <= x0 || y1 <= y0 {
        return Err(CropIssue::OutsideSource);
    }
    // Every value is within 0..=u32::MAX after clamping to the source size
    Ok(CropRect {
        x: x0 as u32,
        y: y0 as u32,
        width: (x1 - x0) as u32,
        height: (y1 - y0) as u32,
    })
}

/// Resize target, or `None` when either side is not positive.
pub fn target_size(width: i32, height: i32) -> Option<(u32, u32)> {
    let w = u32::try_from(width).ok().filter(|w| *w > 0)?;
    let h = u32::try_from(height).ok().filter(|h| *h > 0)?;
    Some((w, h))
}

/// Centre `inner` within `outer`, truncating toward zero.
///
/// A child larger than its parent gets a negative offset.
///
/// ```
/// # use mfd_compose::imaging::centered_placement;
/// let p = centered_placement((512, 512), (256, 128));
/// assert_eq!((p.x, p.y), (128, 192));
/// ```
pub fn centered_placement(outer: (u32, u32), inner: (u32, u32)) -> Placement {
    // i64 division truncates toward zero
    Placement {
        x: (i64::from(outer.0) - i64::from(inner.0)) / 2,
        y: (i64::from(outer.1) - i64::from(inner.1)) / 2,
    }
}

/// Explicit placement at `(left, top)` relative to the canvas origin.
pub fn offset_placement(left: i32, top: i32, origin: (i64, i64)) -> Placement {
    Placement {
        x: origin.0 + i64::from(left),
        y: origin.1 + i64::from(top),
    }
}

/// Intersection of an image of `size` placed at `at` with a canvas of
/// `canvas` size, as `(canvas_x, canvas_y, src_x, src_y, width, height)`.
///
/// `None` when nothing overlaps.
pub fn visible_region(
    canvas: (u32, u32),
    at: Placement,
    size: (u32, u32),
) -> Option<(u32, u32, u32, u32, u32, u32)> {
    let x0 = at.x.max(0);
    let y0 = at.y.max(0);
    let x1 = (at.x + i64::from(size.0)).min(i64::from(canvas.0));
    let y1 = (at.y + i64::from(size.1)).min(i64::from(canvas.1));
    if x1 <= x0 || y1 <= y0 {
        return None;
    }
    Some((
        x0 as u32,
        y0 as u32,
        (x0 - at.x) as u32,
        (y0 - at.y) as u32,
        (x1 - x0) as u32,
        (y1 - y0) as u32,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // crop_window tests
    // =========================================================================

    #[test]
    fn crop_inside_source() {
        let rect = crop_window((10, 20, 110, 70), (512, 512)).unwrap();
        assert_eq!(
            rect,
            CropRect {
                x: 10,
                y: 20,
                width: 100,
                height: 50
            }
        );
    }

    #[test]
    fn crop_finish_equal_to_start_is_degenerate() {
        assert_eq!(crop_window((5, 0, 5, 10), (100, 100)), Err(CropIssue::Degenerate));
        assert_eq!(crop_window((0, 9, 10, 9), (100, 100)), Err(CropIssue::Degenerate));
    }

    #[test]
    fn crop_finish_before_start_is_degenerate() {
        assert_eq!(crop_window((50, 0, 10, 10), (100, 100)), Err(CropIssue::Degenerate));
    }

    #[test]
    fn all_zero_offsets_are_degenerate() {
        assert_eq!(crop_window((0, 0, 0, 0), (100, 100)), Err(CropIssue::Degenerate));
    }

    #[test]
    fn crop_overhang_is_trimmed() {
        let rect = crop_window((-10, 80, 50, 200), (100, 100)).unwrap();
        assert_eq!((rect.x, rect.y, rect.width, rect.height), (0, 80, 50, 20));
    }

    #[test]
    fn crop_outside_source_is_rejected() {
        assert_eq!(
            crop_window((200, 200, 300, 300), (100, 100)),
            Err(CropIssue::OutsideSource)
        );
    }

    // =========================================================================
    // target_size tests
    // =========================================================================

    #[test]
    fn target_size_requires_positive_sides() {
        assert_eq!(target_size(512, 256), Some((512, 256)));
        assert_eq!(target_size(0, 256), None);
        assert_eq!(target_size(512, -1), None);
    }

    // =========================================================================
    // placement tests
    // =========================================================================

    #[test]
    fn centering_is_exact() {
        let p = centered_placement((512, 512), (256, 256));
        assert_eq!((p.x, p.y), (128, 128));
    }

    #[test]
    fn centering_truncates_odd_difference() {
        let p = centered_placement((101, 100), (50, 49));
        assert_eq!((p.x, p.y), (25, 25));
    }

    #[test]
    fn centering_larger_child_truncates_toward_zero() {
        let p = centered_placement((100, 100), (103, 100));
        assert_eq!((p.x, p.y), (-1, 0));
    }

    #[test]
    fn offset_placement_adds_origin() {
        let p = offset_placement(30, 40, (5, 6));
        assert_eq!((p.x, p.y), (35, 46));
    }

    // =========================================================================
    // visible_region tests
    // =========================================================================

    #[test]
    fn visible_region_clips_negative_origin() {
        let region = visible_region((100, 100), Placement { x: -10, y: 90 }, (30, 30));
        assert_eq!(region, Some((0, 90, 10, 0, 20, 10)));
    }

    #[test]
    fn visible_region_none_when_off_canvas() {
        assert_eq!(
            visible_region((100, 100), Placement { x: 100, y: 0 }, (10, 10)),
            None
        );
    }
}
