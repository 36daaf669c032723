//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

use super::backend::Dimensions;

/// Which requested dimension ends up matching the output exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingAxis {
    Width,
    Height,
}

/// Calculate output dimensions for a requested bounding box.
///
/// An absent request dimension places no constraint on its axis: its ratio
/// is computed as `original / 1`.
///
/// - If either ratio (`original / requested`) is below 1 the image would have
///   to grow, so the original dimensions are returned unchanged.
/// - Otherwise the axis with the smaller ratio binds: it takes the requested
///   value and the other axis is scaled by the same ratio. Ties bind height.
///   When only one dimension is requested, that one binds.
///
/// Computed sides are rounded half away from zero and never drop below 1.
///
/// # Arguments
/// * `original` - Source image dimensions
/// * `width` - Requested width, if any (non-zero)
/// * `height` - Requested height, if any (non-zero)
///
/// # Examples
/// ```
/// # use fitcache::imaging::{Dimensions, fit_within};
/// let original = Dimensions { width: 800, height: 600 };
///
/// // Width ratio 2 beats height ratio 6 → width binds
/// let fitted = fit_within(original, Some(400), Some(100));
/// assert_eq!(fitted, Dimensions { width: 400, height: 300 });
///
/// // Never upscale
/// let fitted = fit_within(original, Some(1600), None);
/// assert_eq!(fitted, original);
/// ```
pub fn fit_within(original: Dimensions, width: Option<u32>, height: Option<u32>) -> Dimensions {
    let orig_w = original.width as f64;
    let orig_h = original.height as f64;

    let width_ratio = orig_w / width.unwrap_or(1) as f64;
    let height_ratio = orig_h / height.unwrap_or(1) as f64;

    if width_ratio < 1.0 || height_ratio < 1.0 {
        return original;
    }

    match binding_axis(width, height, width_ratio, height_ratio) {
        Some(BindingAxis::Width) => Dimensions {
            width: width.unwrap_or(original.width),
            height: scaled_side(orig_h, width_ratio),
        },
        Some(BindingAxis::Height) => Dimensions {
            width: scaled_side(orig_w, height_ratio),
            height: height.unwrap_or(original.height),
        },
        None => original,
    }
}

/// Pick the axis that takes its requested value verbatim.
///
/// Returns `None` when nothing was requested.
pub fn binding_axis(
    width: Option<u32>,
    height: Option<u32>,
    width_ratio: f64,
    height_ratio: f64,
) -> Option<BindingAxis> {
    match (width, height) {
        (None, None) => None,
        (Some(_), None) => Some(BindingAxis::Width),
        (None, Some(_)) => Some(BindingAxis::Height),
        (Some(_), Some(_)) if width_ratio < height_ratio => Some(BindingAxis::Width),
        (Some(_), Some(_)) => Some(BindingAxis::Height),
    }
}

fn scaled_side(original_side: f64, ratio: f64) -> u32 {
    ((original_side / ratio).round() as u32).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dims(width: u32, height: u32) -> Dimensions {
        Dimensions { width, height }
    }

    // =========================================================================
    // fit_within tests
    // =========================================================================

    #[test]
    fn width_only_scales_height() {
        // 1000x500, width 100 → ratio 10 → 100x50
        assert_eq!(fit_within(dims(1000, 500), Some(100), None), dims(100, 50));
    }

    #[test]
    fn height_only_scales_width() {
        // 1000x500, height 100 → ratio 5 → 200x100
        assert_eq!(fit_within(dims(1000, 500), None, Some(100)), dims(200, 100));
    }

    #[test]
    fn upscale_request_returns_original() {
        assert_eq!(
            fit_within(dims(200, 100), Some(1000), Some(500)),
            dims(200, 100)
        );
    }

    #[test]
    fn one_axis_too_large_returns_original() {
        // Height would fit, width would have to grow
        assert_eq!(
            fit_within(dims(200, 1000), Some(400), Some(100)),
            dims(200, 1000)
        );
    }

    #[test]
    fn single_axis_upscale_returns_original() {
        assert_eq!(fit_within(dims(100, 1000), Some(200), None), dims(100, 1000));
        assert_eq!(fit_within(dims(1000, 100), None, Some(200)), dims(1000, 100));
    }

    #[test]
    fn smaller_ratio_binds_width() {
        // ratios 2 and 6 → width binds → 400x300
        assert_eq!(
            fit_within(dims(800, 600), Some(400), Some(100)),
            dims(400, 300)
        );
    }

    #[test]
    fn smaller_ratio_binds_height() {
        // ratios 8 and 2 → height binds → 400x300
        assert_eq!(
            fit_within(dims(800, 600), Some(100), Some(300)),
            dims(400, 300)
        );
    }

    #[test]
    fn equal_ratios_bind_height() {
        assert_eq!(
            fit_within(dims(800, 600), Some(400), Some(300)),
            dims(400, 300)
        );
    }

    #[test]
    fn request_equal_to_original_is_identity() {
        assert_eq!(fit_within(dims(800, 600), Some(800), None), dims(800, 600));
        assert_eq!(
            fit_within(dims(800, 600), Some(800), Some(600)),
            dims(800, 600)
        );
    }

    #[test]
    fn rounds_half_away_from_zero() {
        // 400x3 at width 200 → ratio 2 → height 1.5 → 2
        assert_eq!(fit_within(dims(400, 3), Some(200), None), dims(200, 2));
    }

    #[test]
    fn rounds_to_nearest() {
        // 1001x500 at width 100 → ratio 10.01 → height 49.95 → 50
        assert_eq!(fit_within(dims(1001, 500), Some(100), None), dims(100, 50));
    }

    #[test]
    fn computed_side_never_below_one() {
        // 1000x1 at width 10 → height 0.01 → clamped to 1
        assert_eq!(fit_within(dims(1000, 1), Some(10), None), dims(10, 1));
    }

    #[test]
    fn single_requested_axis_binds_even_with_larger_ratio() {
        // 1000x5 at width 100: width ratio 10 > height ratio 5 (height
        // unconstrained), but width is the only requested axis.
        assert_eq!(fit_within(dims(1000, 5), Some(100), None), dims(100, 1));
    }

    #[test]
    fn nothing_requested_returns_original() {
        assert_eq!(fit_within(dims(640, 480), None, None), dims(640, 480));
    }

    #[test]
    fn non_binding_side_within_one_of_exact() {
        for &(w, h, req) in &[(1920, 1080, 333), (3000, 2001, 777), (1234, 987, 101)] {
            let fitted = fit_within(dims(w, h), Some(req), None);
            let exact = h as f64 * req as f64 / w as f64;
            assert_eq!(fitted.width, req);
            assert!((fitted.height as f64 - exact).abs() <= 1.0, "{w}x{h} → {fitted}");
        }
    }

    // =========================================================================
    // binding_axis tests
    // =========================================================================

    #[test]
    fn binding_axis_none_when_unconstrained() {
        assert_eq!(binding_axis(None, None, 1.0, 1.0), None);
    }

    #[test]
    fn binding_axis_follows_single_request() {
        assert_eq!(binding_axis(Some(5), None, 9.0, 1.0), Some(BindingAxis::Width));
        assert_eq!(binding_axis(None, Some(5), 1.0, 9.0), Some(BindingAxis::Height));
    }
}
