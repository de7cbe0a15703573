//! Crop rectangles and geometry remapping.

use serde::{Deserialize, Serialize};
use vermeer_error::{GeometryError, GeometryErrorKind};

/// A pixel-space crop rectangle, always relative to the owning image's
/// current `width x height`.
///
/// Invariant: `left + width <= image width` and `top + height <= image
/// height`. [`Crop::remap`] preserves this invariant across resolution
/// changes (commonly after upscaling).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Crop {
    /// Left edge in pixels
    pub left: u32,
    /// Top edge in pixels
    pub top: u32,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl Crop {
    /// Create a crop rectangle.
    pub fn new(left: u32, top: u32, width: u32, height: u32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Recompute this crop for an image whose pixel dimensions changed from
    /// `(old_w, old_h)` to `(new_w, new_h)`.
    ///
    /// Horizontal fields scale by `new_w / old_w`, vertical fields by
    /// `new_h / old_h`, rounded to the nearest integer and then clamped so
    /// the rectangle stays fully inside the new bounds. Identity scaling
    /// returns the crop unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryErrorKind::ZeroDimension`] when either old
    /// dimension is zero.
    ///
    /// # Examples
    ///
    /// ```
    /// use vermeer_core::Crop;
    ///
    /// let crop = Crop::new(10, 20, 100, 50);
    /// let doubled = crop.remap(200, 100, 400, 200).unwrap();
    /// assert_eq!(doubled, Crop::new(20, 40, 200, 100));
    /// ```
    pub fn remap(
        &self,
        old_w: u32,
        old_h: u32,
        new_w: u32,
        new_h: u32,
    ) -> Result<Crop, GeometryError> {
        if old_w == 0 || old_h == 0 {
            return Err(GeometryError::new(GeometryErrorKind::ZeroDimension(
                old_w, old_h,
            )));
        }

        let sx = f64::from(new_w) / f64::from(old_w);
        let sy = f64::from(new_h) / f64::from(old_h);

        let scale = |v: u32, s: f64| (f64::from(v) * s).round() as u32;

        // Scale, then clamp offsets into bounds before clamping extents so
        // the rectangle never overhangs the new image.
        let left = scale(self.left, sx).min(new_w);
        let top = scale(self.top, sy).min(new_h);
        let width = scale(self.width, sx).min(new_w - left);
        let height = scale(self.height, sy).min(new_h - top);

        Ok(Crop {
            left,
            top,
            width,
            height,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remap_identity_scale_is_noop() {
        let crop = Crop::new(5, 7, 30, 40);
        assert_eq!(crop.remap(100, 100, 100, 100).unwrap(), crop);
    }

    #[test]
    fn remap_scales_linearly_per_axis() {
        let crop = Crop::new(10, 10, 50, 50);
        // Width doubles, height halves.
        let out = crop.remap(100, 100, 200, 50).unwrap();
        assert_eq!(out, Crop::new(20, 5, 100, 25));
    }

    #[test]
    fn remap_rounds_to_nearest() {
        let crop = Crop::new(1, 1, 1, 1);
        // Scale 1.5: 1.5 rounds to 2.
        let out = crop.remap(2, 2, 3, 3).unwrap();
        assert_eq!(out, Crop::new(2, 2, 1, 1));
    }

    #[test]
    fn remap_clamps_inside_new_bounds() {
        // Rounding could push the rectangle past the right edge; the clamp
        // must pull it back so left + width <= new_w.
        let crop = Crop::new(99, 0, 1, 100);
        let out = crop.remap(100, 100, 33, 33).unwrap();
        assert!(out.left + out.width <= 33);
        assert!(out.top + out.height <= 33);
    }

    #[test]
    fn remap_zero_dimension_errors() {
        let crop = Crop::new(0, 0, 10, 10);
        assert!(crop.remap(0, 100, 50, 50).is_err());
        assert!(crop.remap(100, 0, 50, 50).is_err());
    }

    #[test]
    fn remap_invariant_holds_for_varied_inputs() {
        let crop = Crop::new(13, 27, 61, 42);
        for &(ow, oh, nw, nh) in &[
            (100u32, 100u32, 1u32, 1u32),
            (100, 100, 7919, 13),
            (74, 69, 74, 69),
            (640, 480, 1920, 1080),
            (1920, 1080, 640, 480),
        ] {
            let out = crop.remap(ow, oh, nw, nh).unwrap();
            assert!(out.left + out.width <= nw, "{:?} for {}x{}", out, nw, nh);
            assert!(out.top + out.height <= nh, "{:?} for {}x{}", out, nw, nh);
        }
    }
}
