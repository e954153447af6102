//! Core data types shared by the Frame Collector and the Preview Controller.

use serde::{Deserialize, Serialize};

use crate::transport::frame_format::{DecodedBitmap, PreviewFrameInfo};

/// Tolerance for comparing a crop against `{0,0,0}` ("original") and for
/// comparing two crops for consistency in the cropped buffer.
pub const CROP_EPSILON: f64 = 1e-3;

/// Normalized viewport: top-left `(x, y)` and zoom `k`. `k=0` is the full
/// image; `k` approaches 1 as the viewport shrinks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Crop {
    pub x: f64,
    pub y: f64,
    pub k: f64,
}

impl Crop {
    pub const ORIGINAL: Crop = Crop { x: 0.0, y: 0.0, k: 0.0 };

    /// `true` if this crop is within [`CROP_EPSILON`] of `{0,0,0}`.
    pub fn is_original(&self) -> bool {
        self.x.abs() < CROP_EPSILON && self.y.abs() < CROP_EPSILON && self.k.abs() < CROP_EPSILON
    }

    /// `true` if `self` and `other` agree within [`CROP_EPSILON`] on every
    /// field.
    pub fn approx_eq(&self, other: &Crop) -> bool {
        (self.x - other.x).abs() < CROP_EPSILON
            && (self.y - other.y).abs() < CROP_EPSILON
            && (self.k - other.k).abs() < CROP_EPSILON
    }

    /// Clamps `(x, y)` into `[0, k]` and `k` into `[0, 1)`, per the viewport
    /// invariant `0 <= x,y <= k` and `0 <= k < 1`.
    pub fn clamped(x: f64, y: f64, k: f64) -> Crop {
        let k = k.clamp(0.0, 1.0 - f64::EPSILON);
        Crop {
            x: x.clamp(0.0, k),
            y: y.clamp(0.0, k),
            k,
        }
    }
}

/// One decoded frame as retained by the Collector: the metadata the server
/// sent plus the decoded bitmap.
#[derive(Debug, Clone)]
pub struct FrameData {
    pub info: PreviewFrameInfo,
    pub bitmap: DecodedBitmap,
}

impl FrameData {
    pub fn is_original(&self) -> bool {
        self.info.crop.is_original()
    }
}

/// A coherent set of per-channel frames sharing one crop, as returned by
/// [`crate::frame::collector::FrameCollector::get_latest_frames`].
#[derive(Debug, Clone)]
pub struct FrameSet {
    pub crop: Crop,
    pub frames: Vec<Option<FrameData>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn original_constant_is_original() {
        assert!(Crop::ORIGINAL.is_original());
    }

    #[test]
    fn clamp_keeps_viewport_in_unit_square() {
        // Property 1: 0 <= k < 1 and 0 <= x,y <= k.
        let crop = Crop::clamped(5.0, -3.0, 2.0);
        assert!(crop.k < 1.0);
        assert!(crop.x >= 0.0 && crop.x <= crop.k);
        assert!(crop.y >= 0.0 && crop.y <= crop.k);
    }

    #[test]
    fn approx_eq_tolerates_epsilon() {
        let a = Crop { x: 0.1, y: 0.1, k: 0.2 };
        let b = Crop {
            x: 0.1 + 1e-4,
            y: 0.1,
            k: 0.2,
        };
        assert!(a.approx_eq(&b));
    }
}
