//! Pure pan/zoom/crop math. No I/O, no GPU — fully host-testable.

use crate::frame::types::Crop;

/// Fallback max zoom when `full_width` is unknown (zero).
pub const DEFAULT_MAX_K: f64 = 0.95;

/// `maxK = 1 - preview_width/full_width`, matching "the viewport never
/// shrinks below preview_width/full_width".
pub fn max_k_for(preview_width: u32, full_width: u32) -> f64 {
    if full_width == 0 {
        return DEFAULT_MAX_K;
    }
    (1.0 - preview_width as f64 / full_width as f64).clamp(0.0, 1.0 - f64::EPSILON)
}

/// Pointer-move handler: `crop = clamp({start_crop.x - dx, start_crop.y -
/// dy, start_crop.k})`.
pub fn pan(start_crop: Crop, dx: f64, dy: f64) -> Crop {
    Crop::clamped(start_crop.x - dx, start_crop.y - dy, start_crop.k)
}

/// Wheel handler: computes the new crop keeping `mouse` stationary under
/// zoom. `delta_y` is the wheel event's deltaY (positive = scroll down).
pub fn zoom(current: Crop, delta_y: f64, mouse: (f64, f64), max_k: f64) -> Crop {
    let new_k = (current.k + (-delta_y) * 0.001).clamp(0.0, max_k);

    let old_scale = 1.0 - current.k;
    let new_scale = 1.0 - new_k;
    let scale_ratio = if old_scale.abs() < f64::EPSILON {
        1.0
    } else {
        new_scale / old_scale
    };

    let new_x = mouse.0 - (mouse.0 - current.x) * scale_ratio;
    let new_y = mouse.1 - (mouse.1 - current.y) * scale_ratio;

    Crop::clamped(new_x, new_y, new_k)
}
