//! Field-of-view and tile-spacing math. Pure, host-testable.

/// Camera geometry needed to derive FOV, as read from the active detection
/// camera's properties.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraGeometry {
    pub pixel_size_um: f64,
    pub frame_width_px: u32,
    pub frame_height_px: u32,
    /// 1.0 unless a magnification property is configured.
    pub magnification: f64,
}

/// Field of view in millimeters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fov {
    pub width_mm: f64,
    pub height_mm: f64,
}

/// `fov = frame * pixel / (1000 * magnification)`.
pub fn field_of_view(geometry: CameraGeometry) -> Fov {
    let denom = 1000.0 * geometry.magnification;
    Fov {
        width_mm: geometry.frame_width_px as f64 * geometry.pixel_size_um / denom,
        height_mm: geometry.frame_height_px as f64 * geometry.pixel_size_um / denom,
    }
}

/// Tile center-to-center spacing in microns, given FOV in mm and a tile
/// overlap fraction in `[0, 0.5]`.
pub fn tile_spacing_um(fov: Fov, overlap: f64) -> (f64, f64) {
    let factor = 1.0 - overlap;
    (fov.width_mm * 1000.0 * factor, fov.height_mm * 1000.0 * factor)
}

/// Maximum tile counts along each axis that fit within `stage_extent_um`,
/// clamped to at least 1 so a degenerate stage still yields a single tile.
pub fn max_tile_counts(stage_extent_um: (f64, f64), spacing_um: (f64, f64)) -> (u32, u32) {
    let cols = if spacing_um.0 > 0.0 {
        (stage_extent_um.0 / spacing_um.0).floor().max(1.0) as u32
    } else {
        1
    };
    let rows = if spacing_um.1 > 0.0 {
        (stage_extent_um.1 / spacing_um.1).floor().max(1.0) as u32
    } else {
        1
    };
    (rows, cols)
}
