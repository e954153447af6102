//! Tile generation and the move-to-tile command.
//!
//! Tile centers are the authoritative anchor; a tile's `(x_um, y_um)` is
//! always its center, not a corner.

use serde::Serialize;

use super::fov::{max_tile_counts, tile_spacing_um, Fov};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Tile {
    pub row: u32,
    pub col: u32,
    pub x_um: f64,
    pub y_um: f64,
    pub w_um: f64,
    pub h_um: f64,
}

/// Builds the full tile grid for `stage_extent_um` centered on
/// `(origin_x_um, origin_y_um)`, with `fov`/`overlap` determining tile size
/// and spacing.
pub fn generate_tiles(
    origin: (f64, f64),
    stage_extent_um: (f64, f64),
    fov: Fov,
    overlap: f64,
) -> Vec<Tile> {
    let spacing = tile_spacing_um(fov, overlap);
    let (rows, cols) = max_tile_counts(stage_extent_um, spacing);
    let w_um = fov.width_mm * 1000.0;
    let h_um = fov.height_mm * 1000.0;

    let mut tiles = Vec::with_capacity((rows * cols) as usize);
    for row in 0..rows {
        for col in 0..cols {
            let x_um = origin.0 + col as f64 * spacing.0;
            let y_um = origin.1 + row as f64 * spacing.1;
            tiles.push(Tile { row, col, x_um, y_um, w_um, h_um });
        }
    }
    tiles
}

#[derive(Debug, Clone, Serialize)]
pub struct MoveAbsCommand {
    pub device: &'static str,
    pub args: MoveAbsArgs,
}

#[derive(Debug, Clone, Serialize)]
pub struct MoveAbsArgs {
    pub position: f64,
    pub wait: bool,
}

/// The pair of `move_abs` commands issued for moving to a tile's center,
/// targeting the X and Y stage devices with `wait=false`.
pub fn move_to_tile_commands(tile: &Tile) -> [MoveAbsCommand; 2] {
    [
        MoveAbsCommand {
            device: "stage_x",
            args: MoveAbsArgs { position: tile.x_um, wait: false },
        },
        MoveAbsCommand {
            device: "stage_y",
            args: MoveAbsArgs { position: tile.y_um, wait: false },
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generates_a_grid_covering_the_stage_extent() {
        let fov = Fov { width_mm: 1.0, height_mm: 1.0 };
        let tiles = generate_tiles((0.0, 0.0), (2000.0, 1000.0), fov, 0.0);
        assert_eq!(tiles.len(), 2 * 2);
        assert!(tiles.iter().any(|t| t.row == 1 && t.col == 1));
    }

    #[test]
    fn tile_centers_are_spaced_by_overlap_adjusted_fov() {
        let fov = Fov { width_mm: 1.0, height_mm: 1.0 };
        let tiles = generate_tiles((100.0, 100.0), (3000.0, 3000.0), fov, 0.1);
        let origin_tile = tiles.iter().find(|t| t.row == 0 && t.col == 0).unwrap();
        let next_col = tiles.iter().find(|t| t.row == 0 && t.col == 1).unwrap();
        assert!((origin_tile.x_um - 100.0).abs() < 1e-9);
        assert!((next_col.x_um - (100.0 + 900.0)).abs() < 1e-9);
    }

    #[test]
    fn move_to_tile_targets_x_and_y_with_wait_false() {
        let tile = Tile { row: 0, col: 0, x_um: 123.0, y_um: 456.0, w_um: 1000.0, h_um: 1000.0 };
        let commands = move_to_tile_commands(&tile);
        assert_eq!(commands[0].device, "stage_x");
        assert_eq!(commands[0].args.position, 123.0);
        assert!(!commands[0].args.wait);
        assert_eq!(commands[1].device, "stage_y");
        assert_eq!(commands[1].args.position, 456.0);
        assert!(!commands[1].args.wait);
    }
}
