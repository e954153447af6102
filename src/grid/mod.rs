//! FOV/tile math and the stack CRUD proxy.

pub mod fov;
pub mod stack;
pub mod tile;

pub use fov::{field_of_view, max_tile_counts, tile_spacing_um, CameraGeometry, Fov};
pub use stack::{CreateStackRequest, GridConfig, Stack, StackClient, StackStatus, UpdateStackRequest};
pub use tile::{generate_tiles, move_to_tile_commands, MoveAbsCommand, Tile};
