//! Per-channel store of the latest original and cropped frames delivered by
//! the server.

pub mod collector;
pub mod types;

pub use collector::FrameCollector;
pub use types::{Crop, FrameData, FrameSet, CROP_EPSILON};
