//! Crop/pan/zoom math, debounce, and the [`PreviewController`] that ties
//! Transport, Frame Collector, and channel state together.

pub mod crop_math;
pub mod debounce;
mod preview_controller;

pub use debounce::Debouncer;
pub use preview_controller::PreviewController;
