//! Texture/LUT/uniform management and the per-frame render pass.

pub mod backend;
pub mod channel;
#[cfg(feature = "gpu")]
pub mod wgpu_backend;
mod orchestrator;
pub mod shader;
pub mod uniform;

pub use backend::{CompositorBackend, NullBackend};
pub use channel::{Channel, Colormap};
pub use orchestrator::{RenderTickInput, RenderTickOutcome, TickOrchestrator};
pub use uniform::{ChannelUniform, CompositorUniform, DeltaCrop, MAX_CHANNELS};
#[cfg(feature = "gpu")]
pub use wgpu_backend::WgpuBackend;
