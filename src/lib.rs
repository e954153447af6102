//! Transport, device-catalog, and GPU preview-compositing core for a
//! light-sheet microscopy control UI.
//!
//! The crate is split the way the control surface it drives is split:
//! [`transport`] owns the multiplexed WebSocket and topic routing,
//! [`catalog`] mirrors remote devices and their properties, [`frame`] and
//! [`compositor`] form the streaming-preview pipeline, [`controller`] is
//! the pan/zoom/crop/channel-assignment glue in front of it, and [`grid`]
//! maps stage position and camera FOV to tiles and stacks. [`config`] and
//! [`errors`] are shared across all of them; [`reactive`] is the
//! observable-cell primitive every other module builds state on.
//!
//! All logic here is platform-independent: it runs unmodified on native
//! targets (under the `native-transport`/`gpu` features, the crate's
//! default) and in a browser via wasm-bindgen (under the `wasm` feature).
//! Nothing outside [`transport::socket`] and [`compositor::wgpu_backend`]
//! contains a `cfg(target_arch = "wasm32")`.

pub mod catalog;
pub mod compositor;
pub mod config;
pub mod controller;
pub mod errors;
pub mod frame;
pub mod grid;
pub mod reactive;
pub mod transport;

/// Convenience re-exports of the types most callers construct first.
pub mod prelude {
    pub use crate::catalog::{CommandOptions, Device, DeviceCatalog, PropertyModel};
    pub use crate::compositor::{Channel, CompositorBackend, Colormap, NullBackend, TickOrchestrator};
    pub use crate::config::{ControllerConfig, TransportConfig};
    pub use crate::controller::PreviewController;
    pub use crate::errors::CoreError;
    pub use crate::frame::{Crop, FrameCollector};
    pub use crate::grid::{GridConfig, Stack, StackClient, Tile};
    pub use crate::reactive::Observable;
    pub use crate::transport::{ConnectionState, Transport};

    #[cfg(feature = "gpu")]
    pub use crate::compositor::WgpuBackend;
}
