//! GPU backend abstraction.
//!
//! The compositor's render-tick orchestration (pick a frame, compute the
//! uniform, decide what to upload) is backend-agnostic and unit-testable
//! against [`NullBackend`]; only [`super::wgpu_backend::WgpuBackend`]
//! talks to real hardware.

use crate::errors::CompositorError;
use crate::transport::frame_format::DecodedBitmap;

use super::channel::Colormap;
use super::uniform::CompositorUniform;

/// Resource-owning backend for the compositor's GPU state: textures, LUTs,
/// uniform buffer, bind group, and the render pass itself.
pub trait CompositorBackend: Send + Sync {
    /// Uploads `bitmap` into slot `slot`'s streaming texture. Implementations
    /// recreate the texture (and flag the bind group for rebuild) if
    /// dimensions changed since the last upload.
    fn upload_texture(&self, slot: usize, bitmap: &DecodedBitmap) -> Result<(), CompositorError>;

    /// (Re)builds slot `slot`'s 256x1 LUT texture for `colormap`.
    fn upload_lut(&self, slot: usize, colormap: Colormap) -> Result<(), CompositorError>;

    /// Marks `slot` disabled; its bindings fall back to the 1x1 dummy
    /// texture so the bind-group layout stays `MAX_CHANNELS`-constant.
    fn disable_slot(&self, slot: usize) -> Result<(), CompositorError>;

    /// Writes the whole uniform buffer for the upcoming render pass.
    fn write_uniform(&self, uniform: &CompositorUniform) -> Result<(), CompositorError>;

    /// Executes the render pass against the currently bound resources.
    fn render(&self) -> Result<(), CompositorError>;

    /// Releases every GPU resource owned by this backend. Called on
    /// Controller shutdown and before backend replacement.
    fn teardown(&self);
}

/// A no-op backend that records what it was asked to do. Used to test the
/// Compositor's render-tick orchestration without a GPU device.
#[derive(Default)]
pub struct NullBackend {
    pub uploaded_textures: std::sync::Mutex<Vec<usize>>,
    pub uploaded_luts: std::sync::Mutex<Vec<(usize, Colormap)>>,
    pub disabled_slots: std::sync::Mutex<Vec<usize>>,
    pub uniforms_written: std::sync::Mutex<Vec<CompositorUniform>>,
    pub render_calls: std::sync::Mutex<u32>,
    pub torn_down: std::sync::atomic::AtomicBool,
}

impl CompositorBackend for NullBackend {
    fn upload_texture(&self, slot: usize, _bitmap: &DecodedBitmap) -> Result<(), CompositorError> {
        self.uploaded_textures.lock().unwrap().push(slot);
        Ok(())
    }

    fn upload_lut(&self, slot: usize, colormap: Colormap) -> Result<(), CompositorError> {
        self.uploaded_luts.lock().unwrap().push((slot, colormap));
        Ok(())
    }

    fn disable_slot(&self, slot: usize) -> Result<(), CompositorError> {
        self.disabled_slots.lock().unwrap().push(slot);
        Ok(())
    }

    fn write_uniform(&self, uniform: &CompositorUniform) -> Result<(), CompositorError> {
        self.uniforms_written.lock().unwrap().push(*uniform);
        Ok(())
    }

    fn render(&self) -> Result<(), CompositorError> {
        *self.render_calls.lock().unwrap() += 1;
        Ok(())
    }

    fn teardown(&self) {
        self.torn_down.store(true, std::sync::atomic::Ordering::SeqCst);
    }
}
