//! std140-style uniform buffer layout for the compositor shader.

use bytemuck::{Pod, Zeroable};

use crate::frame::types::Crop;

/// Upper bound on preview channels a compositor instance can bind, matching
/// [`crate::config::ControllerConfig`]'s `max_channels` range. The bind
/// group layout is allocated at this width regardless of how many channels
/// a given configuration actually uses, so unused slots simply stay
/// disabled rather than resizing the layout.
pub const MAX_CHANNELS: usize = 8;

/// Per-channel uniform state: intensity window and display flags.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ChannelUniform {
    pub min: f32,
    pub max: f32,
    pub apply_lut: u32,
    pub enabled: u32,
}

impl ChannelUniform {
    pub const DISABLED: ChannelUniform = ChannelUniform {
        min: 0.0,
        max: 1.0,
        apply_lut: 0,
        enabled: 0,
    };
}

/// The difference between the user's intended crop and the crop baked into
/// the currently-displayed frame set, applied in the shader as a digital
/// pan/zoom.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct DeltaCrop {
    pub x: f32,
    pub y: f32,
    pub k: f32,
    pub _pad: f32,
}

/// `delta_crop = user_crop - frame_set_crop`, per S4.
pub fn delta_crop(user_crop: Crop, frame_set_crop: Crop) -> DeltaCrop {
    DeltaCrop {
        x: (user_crop.x - frame_set_crop.x) as f32,
        y: (user_crop.y - frame_set_crop.y) as f32,
        k: (user_crop.k - frame_set_crop.k) as f32,
        _pad: 0.0,
    }
}

/// Whole-buffer layout: `{delta_crop, display_mode, active_count, _pad0,
/// _pad1, channels[MAX_CHANNELS]}`. Size is `32 + 16*MAX_CHANNELS` bytes.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct CompositorUniform {
    pub delta_crop: DeltaCrop,
    pub display_mode: u32,
    pub active_count: u32,
    pub _pad0: u32,
    pub _pad1: u32,
    pub channels: [ChannelUniform; MAX_CHANNELS],
}

impl CompositorUniform {
    pub fn zeroed_disabled() -> Self {
        Self {
            delta_crop: DeltaCrop { x: 0.0, y: 0.0, k: 0.0, _pad: 0.0 },
            display_mode: 0,
            active_count: 0,
            _pad0: 0,
            _pad1: 0,
            channels: [ChannelUniform::DISABLED; MAX_CHANNELS],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn s4_delta_uniform() {
        let user = Crop { x: 0.3, y: 0.2, k: 0.1 };
        let frame_set = Crop { x: 0.2, y: 0.1, k: 0.1 };
        let delta = delta_crop(user, frame_set);
        assert!((delta.x - 0.1).abs() < 1e-6);
        assert!((delta.y - 0.1).abs() < 1e-6);
        assert!((delta.k - 0.0).abs() < 1e-6);
    }

    #[test]
    fn buffer_size_matches_spec_formula() {
        assert_eq!(
            std::mem::size_of::<CompositorUniform>(),
            32 + 16 * MAX_CHANNELS
        );
    }

    #[test]
    fn disabled_channel_has_zero_enabled_flag() {
        assert_eq!(ChannelUniform::DISABLED.enabled, 0);
    }
}
