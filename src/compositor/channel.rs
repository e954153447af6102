//! Preview channel slot state.

use crate::transport::frame_format::PreviewFrameInfo;

/// A color lookup table identity. `None` broadcasts the remapped intensity
/// to RGB directly; every other variant is resolved to a 256x1 LUT texture
/// by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Colormap {
    None,
    Gray,
    Fire,
    Ice,
    Rainbow,
    Turbo,
}

/// Default per-slot palette: skips the `None`/`Gray` identity entries per
/// the design notes' open question ("any deterministic ordering that skips
/// the identity entries is conformant").
const DEFAULT_PALETTE: [Colormap; 4] = [Colormap::Fire, Colormap::Ice, Colormap::Rainbow, Colormap::Turbo];

pub fn default_colormap_for_slot(slot_index: usize) -> Colormap {
    DEFAULT_PALETTE[slot_index % DEFAULT_PALETTE.len()]
}

/// One slot `[0, MAX_CHANNELS)` in the preview pipeline. Slots are
/// pre-allocated so GPU bindings stay stable across channel reassignment.
#[derive(Debug, Clone)]
pub struct Channel {
    pub name: Option<String>,
    pub visible: bool,
    pub intensity_min: f32,
    pub intensity_max: f32,
    pub colormap: Colormap,
    pub latest_frame_info: Option<PreviewFrameInfo>,
}

impl Channel {
    /// An empty, disabled slot.
    pub fn empty(slot_index: usize) -> Self {
        Self {
            name: None,
            visible: false,
            intensity_min: 0.0,
            intensity_max: 1.0,
            colormap: default_colormap_for_slot(slot_index),
            latest_frame_info: None,
        }
    }

    /// Assigns `name` to this slot, making it visible with reset intensity
    /// and a default colormap, per the Controller's channel-assignment rule.
    pub fn assign(&mut self, name: String, slot_index: usize) {
        self.name = Some(name);
        self.visible = true;
        self.intensity_min = 0.0;
        self.intensity_max = 1.0;
        self.colormap = default_colormap_for_slot(slot_index);
        self.latest_frame_info = None;
    }

    /// Disposes this slot's assignment, returning it to empty.
    pub fn dispose(&mut self, slot_index: usize) {
        *self = Self::empty(slot_index);
    }

    pub fn is_enabled(&self) -> bool {
        self.visible && self.name.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_skips_identity_entries() {
        for i in 0..8 {
            let cmap = default_colormap_for_slot(i);
            assert_ne!(cmap, Colormap::None);
            assert_ne!(cmap, Colormap::Gray);
        }
    }

    #[test]
    fn assign_resets_intensity_and_visibility() {
        let mut channel = Channel::empty(0);
        channel.intensity_min = 0.4;
        channel.visible = false;
        channel.assign("green".to_string(), 0);
        assert_eq!(channel.name.as_deref(), Some("green"));
        assert!(channel.visible);
        assert_eq!(channel.intensity_min, 0.0);
        assert_eq!(channel.intensity_max, 1.0);
    }

    #[test]
    fn dispose_clears_assignment() {
        let mut channel = Channel::empty(1);
        channel.assign("red".to_string(), 1);
        channel.dispose(1);
        assert!(channel.name.is_none());
        assert!(!channel.is_enabled());
    }
}
