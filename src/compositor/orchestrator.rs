//! Backend-agnostic render-tick orchestration.
//!
//! This is the part of 4.4's render loop that has no GPU calls in it:
//! picking the desired crop, asking the Collector for a frame set, deciding
//! what to upload, and computing the uniform. [`TickOrchestrator::tick`]
//! takes a [`CompositorBackend`] trait object so it is fully exercised by
//! [`super::backend::NullBackend`] in tests.

use crate::frame::{Crop, FrameCollector};

use super::backend::CompositorBackend;
use super::channel::{Channel, Colormap};
use super::uniform::{delta_crop, ChannelUniform, CompositorUniform, MAX_CHANNELS};

pub struct RenderTickInput<'a> {
    pub channels: &'a [Channel],
    pub user_crop: Crop,
    pub is_pan_zoom_active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderTickOutcome {
    /// A frame set was found and a render pass executed.
    Rendered,
    /// No usable frame set; the caller reschedules the next animation
    /// frame without drawing.
    Skipped,
}

pub struct TickOrchestrator;

impl TickOrchestrator {
    /// Runs one render tick against `backend` and `collector`.
    pub fn tick(
        backend: &dyn CompositorBackend,
        collector: &FrameCollector,
        input: RenderTickInput,
    ) -> RenderTickOutcome {
        let visible: Vec<usize> = input
            .channels
            .iter()
            .enumerate()
            .filter(|(_, c)| c.is_enabled())
            .map(|(i, _)| i)
            .collect();

        // While the user is actively panning/zooming, ask for the original
        // frame so the display doesn't flip between crops mid-interaction.
        let desired_crop = if input.is_pan_zoom_active {
            Crop::ORIGINAL
        } else {
            input.user_crop
        };

        let Some(frame_set) = collector.get_latest_frames(desired_crop, &visible) else {
            return RenderTickOutcome::Skipped;
        };

        for &i in &visible {
            if let Some(frame) = &frame_set.frames[i] {
                if backend.upload_texture(i, &frame.bitmap).is_err() {
                    log::warn!("failed to upload texture for channel slot {i}");
                }
            }
        }

        let mut uniform = CompositorUniform::zeroed_disabled();
        uniform.delta_crop = delta_crop(input.user_crop, frame_set.crop);
        uniform.active_count = visible.len() as u32;
        for &i in &visible {
            if i >= MAX_CHANNELS {
                continue;
            }
            let channel = &input.channels[i];
            uniform.channels[i] = ChannelUniform {
                min: channel.intensity_min,
                max: channel.intensity_max,
                apply_lut: (channel.colormap != Colormap::None) as u32,
                enabled: 1,
            };
        }

        let _ = backend.write_uniform(&uniform);
        let _ = backend.render();
        RenderTickOutcome::Rendered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compositor::backend::NullBackend;
    use crate::transport::frame_format::{DecodedBitmap, FrameFormat, IntensityRange, PreviewFrameInfo};

    fn channel_at(slot: usize, visible: bool) -> Channel {
        let mut c = Channel::empty(slot);
        if visible {
            c.assign(format!("ch{slot}"), slot);
        }
        c
    }

    fn push_frame(collector: &FrameCollector, idx: usize, crop: Crop) {
        collector.collect_frame(
            idx,
            crate::frame::FrameData {
                info: PreviewFrameInfo {
                    frame_idx: 1,
                    preview_width: 4,
                    preview_height: 4,
                    full_width: 4,
                    full_height: 4,
                    crop,
                    intensity: IntensityRange { min: 0.0, max: 1.0 },
                    fmt: FrameFormat::Jpeg,
                },
                bitmap: DecodedBitmap { width: 4, height: 4, rgba: vec![0; 64] },
            },
        );
    }

    #[test]
    fn s4_render_tick_writes_delta_uniform() {
        let collector = FrameCollector::new(2);
        let frame_set_crop = Crop { x: 0.2, y: 0.1, k: 0.1 };
        push_frame(&collector, 0, frame_set_crop);
        push_frame(&collector, 1, frame_set_crop);

        let channels = vec![channel_at(0, true), channel_at(1, true)];
        let backend = NullBackend::default();
        let outcome = TickOrchestrator::tick(
            &backend,
            &collector,
            RenderTickInput {
                channels: &channels,
                user_crop: Crop { x: 0.3, y: 0.2, k: 0.1 },
                is_pan_zoom_active: false,
            },
        );

        assert_eq!(outcome, RenderTickOutcome::Rendered);
        let uniforms = backend.uniforms_written.lock().unwrap();
        let delta = uniforms.last().unwrap().delta_crop;
        assert!((delta.x - 0.1).abs() < 1e-6);
        assert!((delta.y - 0.1).abs() < 1e-6);
        assert!((delta.k - 0.0).abs() < 1e-6);
    }

    #[test]
    fn no_frame_set_skips_render() {
        let collector = FrameCollector::new(2);
        let channels = vec![channel_at(0, true), channel_at(1, true)];
        let backend = NullBackend::default();
        let outcome = TickOrchestrator::tick(
            &backend,
            &collector,
            RenderTickInput {
                channels: &channels,
                user_crop: Crop::ORIGINAL,
                is_pan_zoom_active: false,
            },
        );
        assert_eq!(outcome, RenderTickOutcome::Skipped);
        assert_eq!(*backend.render_calls.lock().unwrap(), 0);
    }

    #[test]
    fn pan_zoom_active_requests_original_regardless_of_user_crop() {
        let collector = FrameCollector::new(1);
        push_frame(&collector, 0, Crop::ORIGINAL);

        let channels = vec![channel_at(0, true)];
        let backend = NullBackend::default();
        let outcome = TickOrchestrator::tick(
            &backend,
            &collector,
            RenderTickInput {
                channels: &channels,
                user_crop: Crop { x: 0.1, y: 0.1, k: 0.3 },
                is_pan_zoom_active: true,
            },
        );
        assert_eq!(outcome, RenderTickOutcome::Rendered);
    }

    #[test]
    fn invisible_channels_are_not_uploaded() {
        let collector = FrameCollector::new(2);
        push_frame(&collector, 0, Crop::ORIGINAL);
        push_frame(&collector, 1, Crop::ORIGINAL);

        let channels = vec![channel_at(0, true), channel_at(1, false)];
        let backend = NullBackend::default();
        TickOrchestrator::tick(
            &backend,
            &collector,
            RenderTickInput {
                channels: &channels,
                user_crop: Crop::ORIGINAL,
                is_pan_zoom_active: false,
            },
        );
        assert_eq!(*backend.uploaded_textures.lock().unwrap(), vec![0]);
    }
}
