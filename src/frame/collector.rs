//! Per-channel store of the latest original and cropped frames.

use std::sync::Mutex;

use super::types::{Crop, FrameData, FrameSet};

/// Maintains exactly two frame arrays of length `max_channels`: the latest
/// "original" (crop == {0,0,0}) and latest "cropped" (crop != {0,0,0})
/// frame seen per channel. Old bitmaps are dropped (released) automatically
/// when replaced.
pub struct FrameCollector {
    max_channels: usize,
    original_frames: Mutex<Vec<Option<FrameData>>>,
    cropped_frames: Mutex<Vec<Option<FrameData>>>,
}

impl FrameCollector {
    pub fn new(max_channels: usize) -> Self {
        Self {
            max_channels,
            original_frames: Mutex::new(vec![None; max_channels].into_iter().collect()),
            cropped_frames: Mutex::new((0..max_channels).map(|_| None).collect()),
        }
    }

    pub fn max_channels(&self) -> usize {
        self.max_channels
    }

    /// Stores `frame` for `channel_idx` in the original or cropped array
    /// depending on its crop. Replacing an entry drops the previous
    /// `FrameData`, releasing its bitmap.
    pub fn collect_frame(&self, channel_idx: usize, frame: FrameData) {
        if channel_idx >= self.max_channels {
            log::warn!("dropping frame for out-of-range channel {channel_idx}");
            return;
        }
        if frame.is_original() {
            self.original_frames.lock().unwrap()[channel_idx] = Some(frame);
        } else {
            self.cropped_frames.lock().unwrap()[channel_idx] = Some(frame);
        }
    }

    /// Selection rule: prefer a consistent cropped set matching
    /// `desired_crop` with every required channel present; else fall back
    /// to the original set if every required channel has one; else `None`.
    pub fn get_latest_frames(&self, desired_crop: Crop, required: &[usize]) -> Option<FrameSet> {
        if !desired_crop.is_original() {
            if let Some(set) = self.try_cropped_set(desired_crop, required) {
                return Some(set);
            }
        }
        self.try_original_set(required)
    }

    fn try_cropped_set(&self, desired_crop: Crop, required: &[usize]) -> Option<FrameSet> {
        let cropped = self.cropped_frames.lock().unwrap();

        let mut shared_crop: Option<Crop> = None;
        for frame in cropped.iter().flatten() {
            match shared_crop {
                None => shared_crop = Some(frame.info.crop),
                Some(c) if c.approx_eq(&frame.info.crop) => {}
                Some(_) => return None, // inconsistent buffer; fall back.
            }
        }
        let shared_crop = shared_crop?;
        if !shared_crop.approx_eq(&desired_crop) {
            return None;
        }
        if required.iter().any(|&i| cropped[i].is_none()) {
            return None;
        }

        Some(FrameSet {
            crop: shared_crop,
            frames: cropped.clone(),
        })
    }

    fn try_original_set(&self, required: &[usize]) -> Option<FrameSet> {
        let original = self.original_frames.lock().unwrap();
        if required.iter().any(|&i| original[i].is_none()) {
            return None;
        }
        Some(FrameSet {
            crop: Crop::ORIGINAL,
            frames: original.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::frame_format::{DecodedBitmap, FrameFormat, IntensityRange, PreviewFrameInfo};

    fn frame(crop: Crop, frame_idx: u64) -> FrameData {
        FrameData {
            info: PreviewFrameInfo {
                frame_idx,
                preview_width: 256,
                preview_height: 256,
                full_width: 2048,
                full_height: 2048,
                crop,
                intensity: IntensityRange { min: 0.0, max: 1.0 },
                fmt: FrameFormat::Jpeg,
            },
            bitmap: DecodedBitmap {
                width: 256,
                height: 256,
                rgba: vec![0; 256 * 256 * 4],
            },
        }
    }

    #[test]
    fn s3_frame_selection_under_pan() {
        let collector = FrameCollector::new(2);
        collector.collect_frame(0, frame(Crop::ORIGINAL, 1));
        collector.collect_frame(1, frame(Crop::ORIGINAL, 1));

        let user_crop = Crop { x: 0.1, y: 0.1, k: 0.2 };
        collector.collect_frame(0, frame(user_crop, 2));
        collector.collect_frame(1, frame(user_crop, 2));

        // pan/zoom inactive: desired crop is the user crop -> cropped set.
        let set = collector.get_latest_frames(user_crop, &[0, 1]).unwrap();
        assert!(set.crop.approx_eq(&user_crop));

        // pointer-down: render loop asks for {0,0,0} -> original set.
        let set = collector.get_latest_frames(Crop::ORIGINAL, &[0, 1]).unwrap();
        assert!(set.crop.is_original());
    }

    #[test]
    fn inconsistent_cropped_buffer_falls_back_to_original() {
        let collector = FrameCollector::new(2);
        collector.collect_frame(0, frame(Crop::ORIGINAL, 1));
        collector.collect_frame(1, frame(Crop::ORIGINAL, 1));

        collector.collect_frame(0, frame(Crop { x: 0.1, y: 0.1, k: 0.2 }, 2));
        collector.collect_frame(1, frame(Crop { x: 0.3, y: 0.3, k: 0.4 }, 2));

        let set = collector
            .get_latest_frames(Crop { x: 0.1, y: 0.1, k: 0.2 }, &[0, 1])
            .unwrap();
        assert!(set.crop.is_original());
    }

    #[test]
    fn missing_required_channel_returns_none() {
        let collector = FrameCollector::new(2);
        collector.collect_frame(0, frame(Crop::ORIGINAL, 1));
        // channel 1 never arrives.
        assert!(collector.get_latest_frames(Crop::ORIGINAL, &[0, 1]).is_none());
    }

    #[test]
    fn replacing_a_frame_drops_the_previous_bitmap() {
        let collector = FrameCollector::new(1);
        collector.collect_frame(0, frame(Crop::ORIGINAL, 1));
        collector.collect_frame(0, frame(Crop::ORIGINAL, 2));
        let set = collector.get_latest_frames(Crop::ORIGINAL, &[0]).unwrap();
        assert_eq!(set.frames[0].as_ref().unwrap().info.frame_idx, 2);
    }
}
