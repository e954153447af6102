//! Orchestrates the Transport, Frame Collector, and channel/crop state that
//! the Compositor reads every render tick.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::ControllerConfig;
use crate::errors::TransportError;
use crate::frame::{Crop, FrameCollector, FrameData};
use crate::reactive::Observable;
use crate::transport::{Payload, Subscription, Transport};

use super::crop_math::{max_k_for, pan, zoom};
use super::debounce::Debouncer;
use crate::compositor::{Channel, CompositorBackend};

#[derive(Debug, Deserialize)]
struct PreviewStatusPayload {
    #[serde(default)]
    channels: Vec<String>,
}

#[derive(Debug, Serialize)]
struct LevelsPayload<'a> {
    channel: &'a str,
    min: f32,
    max: f32,
}

struct PanState {
    start_crop: Crop,
    start_x: f64,
    start_y: f64,
}

const CROP_DEBOUNCE_KEY: &str = "crop";

/// Owns channel slots, crop, and pan/zoom interaction state; the single
/// writer for everything the Compositor's render tick reads.
pub struct PreviewController {
    config: ControllerConfig,
    transport: Arc<Transport>,
    collector: Arc<FrameCollector>,
    channels: Mutex<Vec<Channel>>,
    crop: Observable<Crop>,
    is_previewing: Observable<bool>,
    is_pan_zoom_active: Observable<bool>,
    status_message: Observable<String>,
    pan_state: Mutex<Option<PanState>>,
    wheel_idle_task: Mutex<Option<tokio::task::JoinHandle<()>>>,
    debouncer: Debouncer<String>,
    subscriptions: Mutex<Vec<Subscription>>,
    backend: Mutex<Option<Arc<dyn CompositorBackend>>>,
}

impl PreviewController {
    pub fn new(config: ControllerConfig, transport: Arc<Transport>) -> Arc<Self> {
        let max_channels = config.max_channels as usize;
        let debounce_delay_ms = config.debounce_delay_ms;
        Arc::new(Self {
            config,
            collector: Arc::new(FrameCollector::new(max_channels)),
            channels: Mutex::new((0..max_channels).map(Channel::empty).collect()),
            crop: Observable::new(Crop::ORIGINAL),
            is_previewing: Observable::new(false),
            is_pan_zoom_active: Observable::new(false),
            status_message: Observable::new(String::new()),
            pan_state: Mutex::new(None),
            wheel_idle_task: Mutex::new(None),
            debouncer: Debouncer::new(debounce_delay_ms),
            subscriptions: Mutex::new(Vec::new()),
            backend: Mutex::new(None),
            transport,
        })
    }

    /// Attaches the render backend this controller drives. Channel state
    /// already assigned before this call is synced to the backend
    /// immediately so LUTs/disabled slots aren't silently stale.
    pub fn attach_backend(&self, backend: Arc<dyn CompositorBackend>) {
        *self.backend.lock().unwrap() = Some(backend);
        let max_channels = self.config.max_channels as usize;
        for slot in 0..max_channels {
            self.sync_backend_slot(slot);
        }
    }

    /// Pushes slot `slot`'s current colormap/visibility to the attached
    /// backend, if any: `upload_lut` when enabled, `disable_slot` otherwise.
    /// Re-enabling a slot always re-uploads the LUT, since the backend's
    /// `disable_slot` may have blanked the slot's textures.
    fn sync_backend_slot(&self, slot: usize) {
        let Some(backend) = self.backend.lock().unwrap().clone() else {
            return;
        };
        let channel = self.channels.lock().unwrap()[slot].clone();
        let result = if channel.is_enabled() {
            backend.upload_lut(slot, channel.colormap)
        } else {
            backend.disable_slot(slot)
        };
        if let Err(e) = result {
            log::warn!("failed to sync backend slot {slot}: {e}");
        }
    }

    pub fn collector(&self) -> Arc<FrameCollector> {
        self.collector.clone()
    }

    pub fn channels_snapshot(&self) -> Vec<Channel> {
        self.channels.lock().unwrap().clone()
    }

    pub fn crop(&self) -> Observable<Crop> {
        self.crop.clone()
    }

    pub fn is_previewing(&self) -> Observable<bool> {
        self.is_previewing.clone()
    }

    pub fn is_pan_zoom_active(&self) -> Observable<bool> {
        self.is_pan_zoom_active.clone()
    }

    pub fn status_message(&self) -> Observable<String> {
        self.status_message.clone()
    }

    /// Wires the `preview/status` and `preview/frame` subscriptions. Does
    /// not itself connect the transport — call [`Transport::connect`]
    /// separately.
    pub fn init(self: &Arc<Self>) {
        let this = self.clone();
        let status_sub = self.transport.subscribe("preview/status", move |_, payload| {
            this.handle_status(payload);
            Ok(())
        });

        let this = self.clone();
        let frame_sub = self.transport.subscribe("preview/frame", move |_, payload| {
            this.handle_frame(payload);
            Ok(())
        });

        let mut subs = self.subscriptions.lock().unwrap();
        subs.push(status_sub);
        subs.push(frame_sub);
    }

    /// Stops preview, clears channel state, and drops subscriptions. Does
    /// not disconnect the transport — callers that own the transport's
    /// lifetime decide that separately.
    pub fn shutdown(&self) {
        self.is_previewing.set(false);
        let max_channels = self.config.max_channels as usize;
        *self.channels.lock().unwrap() = (0..max_channels).map(Channel::empty).collect();
        self.subscriptions.lock().unwrap().clear();
        if let Some(task) = self.wheel_idle_task.lock().unwrap().take() {
            task.abort();
        }
    }

    fn handle_status(&self, payload: &Payload) {
        let Payload::Json(value) = payload else { return };
        let Ok(status) = serde_json::from_value::<PreviewStatusPayload>(value.clone()) else {
            log::warn!("malformed preview/status payload");
            return;
        };

        let max_channels = self.config.max_channels as usize;
        let mut channels = self.channels.lock().unwrap();
        let assign_count = status.channels.len().min(max_channels);

        for i in 0..max_channels {
            if i < assign_count {
                channels[i].assign(status.channels[i].clone(), i);
            } else {
                channels[i].dispose(i);
            }
        }
        drop(channels);

        for i in 0..max_channels {
            self.sync_backend_slot(i);
        }
    }

    fn handle_frame(&self, payload: &Payload) {
        let Payload::Frame { channel, info, bitmap } = payload else {
            return;
        };
        let channels = self.channels.lock().unwrap();
        let Some(slot) = channels.iter().position(|c| c.name.as_deref() == Some(channel.as_str())) else {
            return;
        };
        drop(channels);

        self.collector.collect_frame(
            slot,
            FrameData {
                info: info.clone(),
                bitmap: bitmap.clone(),
            },
        );
        self.channels.lock().unwrap()[slot].latest_frame_info = Some(info.clone());
    }

    pub fn start_preview(&self) -> Result<(), TransportError> {
        self.transport.send("preview/start", serde_json::Value::Null)?;
        self.is_previewing.set(true);
        Ok(())
    }

    pub fn stop_preview(&self) -> Result<(), TransportError> {
        self.transport.send("preview/stop", serde_json::Value::Null)?;
        self.is_previewing.set(false);
        Ok(())
    }

    pub fn set_channel_intensity(&self, name: &str, min: f32, max: f32) {
        let slot = {
            let mut channels = self.channels.lock().unwrap();
            let Some(slot) = channels.iter().position(|c| c.name.as_deref() == Some(name)) else {
                return;
            };
            channels[slot].intensity_min = min;
            channels[slot].intensity_max = max;
            slot
        };
        let _ = slot;

        let transport = self.transport.clone();
        let name = name.to_string();
        let key = format!("channel:{name}");
        self.debouncer.schedule(key, move || {
            let payload = LevelsPayload { channel: &name, min, max };
            if let Err(e) = transport.send("preview/levels", payload) {
                log::warn!("failed to publish preview/levels for {name}: {e}");
            }
        });
    }

    pub fn set_channel_colormap(&self, name: &str, colormap: crate::compositor::Colormap) {
        let slot = {
            let mut channels = self.channels.lock().unwrap();
            let Some(slot) = channels.iter().position(|c| c.name.as_deref() == Some(name)) else {
                return;
            };
            channels[slot].colormap = colormap;
            slot
        };
        self.sync_backend_slot(slot);
    }

    pub fn set_channel_visibility(&self, name: &str, visible: bool) {
        let slot = {
            let mut channels = self.channels.lock().unwrap();
            let Some(slot) = channels.iter().position(|c| c.name.as_deref() == Some(name)) else {
                return;
            };
            channels[slot].visible = visible;
            slot
        };
        self.sync_backend_slot(slot);
    }

    pub fn reset_crop(&self) {
        self.crop.set(Crop::ORIGINAL);
        self.publish_crop_debounced();
    }

    pub fn pointer_down(&self, x: f64, y: f64) {
        let current = self.crop.get();
        *self.pan_state.lock().unwrap() = Some(PanState {
            start_crop: current,
            start_x: x,
            start_y: y,
        });
        self.is_pan_zoom_active.set(true);
    }

    pub fn pointer_move(&self, x: f64, y: f64) {
        let Some(state) = self.pan_state.lock().unwrap().as_ref().map(|s| (s.start_crop, s.start_x, s.start_y)) else {
            return;
        };
        let (start_crop, start_x, start_y) = state;
        let dx = x - start_x;
        let dy = y - start_y;
        self.crop.set(pan(start_crop, dx, dy));
    }

    pub fn pointer_up(&self) {
        *self.pan_state.lock().unwrap() = None;
        self.is_pan_zoom_active.set(false);
        self.publish_crop_debounced();
    }

    /// `full_width`/`preview_width` come from the channel's most recently
    /// seen frame info; pass 0 if unknown to fall back to `DEFAULT_MAX_K`.
    pub fn wheel(self: &Arc<Self>, delta_y: f64, mouse: (f64, f64), preview_width: u32, full_width: u32) {
        let max_k = max_k_for(preview_width, full_width);
        let current = self.crop.get();
        self.crop.set(zoom(current, delta_y, mouse, max_k));
        self.is_pan_zoom_active.set(true);
        self.publish_crop_debounced();
        self.reschedule_wheel_idle_clear();
    }

    fn reschedule_wheel_idle_clear(self: &Arc<Self>) {
        if let Some(task) = self.wheel_idle_task.lock().unwrap().take() {
            task.abort();
        }
        let this = self.clone();
        let delay = Duration::from_millis(self.config.wheel_idle_delay_ms.max(0) as u64);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            this.is_pan_zoom_active.set(false);
        });
        *self.wheel_idle_task.lock().unwrap() = Some(handle);
    }

    fn publish_crop_debounced(&self) {
        let transport = self.transport.clone();
        let crop = self.crop.clone();
        self.debouncer.schedule(CROP_DEBOUNCE_KEY.to_string(), move || {
            let value = crop.get();
            if let Err(e) = transport.send("preview/crop", value) {
                log::warn!("failed to publish preview/crop: {e}");
            }
        });
    }
}
