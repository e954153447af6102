//! The public Transport: one multiplexed WebSocket with topic routing,
//! reconnection, and hybrid JSON/binary framing.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use serde::Serialize;
use tokio::sync::mpsc;

use crate::config::TransportConfig;
use crate::errors::TransportError;
use crate::reactive::Observable;

use super::dispatch::{Dispatcher, Subscription};
use super::envelope::{parse_binary_frame, parse_text_frame, JsonEnvelope, Payload};
use super::frame_format::{decode_bitmap, parse_packed_payload, FrameFormat};
use super::reconnect::{ReconnectDecision, ReconnectLadder};
use super::socket::{self, InboundMessage, OutboundMessage, SocketHandle};

/// Connection lifecycle state, exposed as an observable so UI can bind to it
/// directly rather than polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
}

struct Outbound {
    tx: mpsc::UnboundedSender<OutboundMessage>,
}

pub struct Transport {
    config: TransportConfig,
    dispatcher: Arc<Dispatcher>,
    is_connected: Observable<bool>,
    status_message: Observable<String>,
    connection_state: Observable<ConnectionState>,
    outbound: Mutex<Option<Outbound>>,
    auto_reconnect: Mutex<bool>,
    url: Mutex<Option<String>>,
    generation: Mutex<u64>,
    warned_uint16_channels: Mutex<HashSet<String>>,
}

impl Transport {
    pub fn new(config: TransportConfig) -> Arc<Self> {
        let auto_reconnect = config.auto_reconnect;
        Arc::new(Self {
            config,
            dispatcher: Arc::new(Dispatcher::new()),
            is_connected: Observable::new(false),
            status_message: Observable::new(String::new()),
            connection_state: Observable::new(ConnectionState::Disconnected),
            outbound: Mutex::new(None),
            auto_reconnect: Mutex::new(auto_reconnect),
            url: Mutex::new(None),
            generation: Mutex::new(0),
            warned_uint16_channels: Mutex::new(HashSet::new()),
        })
    }

    pub fn is_connected(&self) -> Observable<bool> {
        self.is_connected.clone()
    }

    pub fn status_message(&self) -> Observable<String> {
        self.status_message.clone()
    }

    pub fn connection_state(&self) -> Observable<ConnectionState> {
        self.connection_state.clone()
    }

    pub fn on_connection_change(&self, handler: impl Fn(&bool) + Send + Sync + 'static) {
        self.is_connected.subscribe(handler);
    }

    pub fn on_error(&self, handler: impl Fn(&str, &str) + Send + Sync + 'static) {
        self.dispatcher.on_error(handler);
    }

    pub fn subscribe(
        self: &Arc<Self>,
        pattern: impl Into<String>,
        handler: impl Fn(&str, &Payload) -> Result<(), String> + Send + Sync + 'static,
    ) -> Subscription {
        self.dispatcher.subscribe(pattern, handler)
    }

    /// Opens the socket and, on success, starts the receive loop. On
    /// failure or a later unexpected close, the reconnect ladder takes over
    /// as long as `auto_reconnect` remains enabled.
    #[cfg(feature = "native-transport")]
    pub async fn connect(self: &Arc<Self>, url: impl Into<String>) -> Result<(), TransportError> {
        let url = url.into();
        *self.url.lock().unwrap() = Some(url.clone());
        *self.auto_reconnect.lock().unwrap() = self.config.auto_reconnect;
        let generation = {
            let mut g = self.generation.lock().unwrap();
            *g += 1;
            *g
        };

        self.connection_state.set(ConnectionState::Connecting);
        self.status_message.set(format!("connecting to {url}"));

        let handle = socket::connect(&url).await;
        self.handle_open_result(handle, generation).await
    }

    #[cfg(feature = "native-transport")]
    async fn handle_open_result(
        self: &Arc<Self>,
        handle: Result<SocketHandle, TransportError>,
        generation: u64,
    ) -> Result<(), TransportError> {
        match handle {
            Ok(socket_handle) => {
                self.on_open(socket_handle, generation);
                Ok(())
            }
            Err(e) => {
                self.on_close_or_failure(generation);
                Err(e)
            }
        }
    }

    fn on_open(self: &Arc<Self>, socket_handle: SocketHandle, generation: u64) {
        *self.outbound.lock().unwrap() = Some(Outbound {
            tx: socket_handle.outbound_tx,
        });
        self.is_connected.set(true);
        self.connection_state.set(ConnectionState::Connected);
        self.status_message.set("connected".to_string());

        let this = self.clone();
        tokio::spawn(async move {
            this.run_receive_loop(socket_handle.inbound_rx, generation).await;
        });
    }

    async fn run_receive_loop(
        self: Arc<Self>,
        mut inbound_rx: mpsc::UnboundedReceiver<InboundMessage>,
        generation: u64,
    ) {
        while let Some(message) = inbound_rx.recv().await {
            match message {
                InboundMessage::Text(text) => self.handle_text(&text),
                InboundMessage::Binary(bytes) => self.handle_binary(&bytes),
                InboundMessage::Error(msg) => {
                    log::warn!("transport socket error: {msg}");
                }
                InboundMessage::Closed => {
                    self.on_close_or_failure(generation);
                    break;
                }
            }
        }
    }

    fn handle_text(self: &Arc<Self>, text: &str) {
        match parse_text_frame(text) {
            Ok(JsonEnvelope { topic, payload }) => {
                self.dispatcher.dispatch(&topic, &Payload::Json(payload));
            }
            Err(e) => log::warn!("dropping malformed text frame: {e}"),
        }
    }

    fn handle_binary(self: &Arc<Self>, bytes: &[u8]) {
        let (header, packed) = match parse_binary_frame(bytes) {
            Ok(v) => v,
            Err(e) => {
                log::warn!("dropping malformed binary frame: {e}");
                return;
            }
        };
        let (info, data) = match parse_packed_payload(packed) {
            Ok(v) => v,
            Err(e) => {
                log::warn!("dropping malformed packed payload: {e}");
                return;
            }
        };

        if info.fmt == FrameFormat::Uint16 {
            let mut warned = self.warned_uint16_channels.lock().unwrap();
            if warned.insert(header.channel.clone()) {
                log::warn!(
                    "channel {} sent an unsupported uint16 frame; dropping silently from now on",
                    header.channel
                );
            }
            return;
        }

        match decode_bitmap(&info, data) {
            Ok(bitmap) => {
                let payload = Payload::Frame {
                    channel: header.channel,
                    info,
                    bitmap,
                };
                self.dispatcher.dispatch(&header.topic, &payload);
            }
            Err(e) => log::warn!("dropping frame with undecodable payload: {e}"),
        }
    }

    fn on_close_or_failure(self: &Arc<Self>, generation: u64) {
        if generation != *self.generation.lock().unwrap() {
            return; // superseded by a later connect()/reconnect.
        }
        *self.outbound.lock().unwrap() = None;
        self.is_connected.set(false);

        if !*self.auto_reconnect.lock().unwrap() {
            self.connection_state.set(ConnectionState::Disconnected);
            return;
        }

        let this = self.clone();
        tokio::spawn(async move {
            this.attempt_reconnect(generation).await;
        });
    }

    async fn attempt_reconnect(self: Arc<Self>, generation: u64) {
        let mut ladder = ReconnectLadder::new(self.config.clone());
        loop {
            if generation != *self.generation.lock().unwrap() || !*self.auto_reconnect.lock().unwrap() {
                return;
            }
            match ladder.record_failure() {
                ReconnectDecision::RetryAfter { delay_ms, attempt } => {
                    self.connection_state.set(ConnectionState::Reconnecting);
                    self.status_message
                        .set(format!("reconnecting (attempt {attempt}) in {delay_ms}ms"));
                    tokio::time::sleep(std::time::Duration::from_millis(delay_ms as u64)).await;

                    let Some(url) = self.url.lock().unwrap().clone() else {
                        return;
                    };
                    match socket::connect(&url).await {
                        Ok(socket_handle) => {
                            ladder.reset();
                            self.on_open(socket_handle, generation);
                            return;
                        }
                        Err(e) => log::warn!("reconnect attempt {attempt} failed: {e}"),
                    }
                }
                ReconnectDecision::Terminal => {
                    self.connection_state.set(ConnectionState::Disconnected);
                    self.status_message
                        .set("reconnect attempts exhausted".to_string());
                    self.dispatcher.dispatch(
                        "transport/error",
                        &Payload::Json(serde_json::json!({
                            "message": "reconnect attempts exhausted"
                        })),
                    );
                    return;
                }
            }
        }
    }

    /// Disables auto-reconnect for this session and closes the socket.
    pub fn disconnect(&self) {
        *self.auto_reconnect.lock().unwrap() = false;
        *self.generation.lock().unwrap() += 1;
        if let Some(outbound) = self.outbound.lock().unwrap().take() {
            let _ = outbound.tx.send(OutboundMessage::Close);
        }
        self.is_connected.set(false);
        self.connection_state.set(ConnectionState::Disconnected);
    }

    /// Sends `{topic, payload}` as JSON text. Outbound messages are always
    /// JSON per the wire protocol.
    pub fn send(&self, topic: &str, payload: impl Serialize) -> Result<(), TransportError> {
        let envelope = JsonEnvelope {
            topic: topic.to_string(),
            payload: serde_json::to_value(payload)?,
        };
        let text = serde_json::to_string(&envelope)?;
        let guard = self.outbound.lock().unwrap();
        let outbound = guard.as_ref().ok_or(TransportError::NotConnected)?;
        outbound
            .tx
            .send(OutboundMessage::Text(text))
            .map_err(|_| TransportError::NotConnected)
    }
}

#[cfg(all(test, feature = "native-transport"))]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn send_without_connection_errors() {
        let transport = Transport::new(TransportConfig::default());
        let err = transport.send("preview/start", serde_json::json!(null)).unwrap_err();
        assert!(matches!(err, TransportError::NotConnected));
    }

    #[test]
    fn dispatch_fanout_through_handle_text() {
        let transport = Transport::new(TransportConfig::default());
        let calls = Arc::new(AtomicUsize::new(0));
        let c = calls.clone();
        let _sub = transport.subscribe("preview/frame", move |_, _| {
            c.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        transport.handle_text(r#"{"topic":"preview/frame","payload":42}"#);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn uint16_binary_frame_is_dropped_and_warned_once() {
        use crate::transport::frame_format::{IntensityRange, PreviewFrameInfo};
        use crate::frame::types::Crop;

        let transport = Transport::new(TransportConfig::default());
        let calls = Arc::new(AtomicUsize::new(0));
        let c = calls.clone();
        let _sub = transport.subscribe("preview/frame", move |_, _| {
            c.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        let info = PreviewFrameInfo {
            frame_idx: 1,
            preview_width: 4,
            preview_height: 4,
            full_width: 4,
            full_height: 4,
            crop: Crop::ORIGINAL,
            intensity: IntensityRange { min: 0.0, max: 1.0 },
            fmt: FrameFormat::Uint16,
        };
        let mut packed = serde_json::to_vec(&info).unwrap();
        packed.push(b'\n');
        packed.extend_from_slice(&[0u8; 8]);

        let mut bytes = serde_json::to_vec(&serde_json::json!({
            "topic": "preview/frame",
            "channel": "green",
        }))
        .unwrap();
        bytes.push(b'\n');
        bytes.extend_from_slice(&packed);

        transport.handle_binary(&bytes);
        transport.handle_binary(&bytes);

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(transport.warned_uint16_channels.lock().unwrap().len(), 1);
    }
}
