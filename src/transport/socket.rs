//! Platform socket glue.
//!
//! The rest of the transport (topic routing, framing, reconnect ladder) is
//! platform-independent and talks only to an [`InboundMessage`]/
//! [`OutboundMessage`] channel pair. This module is the only place that
//! differs between a native build (`tokio-tungstenite`) and a browser build
//! (`web-sys`'s `WebSocket`), isolating platform-specific socket glue
//! behind a narrow interface.

use tokio::sync::mpsc;

use crate::errors::TransportError;

/// A message arriving from the socket, handed to the transport's receive
/// loop in arrival order.
#[derive(Debug)]
pub enum InboundMessage {
    Text(String),
    Binary(Vec<u8>),
    /// The socket closed, cleanly or otherwise.
    Closed,
    /// A socket-level error occurred; the caller still expects a following
    /// `Closed` to drive reconnection.
    Error(String),
}

/// A message the transport wants sent. Outbound traffic is always JSON text
/// per the wire protocol, but `Close` lets the caller request a clean
/// shutdown of the underlying connection.
#[derive(Debug)]
pub enum OutboundMessage {
    Text(String),
    Close,
}

/// The pair of channels a connected socket hands back: `outbound_tx` is used
/// to send messages out; `inbound_rx` yields messages as they arrive.
pub struct SocketHandle {
    pub outbound_tx: mpsc::UnboundedSender<OutboundMessage>,
    pub inbound_rx: mpsc::UnboundedReceiver<InboundMessage>,
}

#[cfg(feature = "native-transport")]
pub async fn connect(url: &str) -> Result<SocketHandle, TransportError> {
    use futures_util::{SinkExt, StreamExt};
    use tokio_tungstenite::tungstenite::Message as WsMessage;

    let (ws_stream, _response) = tokio_tungstenite::connect_async(url)
        .await
        .map_err(|e| TransportError::Socket(e.to_string()))?;
    let (mut write, mut read) = ws_stream.split();

    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<OutboundMessage>();
    let (inbound_tx, inbound_rx) = mpsc::unbounded_channel::<InboundMessage>();

    tokio::spawn(async move {
        loop {
            tokio::select! {
                outbound = outbound_rx.recv() => {
                    match outbound {
                        Some(OutboundMessage::Text(text)) => {
                            if write.send(WsMessage::Text(text.into())).await.is_err() {
                                break;
                            }
                        }
                        Some(OutboundMessage::Close) | None => {
                            let _ = write.send(WsMessage::Close(None)).await;
                            break;
                        }
                    }
                }
                inbound = read.next() => {
                    match inbound {
                        Some(Ok(WsMessage::Text(text))) => {
                            let _ = inbound_tx.send(InboundMessage::Text(text.to_string()));
                        }
                        Some(Ok(WsMessage::Binary(bytes))) => {
                            let _ = inbound_tx.send(InboundMessage::Binary(bytes.to_vec()));
                        }
                        Some(Ok(WsMessage::Close(_))) => {
                            let _ = inbound_tx.send(InboundMessage::Closed);
                            break;
                        }
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            let _ = inbound_tx.send(InboundMessage::Error(e.to_string()));
                        }
                        None => {
                            let _ = inbound_tx.send(InboundMessage::Closed);
                            break;
                        }
                    }
                }
            }
        }
    });

    Ok(SocketHandle {
        outbound_tx,
        inbound_rx,
    })
}

#[cfg(feature = "wasm")]
pub mod wasm_socket {
    //! Browser binding: wraps `web_sys::WebSocket`'s event callbacks into the
    //! same `SocketHandle` channel pair the native transport produces, so
    //! everything above this module stays platform-neutral.

    use super::{InboundMessage, OutboundMessage, SocketHandle};
    use crate::errors::TransportError;
    use wasm_bindgen::closure::Closure;
    use wasm_bindgen::JsCast;
    use web_sys::{BinaryType, CloseEvent, ErrorEvent, MessageEvent, WebSocket};

    pub fn connect(url: &str) -> Result<SocketHandle, TransportError> {
        let ws = WebSocket::new(url).map_err(|e| TransportError::Socket(format!("{e:?}")))?;
        ws.set_binary_type(BinaryType::Arraybuffer);

        let (outbound_tx, mut outbound_rx) = tokio::sync::mpsc::unbounded_channel::<OutboundMessage>();
        let (inbound_tx, inbound_rx) = tokio::sync::mpsc::unbounded_channel::<InboundMessage>();

        let onmessage_tx = inbound_tx.clone();
        let onmessage = Closure::<dyn FnMut(MessageEvent)>::new(move |event: MessageEvent| {
            if let Some(text) = event.data().as_string() {
                let _ = onmessage_tx.send(InboundMessage::Text(text));
            } else {
                let buf = event.data().dyn_into::<js_sys::ArrayBuffer>();
                if let Ok(buf) = buf {
                    let array = js_sys::Uint8Array::new(&buf);
                    let mut bytes = vec![0u8; array.length() as usize];
                    array.copy_to(&mut bytes);
                    let _ = onmessage_tx.send(InboundMessage::Binary(bytes));
                }
            }
        });
        ws.set_onmessage(Some(onmessage.as_ref().unchecked_ref()));
        onmessage.forget();

        let onclose_tx = inbound_tx.clone();
        let onclose = Closure::<dyn FnMut(CloseEvent)>::new(move |_event: CloseEvent| {
            let _ = onclose_tx.send(InboundMessage::Closed);
        });
        ws.set_onclose(Some(onclose.as_ref().unchecked_ref()));
        onclose.forget();

        let onerror_tx = inbound_tx.clone();
        let onerror = Closure::<dyn FnMut(ErrorEvent)>::new(move |event: ErrorEvent| {
            let _ = onerror_tx.send(InboundMessage::Error(event.message()));
        });
        ws.set_onerror(Some(onerror.as_ref().unchecked_ref()));
        onerror.forget();

        let pump_ws = ws.clone();
        wasm_bindgen_futures::spawn_local(async move {
            while let Some(outbound) = outbound_rx.recv().await {
                match outbound {
                    OutboundMessage::Text(text) => {
                        let _ = pump_ws.send_with_str(&text);
                    }
                    OutboundMessage::Close => {
                        let _ = pump_ws.close();
                        break;
                    }
                }
            }
        });

        Ok(SocketHandle {
            outbound_tx,
            inbound_rx,
        })
    }
}
