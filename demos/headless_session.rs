//! Connects to a rig-control server, logs catalog bootstrap and preview
//! traffic as it arrives, and exits on Ctrl-C. No GPU, no canvas — this
//! exercises the transport/catalog wiring in isolation.
//!
//! ```text
//! cargo run --example headless_session -- ws://localhost:8080/ws http://localhost:8080
//! ```

use std::env;
use std::sync::Arc;

use rigscope_core::prelude::*;
use rigscope_core::transport::Payload;

#[tokio::main]
async fn main() {
    env_logger::init();

    let mut args = env::args().skip(1);
    let ws_url = args.next().unwrap_or_else(|| "ws://localhost:8080/ws".to_string());
    let rest_base_url = args.next().unwrap_or_else(|| "http://localhost:8080".to_string());

    let transport = Transport::new(TransportConfig::default());
    transport.on_connection_change(|connected| {
        log::info!("connection state changed: connected={connected}");
    });
    transport.on_error(|topic, message| {
        log::warn!("handler error on {topic}: {message}");
    });

    let catalog = DeviceCatalog::new(transport.clone(), rest_base_url);

    let _frame_sub = transport.subscribe("preview/frame", |_, payload| {
        if let Payload::Frame { channel, info, bitmap } = payload {
            log::info!(
                "frame channel={channel} idx={} {}x{} crop={:?}",
                info.frame_idx,
                bitmap.width,
                bitmap.height,
                info.crop
            );
        }
        Ok(())
    });

    if let Err(e) = transport.connect(&ws_url).await {
        log::error!("failed to connect to {ws_url}: {e}");
        return;
    }

    if let Err(e) = catalog.initialize().await {
        log::error!("catalog bootstrap failed: {e}");
    } else {
        for id in catalog.device_ids() {
            let device = catalog.device(&id).unwrap();
            log::info!(
                "device {id}: connected={} properties={:?}",
                device.is_connected(),
                device.property_names()
            );
        }
    }

    log::info!("listening; press Ctrl-C to exit");
    let _ = tokio::signal::ctrl_c().await;
    log::info!("shutting down");
    transport.disconnect();
}
