//! Reactive device/property catalog.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde::Serialize;
use serde_json::Value;

use crate::errors::CatalogError;
use crate::transport::{Payload, Transport};

use super::device::Device;
use super::property::PropertyModelData;
use super::rest::RestClient;

#[derive(Debug, Serialize)]
struct ActivateProfilePayload<'a> {
    profile_id: &'a str,
}

#[derive(Debug, Serialize)]
struct SetPropertyPayload<'a> {
    device: &'a str,
    properties: HashMap<&'a str, Value>,
}

#[derive(Debug, Serialize)]
struct CommandOpts {
    #[serde(skip_serializing_if = "Option::is_none")]
    wait: Option<bool>,
}

#[derive(Debug, Serialize)]
struct CommandPayload<'a> {
    device: &'a str,
    command: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    args: Option<&'a [Value]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    opts: Option<CommandOpts>,
}

/// Options accepted by [`DeviceCatalog::execute_command`].
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandOptions {
    /// Await acknowledgment before returning. Move commands default to
    /// `false` per the wire protocol.
    pub wait: bool,
}

/// Mirrors the remote device set and routes property updates into each
/// device's reactive values. Owns the device map exclusively.
pub struct DeviceCatalog {
    transport: Arc<Transport>,
    rest: RestClient,
    devices: RwLock<HashMap<String, Arc<Device>>>,
}

impl DeviceCatalog {
    pub fn new(transport: Arc<Transport>, rest_base_url: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            transport,
            rest: RestClient::new(rest_base_url),
            devices: RwLock::new(HashMap::new()),
        })
    }

    pub fn device(&self, id: &str) -> Option<Arc<Device>> {
        self.devices.read().unwrap().get(id).cloned()
    }

    pub fn device_ids(&self) -> Vec<String> {
        self.devices.read().unwrap().keys().cloned().collect()
    }

    pub fn get_property_value(&self, device_id: &str, prop: &str) -> Option<Value> {
        self.device(device_id)?.property(prop).map(|m| m.get().value)
    }

    /// Fetches the full device set, then initial property values for every
    /// connected device, then subscribes to `device` updates for the life
    /// of the catalog.
    pub async fn initialize(self: &Arc<Self>) -> Result<(), CatalogError> {
        let listing = self.rest.list_devices().await?;

        for (id, entry) in listing.devices {
            let device = Device::new(id.clone(), entry.connected, entry.interface);
            self.devices.write().unwrap().insert(id.clone(), device.clone());

            if let Some(msg) = entry.error {
                log::warn!("device {id} reported bootstrap error: {msg}");
            }

            if entry.connected {
                match self.rest.get_properties(&id, &[]).await {
                    Ok(response) => {
                        for (prop, raw) in response.res {
                            match serde_json::from_value::<PropertyModelData>(raw) {
                                Ok(data) => device.seed_property(&prop, data),
                                Err(e) => log::warn!(
                                    "device {id} property {prop}: malformed initial value: {e}"
                                ),
                            }
                        }
                        for (prop, err) in response.err {
                            log::warn!("device {id} property {prop}: bootstrap error: {err}");
                        }
                    }
                    Err(e) => log::warn!("failed to fetch initial properties for {id}: {e}"),
                }
            }
        }

        let this = self.clone();
        self.transport.subscribe("device", move |topic, payload| {
            this.handle_device_message(topic, payload);
            Ok(())
        });

        Ok(())
    }

    fn handle_device_message(&self, topic: &str, payload: &Payload) {
        let Payload::Json(value) = payload else {
            return;
        };
        let Some(device_id) = topic.split('/').nth(1) else {
            return;
        };
        let Some(device) = self.device(device_id) else {
            log::warn!("property update for unknown device {device_id}");
            return;
        };

        let res = value.get("res").and_then(Value::as_object);
        let err = value.get("err").and_then(Value::as_object);

        if let Some(res) = res {
            for (prop, raw) in res {
                if !device.declares_property(prop) {
                    continue; // unknown properties are ignored.
                }
                match serde_json::from_value::<PropertyModelData>(raw.clone()) {
                    Ok(data) => device.apply_property_update(prop, data),
                    Err(e) => log::warn!("device {device_id} property {prop}: malformed update: {e}"),
                }
            }
        }
        if let Some(err) = err {
            for (prop, detail) in err {
                log::warn!("device {device_id} property {prop}: rejected: {detail}");
            }
        }
    }

    pub fn set_property(&self, device: &str, name: &str, value: Value) -> Result<(), CatalogError> {
        let payload = SetPropertyPayload {
            device,
            properties: HashMap::from([(name, value)]),
        };
        self.send_set_property(device, payload)
    }

    pub fn set_properties(
        &self,
        device: &str,
        values: HashMap<&str, Value>,
    ) -> Result<(), CatalogError> {
        let payload = SetPropertyPayload {
            device,
            properties: values,
        };
        self.send_set_property(device, payload)
    }

    fn send_set_property(&self, _device: &str, payload: SetPropertyPayload<'_>) -> Result<(), CatalogError> {
        self.transport
            .send("device/set_property", payload)
            .map_err(|e| CatalogError::DeviceNotFound(e.to_string()))
    }

    /// Sends the `profiles/activate` topic, the WebSocket counterpart of
    /// [`RestClient::activate_profile`][super::rest::RestClient::activate_profile].
    /// Callers that need the server's ack (`active_profile_id`) should use
    /// the REST form instead; this one is fire-and-forget, for clients that
    /// already route everything else through the transport.
    pub fn activate_profile(&self, profile_id: &str) -> Result<(), CatalogError> {
        self.transport
            .send("profiles/activate", ActivateProfilePayload { profile_id })
            .map_err(|e| CatalogError::DeviceNotFound(e.to_string()))
    }

    pub fn execute_command(
        &self,
        device: &str,
        command: &str,
        args: Option<&[Value]>,
        opts: CommandOptions,
    ) -> Result<(), CatalogError> {
        let payload = CommandPayload {
            device,
            command,
            args,
            opts: Some(CommandOpts { wait: Some(opts.wait) }),
        };
        self.transport
            .send("device/command", payload)
            .map_err(|e| CatalogError::DeviceNotFound(e.to_string()))
    }
}
