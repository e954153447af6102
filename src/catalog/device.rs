//! Device and its static interface.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

use super::property::{PropertyInfo, PropertyModel, PropertyModelData};

/// Static description of a command a device accepts. Argument schema is not
/// interpreted by the core; it is passed through for UI to render.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandInfo {
    pub name: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub args_schema: Option<serde_json::Value>,
}

/// A device's fixed interface: its commands and the properties it declares.
/// Fetched once on catalog bootstrap and never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceInterface {
    pub uid: String,
    #[serde(rename = "type")]
    pub device_type: String,
    #[serde(default)]
    pub commands: HashMap<String, CommandInfo>,
    #[serde(default)]
    pub properties: HashMap<String, PropertyInfo>,
}

/// A device as mirrored by the catalog. Created once on bootstrap;
/// `connected` and `values` change over the device's lifetime, `interface`
/// never does. A disconnected device retains its interface and last-known
/// values.
pub struct Device {
    pub id: String,
    pub connected: RwLock<bool>,
    pub interface: Option<DeviceInterface>,
    values: RwLock<HashMap<String, PropertyModel>>,
}

impl Device {
    pub fn new(id: String, connected: bool, interface: Option<DeviceInterface>) -> Arc<Self> {
        Arc::new(Self {
            id,
            connected: RwLock::new(connected),
            interface,
            values: RwLock::new(HashMap::new()),
        })
    }

    pub fn is_connected(&self) -> bool {
        *self.connected.read().unwrap()
    }

    pub fn set_connected(&self, connected: bool) {
        *self.connected.write().unwrap() = connected;
    }

    /// Declares a property not known by name returns `None`.
    pub fn property(&self, name: &str) -> Option<PropertyModel> {
        self.values.read().unwrap().get(name).cloned()
    }

    pub fn property_names(&self) -> Vec<String> {
        self.values.read().unwrap().keys().cloned().collect()
    }

    /// `true` if `name` is declared in this device's interface.
    pub fn declares_property(&self, name: &str) -> bool {
        self.interface
            .as_ref()
            .map(|i| i.properties.contains_key(name))
            .unwrap_or(false)
    }

    /// Idempotent-replace the value for `name`: if a `PropertyModel` already
    /// exists it is mutated in place (preserving its identity for bound UI),
    /// otherwise a new one is inserted.
    pub fn apply_property_update(&self, name: &str, data: PropertyModelData) {
        let mut values = self.values.write().unwrap();
        if let Some(existing) = values.get(name) {
            existing.set(data);
        } else {
            values.insert(name.to_string(), PropertyModel::new(data));
        }
    }

    /// Seeds the initial value for `name` without requiring an existing
    /// entry — used during bootstrap, where the catalog fetches initial
    /// property values for connected devices.
    pub fn seed_property(&self, name: &str, data: PropertyModelData) {
        self.values
            .write()
            .unwrap()
            .insert(name.to_string(), PropertyModel::new(data));
    }
}
