//! REST client for catalog bootstrap and profile activation.
//!
//! A small typed client: one `reqwest::Client`, JSON bodies in and out via
//! `serde`.

use std::collections::HashMap;

use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::errors::CatalogError;

use super::device::DeviceInterface;

/// One device entry as returned by `GET /devices`.
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceListEntry {
    pub id: String,
    pub connected: bool,
    #[serde(default)]
    pub interface: Option<DeviceInterface>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DevicesResponse {
    pub count: usize,
    pub devices: HashMap<String, DeviceListEntry>,
}

#[derive(Debug, Deserialize)]
pub struct DevicePropertiesResponse {
    pub device: String,
    #[serde(default)]
    pub res: HashMap<String, serde_json::Value>,
    #[serde(default)]
    pub err: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Serialize)]
struct ActivateProfileRequest {
    profile_id: String,
}

#[derive(Debug, Deserialize)]
pub struct ActivateProfileResponse {
    pub active_profile_id: String,
}

/// A thin typed wrapper over the catalog's REST surface. `base_url` has no
/// trailing slash (e.g. `http://rig.local:8080`).
pub struct RestClient {
    client: reqwest::Client,
    base_url: String,
}

impl RestClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, CatalogError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self.client.get(&url).send().await?;
        Ok(response.error_for_status()?.json::<T>().await?)
    }

    /// `GET /devices`.
    pub async fn list_devices(&self) -> Result<DevicesResponse, CatalogError> {
        self.get_json("/devices").await
    }

    /// `GET /devices/{id}/properties?props=a&props=b`. An empty `props`
    /// fetches every declared property.
    pub async fn get_properties(
        &self,
        device_id: &str,
        props: &[String],
    ) -> Result<DevicePropertiesResponse, CatalogError> {
        let mut path = format!("/devices/{device_id}/properties");
        if !props.is_empty() {
            let query: Vec<String> = props.iter().map(|p| format!("props={p}")).collect();
            path.push('?');
            path.push_str(&query.join("&"));
        }
        self.get_json(&path).await
    }

    /// `POST /profiles/active` with `{profile_id}`.
    pub async fn activate_profile(
        &self,
        profile_id: &str,
    ) -> Result<ActivateProfileResponse, CatalogError> {
        let url = format!("{}/profiles/active", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&ActivateProfileRequest {
                profile_id: profile_id.to_string(),
            })
            .send()
            .await?;
        Ok(response.error_for_status()?.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn devices_response_deserializes() {
        let raw = r#"{"count":1,"devices":{"laser_488":{"id":"laser_488","connected":true}}}"#;
        let parsed: DevicesResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.count, 1);
        assert!(parsed.devices["laser_488"].connected);
    }

    #[test]
    fn properties_response_deserializes_res_and_err() {
        let raw = r#"{"device":"laser_488","res":{"power_mw":{"value":12.5}},"err":{"shutter":{"msg":"nope"}}}"#;
        let parsed: DevicePropertiesResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.device, "laser_488");
        assert!(parsed.res.contains_key("power_mw"));
        assert!(parsed.err.contains_key("shutter"));
    }
}
