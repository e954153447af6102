//! Stack data model and the REST proxy for stack CRUD.
//!
//! Stack creation/edit/delete is proxied to the server, which owns
//! authoritative state, so this client carries no local validation beyond
//! what serde's types already enforce; it mirrors the catalog's
//! [`crate::catalog::rest`] REST-wrapper shape.

use serde::{Deserialize, Serialize};

use crate::errors::GridError;

use super::tile::Tile;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StackStatus {
    Planned,
    Committed,
    Acquiring,
    Completed,
    Failed,
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stack {
    #[serde(flatten)]
    pub tile: Tile,
    pub z_start_um: f64,
    pub z_end_um: f64,
    pub z_step_um: f64,
    pub profile_id: String,
    pub status: StackStatus,
    pub num_frames: u32,
    #[serde(default)]
    pub output_path: Option<String>,
}

/// Grid/Stage defaults; not authoritative over any single stack once
/// created.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridConfig {
    pub x_offset_um: f64,
    pub y_offset_um: f64,
    pub overlap: f64,
    pub z_step_um: f64,
    pub default_z_start_um: f64,
    pub default_z_end_um: f64,
}

impl GridConfig {
    /// Clamps `overlap` into `[0, 0.5]` per the data model invariant.
    pub fn clamped_overlap(&self) -> f64 {
        self.overlap.clamp(0.0, 0.5)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateStackRequest {
    pub tile: Tile,
    pub z_start_um: f64,
    pub z_end_um: f64,
    pub z_step_um: f64,
    pub profile_id: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateStackRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub z_start_um: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub z_end_um: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub z_step_um: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<StackStatus>,
}

#[derive(Debug, Deserialize)]
struct ListStacksResponse {
    stacks: Vec<Stack>,
}

#[derive(Debug, Deserialize)]
struct StackIdResponse {
    id: String,
}

/// Typed wrapper over the `/sessions/{session_id}/stacks` CRUD surface.
pub struct StackClient {
    client: reqwest::Client,
    base_url: String,
    session_id: String,
}

impl StackClient {
    pub fn new(base_url: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            session_id: session_id.into(),
        }
    }

    fn stacks_url(&self) -> String {
        format!("{}/sessions/{}/stacks", self.base_url, self.session_id)
    }

    pub async fn list(&self) -> Result<Vec<Stack>, GridError> {
        let response = self.client.get(self.stacks_url()).send().await?;
        let parsed: ListStacksResponse = response.error_for_status()?.json().await?;
        Ok(parsed.stacks)
    }

    pub async fn create(&self, request: CreateStackRequest) -> Result<String, GridError> {
        let response = self.client.post(self.stacks_url()).json(&request).send().await?;
        let parsed: StackIdResponse = response.error_for_status()?.json().await?;
        Ok(parsed.id)
    }

    pub async fn update(&self, stack_id: &str, request: UpdateStackRequest) -> Result<(), GridError> {
        let url = format!("{}/{}", self.stacks_url(), stack_id);
        self.client.patch(url).json(&request).send().await?.error_for_status()?;
        Ok(())
    }

    pub async fn delete(&self, stack_id: &str) -> Result<(), GridError> {
        let url = format!("{}/{}", self.stacks_url(), stack_id);
        let response = self.client.delete(url).send().await?;
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(GridError::StackNotFound(stack_id.to_string()));
        }
        response.error_for_status()?;
        Ok(())
    }
}
