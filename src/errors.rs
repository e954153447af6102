//! Crate-wide error types.
//!
//! Each subsystem gets its own small `thiserror` enum. [`CoreError`]
//! aggregates them for callers that don't care which subsystem failed.

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("not connected")]
    NotConnected,

    #[error("socket error: {0}")]
    Socket(String),

    #[error("reconnect attempts exhausted after {0} tries")]
    ReconnectExhausted(u32),

    #[error("malformed binary frame: {0}")]
    MalformedFrame(&'static str),

    #[error("unsupported frame format: {0}")]
    UnsupportedFormat(String),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("device not found: {0}")]
    DeviceNotFound(String),

    #[error("property not declared on device {device}: {property}")]
    UnknownProperty { device: String, property: String },

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum CompositorError {
    #[error("no compatible GPU adapter found")]
    NoAdapter,

    #[error("device request failed: {0}")]
    DeviceRequest(String),

    #[error("surface configuration failed: {0}")]
    Surface(String),

    #[error("device was lost: {0}")]
    DeviceLost(String),
}

#[derive(Debug, thiserror::Error)]
pub enum GridError {
    #[error("stack not found: {0}")]
    StackNotFound(String),

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("invalid grid configuration: {0}")]
    InvalidConfig(&'static str),
}

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Compositor(#[from] CompositorError),

    #[error(transparent)]
    Grid(#[from] GridError),
}
