//! Crate-wide configuration.
//!
//! [`TransportConfig`] and [`ControllerConfig`] hold the reconnection and
//! preview-pipeline tunables. `ControllerConfig` is built through
//! [`ControllerConfigBuilder`] with validation rather than constructed
//! directly, so an invalid combination (zero channels, zero delay) is
//! rejected at the point of construction.

use std::fmt;

/// Reconnection and auto-reconnect behavior for the [`crate::transport::Transport`].
#[derive(Debug, Clone, PartialEq)]
pub struct TransportConfig {
    pub auto_reconnect: bool,
    pub initial_reconnect_delay_ms: i32,
    pub max_reconnect_delay_ms: i32,
    pub max_reconnect_attempts: i32,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            auto_reconnect: true,
            initial_reconnect_delay_ms: 1000,
            max_reconnect_delay_ms: 15000,
            max_reconnect_attempts: 10,
        }
    }
}

/// Preview-pipeline configuration: channel count and debounce timings.
#[derive(Debug, Clone, PartialEq)]
pub struct ControllerConfig {
    pub max_channels: u32,
    pub debounce_delay_ms: i32,
    pub wheel_idle_delay_ms: i32,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            max_channels: 4,
            debounce_delay_ms: 100,
            wheel_idle_delay_ms: 250,
        }
    }
}

impl ControllerConfig {
    pub fn builder() -> ControllerConfigBuilder {
        ControllerConfigBuilder::default()
    }
}

#[derive(Debug, Clone)]
pub struct ControllerConfigBuilder {
    inner: ControllerConfig,
}

impl Default for ControllerConfigBuilder {
    fn default() -> Self {
        Self {
            inner: ControllerConfig::default(),
        }
    }
}

impl ControllerConfigBuilder {
    #[inline]
    fn map(mut self, f: impl FnOnce(&mut ControllerConfig)) -> Self {
        f(&mut self.inner);
        self
    }

    pub fn max_channels(self, n: u32) -> Self {
        self.map(|c| c.max_channels = n)
    }

    pub fn debounce_delay_ms(self, n: i32) -> Self {
        self.map(|c| c.debounce_delay_ms = n)
    }

    pub fn wheel_idle_delay_ms(self, n: i32) -> Self {
        self.map(|c| c.wheel_idle_delay_ms = n)
    }

    pub fn build(self) -> Result<ControllerConfig, ControllerConfigError> {
        validate(&self.inner)?;
        Ok(self.inner)
    }
}

#[derive(Debug, Clone)]
pub enum ControllerConfigError {
    ChannelCountOutOfRange(u32),
    ZeroDelay(&'static str),
}

impl fmt::Display for ControllerConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ChannelCountOutOfRange(n) => {
                write!(f, "max_channels must be in 1..=8 (got {n})")
            }
            Self::ZeroDelay(name) => write!(f, "{name} must be > 0"),
        }
    }
}

impl std::error::Error for ControllerConfigError {}

fn validate(c: &ControllerConfig) -> Result<(), ControllerConfigError> {
    if c.max_channels == 0 || c.max_channels > 8 {
        return Err(ControllerConfigError::ChannelCountOutOfRange(c.max_channels));
    }
    if c.debounce_delay_ms <= 0 {
        return Err(ControllerConfigError::ZeroDelay("debounce_delay_ms"));
    }
    if c.wheel_idle_delay_ms <= 0 {
        return Err(ControllerConfigError::ZeroDelay("wheel_idle_delay_ms"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let t = TransportConfig::default();
        assert_eq!(t.initial_reconnect_delay_ms, 1000);
        assert_eq!(t.max_reconnect_delay_ms, 15000);
        assert_eq!(t.max_reconnect_attempts, 10);

        let c = ControllerConfig::default();
        assert_eq!(c.debounce_delay_ms, 100);
        assert_eq!(c.wheel_idle_delay_ms, 250);
    }

    #[test]
    fn builder_rejects_zero_channels() {
        let err = ControllerConfig::builder().max_channels(0).build().unwrap_err();
        assert!(matches!(err, ControllerConfigError::ChannelCountOutOfRange(0)));
    }

    #[test]
    fn builder_rejects_too_many_channels() {
        let err = ControllerConfig::builder().max_channels(9).build().unwrap_err();
        assert!(matches!(err, ControllerConfigError::ChannelCountOutOfRange(9)));
    }

    #[test]
    fn builder_accepts_valid_config() {
        let c = ControllerConfig::builder()
            .max_channels(2)
            .debounce_delay_ms(100)
            .wheel_idle_delay_ms(250)
            .build()
            .unwrap();
        assert_eq!(c.max_channels, 2);
    }
}
