//! Reconnect backoff ladder.
//!
//! Delay after the n-th consecutive failure is `min(initial * 1.5^(n-1),
//! max)`. A successful open resets both the attempt counter and the delay;
//! `maxAttempts` consecutive failures without success is terminal.

use crate::config::TransportConfig;

/// What the caller should do after a connection attempt fails.
#[derive(Debug, Clone, PartialEq)]
pub enum ReconnectDecision {
    /// Schedule another connection attempt after `delay_ms`.
    RetryAfter { delay_ms: i32, attempt: u32 },
    /// `max_reconnect_attempts` consecutive failures reached; give up until
    /// the caller manually reconnects.
    Terminal,
}

/// Computes the delay for the n-th (1-indexed) consecutive failure.
pub fn delay_for_attempt(initial_ms: i32, max_ms: i32, attempt: u32) -> i32 {
    let scaled = (initial_ms as f64) * 1.5f64.powi(attempt as i32 - 1);
    (scaled.min(max_ms as f64)).round() as i32
}

/// Tracks consecutive-failure state across reconnect attempts for one
/// transport session.
#[derive(Debug, Clone)]
pub struct ReconnectLadder {
    config: TransportConfig,
    attempt: u32,
}

impl ReconnectLadder {
    pub fn new(config: TransportConfig) -> Self {
        Self { config, attempt: 0 }
    }

    /// Call on every successful `open`. Clears the failure count.
    pub fn reset(&mut self) {
        self.attempt = 0;
    }

    /// Call on every failed `open` or unexpected `close`. Returns whether to
    /// retry (with the delay to wait) or give up.
    pub fn record_failure(&mut self) -> ReconnectDecision {
        self.attempt += 1;
        if self.attempt as i32 > self.config.max_reconnect_attempts {
            return ReconnectDecision::Terminal;
        }
        let delay_ms = delay_for_attempt(
            self.config.initial_reconnect_delay_ms,
            self.config.max_reconnect_delay_ms,
            self.attempt,
        );
        ReconnectDecision::RetryAfter {
            delay_ms,
            attempt: self.attempt,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_formula_matches_spec() {
        // S2: initial=1000, max=15000.
        assert_eq!(delay_for_attempt(1000, 15000, 1), 1000);
        assert_eq!(delay_for_attempt(1000, 15000, 2), 1500);
        assert_eq!(delay_for_attempt(1000, 15000, 3), 2250);
        assert_eq!(delay_for_attempt(1000, 15000, 4), 3375);
    }

    #[test]
    fn delay_caps_at_max() {
        assert_eq!(delay_for_attempt(1000, 15000, 20), 15000);
    }

    #[test]
    fn s2_reconnect_backoff_scenario() {
        let config = TransportConfig {
            auto_reconnect: true,
            initial_reconnect_delay_ms: 1000,
            max_reconnect_delay_ms: 15000,
            max_reconnect_attempts: 4,
        };
        let mut ladder = ReconnectLadder::new(config);

        let mut delays = Vec::new();
        for _ in 0..4 {
            match ladder.record_failure() {
                ReconnectDecision::RetryAfter { delay_ms, .. } => delays.push(delay_ms),
                ReconnectDecision::Terminal => panic!("should not be terminal yet"),
            }
        }
        assert_eq!(delays, vec![1000, 1500, 2250, 3375]);

        assert_eq!(ladder.record_failure(), ReconnectDecision::Terminal);
    }

    #[test]
    fn success_resets_counter_and_delay() {
        let mut ladder = ReconnectLadder::new(TransportConfig::default());
        ladder.record_failure();
        ladder.record_failure();
        ladder.reset();
        match ladder.record_failure() {
            ReconnectDecision::RetryAfter { delay_ms, attempt } => {
                assert_eq!(delay_ms, 1000);
                assert_eq!(attempt, 1);
            }
            ReconnectDecision::Terminal => panic!("should not be terminal"),
        }
    }
}
