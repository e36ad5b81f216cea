// src/engine/pacing.rs

//! Inter-request pacing.
//!
//! Every wait draws uniformly from `[base_delay, base_delay + jitter_band]`
//! so request timing never falls into a detectable rhythm. While failures
//! accumulate, a capped exponential backoff term is added on top,
//! independent of the jitter. The effective delay is always at least the
//! configured base delay.

use std::time::Duration;

use rand::Rng;

use crate::models::PacingConfig;

/// Randomized pacing with exponential backoff on repeated failures.
#[derive(Debug)]
pub struct RateLimiter {
    base_delay: Duration,
    jitter_band_ms: u64,
    backoff_base_ms: u64,
    backoff_cap_ms: u64,
    consecutive_failures: u32,
}

impl RateLimiter {
    /// Create a limiter from pacing configuration.
    pub fn new(config: &PacingConfig) -> Self {
        Self {
            base_delay: Duration::from_millis(config.base_delay_ms),
            jitter_band_ms: config.jitter_band_ms,
            backoff_base_ms: config.backoff_base_ms,
            backoff_cap_ms: config.backoff_cap_ms,
            consecutive_failures: 0,
        }
    }

    /// Record a failed request; the next delay grows.
    pub fn record_failure(&mut self) {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
    }

    /// Record a successful request; backoff resets.
    pub fn record_success(&mut self) {
        self.consecutive_failures = 0;
    }

    /// Consecutive failures recorded so far.
    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// The current backoff term: `backoff_base * 2^(n-1)`, capped.
    pub fn backoff(&self) -> Duration {
        if self.consecutive_failures == 0 || self.backoff_base_ms == 0 {
            return Duration::ZERO;
        }
        // Clamp the exponent before shifting so the factor cannot overflow
        let exponent = (self.consecutive_failures - 1).min(20);
        let millis = self
            .backoff_base_ms
            .saturating_mul(1u64 << exponent)
            .min(self.backoff_cap_ms);
        Duration::from_millis(millis)
    }

    /// Draw the delay for the next request.
    pub fn next_delay(&self) -> Duration {
        let jitter_ms = if self.jitter_band_ms == 0 {
            0
        } else {
            rand::thread_rng().gen_range(0..=self.jitter_band_ms)
        };
        self.base_delay + Duration::from_millis(jitter_ms) + self.backoff()
    }

    /// Suspend until the next request may be issued.
    pub async fn wait_between_requests(&self) {
        let delay = self.next_delay();
        if delay > Duration::ZERO {
            log::debug!(
                "Pacing: waiting {:?} ({} consecutive failures)",
                delay,
                self.consecutive_failures
            );
            tokio::time::sleep(delay).await;
        }
    }
}
