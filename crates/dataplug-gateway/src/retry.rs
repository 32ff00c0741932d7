//! Bounded retry policy for gateway calls.

use std::time::Duration;

use rand::Rng;

/// Retry policy for transient gateway failures.
///
/// Delays grow exponentially from `base_delay`, are capped at
/// `max_delay`, and carry proportional jitter so concurrent retries do
/// not synchronize. The policy is data, not behavior: callers pass it
/// into [`crate::GatewayClient::verify`] per call site, so webhook
/// handling and interactive polling can retry differently.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,

    /// Delay before the second attempt.
    pub base_delay: Duration,

    /// Upper bound on any single delay.
    pub max_delay: Duration,

    /// Proportional jitter in `0.0..=1.0`; `0.2` means each delay is
    /// scaled by a random factor in `0.8..=1.2`.
    pub jitter: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(2),
            jitter: 0.2,
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries (single attempt).
    #[must_use]
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            jitter: 0.0,
        }
    }

    /// Delay to sleep after the given failed attempt (1-based).
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        // Exponent capped so the shift cannot overflow.
        let exponent = attempt.saturating_sub(1).min(16);
        let backoff = self
            .base_delay
            .saturating_mul(1_u32 << exponent)
            .min(self.max_delay);

        if self.jitter <= 0.0 {
            return backoff;
        }

        let factor = rand::thread_rng().gen_range(1.0 - self.jitter..=1.0 + self.jitter);
        backoff.mul_f64(factor.max(0.0))
    }
}
