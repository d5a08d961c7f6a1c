//! Explicit retry policy for transient gateway failures, computable without
//! any network so the schedule itself is testable.

use crate::config::RetryConfig;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    pub fn attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Exponential backoff before retry number `retry` (0-based): base,
    /// 2*base, 4*base, ...
    pub fn delay_for(&self, retry: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(retry)
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(cfg: &RetryConfig) -> Self {
        RetryPolicy::new(cfg.max_attempts, Duration::from_millis(cfg.base_delay_ms))
    }
}
