//! Retry backoff policy.

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Retry behavior for transient request failures.
///
/// The policy only computes how long to wait; the route validator owns the
/// decision of whether to retry and performs the actual sleep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    /// Maximum number of retry attempts before giving up
    pub max_retries: u32,

    /// Base delay in seconds; the wait for retry `n` is `base ^ n`
    pub base_delay_secs: f64,

    /// Jitter fraction: the wait is perturbed by a uniform factor in
    /// `[1 - jitter, 1 + jitter]` to avoid synchronized retry storms
    pub jitter: f64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_secs: 2.0,
            jitter: 0.5,
        }
    }
}

impl RetrySettings {
    /// Backoff duration before retry attempt `retry_count` (1-based).
    ///
    /// Exponential in the retry count, with multiplicative jitter:
    /// `base ^ retry_count * (1 + U(-jitter, +jitter))`, clamped at zero.
    pub fn backoff(&self, retry_count: u32) -> Duration {
        let delay = self.base_delay_secs.powi(retry_count as i32);
        let jitter = rand::rng().random_range(-self.jitter..=self.jitter);
        Duration::from_secs_f64((delay * (1.0 + jitter)).max(0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_without_jitter_is_exponential() {
        let settings = RetrySettings {
            max_retries: 3,
            base_delay_secs: 2.0,
            jitter: 0.0,
        };

        assert_eq!(settings.backoff(1), Duration::from_secs(2));
        assert_eq!(settings.backoff(2), Duration::from_secs(4));
        assert_eq!(settings.backoff(3), Duration::from_secs(8));
    }

    #[test]
    fn test_backoff_jitter_stays_in_bounds() {
        let settings = RetrySettings::default();

        for retry_count in 1..=3u32 {
            let base = 2.0f64.powi(retry_count as i32);
            for _ in 0..100 {
                let delay = settings.backoff(retry_count).as_secs_f64();
                assert!(delay >= base * 0.5 - 1e-9, "delay {} below bound", delay);
                assert!(delay <= base * 1.5 + 1e-9, "delay {} above bound", delay);
            }
        }
    }

    #[test]
    fn test_backoff_never_negative() {
        // Jitter larger than 1 can push the factor below zero; the duration
        // must clamp instead of panicking.
        let settings = RetrySettings {
            max_retries: 3,
            base_delay_secs: 2.0,
            jitter: 2.0,
        };
        for _ in 0..100 {
            let _ = settings.backoff(1);
        }
    }
}
