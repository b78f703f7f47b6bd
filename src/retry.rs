// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Retry Logic with Exponential Backoff
 * Bounded retry with jitter for upstream registry lookups
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tracing::{debug, warn};

use crate::errors::{CheckError, CheckResult};

/// Retry configuration with exponential backoff
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first
    pub max_attempts: u32,

    /// Initial backoff duration
    pub initial_backoff: Duration,

    /// Maximum backoff duration
    pub max_backoff: Duration,

    /// Backoff multiplier (typically 2.0 for exponential)
    pub backoff_multiplier: f64,

    /// Enable jitter to prevent thundering herd
    pub enable_jitter: bool,

    /// Jitter factor (0.0 to 1.0)
    pub jitter_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(5),
            backoff_multiplier: 2.0,
            enable_jitter: true,
            jitter_factor: 0.3,
        }
    }
}

impl RetryConfig {
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn without_jitter(mut self) -> Self {
        self.enable_jitter = false;
        self
    }

    /// Calculate backoff duration for a given attempt
    pub fn calculate_backoff(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::from_secs(0);
        }

        let base_backoff = self.initial_backoff.as_millis() as f64
            * self.backoff_multiplier.powi((attempt - 1) as i32);

        let capped_backoff = base_backoff.min(self.max_backoff.as_millis() as f64);

        let backoff_with_jitter = if self.enable_jitter {
            let mut rng = rand::rng();
            let jitter_range = capped_backoff * self.jitter_factor;
            let jitter = rng.random_range(-jitter_range..jitter_range);
            (capped_backoff + jitter).max(0.0)
        } else {
            capped_backoff
        };

        Duration::from_millis(backoff_with_jitter as u64)
    }
}

/// Retry a future with exponential backoff. Non-retryable errors return
/// immediately.
pub async fn retry_with_backoff<F, Fut, T>(
    config: &RetryConfig,
    operation_name: &str,
    mut operation: F,
) -> CheckResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = CheckResult<T>>,
{
    let mut attempt = 0;
    let mut last_error: Option<CheckError> = None;

    while attempt < config.max_attempts {
        attempt += 1;

        match operation().await {
            Ok(result) => {
                if attempt > 1 {
                    debug!(
                        attempt = attempt,
                        operation = operation_name,
                        "Operation succeeded after retry"
                    );
                }
                return Ok(result);
            }
            Err(err) => {
                if !err.is_retryable() || attempt >= config.max_attempts {
                    debug!(
                        attempt = attempt,
                        operation = operation_name,
                        error = %err,
                        "Operation failed, not retrying"
                    );
                    return Err(err);
                }

                let backoff = config.calculate_backoff(attempt);
                warn!(
                    attempt = attempt,
                    operation = operation_name,
                    backoff_ms = backoff.as_millis() as u64,
                    error = %err,
                    "Operation failed, retrying after backoff"
                );
                last_error = Some(err);
                tokio::time::sleep(backoff).await;
            }
        }
    }

    Err(last_error.unwrap_or_else(|| {
        CheckError::General(format!("{operation_name} exhausted retries"))
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_backoff_grows_exponentially() {
        let config = RetryConfig::default().without_jitter();
        assert_eq!(config.calculate_backoff(0), Duration::from_secs(0));
        assert_eq!(config.calculate_backoff(1), Duration::from_millis(100));
        assert_eq!(config.calculate_backoff(2), Duration::from_millis(200));
        assert_eq!(config.calculate_backoff(3), Duration::from_millis(400));
    }

    #[test]
    fn test_backoff_capped() {
        let config = RetryConfig::default().without_jitter();
        assert_eq!(config.calculate_backoff(20), config.max_backoff);
    }

    #[tokio::test]
    async fn test_retry_succeeds_after_transient_failure() {
        let config = RetryConfig {
            initial_backoff: Duration::from_millis(1),
            ..RetryConfig::default()
        };
        let attempts = AtomicU32::new(0);

        let result = retry_with_backoff(&config, "test_op", || {
            let n = attempts.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 1 {
                    Err(CheckError::Timeout {
                        duration: Duration::from_secs(1),
                    })
                } else {
                    Ok(42)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_non_retryable_fails_immediately() {
        let config = RetryConfig::default();
        let attempts = AtomicU32::new(0);

        let result: CheckResult<()> = retry_with_backoff(&config, "test_op", || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Err(CheckError::Parse("bad record".to_string())) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_exhausts_attempts() {
        let config = RetryConfig {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(1),
            enable_jitter: false,
            ..RetryConfig::default()
        };
        let attempts = AtomicU32::new(0);

        let result: CheckResult<()> = retry_with_backoff(&config, "test_op", || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async {
                Err(CheckError::Timeout {
                    duration: Duration::from_secs(1),
                })
            }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }
}
