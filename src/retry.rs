use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::error::ApiError;

/// Configuration for retrying idempotent reads
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts (including the first one)
    pub max_attempts: u32,
    /// Delay unit; attempt `n` waits `n * base_delay`
    pub base_delay: Duration,
    /// Maximum delay between retries
    pub max_delay: Duration,
}

impl RetryConfig {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
            max_delay: Duration::from_secs(10),
        }
    }

    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    /// Preset: view refetch after a mutation (3 attempts)
    /// Delays: 1s, 2s = 3s total wait time
    pub fn refetch() -> Self {
        Self::new(3, Duration::from_secs(1)).with_max_delay(Duration::from_secs(3))
    }

    /// Preset: no retries at all
    pub fn once() -> Self {
        Self::new(1, Duration::ZERO)
    }

    /// Linear backoff, 0-indexed attempt
    fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        self.base_delay.saturating_mul(attempt).min(self.max_delay)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::refetch()
    }
}

/// Run a read against the API, retrying only errors whose kind is retryable.
///
/// Mutations never go through here: a failed approve, reject or undo is
/// surfaced to the user instead of being replayed behind their back.
///
/// # Panics
/// Panics if `config.max_attempts` is 0
pub async fn with_retry<T, F, Fut>(
    config: &RetryConfig,
    operation_name: &str,
    mut operation: F,
) -> Result<T, ApiError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
{
    assert!(
        config.max_attempts >= 1,
        "RetryConfig.max_attempts must be >= 1, got {}",
        config.max_attempts
    );

    let mut attempt = 0;
    loop {
        let delay = config.delay_for_attempt(attempt);
        if !delay.is_zero() {
            debug!(
                "{}: Retry attempt {}/{} after {:?}",
                operation_name,
                attempt + 1,
                config.max_attempts,
                delay
            );
            sleep(delay).await;
        }

        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) if !e.is_retryable() => {
                debug!("{}: {} is not retryable", operation_name, e.kind);
                return Err(e);
            }
            Err(e) => {
                attempt += 1;
                if attempt >= config.max_attempts {
                    warn!(
                        "{}: All {} attempts failed. Last error: {}",
                        operation_name, config.max_attempts, e
                    );
                    return Err(e);
                }
                warn!(
                    "{}: Attempt {}/{} failed ({})",
                    operation_name, attempt, config.max_attempts, e
                );
            }
        }
    }
}
