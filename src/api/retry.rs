//! Retry policy for transient API failures
//!
//! The compliance API drops requests under load and exhibits eventual
//! consistency right after writes, so every gateway operation runs under a
//! small bounded retry with backoff. Only transport-class errors are
//! retried; validation rejections would fail identically on every attempt.

use std::future::Future;
use std::time::Duration;

use log::{debug, warn};
use rand::Rng;

use crate::error::{Error, Result};

/// Configuration for retry behavior.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub backoff_multiplier: f64,
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(15),
            backoff_multiplier: 2.0,
            jitter: true,
        }
    }
}

impl RetryConfig {
    /// Near-zero delays for tests.
    pub fn fast() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
            backoff_multiplier: 2.0,
            jitter: false,
        }
    }
}

/// Executes operations with bounded retries and exponential backoff.
#[derive(Debug, Clone, Default)]
pub struct RetryPolicy {
    config: RetryConfig,
}

impl RetryPolicy {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    /// Run `operation` until it succeeds, fails permanently, or exhausts
    /// the attempt budget. The final error is returned unchanged.
    pub async fn execute<F, Fut, T>(&self, op_name: &str, operation: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 1;
        loop {
            match operation().await {
                Ok(result) => {
                    if attempt > 1 {
                        debug!("{op_name} succeeded on attempt {attempt}");
                    }
                    return Ok(result);
                }
                Err(error) => {
                    if !error.is_transient() || attempt == self.config.max_attempts {
                        warn!(
                            "{op_name} failed permanently on attempt {attempt}/{}: {error}",
                            self.config.max_attempts
                        );
                        return Err(error);
                    }

                    let delay = self.calculate_delay(attempt);
                    warn!("{op_name} failed on attempt {attempt} (retrying in {delay:?}): {error}");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    /// Exponential backoff delay with optional jitter, capped at `max_delay`.
    fn calculate_delay(&self, attempt: u32) -> Duration {
        let delay_ms = (self.config.base_delay.as_millis() as f64)
            * self.config.backoff_multiplier.powi(attempt as i32 - 1);

        let mut delay = Duration::from_millis(delay_ms as u64);
        if delay > self.config.max_delay {
            delay = self.config.max_delay;
        }

        if self.config.jitter {
            let jitter_factor = rand::thread_rng().gen_range(0.5..=1.5);
            delay = Duration::from_millis((delay.as_millis() as f64 * jitter_factor) as u64);
        }

        delay
    }
}
