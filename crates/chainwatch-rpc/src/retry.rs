//! Exponential backoff retry bounded by total elapsed time.
//!
//! There is no attempt limit: a call keeps retrying transient failures until
//! the next sleep would push it past `max_elapsed`, then the last error is
//! returned as-is.

use std::future::Future;
use std::time::{Duration, Instant};

use crate::error::TransportError;

/// Configuration for the retry policy.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Delay before the first retry.
    pub initial_backoff: Duration,
    /// Cap on a single delay.
    pub max_backoff: Duration,
    /// Multiplier applied to the delay on each retry.
    pub multiplier: f64,
    /// Total time budget for one call, retries included.
    pub max_elapsed: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(10),
            multiplier: 2.0,
            max_elapsed: Duration::from_secs(60),
        }
    }
}

impl From<&chainwatch_core::RetryConfig> for RetryConfig {
    fn from(cfg: &chainwatch_core::RetryConfig) -> Self {
        Self {
            initial_backoff: cfg.initial_backoff(),
            max_backoff: cfg.max_backoff(),
            max_elapsed: cfg.max_elapsed(),
            ..Default::default()
        }
    }
}

/// Stateless retry policy. Computes the next delay from the attempt number
/// and the time already spent.
#[derive(Debug, Clone, Default)]
pub struct RetryPolicy {
    pub config: RetryConfig,
}

impl RetryPolicy {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    /// Uncapped-by-budget delay before the `attempt`-th retry (1-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(63) as i32;
        let base_ms = self.config.initial_backoff.as_millis() as f64 * self.config.multiplier.powi(exp);
        let cap_ms = self.config.max_backoff.as_millis() as f64;
        Duration::from_millis(base_ms.min(cap_ms) as u64)
    }

    /// Delay before the `attempt`-th retry, or `None` once sleeping would
    /// exceed the elapsed-time budget.
    pub fn next_delay(&self, attempt: u32, elapsed: Duration) -> Option<Duration> {
        let delay = self.backoff(attempt);
        (elapsed + delay <= self.config.max_elapsed).then_some(delay)
    }

    /// Run `op` until it succeeds, fails with a non-retryable error, or the
    /// budget runs out. Every retry is logged at `warn`.
    pub async fn run<T, F, Fut>(&self, method: &str, network: &str, mut op: F) -> Result<T, TransportError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, TransportError>>,
    {
        let started = Instant::now();
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() => match self.next_delay(attempt, started.elapsed()) {
                    Some(delay) => {
                        tracing::warn!(
                            method,
                            network,
                            attempt,
                            delay_ms = delay.as_millis() as u64,
                            error = %e,
                            "retrying request"
                        );
                        tokio::time::sleep(delay).await;
                    }
                    None => {
                        tracing::error!(
                            method,
                            network,
                            attempt,
                            elapsed_ms = started.elapsed().as_millis() as u64,
                            error = %e,
                            "retry budget exhausted"
                        );
                        return Err(e);
                    }
                },
                Err(e) => return Err(e),
            }
        }
    }
}
