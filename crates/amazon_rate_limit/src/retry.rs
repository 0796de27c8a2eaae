//! Retry with exponential back-off.
//!
//! [`RetryExecutor`] drives the loop through `tokio-retry2`; a
//! [`RetryStrategy`] decides whether each failure is worth another attempt and
//! how long to wait first.

use crate::RetryConfig;
use amazon_error::RetryableError;
use std::fmt::Display;
use std::future::Future;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tokio_retry2::strategy::jitter;
use tokio_retry2::{Retry, RetryError};
use tracing::{debug, instrument, warn};

/// Retry policy.
///
/// `attempt` is zero-based: the first failure is attempt 0.
pub trait RetryStrategy<E>: Send + Sync {
    /// Whether to try again after `error` on `attempt`.
    fn should_retry(&self, attempt: u32, error: &E) -> bool;

    /// Wait before the next attempt.
    fn delay(&self, attempt: u32, error: &E) -> Duration;
}

/// Exponential back-off driven by a [`RetryConfig`].
///
/// Delay for attempt *n*: `min(base * multiplier^n, max_delay)` plus up to
/// 10% jitter, never shorter than a server-provided `Retry-After`.
///
/// An error is retried when the attempt budget allows and any of these hold:
/// the error classifies itself as retryable, its status is in
/// `retryable_statuses`, or its code is in `retryable_error_codes`.
///
/// # Example
///
/// ```
/// use amazon_rate_limit::{ExponentialBackoffStrategy, RetryConfig};
/// use std::time::Duration;
///
/// let strategy = ExponentialBackoffStrategy::new(RetryConfig::sp_api());
/// assert_eq!(strategy.backoff(0), Duration::from_millis(1000));
/// assert_eq!(strategy.backoff(1), Duration::from_millis(2000));
/// ```
#[derive(Debug, Clone)]
pub struct ExponentialBackoffStrategy {
    config: RetryConfig,
}

impl ExponentialBackoffStrategy {
    /// Strategy for `config`.
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    /// Retry configuration.
    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Capped exponential delay for `attempt`, before jitter and `Retry-After`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let secs = self.config.base_delay.as_secs_f64()
            * self.config.backoff_multiplier.powi(exponent);
        let capped = secs.min(self.config.max_delay.as_secs_f64());
        Duration::from_secs_f64(capped.max(0.0))
    }

    /// Whether `error` is retryable under this policy, ignoring the attempt budget.
    pub fn is_retryable<E: RetryableError>(&self, error: &E) -> bool {
        error.is_retryable()
            || error
                .status_code()
                .is_some_and(|s| self.config.retryable_statuses.contains(&s))
            || error
                .error_code()
                .is_some_and(|c| self.config.retryable_error_codes.contains(c))
    }
}

impl<E: RetryableError> RetryStrategy<E> for ExponentialBackoffStrategy {
    fn should_retry(&self, attempt: u32, error: &E) -> bool {
        attempt < self.config.max_retries && self.is_retryable(error)
    }

    fn delay(&self, attempt: u32, error: &E) -> Duration {
        let backoff = self.backoff(attempt);
        let delay = backoff + jitter(backoff / 10);
        match error.retry_after() {
            Some(retry_after) if retry_after > delay => retry_after,
            _ => delay,
        }
    }
}

/// Runs an operation until it succeeds, fails permanently, or exhausts the
/// strategy's retry budget.
///
/// Total attempts never exceed `max_retries + 1`. The last error is returned
/// unchanged.
#[derive(Debug, Clone)]
pub struct RetryExecutor<S = ExponentialBackoffStrategy> {
    strategy: S,
}

impl RetryExecutor {
    /// Executor with exponential back-off for `config`.
    pub fn from_config(config: RetryConfig) -> Self {
        Self::new(ExponentialBackoffStrategy::new(config))
    }
}

impl<S> RetryExecutor<S> {
    /// Executor using `strategy`.
    pub fn new(strategy: S) -> Self {
        Self { strategy }
    }

    /// Retry strategy.
    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    /// Run `operation`, retrying per the strategy. `context` labels log events.
    #[instrument(skip(self, operation))]
    pub async fn execute<T, E, F, Fut>(&self, context: &str, mut operation: F) -> Result<T, E>
    where
        S: RetryStrategy<E>,
        E: Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let attempts = AtomicU32::new(0);
        let strategy = &self.strategy;

        // Delays come from the strategy through `retry_after`; the base
        // schedule itself never waits.
        let result = Retry::spawn(std::iter::repeat(Duration::ZERO), || {
            let attempt = attempts.fetch_add(1, Ordering::Relaxed);
            let call = operation();
            async move {
                match call.await {
                    Ok(value) => Ok(value),
                    Err(err) if strategy.should_retry(attempt, &err) => {
                        let delay = strategy.delay(attempt, &err);
                        warn!(
                            attempt = attempt + 1,
                            delay_ms = delay.as_millis() as u64,
                            error = %err,
                            "Transient error, retrying"
                        );
                        Err(RetryError::Transient {
                            err,
                            retry_after: Some(delay),
                        })
                    }
                    Err(err) => Err(RetryError::Permanent(err)),
                }
            }
        })
        .await;

        let attempts = attempts.load(Ordering::Relaxed);
        match &result {
            Ok(_) if attempts > 1 => debug!(attempts, "Operation succeeded after retry"),
            Ok(_) => {}
            Err(e) => warn!(attempts, error = %e, "Operation failed"),
        }
        result
    }
}
