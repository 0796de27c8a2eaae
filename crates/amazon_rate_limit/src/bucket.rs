//! Token bucket limiter.

use crate::RateLimitConfig;
use amazon_error::AmazonResult;
use serde::Serialize;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, trace};

/// Shortest sleep between admission attempts; absorbs float rounding at refill edges.
const MIN_POLL: Duration = Duration::from_millis(1);

/// Snapshot of a bucket.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RateLimitStatus {
    /// Tokens available now (fractional)
    pub tokens_remaining: f64,
    /// Bucket capacity
    pub max_tokens: u32,
    /// Tokens added per second
    pub refill_rate: f64,
    /// Time until the next token is available; zero when one is available now
    #[serde(rename = "estimated_wait_ms", with = "crate::config::millis")]
    pub estimated_wait: Duration,
}

#[derive(Debug, Clone, Copy)]
struct BucketState {
    tokens: f64,
    last_refill: Instant,
    /// Effective rate; starts at the configured rate, moved by [`TokenBucket::set_rate`]
    rate: f64,
}

impl BucketState {
    /// Add tokens for the time since the last refill; returns that time.
    fn refill(&mut self, now: Instant, burst_limit: u32) -> Duration {
        let elapsed = now.saturating_duration_since(self.last_refill);
        self.tokens = (self.tokens + elapsed.as_secs_f64() * self.rate).min(f64::from(burst_limit));
        self.last_refill = now;
        elapsed
    }

    /// `refill_interval - (since_refill mod refill_interval)` when empty.
    fn wait(&self, since_refill: Duration) -> Duration {
        if self.tokens >= 1.0 {
            return Duration::ZERO;
        }
        let interval = crate::config::refill_interval(self.rate);
        let into_interval = since_refill.as_nanos() % interval.as_nanos().max(1);
        interval.saturating_sub(Duration::from_nanos(into_interval as u64))
    }
}

/// Token bucket: up to `burst_limit` immediate requests, then
/// `requests_per_second` sustained.
///
/// Refills lazily on every call, so an idle bucket costs nothing. State sits
/// behind a mutex; contended callers serialize, which keeps the
/// never-over-admit invariant without atomics on floats.
///
/// Uses [`tokio::time::Instant`] so tests can drive it with a paused clock.
///
/// # Example
///
/// ```rust,no_run
/// use amazon_rate_limit::{RateLimitConfig, TokenBucket};
///
/// # async fn example() -> amazon_error::AmazonResult<()> {
/// let bucket = TokenBucket::new(RateLimitConfig::new(1.0, 10))?;
/// bucket.wait_for_token().await;
/// // ... make the request
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct TokenBucket {
    config: RateLimitConfig,
    state: Mutex<BucketState>,
}

impl TokenBucket {
    /// Create a full bucket.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the rate or burst limit is invalid.
    pub fn new(config: RateLimitConfig) -> AmazonResult<Self> {
        config.validate()?;
        debug!(
            rps = config.requests_per_second,
            burst = config.burst_limit,
            "Created token bucket"
        );
        let state = BucketState {
            tokens: f64::from(config.burst_limit),
            last_refill: Instant::now(),
            rate: config.requests_per_second,
        };
        Ok(Self {
            config,
            state: Mutex::new(state),
        })
    }

    /// Bucket configuration as constructed.
    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Current refill rate in tokens per second.
    pub fn rate(&self) -> f64 {
        self.state().rate
    }

    /// Change the refill rate, keeping the burst limit and current tokens.
    ///
    /// Time elapsed so far is credited at the old rate.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `requests_per_second` is not a
    /// schedulable positive rate; the bucket is left unchanged.
    pub fn set_rate(&self, requests_per_second: f64) -> AmazonResult<()> {
        RateLimitConfig {
            requests_per_second,
            ..self.config.clone()
        }
        .validate()?;
        let mut state = self.state();
        let _ = state.refill(Instant::now(), self.config.burst_limit);
        if state.rate != requests_per_second {
            debug!(from = state.rate, to = requests_per_second, "Adjusted token bucket rate");
            state.rate = requests_per_second;
        }
        Ok(())
    }

    fn state(&self) -> MutexGuard<'_, BucketState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Take one token if available. Never blocks.
    pub fn try_consume(&self) -> bool {
        let mut state = self.state();
        let _ = state.refill(Instant::now(), self.config.burst_limit);
        if state.tokens >= 1.0 {
            state.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// Time until the next token, including jitter when enabled.
    pub fn wait_time(&self) -> Duration {
        let mut state = self.state();
        let since_refill = state.refill(Instant::now(), self.config.burst_limit);
        let wait = state.wait(since_refill);
        if self.config.jitter && !wait.is_zero() {
            wait.saturating_add(tokio_retry2::strategy::jitter(wait / 10))
        } else {
            wait
        }
    }

    /// Suspend until a token is taken. Returns the total time spent waiting.
    ///
    /// Cancellation-safe: dropping the future never consumes a token.
    pub async fn wait_for_token(&self) -> Duration {
        let started = Instant::now();
        loop {
            if self.try_consume() {
                return started.elapsed();
            }
            let wait = self.wait_time().max(MIN_POLL);
            trace!(wait_ms = wait.as_millis() as u64, "Waiting for rate limit token");
            tokio::time::sleep(wait).await;
        }
    }

    /// Current state without consuming.
    pub fn status(&self) -> RateLimitStatus {
        let mut state = self.state();
        let since_refill = state.refill(Instant::now(), self.config.burst_limit);
        RateLimitStatus {
            tokens_remaining: state.tokens,
            max_tokens: self.config.burst_limit,
            refill_rate: state.rate,
            estimated_wait: state.wait(since_refill),
        }
    }

    /// Refill to capacity.
    pub fn reset(&self) {
        let mut state = self.state();
        state.tokens = f64::from(self.config.burst_limit);
        state.last_refill = Instant::now();
    }

    /// Return a token taken for a request that never went out.
    pub fn refund(&self) {
        let mut state = self.state();
        state.tokens = (state.tokens + 1.0).min(f64::from(self.config.burst_limit));
    }
}
