//! Configuration structures for rate limiting and retry.
//!
//! Durations are expressed in milliseconds when serialized so the bundled
//! `amazon.toml` stays readable:
//!
//! ```toml
//! [providers.sp-api.rate_limit]
//! requests_per_second = 0.0167
//! burst_limit = 20
//! max_backoff_time_ms = 60_000
//! ```

use amazon_error::{AmazonError, AmazonResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::Duration;

/// Serde adapter storing a [`Duration`] as whole milliseconds.
pub mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    /// Serialize as milliseconds.
    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    /// Deserialize from milliseconds.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_max_backoff_time() -> Duration {
    Duration::from_secs(60)
}

fn default_jitter() -> bool {
    true
}

/// Token bucket parameters for one endpoint.
///
/// Invariant (checked by [`validate`](Self::validate)):
/// `requests_per_second > 0` and `burst_limit >= 1`.
///
/// # Example
///
/// ```toml
/// [providers.associates.rate_limit]
/// requests_per_second = 1.0
/// burst_limit = 1
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Sustained refill rate; may be fractional (0.0167 = one per minute)
    pub requests_per_second: f64,

    /// Bucket capacity
    pub burst_limit: u32,

    /// Growth factor applied by callers backing off after throttling
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Ceiling for throttling back-off
    #[serde(
        rename = "max_backoff_time_ms",
        with = "millis",
        default = "default_max_backoff_time"
    )]
    pub max_backoff_time: Duration,

    /// Add up to 10% random extra wait so callers do not wake in lockstep
    #[serde(default = "default_jitter")]
    pub jitter: bool,
}

impl RateLimitConfig {
    /// Config with the given rate and burst and default back-off settings.
    pub fn new(requests_per_second: f64, burst_limit: u32) -> Self {
        Self {
            requests_per_second,
            burst_limit,
            backoff_multiplier: default_backoff_multiplier(),
            max_backoff_time: default_max_backoff_time(),
            jitter: default_jitter(),
        }
    }

    /// Disable or enable wait-time jitter.
    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Default SP-API bucket for endpoints without an explicit entry.
    pub fn sp_api() -> Self {
        Self::new(1.0, 5)
    }

    /// Default Advertising API bucket.
    pub fn advertising() -> Self {
        Self::new(10.0, 10).with_backoff(1.5, Duration::from_secs(30))
    }

    /// Default Associates (PA-API) bucket: one request per second, no burst.
    pub fn associates() -> Self {
        Self::new(1.0, 1).with_backoff(3.0, Duration::from_secs(120))
    }

    fn with_backoff(mut self, multiplier: f64, max: Duration) -> Self {
        self.backoff_multiplier = multiplier;
        self.max_backoff_time = max;
        self
    }

    /// Time for one token to refill, saturating for rates too small to
    /// represent.
    pub fn refill_interval(&self) -> Duration {
        refill_interval(self.requests_per_second)
    }

    /// Check the configuration invariants.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the rate is not a positive finite
    /// number, its refill interval does not fit a `Duration`, or the burst
    /// limit is zero.
    pub fn validate(&self) -> AmazonResult<()> {
        if !(self.requests_per_second.is_finite() && self.requests_per_second > 0.0) {
            return Err(AmazonError::config(format!(
                "requests_per_second must be > 0, got {}",
                self.requests_per_second
            )));
        }
        if Duration::try_from_secs_f64(1.0 / self.requests_per_second).is_err() {
            return Err(AmazonError::config(format!(
                "requests_per_second {} is too small to schedule a refill",
                self.requests_per_second
            )));
        }
        if self.burst_limit < 1 {
            return Err(AmazonError::config("burst_limit must be >= 1"));
        }
        if !(self.backoff_multiplier.is_finite() && self.backoff_multiplier >= 1.0) {
            return Err(AmazonError::config(format!(
                "backoff_multiplier must be >= 1, got {}",
                self.backoff_multiplier
            )));
        }
        Ok(())
    }
}

pub(crate) fn refill_interval(requests_per_second: f64) -> Duration {
    Duration::try_from_secs_f64(1.0 / requests_per_second).unwrap_or(Duration::MAX)
}

fn default_retryable_statuses() -> BTreeSet<u16> {
    [408, 429, 500, 502, 503, 504].into_iter().collect()
}

fn default_retryable_error_codes() -> BTreeSet<String> {
    [
        "RATE_LIMIT_EXCEEDED",
        "SERVICE_UNAVAILABLE",
        "CONNECTION_TIMEOUT",
        "CONNECTION_REFUSED",
        "DNS_ERROR",
        "ECONNRESET",
        "Throttled",
        "TooManyRequests",
        "InternalFailure",
    ]
    .into_iter()
    .map(str::to_string)
    .collect()
}

/// Retry policy parameters.
///
/// # Example
///
/// ```toml
/// [providers.sp-api.retry]
/// max_retries = 3
/// base_delay_ms = 1000
/// max_delay_ms = 30000
/// backoff_multiplier = 2.0
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Retries after the first attempt
    pub max_retries: u32,

    /// Delay before the first retry
    #[serde(rename = "base_delay_ms", with = "millis")]
    pub base_delay: Duration,

    /// Ceiling for the computed delay (before jitter)
    #[serde(rename = "max_delay_ms", with = "millis")]
    pub max_delay: Duration,

    /// Growth factor per attempt
    pub backoff_multiplier: f64,

    /// HTTP statuses retried regardless of the error's own classification
    #[serde(default = "default_retryable_statuses")]
    pub retryable_statuses: BTreeSet<u16>,

    /// Error codes retried regardless of the error's own classification
    #[serde(default = "default_retryable_error_codes")]
    pub retryable_error_codes: BTreeSet<String>,
}

impl RetryConfig {
    /// Config with default retryable statuses and codes.
    pub fn new(
        max_retries: u32,
        base_delay: Duration,
        max_delay: Duration,
        backoff_multiplier: f64,
    ) -> Self {
        Self {
            max_retries,
            base_delay,
            max_delay,
            backoff_multiplier,
            retryable_statuses: default_retryable_statuses(),
            retryable_error_codes: default_retryable_error_codes(),
        }
    }

    /// SP-API: 3 retries, 1 s base, doubling.
    pub fn sp_api() -> Self {
        Self::new(3, Duration::from_millis(1000), Duration::from_secs(30), 2.0)
    }

    /// Advertising API: 5 retries, 500 ms base, ×1.5.
    pub fn advertising() -> Self {
        Self::new(5, Duration::from_millis(500), Duration::from_secs(30), 1.5)
    }

    /// Associates: 2 retries, 2 s base, tripling; the TPS ceiling is very low.
    pub fn associates() -> Self {
        Self::new(2, Duration::from_millis(2000), Duration::from_secs(60), 3.0)
    }

    /// Check the configuration invariants.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for a multiplier below 1 or a maximum
    /// delay shorter than the base delay.
    pub fn validate(&self) -> AmazonResult<()> {
        if !(self.backoff_multiplier.is_finite() && self.backoff_multiplier >= 1.0) {
            return Err(AmazonError::config(format!(
                "retry backoff_multiplier must be >= 1, got {}",
                self.backoff_multiplier
            )));
        }
        if self.max_delay < self.base_delay {
            return Err(AmazonError::config(
                "retry max_delay must not be shorter than base_delay",
            ));
        }
        Ok(())
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::sp_api()
    }
}
