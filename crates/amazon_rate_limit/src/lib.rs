//! Rate limiting and error recovery for Amazon API clients.
//!
//! Amazon throttles aggressively and per operation, so every outbound request
//! draws from a token bucket first and failed requests are retried with
//! exponential back-off.
//!
//! - [`TokenBucket`] - burst plus sustained-rate admission
//! - [`EndpointRateLimiters`] - one bucket per endpoint pattern
//! - [`DistributedRateLimiter`] - admission shared across instances via a
//!   [`RateLimitStorage`] (Redis with the `redis` feature)
//! - [`RetryExecutor`] - retry loop with [`ExponentialBackoffStrategy`]
//! - [`HeaderRateLimitDetector`] - upstream limits from response headers
//!
//! ## Features
//!
//! - `redis` - enables `RedisRateLimitStorage`

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod bucket;
mod config;
mod detector;
mod distributed;
#[cfg(feature = "redis")]
mod redis_storage;
mod registry;
mod retry;

pub use bucket::{RateLimitStatus, TokenBucket};
pub use config::{RateLimitConfig, RetryConfig, millis};
pub use detector::{HeaderRateLimitDetector, RATE_LIMIT_HEADER};
pub use distributed::{
    DistributedRateLimiter, DistributedStatus, InMemoryRateLimitStorage, RateLimitStorage,
    StorageStatus,
};
#[cfg(feature = "redis")]
pub use redis_storage::RedisRateLimitStorage;
pub use registry::{DEFAULT_LIMITER_KEY, EndpointRateLimiters, ResolvedLimiter};
pub use retry::{ExponentialBackoffStrategy, RetryExecutor, RetryStrategy};
