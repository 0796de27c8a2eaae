//! Rate limiting shared across process instances.
//!
//! A [`DistributedRateLimiter`] admits a request only when both its local
//! [`TokenBucket`] and the shared [`RateLimitStorage`] agree. The storage is
//! consulted for every admission, so N instances sharing a store never exceed
//! the configured limit together.

use crate::{RateLimitConfig, TokenBucket};
use amazon_error::AmazonResult;
use async_trait::async_trait;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, instrument, warn};

const MIN_POLL: Duration = Duration::from_millis(1);

/// Shared admission state for one key.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StorageStatus {
    /// Admissions left before the key is exhausted
    pub remaining: u64,
    /// Admissions allowed per window (or bucket capacity)
    pub limit: u64,
    /// Time until at least one more admission is possible
    #[serde(rename = "reset_in_ms", with = "crate::config::millis")]
    pub reset_in: Duration,
}

/// Shared counter store backing a [`DistributedRateLimiter`].
///
/// `consume` must be atomic per key: two instances racing for the last slot
/// must not both be admitted.
#[async_trait]
pub trait RateLimitStorage: Send + Sync + std::fmt::Debug {
    /// Try to take one admission for `key`.
    async fn consume(&self, key: &str) -> AmazonResult<bool>;

    /// Current state of `key`.
    async fn status(&self, key: &str) -> AmazonResult<StorageStatus>;

    /// Forget all state for `key`.
    async fn reset(&self, key: &str) -> AmazonResult<()>;

    /// Storage backend name for logs.
    fn backend(&self) -> &'static str;
}

/// Key count that triggers the first sweep of idle buckets.
const MIN_SWEEP_AT: usize = 64;

#[derive(Debug)]
struct KeyedBuckets {
    buckets: HashMap<String, Arc<TokenBucket>>,
    sweep_at: usize,
}

impl KeyedBuckets {
    /// Drop buckets that have refilled to capacity and are not in use.
    ///
    /// A full bucket admits exactly like a fresh one, so dropping it changes
    /// no decision.
    fn sweep(&mut self) {
        let before = self.buckets.len();
        self.buckets.retain(|_, bucket| {
            Arc::strong_count(bucket) > 1
                || bucket.status().tokens_remaining < f64::from(bucket.config().burst_limit)
        });
        self.sweep_at = (self.buckets.len() * 2).max(MIN_SWEEP_AT);
        debug!(
            removed = before - self.buckets.len(),
            remaining = self.buckets.len(),
            "Swept idle rate limit keys"
        );
    }
}

/// In-process storage: one token bucket per key.
///
/// Useful for tests and single-instance deployments that still want the
/// distributed code path. Keys whose buckets have refilled completely are
/// dropped as new keys arrive, so memory follows the number of recently
/// active keys rather than every key ever seen.
#[derive(Debug)]
pub struct InMemoryRateLimitStorage {
    config: RateLimitConfig,
    buckets: Mutex<KeyedBuckets>,
}

impl InMemoryRateLimitStorage {
    /// Storage whose per-key buckets use `config`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `config` is invalid.
    pub fn new(config: RateLimitConfig) -> AmazonResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            buckets: Mutex::new(KeyedBuckets {
                buckets: HashMap::new(),
                sweep_at: MIN_SWEEP_AT,
            }),
        })
    }

    /// Number of keys currently tracked.
    pub fn tracked_keys(&self) -> usize {
        self.buckets
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .buckets
            .len()
    }

    fn bucket(&self, key: &str) -> AmazonResult<Arc<TokenBucket>> {
        let mut state = self.buckets.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(bucket) = state.buckets.get(key) {
            return Ok(Arc::clone(bucket));
        }
        if state.buckets.len() >= state.sweep_at {
            state.sweep();
        }
        let bucket = Arc::new(TokenBucket::new(self.config.clone())?);
        state.buckets.insert(key.to_string(), Arc::clone(&bucket));
        Ok(bucket)
    }
}

#[async_trait]
impl RateLimitStorage for InMemoryRateLimitStorage {
    async fn consume(&self, key: &str) -> AmazonResult<bool> {
        Ok(self.bucket(key)?.try_consume())
    }

    async fn status(&self, key: &str) -> AmazonResult<StorageStatus> {
        let status = self.bucket(key)?.status();
        Ok(StorageStatus {
            remaining: status.tokens_remaining.floor() as u64,
            limit: u64::from(status.max_tokens),
            reset_in: status.estimated_wait,
        })
    }

    async fn reset(&self, key: &str) -> AmazonResult<()> {
        self.buckets
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .buckets
            .remove(key);
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

/// Combined view of local and shared state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DistributedStatus {
    /// Local bucket
    pub local: crate::RateLimitStatus,
    /// Shared storage; `None` when the store could not be reached
    pub shared: Option<StorageStatus>,
}

/// Limiter admitting a request only when local and shared limits both allow it.
///
/// When the shared store denies, the local token is refunded. When the store
/// errors, the request is admitted on the local decision alone and a warning
/// is logged; an unreachable store must not take the API client down with it.
#[derive(Debug)]
pub struct DistributedRateLimiter {
    key: String,
    local: TokenBucket,
    storage: Arc<dyn RateLimitStorage>,
}

impl DistributedRateLimiter {
    /// Limiter for `key` with a local bucket built from `config`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `config` is invalid.
    pub fn new(
        key: impl Into<String>,
        config: RateLimitConfig,
        storage: Arc<dyn RateLimitStorage>,
    ) -> AmazonResult<Self> {
        Ok(Self {
            key: key.into(),
            local: TokenBucket::new(config)?,
            storage,
        })
    }

    /// Shared key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Try to admit one request without waiting.
    #[instrument(skip(self), fields(key = %self.key, backend = self.storage.backend()))]
    pub async fn try_acquire(&self) -> bool {
        if !self.local.try_consume() {
            return false;
        }
        match self.storage.consume(&self.key).await {
            Ok(true) => true,
            Ok(false) => {
                debug!("Shared limit exhausted, refunding local token");
                self.local.refund();
                false
            }
            Err(e) => {
                warn!(error = %e, "Rate limit storage unavailable, using local limit only");
                true
            }
        }
    }

    /// Suspend until admitted. Returns the total time spent waiting.
    pub async fn wait_for_token(&self) -> Duration {
        let started = Instant::now();
        loop {
            if self.try_acquire().await {
                return started.elapsed();
            }
            tokio::time::sleep(self.wait_time().await.max(MIN_POLL)).await;
        }
    }

    /// Larger of the local and shared wait times.
    pub async fn wait_time(&self) -> Duration {
        let local = self.local.wait_time();
        match self.storage.status(&self.key).await {
            Ok(shared) if shared.remaining == 0 => local.max(shared.reset_in),
            _ => local,
        }
    }

    /// Local and shared state.
    pub async fn status(&self) -> DistributedStatus {
        DistributedStatus {
            local: self.local.status(),
            shared: self.storage.status(&self.key).await.ok(),
        }
    }

    /// Refill the local bucket and clear the shared key.
    ///
    /// # Errors
    ///
    /// Returns the storage error if the shared key could not be cleared.
    pub async fn reset(&self) -> AmazonResult<()> {
        self.local.reset();
        self.storage.reset(&self.key).await
    }
}
