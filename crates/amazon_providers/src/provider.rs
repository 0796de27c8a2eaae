//! Lifecycle shared by every Amazon API provider.

use crate::pipeline::RequestPipeline;
use amazon_error::{AmazonError, AmazonErrorKind, AmazonResult, Provider};
use amazon_rate_limit::RateLimitStatus;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Health of an upstream API as seen by one probe request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum HealthStatus {
    /// Probe succeeded
    Healthy,
    /// Reachable but throttling
    Degraded {
        /// What the probe saw
        message: String,
    },
    /// Probe failed
    Unhealthy {
        /// What the probe saw
        message: String,
    },
}

impl HealthStatus {
    /// Classify the outcome of a probe request.
    pub fn from_probe<T>(result: &AmazonResult<T>) -> Self {
        match result {
            Ok(_) => HealthStatus::Healthy,
            Err(err) => Self::from_error(err),
        }
    }

    fn from_error(err: &AmazonError) -> Self {
        let message = err.to_string();
        match err.kind() {
            AmazonErrorKind::RateLimit(_) | AmazonErrorKind::QuotaExceeded { .. } => {
                HealthStatus::Degraded { message }
            }
            _ => HealthStatus::Unhealthy { message },
        }
    }

    /// Whether the probe succeeded outright.
    pub fn is_healthy(&self) -> bool {
        matches!(self, HealthStatus::Healthy)
    }
}

/// Operations every provider supports regardless of API.
#[async_trait]
pub trait AmazonProvider: Send + Sync + std::fmt::Debug {
    /// API family served.
    fn provider(&self) -> Provider;

    /// Pipeline the provider sends through.
    fn pipeline(&self) -> &RequestPipeline;

    /// Verify credentials can be used, e.g. by fetching a first token.
    ///
    /// # Errors
    ///
    /// Returns an auth or configuration error when the provider is unusable.
    async fn initialize(&self) -> AmazonResult<()>;

    /// Probe the API with a representative uncached read.
    async fn health_check(&self) -> HealthStatus;

    /// Bucket snapshot per endpoint pattern.
    fn rate_limit_status(&self) -> BTreeMap<String, RateLimitStatus> {
        self.pipeline().rate_limit_status()
    }

    /// Drop cached responses, all of them or those matching a glob pattern.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the pattern cannot be compiled.
    fn clear_cache(&self, pattern: Option<&str>) -> AmazonResult<usize> {
        self.pipeline().clear_cache(pattern)
    }
}
