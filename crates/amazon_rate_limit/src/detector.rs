//! Detection of upstream rate limits from response headers.
//!
//! SP-API reports the effective limit of the operation just called in
//! `x-amzn-RateLimit-Limit` (requests per second). Limits differ per seller
//! and change over time, so the reported value is more current than any
//! configured one. Callers apply it with [`TokenBucket::set_rate`].
//!
//! [`TokenBucket::set_rate`]: crate::TokenBucket::set_rate

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

/// Header carrying the upstream rate (requests/second).
pub const RATE_LIMIT_HEADER: &str = "x-amzn-ratelimit-limit";

/// Caches upstream-reported rates per endpoint.
///
/// # Example
///
/// ```rust,ignore
/// let detector = HeaderRateLimitDetector::new();
/// if let Some(rps) = detector.observe("/orders/v0/orders", response.headers()).await {
///     println!("Upstream allows {rps} req/s");
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct HeaderRateLimitDetector {
    detected: Arc<RwLock<HashMap<String, f64>>>,
}

impl HeaderRateLimitDetector {
    /// Create an empty detector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the rate reported in `headers` (lowercase names) for `endpoint`.
    ///
    /// Returns the detected rate, or `None` if the header is absent or invalid.
    #[instrument(skip(self, headers))]
    pub async fn observe(&self, endpoint: &str, headers: &HashMap<String, String>) -> Option<f64> {
        let rps: f64 = headers.get(RATE_LIMIT_HEADER)?.trim().parse().ok()?;
        if !(rps.is_finite() && rps > 0.0) {
            return None;
        }
        let previous = self
            .detected
            .write()
            .await
            .insert(endpoint.to_string(), rps);
        if previous != Some(rps) {
            debug!(rps, ?previous, "Detected upstream rate limit");
        }
        Some(rps)
    }

    /// Last rate detected for `endpoint`.
    pub async fn detected(&self, endpoint: &str) -> Option<f64> {
        self.detected.read().await.get(endpoint).copied()
    }

    /// All detected rates.
    pub async fn all(&self) -> HashMap<String, f64> {
        self.detected.read().await.clone()
    }

    /// Forget every detected rate.
    #[instrument(skip(self))]
    pub async fn clear_cache(&self) {
        debug!("Clearing detected rate limits");
        self.detected.write().await.clear();
    }
}
