//! Structured request events.
//!
//! Every provider call emits the same field set so log pipelines can group by
//! provider and endpoint without parsing messages.

use amazon_error::{AmazonError, Provider};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Outbound request about to be attempted.
pub fn log_request(provider: Provider, method: &str, endpoint: &str) {
    debug!(
        provider = %provider,
        method,
        endpoint,
        "API request"
    );
}

/// Response received for a request, successful or not.
pub fn log_response(provider: Provider, method: &str, endpoint: &str, status: u16, elapsed: Duration) {
    let elapsed_ms = elapsed.as_millis() as u64;
    if status >= 500 {
        error!(provider = %provider, method, endpoint, status, elapsed_ms, "API response");
    } else if status >= 400 {
        warn!(provider = %provider, method, endpoint, status, elapsed_ms, "API response");
    } else {
        info!(provider = %provider, method, endpoint, status, elapsed_ms, "API response");
    }
}

/// Final failure after retries were exhausted or skipped.
pub fn log_failure(provider: Provider, method: &str, endpoint: &str, err: &AmazonError) {
    error!(
        provider = %provider,
        method,
        endpoint,
        code = err.code(),
        retryable = err.is_retryable(),
        error = %err,
        "API request failed"
    );
}

/// Cache lookup outcome.
pub fn log_cache(provider: Provider, endpoint: &str, hit: bool) {
    debug!(
        provider = %provider,
        endpoint,
        cache = if hit { "hit" } else { "miss" },
        "Cache lookup"
    );
}
