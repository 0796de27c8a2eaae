//! Retry classification shared by every error the pipeline can observe.

use std::time::Duration;

/// Trait for errors that support retry logic.
///
/// The retry strategy never inspects concrete error types. It asks the error
/// whether it considers itself transient and which status code, error code and
/// server-mandated wait it carries, and combines that with its own policy.
///
/// # Examples
///
/// ```
/// use amazon_error::{AmazonError, RetryableError};
///
/// let err = AmazonError::http(503, "Service Unavailable", None);
/// assert!(err.is_retryable());
/// assert_eq!(err.status_code(), Some(503));
/// ```
pub trait RetryableError {
    /// Returns true if the error is transient by its own classification.
    fn is_retryable(&self) -> bool;

    /// HTTP status associated with the error, if any.
    fn status_code(&self) -> Option<u16> {
        None
    }

    /// Stable machine-readable error code, if any.
    fn error_code(&self) -> Option<&str> {
        None
    }

    /// Minimum wait the upstream asked for before the next attempt.
    fn retry_after(&self) -> Option<Duration> {
        None
    }
}
