//! Client-safe error projection for the web layer.

use crate::AmazonError;
use serde::{Deserialize, Serialize};

/// What may leave the client layer: no stack, no location, no cause chain.
///
/// # Examples
///
/// ```
/// use amazon_error::{AmazonError, SanitizedError};
///
/// let err = AmazonError::http(502, "Bad Gateway", Some("<html>...</html>".into()));
/// let safe = err.sanitize();
/// assert_eq!(safe.code, "HTTP_ERROR");
/// assert!(safe.retryable);
/// assert!(!safe.message.contains("line"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SanitizedError {
    /// Human-readable message
    pub message: String,
    /// Machine-readable error code
    pub code: String,
    /// Whether the caller may try again
    pub retryable: bool,
}

impl AmazonError {
    /// Project the error into its client-safe form.
    pub fn sanitize(&self) -> SanitizedError {
        SanitizedError::from(self)
    }
}

impl From<&AmazonError> for SanitizedError {
    fn from(err: &AmazonError) -> Self {
        Self {
            message: err.message().to_string(),
            code: err.code().to_string(),
            retryable: err.is_retryable(),
        }
    }
}
