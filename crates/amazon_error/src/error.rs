//! Top-level error wrapper type.

use crate::{AmazonErrorKind, ConnectionFailure, FieldViolation, Provider, RateLimitInfo, RetryableError};
use chrono::{DateTime, Utc};
use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

type Cause = Arc<dyn StdError + Send + Sync>;

#[derive(Debug, Clone)]
struct ErrorInner {
    kind: AmazonErrorKind,
    message: String,
    code: String,
    retryable: bool,
    timestamp: DateTime<Utc>,
    cause: Option<Cause>,
    line: u32,
    file: &'static str,
}

/// Amazon client error with kind discrimination and location tracking.
///
/// Every error carries the shared metadata (`code`, `retryable`, `timestamp`,
/// optional `cause`) plus the payload of its [`AmazonErrorKind`]. Errors are
/// cheap to clone and never mutated after they leave the constructor chain.
///
/// # Examples
///
/// ```
/// use amazon_error::{AmazonError, AmazonErrorKind, AmazonResult, Provider};
///
/// fn fetch() -> AmazonResult<()> {
///     Err(AmazonError::auth(Provider::SpApi, "refresh token revoked"))
/// }
///
/// let err = fetch().unwrap_err();
/// assert_eq!(err.code(), "AUTH_ERROR");
/// assert!(!err.is_retryable());
/// assert!(matches!(err.kind(), AmazonErrorKind::Auth { provider: Provider::SpApi }));
/// ```
#[derive(Debug, Clone)]
pub struct AmazonError(Box<ErrorInner>);

impl AmazonError {
    /// Create a new error from a kind, using the kind's default code and
    /// retry classification.
    #[track_caller]
    pub fn new(kind: AmazonErrorKind, message: impl Into<String>) -> Self {
        let location = std::panic::Location::caller();
        Self(Box::new(ErrorInner {
            code: kind.default_code().to_string(),
            retryable: kind.default_retryable(),
            kind,
            message: message.into(),
            timestamp: Utc::now(),
            cause: None,
            line: location.line(),
            file: location.file(),
        }))
    }

    /// Invalid or missing configuration.
    #[track_caller]
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(AmazonErrorKind::Config, message)
    }

    /// Credentials rejected by `provider`.
    #[track_caller]
    pub fn auth(provider: Provider, message: impl Into<String>) -> Self {
        Self::new(AmazonErrorKind::Auth { provider }, message)
    }

    /// A single field failed validation.
    #[track_caller]
    pub fn validation(
        field: impl Into<String>,
        value: Option<String>,
        constraint: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::new(
            AmazonErrorKind::Validation {
                field: field.into(),
                value,
                constraint: constraint.into(),
            },
            message,
        )
    }

    /// Several fields failed validation.
    #[track_caller]
    pub fn multiple_validation(violations: Vec<FieldViolation>) -> Self {
        let message = violations
            .iter()
            .map(|v| format!("{}: {}", v.field, v.message))
            .collect::<Vec<_>>()
            .join("; ");
        Self::new(AmazonErrorKind::MultipleValidation { violations }, message)
    }

    /// Upstream API error response.
    #[track_caller]
    pub fn api(
        provider: Provider,
        status_code: u16,
        request_id: Option<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::new(
            AmazonErrorKind::Api {
                provider,
                status_code,
                request_id,
            },
            message,
        )
    }

    /// Account quota exhausted.
    #[track_caller]
    pub fn quota_exceeded(
        provider: Provider,
        request_id: Option<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::new(
            AmazonErrorKind::QuotaExceeded {
                provider,
                request_id,
            },
            message,
        )
    }

    /// Request throttled.
    #[track_caller]
    pub fn rate_limit(info: RateLimitInfo, message: impl Into<String>) -> Self {
        Self::new(AmazonErrorKind::RateLimit(info), message)
    }

    /// Upstream temporarily unavailable.
    #[track_caller]
    pub fn service_unavailable(retry_after: Option<Duration>, message: impl Into<String>) -> Self {
        Self::new(AmazonErrorKind::ServiceUnavailable { retry_after }, message)
    }

    /// Network failure before any response arrived.
    #[track_caller]
    pub fn connection(
        failure: ConnectionFailure,
        request_url: impl Into<String>,
        method: impl Into<String>,
    ) -> Self {
        let request_url = request_url.into();
        let method = method.into();
        let message = format!("{} for {} {}", failure, method, request_url);
        Self::new(
            AmazonErrorKind::Connection {
                failure,
                request_url,
                method,
            },
            message,
        )
    }

    /// Generic HTTP failure.
    #[track_caller]
    pub fn http(status_code: u16, status_text: impl Into<String>, body: Option<String>) -> Self {
        let status_text = status_text.into();
        let message = format!("HTTP {} {}", status_code, status_text);
        Self::new(
            AmazonErrorKind::Http {
                status_code,
                status_text,
                body,
            },
            message,
        )
    }

    /// Replace the default error code.
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.0.code = code.into();
        self
    }

    /// Override the kind's default retry classification.
    pub fn with_retryable(mut self, retryable: bool) -> Self {
        self.0.retryable = retryable;
        self
    }

    /// Attach the underlying cause.
    pub fn with_cause<E>(mut self, cause: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        self.0.cause = Some(Arc::new(cause));
        self
    }

    /// Get the error kind.
    pub fn kind(&self) -> &AmazonErrorKind {
        &self.0.kind
    }

    /// Human-readable message.
    pub fn message(&self) -> &str {
        &self.0.message
    }

    /// Machine-readable error code.
    pub fn code(&self) -> &str {
        &self.0.code
    }

    /// Whether the error is transient by its own classification.
    pub fn is_retryable(&self) -> bool {
        self.0.retryable
    }

    /// When the error was constructed.
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.0.timestamp
    }

    /// Source file and line that constructed the error.
    pub fn location(&self) -> (&'static str, u32) {
        (self.0.file, self.0.line)
    }

    /// HTTP status implied by the error, if any.
    pub fn status_code(&self) -> Option<u16> {
        self.0.kind.status_code()
    }

    /// Server-mandated wait before the next attempt, if any.
    pub fn retry_after(&self) -> Option<Duration> {
        self.0.kind.retry_after()
    }

    /// Provider the error is attributed to, if any.
    pub fn provider(&self) -> Option<Provider> {
        match &self.0.kind {
            AmazonErrorKind::Auth { provider }
            | AmazonErrorKind::Api { provider, .. }
            | AmazonErrorKind::QuotaExceeded { provider, .. } => Some(*provider),
            _ => None,
        }
    }

    /// Upstream request id, if reported.
    pub fn request_id(&self) -> Option<&str> {
        match &self.0.kind {
            AmazonErrorKind::Api { request_id, .. }
            | AmazonErrorKind::QuotaExceeded { request_id, .. } => request_id.as_deref(),
            _ => None,
        }
    }

    /// Field violations for validation errors; empty otherwise.
    pub fn violations(&self) -> Vec<FieldViolation> {
        match &self.0.kind {
            AmazonErrorKind::Validation {
                field,
                value,
                constraint,
            } => {
                let violation = FieldViolation::new(field.clone(), self.code(), constraint.clone());
                vec![match value {
                    Some(value) => violation.with_value(value.clone()),
                    None => violation,
                }]
            }
            AmazonErrorKind::MultipleValidation { violations } => violations.clone(),
            _ => Vec::new(),
        }
    }
}

impl fmt::Display for AmazonError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Amazon Error [{}]: {}: {} at line {} in {}",
            self.0.code, self.0.kind, self.0.message, self.0.line, self.0.file
        )
    }
}

impl StdError for AmazonError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.0
            .cause
            .as_ref()
            .map(|cause| cause.as_ref() as &(dyn StdError + 'static))
    }
}

impl RetryableError for AmazonError {
    fn is_retryable(&self) -> bool {
        self.0.retryable
    }

    fn status_code(&self) -> Option<u16> {
        AmazonError::status_code(self)
    }

    fn error_code(&self) -> Option<&str> {
        Some(&self.0.code)
    }

    fn retry_after(&self) -> Option<Duration> {
        AmazonError::retry_after(self)
    }
}

/// Result type for Amazon client operations.
///
/// # Examples
///
/// ```
/// use amazon_error::{AmazonError, AmazonResult};
///
/// fn load() -> AmazonResult<u32> {
///     Err(AmazonError::config("missing refresh token"))
/// }
/// assert!(load().is_err());
/// ```
pub type AmazonResult<T> = std::result::Result<T, AmazonError>;
