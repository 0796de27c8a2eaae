//! Error kinds and their per-kind payloads.

use crate::Provider;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;

/// A single failed field check, collected before raising one error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, derive_more::Display)]
#[display("{}: {} ({})", field, message, code)]
pub struct FieldViolation {
    /// Dotted path of the offending field
    pub field: String,
    /// Machine-readable violation code, e.g. `INVALID_ASIN_FORMAT`
    pub code: String,
    /// Human-readable explanation
    pub message: String,
    /// Offending value, when it can be shown
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl FieldViolation {
    /// Create a new field violation.
    pub fn new(
        field: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            code: code.into(),
            message: message.into(),
            value: None,
        }
    }

    /// Attach the offending value.
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }
}

/// Quota details carried by a throttling response.
///
/// Every field is optional because each API reports a different subset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RateLimitInfo {
    /// Server-mandated wait before retrying (`Retry-After`)
    pub retry_after: Option<Duration>,
    /// Upstream request rate limit (`x-amzn-RateLimit-Limit`, requests/second)
    pub limit: Option<f64>,
    /// Requests remaining in the current window
    pub remaining: Option<u64>,
    /// When the current window resets
    pub reset_time: Option<DateTime<Utc>>,
}

/// Low-level network failure classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr)]
pub enum ConnectionFailure {
    /// The request did not complete before its deadline
    #[strum(serialize = "connection timed out")]
    Timeout,
    /// The remote host refused or reset the connection
    #[strum(serialize = "connection refused")]
    Refused,
    /// The host name could not be resolved
    #[strum(serialize = "DNS resolution failed")]
    Dns,
    /// TLS negotiation or certificate validation failed
    #[strum(serialize = "TLS handshake failed")]
    Ssl,
}

impl ConnectionFailure {
    /// Default error code for this failure class.
    pub fn code(&self) -> &'static str {
        match self {
            ConnectionFailure::Timeout => "CONNECTION_TIMEOUT",
            ConnectionFailure::Refused => "CONNECTION_REFUSED",
            ConnectionFailure::Dns => "DNS_ERROR",
            ConnectionFailure::Ssl => "SSL_ERROR",
        }
    }

    /// Certificate problems do not heal by retrying; everything else may.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, ConnectionFailure::Ssl)
    }
}

/// Specific error conditions of the Amazon client layer.
///
/// One level of specialization: every kind shares the metadata held by
/// [`AmazonError`](crate::AmazonError) and adds its own payload.
#[derive(Debug, Clone, PartialEq, derive_more::Display)]
pub enum AmazonErrorKind {
    /// Invalid or missing client configuration
    #[display("configuration")]
    Config,
    /// Credentials rejected or token refresh failed
    #[display("authentication ({})", provider)]
    Auth {
        /// API that rejected the credentials
        provider: Provider,
    },
    /// A single input field failed local validation
    #[display("validation of '{}'", field)]
    Validation {
        /// Offending field
        field: String,
        /// Offending value, when safe to echo
        value: Option<String>,
        /// Constraint that was violated
        constraint: String,
    },
    /// Several input fields failed local validation
    #[display("multiple validation failures")]
    MultipleValidation {
        /// Every collected violation, in schema order
        violations: Vec<FieldViolation>,
    },
    /// Upstream API returned an error response
    #[display("{} API returned {}", provider, status_code)]
    Api {
        /// API that produced the response
        provider: Provider,
        /// HTTP status code
        status_code: u16,
        /// Upstream request id, if reported
        request_id: Option<String>,
    },
    /// Account-level quota exhausted; retrying inside the window cannot help
    #[display("{} quota exceeded", provider)]
    QuotaExceeded {
        /// API whose quota was exhausted
        provider: Provider,
        /// Upstream request id, if reported
        request_id: Option<String>,
    },
    /// Request was throttled (HTTP 429)
    #[display("rate limit exceeded")]
    RateLimit(RateLimitInfo),
    /// Service temporarily unavailable (HTTP 503)
    #[display("service unavailable")]
    ServiceUnavailable {
        /// Server-mandated wait before retrying
        retry_after: Option<Duration>,
    },
    /// Network-level failure before a response was received
    #[display("{} for {} {}", failure, method, request_url)]
    Connection {
        /// Failure class
        failure: ConnectionFailure,
        /// URL being requested
        request_url: String,
        /// HTTP method
        method: String,
    },
    /// Generic HTTP failure outside any provider vocabulary
    #[display("HTTP {} {}", status_code, status_text)]
    Http {
        /// HTTP status code
        status_code: u16,
        /// Reason phrase
        status_text: String,
        /// Response body, if any
        body: Option<String>,
    },
}

impl AmazonErrorKind {
    /// Default error code for this kind.
    pub fn default_code(&self) -> &'static str {
        match self {
            AmazonErrorKind::Config => "CONFIG_ERROR",
            AmazonErrorKind::Auth { .. } => "AUTH_ERROR",
            AmazonErrorKind::Validation { .. } => "VALIDATION_ERROR",
            AmazonErrorKind::MultipleValidation { .. } => "MULTIPLE_VALIDATION_ERRORS",
            AmazonErrorKind::Api { .. } => "API_ERROR",
            AmazonErrorKind::QuotaExceeded { .. } => "QUOTA_EXCEEDED",
            AmazonErrorKind::RateLimit(_) => "RATE_LIMIT_EXCEEDED",
            AmazonErrorKind::ServiceUnavailable { .. } => "SERVICE_UNAVAILABLE",
            AmazonErrorKind::Connection { failure, .. } => failure.code(),
            AmazonErrorKind::Http { .. } => "HTTP_ERROR",
        }
    }

    /// Default retry classification for this kind.
    pub fn default_retryable(&self) -> bool {
        match self {
            AmazonErrorKind::Config
            | AmazonErrorKind::Auth { .. }
            | AmazonErrorKind::Validation { .. }
            | AmazonErrorKind::MultipleValidation { .. }
            | AmazonErrorKind::QuotaExceeded { .. } => false,
            AmazonErrorKind::Api { status_code, .. } => *status_code >= 500,
            AmazonErrorKind::RateLimit(_) | AmazonErrorKind::ServiceUnavailable { .. } => true,
            AmazonErrorKind::Connection { failure, .. } => failure.is_retryable(),
            AmazonErrorKind::Http { status_code, .. } => *status_code >= 500 || *status_code == 429,
        }
    }

    /// HTTP status implied by this kind, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            AmazonErrorKind::Api { status_code, .. } | AmazonErrorKind::Http { status_code, .. } => {
                Some(*status_code)
            }
            AmazonErrorKind::QuotaExceeded { .. } => Some(403),
            AmazonErrorKind::RateLimit(_) => Some(429),
            AmazonErrorKind::ServiceUnavailable { .. } => Some(503),
            _ => None,
        }
    }

    /// Server-mandated wait carried by this kind, if any.
    pub fn retry_after(&self) -> Option<std::time::Duration> {
        match self {
            AmazonErrorKind::RateLimit(info) => info.retry_after,
            AmazonErrorKind::ServiceUnavailable { retry_after } => *retry_after,
            _ => None,
        }
    }
}
