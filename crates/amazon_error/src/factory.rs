//! Normalization of raw upstream error responses into the error taxonomy.
//!
//! Each Amazon API reports failures in its own shape:
//! - SP-API: `{"errors": [{"code": "QuotaExceeded", "message": "...", "details": "..."}]}`
//! - Associates (PA-API 5): `{"__type": "...#TooManyRequestsException", "Errors": [{"Code": "...", "Message": "..."}]}`
//! - Advertising: `{"code": "UNAUTHORIZED", "details": "..."}`
//!
//! [`ApiErrorFactory::from_response`] is the single boundary where raw HTTP
//! data becomes an [`AmazonError`]. Nothing else in the workspace builds
//! errors from response bodies.

use crate::{AmazonError, Provider, RateLimitInfo};
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

/// Header names that carry an upstream request id, in lookup order.
const REQUEST_ID_HEADERS: &[&str] = &[
    "x-amzn-requestid",
    "x-amzn-request-id",
    "x-amz-request-id",
    "x-amz-rid",
];

/// Raw error response as observed by the transport.
///
/// Header names are stored lower-cased.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ErrorResponse {
    /// HTTP status code
    pub status: u16,
    /// HTTP reason phrase
    pub status_text: String,
    /// Parsed body (`Value::Null` when empty, `Value::String` when not JSON)
    pub data: Value,
    /// Response headers
    pub headers: HashMap<String, String>,
}

impl ErrorResponse {
    /// Create a response without headers.
    pub fn new(status: u16, status_text: impl Into<String>, data: Value) -> Self {
        Self {
            status,
            status_text: status_text.into(),
            data,
            headers: HashMap::new(),
        }
    }

    /// Add a header (name is lower-cased).
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Upstream request id from the well-known headers.
    pub fn request_id(&self) -> Option<String> {
        REQUEST_ID_HEADERS
            .iter()
            .find_map(|name| self.header(name))
            .map(str::to_string)
    }

    /// Quota details carried by the throttling headers.
    pub fn rate_limit_info(&self) -> RateLimitInfo {
        RateLimitInfo {
            retry_after: self.header("retry-after").and_then(parse_retry_after),
            limit: self
                .header("x-amzn-ratelimit-limit")
                .and_then(|v| v.trim().parse().ok()),
            remaining: self
                .header("x-ratelimit-remaining")
                .and_then(|v| v.trim().parse().ok()),
            reset_time: self.header("x-ratelimit-reset").and_then(parse_reset_time),
        }
    }
}

/// Parse a `Retry-After` value: delta-seconds (integer or fractional) or an
/// HTTP date.
///
/// # Examples
///
/// ```
/// use amazon_error::parse_retry_after;
/// use std::time::Duration;
///
/// assert_eq!(parse_retry_after("5"), Some(Duration::from_secs(5)));
/// assert_eq!(parse_retry_after("0.5"), Some(Duration::from_millis(500)));
/// assert_eq!(parse_retry_after("soon"), None);
/// assert_eq!(parse_retry_after("99999999999999999999999"), None);
/// ```
pub fn parse_retry_after(value: &str) -> Option<Duration> {
    let value = value.trim();
    if let Ok(secs) = value.parse::<f64>() {
        return Duration::try_from_secs_f64(secs).ok();
    }
    let date = DateTime::parse_from_rfc2822(value).ok()?;
    let delta = date.with_timezone(&Utc) - Utc::now();
    Some(delta.to_std().unwrap_or(Duration::ZERO))
}

fn parse_reset_time(value: &str) -> Option<DateTime<Utc>> {
    let secs = value.trim().parse::<i64>().ok()?;
    Utc.timestamp_opt(secs, 0).single()
}

/// Provider-specific error code and message pulled from a response body.
#[derive(Debug, Default)]
struct UpstreamError {
    code: Option<String>,
    message: Option<String>,
    details: Option<String>,
}

impl UpstreamError {
    fn extract(provider: Provider, data: &Value) -> Self {
        let extracted = match provider {
            Provider::SpApi => Self::from_entry(data.get("errors").and_then(first), "code", "message", "details"),
            Provider::Associates => {
                let mut upstream =
                    Self::from_entry(data.get("Errors").and_then(first), "Code", "Message", "Details");
                if upstream.code.is_none() {
                    upstream.code = data
                        .get("__type")
                        .and_then(Value::as_str)
                        .map(associates_type_code);
                }
                upstream
            }
            Provider::Advertising => {
                let mut upstream = Self::from_entry(Some(data), "code", "details", "message");
                if upstream.code.is_none() {
                    upstream = Self::from_entry(data.get("errors").and_then(first), "code", "message", "details");
                }
                upstream
            }
        };

        if extracted.message.is_some() || extracted.code.is_some() {
            return extracted;
        }

        // Unrecognized shape: fall back to a top-level message or a text body
        Self {
            message: data
                .get("message")
                .and_then(Value::as_str)
                .or_else(|| data.as_str())
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            ..Self::default()
        }
    }

    fn from_entry(entry: Option<&Value>, code: &str, message: &str, details: &str) -> Self {
        let field = |name: &str| {
            entry
                .and_then(|e| e.get(name))
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        Self {
            code: field(code),
            message: field(message),
            details: field(details),
        }
    }
}

fn first(value: &Value) -> Option<&Value> {
    value.as_array().and_then(|items| items.first())
}

/// `com.amazon.paapi5#TooManyRequestsException` becomes `TooManyRequests`.
fn associates_type_code(raw: &str) -> String {
    let name = raw.rsplit('#').next().unwrap_or(raw);
    name.strip_suffix("Exception").unwrap_or(name).to_string()
}

/// Maps one provider's error vocabulary onto the error taxonomy.
///
/// # Examples
///
/// ```
/// use amazon_error::{ApiErrorFactory, AmazonErrorKind, ErrorResponse, Provider};
/// use serde_json::json;
///
/// let factory = ApiErrorFactory::new(Provider::SpApi);
/// let response = ErrorResponse::new(
///     403,
///     "Forbidden",
///     json!({"errors": [{"code": "QuotaExceeded", "message": "You exceeded your quota"}]}),
/// );
///
/// let err = factory.from_response(&response, Some("req-1"));
/// assert!(matches!(err.kind(), AmazonErrorKind::QuotaExceeded { .. }));
/// assert!(!err.is_retryable());
/// assert_eq!(err.request_id(), Some("req-1"));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApiErrorFactory {
    provider: Provider,
}

impl ApiErrorFactory {
    /// Create a factory for `provider`.
    pub fn new(provider: Provider) -> Self {
        Self { provider }
    }

    /// Provider this factory maps for.
    pub fn provider(&self) -> Provider {
        self.provider
    }

    /// Normalize a raw error response.
    ///
    /// Known upstream codes are mapped first; anything else is classified by
    /// HTTP status. The explicit `request_id` wins over response headers.
    #[track_caller]
    pub fn from_response(&self, response: &ErrorResponse, request_id: Option<&str>) -> AmazonError {
        let upstream = UpstreamError::extract(self.provider, &response.data);
        let request_id = request_id
            .map(str::to_string)
            .or_else(|| response.request_id());
        let message = match (&upstream.message, &upstream.details) {
            (Some(message), Some(details)) => format!("{} ({})", message, details),
            (Some(message), None) => message.clone(),
            (None, _) => format!("{} {}", response.status, response.status_text),
        };

        let mapped = upstream
            .code
            .as_deref()
            .and_then(|code| self.map_code(code, response, request_id.clone(), &message, &upstream));

        let err = match mapped {
            Some(err) => err,
            None => {
                let err = self.map_status(response, request_id, message);
                let is_api = matches!(err.kind(), crate::AmazonErrorKind::Api { .. });
                match &upstream.code {
                    Some(code) if is_api => err.with_code(code.clone()),
                    _ => err,
                }
            }
        };

        debug!(
            provider = %self.provider,
            status = response.status,
            upstream_code = upstream.code.as_deref().unwrap_or("-"),
            code = err.code(),
            retryable = err.is_retryable(),
            "Mapped upstream error response"
        );
        err
    }

    #[track_caller]
    fn map_code(
        &self,
        code: &str,
        response: &ErrorResponse,
        request_id: Option<String>,
        message: &str,
        upstream: &UpstreamError,
    ) -> Option<AmazonError> {
        let provider = self.provider;
        let class = match provider {
            Provider::SpApi => match code {
                "QuotaExceeded" => CodeClass::Quota,
                "Unauthorized" | "Forbidden" | "AccessDenied" | "InvalidSignature"
                | "InvalidAccessToken" | "MissingAuthenticationToken" | "invalid_grant"
                | "unauthorized_client" | "invalid_client" => CodeClass::Auth,
                "InvalidInput" | "InvalidParameterValue" | "InvalidRequest" => CodeClass::Validation,
                "Throttled" | "TooManyRequests" | "RequestThrottled" => CodeClass::Throttled,
                "ServiceUnavailable" => CodeClass::Unavailable,
                "NotFound" | "ResourceNotFound" => CodeClass::Api(404),
                "InternalFailure" | "InternalError" => CodeClass::Api(response.status.max(500)),
                _ => return None,
            },
            Provider::Associates => match code {
                "TooManyRequests" | "RequestThrottled" => CodeClass::Throttled,
                "InvalidPartnerTag" | "InvalidAssociate" | "UnrecognizedClient"
                | "InvalidSignature" | "IncompleteSignature" | "AccessDenied"
                | "AccessDeniedAwsUsers" | "MissingAuthenticationToken" | "ExpiredToken" => {
                    CodeClass::Auth
                }
                "InvalidParameterValue" | "MissingParameter" | "InvalidParameterCombination"
                | "UnknownOperation" | "InvalidInput" | "ValidationException" => {
                    CodeClass::Validation
                }
                "ItemNotAccessible" | "NoResults" | "ResourceNotFound" => {
                    CodeClass::Api(if response.status >= 400 { response.status } else { 404 })
                }
                "InternalFailure" | "ServiceException" => CodeClass::Api(response.status.max(500)),
                _ => return None,
            },
            Provider::Advertising => match code {
                "UNAUTHORIZED" | "FORBIDDEN" | "INVALID_TOKEN" => CodeClass::Auth,
                "THROTTLED" | "TOO_MANY_REQUESTS" => CodeClass::Throttled,
                "INVALID_ARGUMENT" | "BAD_REQUEST" | "INVALID_REQUEST" => CodeClass::Validation,
                "NOT_FOUND" => CodeClass::Api(404),
                "INTERNAL_ERROR" | "SERVER_IS_BUSY" => CodeClass::Api(response.status.max(500)),
                _ => return None,
            },
        };

        let tagged = format!("[{}] {}", code, message);
        let err = match class {
            CodeClass::Quota => AmazonError::quota_exceeded(provider, request_id, tagged),
            CodeClass::Auth => AmazonError::auth(provider, tagged),
            CodeClass::Validation => AmazonError::validation(
                "request",
                None,
                upstream.details.clone().unwrap_or_else(|| message.to_string()),
                tagged,
            ),
            CodeClass::Throttled => AmazonError::rate_limit(response.rate_limit_info(), tagged),
            CodeClass::Unavailable => AmazonError::service_unavailable(
                response.header("retry-after").and_then(parse_retry_after),
                tagged,
            ),
            CodeClass::Api(status) => AmazonError::api(provider, status, request_id, tagged),
        };
        Some(err)
    }

    #[track_caller]
    fn map_status(
        &self,
        response: &ErrorResponse,
        request_id: Option<String>,
        message: String,
    ) -> AmazonError {
        match response.status {
            401 | 403 => AmazonError::auth(self.provider, message),
            429 => AmazonError::rate_limit(response.rate_limit_info(), message),
            503 => AmazonError::service_unavailable(
                response.header("retry-after").and_then(parse_retry_after),
                message,
            ),
            status => AmazonError::api(self.provider, status, request_id, message),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum CodeClass {
    Quota,
    Auth,
    Validation,
    Throttled,
    Unavailable,
    Api(u16),
}

/// Normalize a raw error response for `provider`.
///
/// Shorthand for `ApiErrorFactory::new(provider).from_response(..)`.
#[track_caller]
pub fn from_response(
    provider: Provider,
    response: &ErrorResponse,
    request_id: Option<&str>,
) -> AmazonError {
    ApiErrorFactory::new(provider).from_response(response, request_id)
}
