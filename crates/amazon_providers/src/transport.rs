//! HTTP transport abstraction.
//!
//! Providers talk to the network through [`HttpTransport`] so tests can swap
//! in a scripted transport. [`ReqwestTransport`] is the production
//! implementation.

use amazon_error::{AmazonError, AmazonResult, ConnectionFailure, ErrorResponse};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::error::Error as StdError;
use std::time::Duration;
use tracing::{debug, instrument};

/// HTTP method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr)]
#[strum(serialize_all = "UPPERCASE")]
pub enum Method {
    /// GET
    Get,
    /// POST
    Post,
    /// PUT
    Put,
    /// DELETE
    Delete,
}

/// Outbound request, fully resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    /// Method
    pub method: Method,
    /// Absolute URL including query string
    pub url: String,
    /// Header name/value pairs
    pub headers: Vec<(String, String)>,
    /// Serialized body; signers hash these exact bytes
    pub body: Option<String>,
}

impl HttpRequest {
    /// Request without headers or body.
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    /// Add a header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Set the body.
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// First header named `name` (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Response envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    /// Parsed JSON body; non-JSON bodies arrive as a string value
    pub data: Value,
    /// Status code
    pub status: u16,
    /// Reason phrase
    pub status_text: String,
    /// Headers with lowercase names
    pub headers: HashMap<String, String>,
}

impl HttpResponse {
    /// Response with a JSON body and no headers.
    pub fn new(status: u16, data: Value) -> Self {
        Self {
            data,
            status,
            status_text: reason_phrase(status).to_string(),
            headers: HashMap::new(),
        }
    }

    /// Add a header (name is lowercased).
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    /// Whether the status is below 400.
    pub fn is_success(&self) -> bool {
        self.status < 400
    }

    /// View for the error factory.
    pub fn to_error_response(&self) -> ErrorResponse {
        self.headers.iter().fold(
            ErrorResponse::new(self.status, self.status_text.clone(), self.data.clone()),
            |response, (name, value)| response.with_header(name, value.clone()),
        )
    }
}

fn reason_phrase(status: u16) -> &'static str {
    reqwest::StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("")
}

/// Sends HTTP requests.
#[async_trait]
pub trait HttpTransport: Send + Sync + std::fmt::Debug {
    /// Send `request`, failing with a connection error after `timeout`.
    ///
    /// Any status code is a successful send; mapping statuses to errors is
    /// the caller's job.
    async fn send(&self, request: HttpRequest, timeout: Duration) -> AmazonResult<HttpResponse>;
}

/// [`HttpTransport`] backed by a shared `reqwest::Client`.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Transport with a default client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Transport reusing `client`.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

/// Classify a reqwest failure into a connection failure class.
fn classify(error: &reqwest::Error) -> ConnectionFailure {
    if error.is_timeout() {
        return ConnectionFailure::Timeout;
    }
    let mut source: Option<&(dyn StdError + 'static)> = error.source();
    while let Some(cause) = source {
        let text = cause.to_string().to_ascii_lowercase();
        if text.contains("dns") || text.contains("failed to lookup") {
            return ConnectionFailure::Dns;
        }
        if text.contains("certificate") || text.contains("tls") || text.contains("ssl") {
            return ConnectionFailure::Ssl;
        }
        source = cause.source();
    }
    ConnectionFailure::Refused
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    #[instrument(skip(self, request), fields(method = %request.method, url = %request.url))]
    async fn send(&self, request: HttpRequest, timeout: Duration) -> AmazonResult<HttpResponse> {
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        };
        let mut builder = self
            .client
            .request(method, &request.url)
            .timeout(timeout);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = request.body.clone() {
            builder = builder.body(body);
        }

        let connection_error = |e: reqwest::Error| {
            AmazonError::connection(classify(&e), request.url.clone(), request.method.as_ref())
                .with_cause(e)
        };

        let response = builder.send().await.map_err(connection_error)?;
        let status = response.status();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect();
        let text = response.text().await.map_err(connection_error)?;
        let data = if text.is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        };
        debug!(status = status.as_u16(), "Received response");

        Ok(HttpResponse {
            data,
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or("").to_string(),
            headers,
        })
    }
}
