//! Login with Amazon (LWA) token refresh for SP-API.

use super::AuthProvider;
use crate::{HttpRequest, HttpTransport, Method};
use amazon_error::{AmazonError, AmazonResult, Provider, from_response};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, instrument};

/// LWA token endpoint.
pub const LWA_TOKEN_URL: &str = "https://api.amazon.com/auth/o2/token";

/// Tokens are refreshed this long before they expire.
const REFRESH_MARGIN: Duration = Duration::from_secs(60);

const TOKEN_TIMEOUT: Duration = Duration::from_secs(30);

/// LWA application credentials and the seller's refresh token.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LwaCredentials {
    /// LWA client id
    pub client_id: String,
    /// LWA client secret
    pub client_secret: String,
    /// Refresh token from seller authorization
    pub refresh_token: String,
}

impl LwaCredentials {
    /// Bundle credentials.
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        refresh_token: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            refresh_token: refresh_token.into(),
        }
    }
}

impl fmt::Debug for LwaCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LwaCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone)]
struct AccessToken {
    value: String,
    expires_at: Instant,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

/// Exchanges the refresh token for short-lived access tokens and caches them.
///
/// Concurrent callers share one refresh: the token slot is locked for the
/// duration of the exchange.
#[derive(Debug)]
pub struct LwaTokenProvider {
    credentials: LwaCredentials,
    token_url: String,
    transport: Arc<dyn HttpTransport>,
    token: Mutex<Option<AccessToken>>,
}

impl LwaTokenProvider {
    /// Provider using the public LWA endpoint.
    pub fn new(credentials: LwaCredentials, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            credentials,
            token_url: LWA_TOKEN_URL.to_string(),
            transport,
            token: Mutex::new(None),
        }
    }

    /// Use a different token endpoint.
    pub fn with_token_url(mut self, token_url: impl Into<String>) -> Self {
        self.token_url = token_url.into();
        self
    }

    /// A valid access token, refreshing when missing or about to expire.
    ///
    /// # Errors
    ///
    /// Returns an auth error when LWA rejects the credentials, or the mapped
    /// upstream error for server-side failures.
    pub async fn access_token(&self) -> AmazonResult<String> {
        let mut slot = self.token.lock().await;
        if let Some(token) = slot.as_ref()
            && token.expires_at > Instant::now() + REFRESH_MARGIN
        {
            return Ok(token.value.clone());
        }
        let fresh = self.refresh().await?;
        let value = fresh.value.clone();
        *slot = Some(fresh);
        Ok(value)
    }

    /// Headers carrying the access token.
    ///
    /// # Errors
    ///
    /// See [`access_token`](Self::access_token).
    pub async fn auth_headers(&self) -> AmazonResult<Vec<(String, String)>> {
        Ok(vec![(
            "x-amz-access-token".to_string(),
            self.access_token().await?,
        )])
    }

    /// Drop the cached token so the next call refreshes.
    pub async fn invalidate(&self) {
        *self.token.lock().await = None;
    }

    #[instrument(skip(self), fields(client_id = %self.credentials.client_id))]
    async fn refresh(&self) -> AmazonResult<AccessToken> {
        debug!("Refreshing LWA access token");
        let body = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("grant_type", "refresh_token")
            .append_pair("refresh_token", &self.credentials.refresh_token)
            .append_pair("client_id", &self.credentials.client_id)
            .append_pair("client_secret", &self.credentials.client_secret)
            .finish();
        let request = HttpRequest::new(Method::Post, &self.token_url)
            .with_header(
                "content-type",
                "application/x-www-form-urlencoded;charset=UTF-8",
            )
            .with_body(body);

        let response = self.transport.send(request, TOKEN_TIMEOUT).await?;
        match response.status {
            400 | 401 | 403 => {
                let description = response
                    .data
                    .get("error_description")
                    .or_else(|| response.data.get("error"))
                    .and_then(|v| v.as_str())
                    .unwrap_or("credentials rejected");
                return Err(AmazonError::auth(
                    Provider::SpApi,
                    format!("LWA token refresh failed: {}", description),
                ));
            }
            status if status >= 300 => {
                let error_response = response.to_error_response();
                let request_id = error_response.request_id();
                return Err(from_response(
                    Provider::SpApi,
                    &error_response,
                    request_id.as_deref(),
                ));
            }
            _ => {}
        }

        let token: TokenResponse = serde_json::from_value(response.data).map_err(|e| {
            AmazonError::auth(Provider::SpApi, format!("Malformed LWA token response: {}", e))
        })?;
        debug!(expires_in = token.expires_in, "Obtained LWA access token");
        Ok(AccessToken {
            value: token.access_token,
            expires_at: Instant::now() + Duration::from_secs(token.expires_in),
        })
    }
}

#[async_trait]
impl AuthProvider for LwaTokenProvider {
    async fn authorize(&self, request: &mut HttpRequest) -> AmazonResult<()> {
        request.headers.extend(self.auth_headers().await?);
        Ok(())
    }

    fn provider(&self) -> Provider {
        Provider::SpApi
    }
}
