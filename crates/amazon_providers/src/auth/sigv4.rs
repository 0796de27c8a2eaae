//! AWS Signature Version 4 for the Product Advertising API.

use super::AuthProvider;
use crate::{HttpRequest, Method};
use amazon_error::{AmazonError, AmazonResult, Provider};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use std::fmt;

type HmacSha256 = Hmac<Sha256>;

/// Signing service name for PA-API 5.
pub const PAAPI_SERVICE: &str = "ProductAdvertisingAPI";

const ALGORITHM: &str = "AWS4-HMAC-SHA256";
const TARGET_PREFIX: &str = "com.amazon.paapi5.v1.ProductAdvertisingAPIv1";
const CONTENT_TYPE: &str = "application/json; charset=utf-8";
const CONTENT_ENCODING: &str = "amz-1.0";

/// `x-amz-target` for a PA-API operation path such as `/paapi5/getitems`.
pub fn paapi_target(path: &str) -> Option<String> {
    let operation = match path.rsplit('/').next()? {
        "getitems" => "GetItems",
        "searchitems" => "SearchItems",
        "getbrowsenodes" => "GetBrowseNodes",
        "getvariations" => "GetVariations",
        _ => return None,
    };
    Some(format!("{}.{}", TARGET_PREFIX, operation))
}

fn hmac(key: &[u8], data: &str) -> AmazonResult<Vec<u8>> {
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| AmazonError::config(format!("Invalid signing key: {}", e)))?;
    mac.update(data.as_bytes());
    Ok(mac.finalize().into_bytes().to_vec())
}

fn sha256_hex(data: &str) -> String {
    hex::encode(Sha256::digest(data.as_bytes()))
}

/// Signs PA-API requests with an access key pair.
#[derive(Clone)]
pub struct SigV4Signer {
    access_key: String,
    secret_key: String,
    region: String,
    service: String,
    host: String,
}

impl fmt::Debug for SigV4Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigV4Signer")
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .field("region", &self.region)
            .field("service", &self.service)
            .field("host", &self.host)
            .finish()
    }
}

impl SigV4Signer {
    /// Signer for PA-API on `host` in `region`.
    pub fn new(
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
        region: impl Into<String>,
        host: impl Into<String>,
    ) -> Self {
        Self {
            access_key: access_key.into(),
            secret_key: secret_key.into(),
            region: region.into(),
            service: PAAPI_SERVICE.to_string(),
            host: host.into(),
        }
    }

    /// Sign for a different AWS service.
    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.service = service.into();
        self
    }

    /// Headers for `method path` with `body`, signed at `timestamp`.
    ///
    /// Returns every header that must accompany the request, `authorization`
    /// last.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the signing key cannot be derived.
    pub fn sign_request(
        &self,
        method: Method,
        path: &str,
        body: &str,
        timestamp: DateTime<Utc>,
    ) -> AmazonResult<Vec<(String, String)>> {
        let amz_date = timestamp.format("%Y%m%dT%H%M%SZ").to_string();
        let date = timestamp.format("%Y%m%d").to_string();

        // Sorted by name, as canonical headers must be
        let mut headers = vec![
            ("content-encoding".to_string(), CONTENT_ENCODING.to_string()),
            ("content-type".to_string(), CONTENT_TYPE.to_string()),
            ("host".to_string(), self.host.clone()),
            ("x-amz-date".to_string(), amz_date.clone()),
        ];
        if let Some(target) = paapi_target(path) {
            headers.push(("x-amz-target".to_string(), target));
        }

        let canonical_headers: String = headers
            .iter()
            .map(|(name, value)| format!("{}:{}\n", name, value.trim()))
            .collect();
        let signed_headers = headers
            .iter()
            .map(|(name, _)| name.as_str())
            .collect::<Vec<_>>()
            .join(";");
        let canonical_request = format!(
            "{}\n{}\n\n{}\n{}\n{}",
            method,
            path,
            canonical_headers,
            signed_headers,
            sha256_hex(body)
        );

        let scope = format!("{}/{}/{}/aws4_request", date, self.region, self.service);
        let string_to_sign = format!(
            "{}\n{}\n{}\n{}",
            ALGORITHM,
            amz_date,
            scope,
            sha256_hex(&canonical_request)
        );

        let key = hmac(format!("AWS4{}", self.secret_key).as_bytes(), &date)?;
        let key = hmac(&key, &self.region)?;
        let key = hmac(&key, &self.service)?;
        let key = hmac(&key, "aws4_request")?;
        let signature = hex::encode(hmac(&key, &string_to_sign)?);

        headers.push((
            "authorization".to_string(),
            format!(
                "{} Credential={}/{}, SignedHeaders={}, Signature={}",
                ALGORITHM, self.access_key, scope, signed_headers, signature
            ),
        ));
        Ok(headers)
    }
}

#[async_trait]
impl AuthProvider for SigV4Signer {
    async fn authorize(&self, request: &mut HttpRequest) -> AmazonResult<()> {
        let url = url::Url::parse(&request.url)
            .map_err(|e| AmazonError::config(format!("Invalid request URL '{}': {}", request.url, e)))?;
        let body = request.body.as_deref().unwrap_or("");
        let headers = self.sign_request(request.method, url.path(), body, Utc::now())?;
        // Signed values replace any caller-supplied duplicates
        request
            .headers
            .retain(|(name, _)| !headers.iter().any(|(signed, _)| signed.eq_ignore_ascii_case(name)));
        request.headers.extend(headers);
        Ok(())
    }

    fn provider(&self) -> Provider {
        Provider::Associates
    }
}
