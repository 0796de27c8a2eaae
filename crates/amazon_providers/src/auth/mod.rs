//! Request authorization per API.
//!
//! - SP-API: Login with Amazon bearer token in `x-amz-access-token`
//!   ([`LwaTokenProvider`])
//! - Associates: AWS Signature Version 4 ([`SigV4Signer`])

mod lwa;
mod sigv4;

pub use lwa::{LWA_TOKEN_URL, LwaCredentials, LwaTokenProvider};
pub use sigv4::{PAAPI_SERVICE, SigV4Signer, paapi_target};

use crate::HttpRequest;
use amazon_error::{AmazonResult, Provider};
use async_trait::async_trait;

/// Adds credentials to outbound requests.
///
/// Called once per attempt, so signatures and tokens are always fresh when a
/// request is retried.
#[async_trait]
pub trait AuthProvider: Send + Sync + std::fmt::Debug {
    /// Add authorization headers to `request`.
    async fn authorize(&self, request: &mut HttpRequest) -> AmazonResult<()>;

    /// API this provider authorizes for.
    fn provider(&self) -> Provider;
}
