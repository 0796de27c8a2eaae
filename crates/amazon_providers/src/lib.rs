//! Amazon API providers built on a shared request pipeline.
//!
//! - [`SpApiProvider`]: Selling Partner API (orders, catalog, inventory,
//!   reports) authorized with Login with Amazon
//! - [`AssociatesProvider`]: Product Advertising API 5.0 signed with AWS
//!   Signature Version 4, plus affiliate link building
//!
//! Both send through [`RequestPipeline`], which applies per-endpoint rate
//! limits, response caching and retry with exponential back-off, and maps
//! every upstream failure into an [`AmazonError`](amazon_error::AmazonError).
//!
//! # Example
//!
//! ```no_run
//! use amazon_providers::{AmazonConfig, AmazonProvider, LwaCredentials, SpApiConfig, SpApiProvider, SpApiRegion};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let file = AmazonConfig::load()?;
//! let config = SpApiConfig::from_file_config(
//!     &file,
//!     LwaCredentials::new("client", "secret", "refresh"),
//!     SpApiRegion::NorthAmerica,
//! )?;
//! let provider = SpApiProvider::new(config)?;
//! provider.initialize().await?;
//! println!("{:?}", provider.health_check().await);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod associates;
mod auth;
mod config;
mod logging;
mod pipeline;
mod provider;
mod region;
mod sp_api;
mod transport;

pub use associates::*;
pub use auth::{
    AuthProvider, LWA_TOKEN_URL, LwaCredentials, LwaTokenProvider, PAAPI_SERVICE, SigV4Signer,
    paapi_target,
};
pub use config::{
    AmazonConfig, AssociatesConfig, AssociatesConfigBuilder, DEFAULT_HEALTH_CHECK_ASIN,
    ProviderSettings, SpApiConfig, SpApiConfigBuilder,
};
pub use logging::{log_cache, log_failure, log_request, log_response};
pub use pipeline::{ApiRequest, RequestPipeline};
pub use provider::{AmazonProvider, HealthStatus};
pub use region::{AssociatesMarketplace, SpApiRegion};
pub use sp_api::*;
pub use transport::{HttpRequest, HttpResponse, HttpTransport, Method, ReqwestTransport};
