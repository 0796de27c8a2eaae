//! amazon-core - Rate-limited Amazon API clients
//!
//! amazon-core wraps Amazon's Selling Partner API and Product Advertising API
//! behind providers that share one request pipeline: per-endpoint token
//! bucket rate limiting, a TTL + LRU response cache, retry with exponential
//! back-off that honors `Retry-After`, and a typed error taxonomy.
//!
//! # Quick Start
//!
//! ```no_run
//! use amazon_core::{
//!     AmazonConfig, AmazonContext, LwaCredentials, OrdersQuery, SpApiConfig, SpApiProvider,
//!     SpApiRegion,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let file = AmazonConfig::load()?;
//! let sp_api = SpApiProvider::new(SpApiConfig::from_file_config(
//!     &file,
//!     LwaCredentials::new("client", "secret", "refresh"),
//!     SpApiRegion::NorthAmerica,
//! )?)?;
//! let context = AmazonContext::new().with_sp_api(sp_api);
//!
//! if let Some(sp_api) = context.sp_api() {
//!     let query = OrdersQuery::builder()
//!         .marketplace_ids(vec!["ATVPDKIKX0DER".to_string()])
//!         .last_updated_after(chrono::Utc::now() - chrono::Duration::days(1))
//!         .build()?;
//!     let orders = sp_api.get_orders(&query).await?;
//!     println!("{} orders", orders.orders.len());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - `amazon_error` - Error taxonomy and per-API error factories
//! - `amazon_validation` - Field validators and schema checks
//! - `amazon_rate_limit` - Token buckets, endpoint registry, retry executor
//! - `amazon_cache` - Response cache with per-class TTLs
//! - `amazon_providers` - SP-API and Associates providers
//!
//! This crate re-exports everything and adds [`AmazonContext`] plus logging
//! bootstrap.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod context;
mod observability;

pub use context::AmazonContext;
pub use observability::{ObservabilityConfig, init_observability, init_observability_with_config};

pub use amazon_cache::*;
pub use amazon_error::*;
pub use amazon_providers::*;
pub use amazon_rate_limit::*;
pub use amazon_validation::*;
