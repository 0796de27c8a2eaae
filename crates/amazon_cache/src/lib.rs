//! Response caching with TTL support.
//!
//! Providers cache successful read responses to save rate limit tokens.
//! Entries expire per [`TtlClass`] and the cache evicts least recently used
//! entries once full.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod cache;
mod config;
mod key;
mod pattern;

pub use cache::{CacheEntry, CacheStats, ResponseCache};
pub use config::{CacheConfig, CacheConfigBuilder, TtlClass, TtlPolicy};
pub use key::CacheKey;
