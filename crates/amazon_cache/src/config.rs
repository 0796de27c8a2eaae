//! Cache configuration and TTL policy.

use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Serde adapter storing a [`Duration`] as whole seconds.
mod seconds {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}

/// Volatility class of a cached response.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TtlClass {
    /// Catalog item attributes
    Catalog,
    /// Browse node hierarchy
    BrowseNodes,
    /// Associates item lookups (prices move)
    Items,
    /// Orders and order items
    Orders,
    /// FBA inventory summaries
    Inventory,
    /// Keyword search results
    Search,
    /// Report metadata and documents
    Reports,
    /// Anything unclassified
    Default,
}

/// TTL per [`TtlClass`].
///
/// ```toml
/// [cache.ttl]
/// catalog_secs = 7200
/// orders_secs = 300
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters)]
#[serde(default)]
pub struct TtlPolicy {
    #[serde(rename = "catalog_secs", with = "seconds")]
    catalog: Duration,
    #[serde(rename = "browse_nodes_secs", with = "seconds")]
    browse_nodes: Duration,
    #[serde(rename = "items_secs", with = "seconds")]
    items: Duration,
    #[serde(rename = "orders_secs", with = "seconds")]
    orders: Duration,
    #[serde(rename = "inventory_secs", with = "seconds")]
    inventory: Duration,
    #[serde(rename = "search_secs", with = "seconds")]
    search: Duration,
    #[serde(rename = "reports_secs", with = "seconds")]
    reports: Duration,
}

impl Default for TtlPolicy {
    fn default() -> Self {
        const MINUTE: u64 = 60;
        Self {
            catalog: Duration::from_secs(120 * MINUTE),
            browse_nodes: Duration::from_secs(120 * MINUTE),
            items: Duration::from_secs(60 * MINUTE),
            orders: Duration::from_secs(5 * MINUTE),
            inventory: Duration::from_secs(5 * MINUTE),
            search: Duration::from_secs(10 * MINUTE),
            reports: Duration::from_secs(30 * MINUTE),
        }
    }
}

impl TtlPolicy {
    /// TTL for `class`; `default_ttl` covers [`TtlClass::Default`].
    pub fn ttl(&self, class: TtlClass, default_ttl: Duration) -> Duration {
        match class {
            TtlClass::Catalog => self.catalog,
            TtlClass::BrowseNodes => self.browse_nodes,
            TtlClass::Items => self.items,
            TtlClass::Orders => self.orders,
            TtlClass::Inventory => self.inventory,
            TtlClass::Search => self.search,
            TtlClass::Reports => self.reports,
            TtlClass::Default => default_ttl,
        }
    }
}

/// Configuration for [`ResponseCache`](crate::ResponseCache).
#[derive(
    Debug,
    Clone,
    PartialEq,
    Serialize,
    Deserialize,
    Getters,
    derive_setters::Setters,
    derive_builder::Builder,
)]
#[setters(prefix = "with_")]
#[builder(default)]
#[serde(default)]
pub struct CacheConfig {
    /// Whether caching is enabled
    enabled: bool,

    /// Maximum number of entries before LRU eviction
    max_size: usize,

    /// TTL for unclassified entries
    #[serde(rename = "default_ttl_secs", with = "seconds")]
    default_ttl: Duration,

    /// Per-class TTLs
    ttl: TtlPolicy,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_size: 1000,
            default_ttl: Duration::from_secs(300),
            ttl: TtlPolicy::default(),
        }
    }
}

impl CacheConfig {
    /// TTL for `class`.
    pub fn ttl_for(&self, class: TtlClass) -> Duration {
        self.ttl.ttl(class, self.default_ttl)
    }
}
