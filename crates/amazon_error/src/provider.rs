//! Upstream Amazon API identifiers.

use serde::{Deserialize, Serialize};

/// Amazon API family a request or error belongs to.
///
/// The string form is used in cache keys, rate limiter keys and log fields.
///
/// # Examples
///
/// ```
/// use amazon_error::Provider;
/// use std::str::FromStr;
///
/// assert_eq!(Provider::SpApi.to_string(), "sp-api");
/// assert_eq!(Provider::from_str("associates").unwrap(), Provider::Associates);
/// ```
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
    strum::EnumIter,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Provider {
    /// Selling Partner API (orders, catalog, inventory, reports)
    SpApi,
    /// Amazon Advertising API
    Advertising,
    /// Product Advertising API 5.0 (Associates)
    Associates,
}
