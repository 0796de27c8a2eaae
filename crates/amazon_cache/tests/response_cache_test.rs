//! Tests for TTL expiry, LRU eviction and pattern invalidation.

use amazon_cache::{CacheConfig, CacheConfigBuilder, CacheKey, ResponseCache, TtlClass};
use amazon_error::Provider;
use serde_json::{Value, json};
use std::time::Duration;

fn small_cache(max_size: usize) -> ResponseCache<Value> {
    let config = CacheConfigBuilder::default()
        .max_size(max_size)
        .build()
        .unwrap();
    ResponseCache::new(config)
}

#[tokio::test(start_paused = true)]
async fn test_entry_expires_after_ttl() {
    let cache = small_cache(10);
    cache.set("k", json!("v"), Some(Duration::from_millis(1000)));
    assert_eq!(cache.get("k"), Some(json!("v")));

    tokio::time::advance(Duration::from_millis(1100)).await;
    assert_eq!(cache.get("k"), None);
    assert!(cache.is_empty());

    let stats = cache.stats();
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.expirations, 1);
}

#[tokio::test(start_paused = true)]
async fn test_default_ttl_applies_without_explicit_ttl() {
    let cache: ResponseCache<u32> = ResponseCache::new(
        CacheConfig::default().with_default_ttl(Duration::from_secs(2)),
    );
    cache.set("k", 7, None);

    tokio::time::advance(Duration::from_millis(1900)).await;
    assert_eq!(cache.get("k"), Some(7));
    tokio::time::advance(Duration::from_millis(200)).await;
    assert_eq!(cache.get("k"), None);
}

#[test]
fn test_lru_evicts_least_recently_read() {
    let cache = small_cache(2);
    cache.set("a", json!(1), None);
    cache.set("b", json!(2), None);

    // Reading "a" makes "b" the eviction candidate
    assert!(cache.get("a").is_some());
    cache.set("c", json!(3), None);

    assert_eq!(cache.len(), 2);
    assert!(cache.get("b").is_none());
    assert_eq!(cache.get("a"), Some(json!(1)));
    assert_eq!(cache.get("c"), Some(json!(3)));
    assert_eq!(cache.stats().evictions, 1);
}

#[test]
fn test_overwrite_does_not_evict() {
    let cache = small_cache(2);
    cache.set("a", json!(1), None);
    cache.set("b", json!(2), None);
    cache.set("a", json!(10), None);

    assert_eq!(cache.len(), 2);
    assert_eq!(cache.get("a"), Some(json!(10)));
    assert_eq!(cache.stats().evictions, 0);
}

#[test]
fn test_lru_order_survives_removals_and_rewrites() {
    let cache = small_cache(3);
    cache.set("a", json!(1), None);
    cache.set("b", json!(2), None);
    cache.set("c", json!(3), None);

    // Rewriting "a" and reading "b" leaves "c" oldest
    cache.set("a", json!(10), None);
    assert!(cache.get("b").is_some());
    cache.set("d", json!(4), None);
    assert!(cache.get("c").is_none());

    // A removed key never comes back as an eviction candidate
    assert!(cache.remove("a").is_some());
    cache.set("e", json!(5), None);
    cache.set("f", json!(6), None);

    assert_eq!(cache.len(), 3);
    assert!(cache.get("b").is_none());
    assert_eq!(cache.get("d"), Some(json!(4)));
    assert_eq!(cache.get("e"), Some(json!(5)));
    assert_eq!(cache.get("f"), Some(json!(6)));
    assert_eq!(cache.stats().evictions, 2);
}

#[test]
fn test_large_cache_evicts_in_insertion_order() {
    let cache = small_cache(1000);
    for i in 0..2000 {
        cache.set(&format!("key-{i}"), json!(i), None);
    }

    assert_eq!(cache.len(), 1000);
    assert!(cache.get("key-999").is_none());
    assert_eq!(cache.get("key-1000"), Some(json!(1000)));
    assert_eq!(cache.stats().evictions, 1000);
}

#[test]
fn test_clear_pattern_removes_matching_keys() {
    let cache = small_cache(10);
    cache.set("sp-api:/orders/v0/orders:1", json!(1), None);
    cache.set("sp-api:/orders/v0/orders:2", json!(2), None);
    cache.set("sp-api:/catalog/2022-04-01/items:3", json!(3), None);
    cache.set("associates:/paapi5/getitems:4", json!(4), None);

    assert_eq!(cache.clear_pattern("sp-api:/orders*").unwrap(), 2);
    assert_eq!(cache.len(), 2);
    assert_eq!(cache.clear_pattern("*:/paapi5/*").unwrap(), 1);
    assert!(cache.get("sp-api:/catalog/2022-04-01/items:3").is_some());

    cache.clear();
    assert!(cache.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_cleanup_and_remove() {
    let cache = small_cache(10);
    cache.set("short", json!(1), Some(Duration::from_secs(1)));
    cache.set("long", json!(2), Some(Duration::from_secs(60)));

    tokio::time::advance(Duration::from_secs(2)).await;
    assert_eq!(cache.cleanup_expired(), 1);
    assert_eq!(cache.remove("long"), Some(json!(2)));
    assert!(cache.is_empty());
}

#[test]
fn test_disabled_cache_stores_nothing() {
    let cache: ResponseCache<Value> =
        ResponseCache::new(CacheConfig::default().with_enabled(false));
    cache.set("k", json!(1), None);
    assert!(cache.get("k").is_none());
    assert!(cache.is_empty());
}

#[test]
fn test_keys_are_order_insensitive_and_scoped() {
    let a = CacheKey::new(Provider::SpApi, "get", "/orders/v0/orders")
        .query([("MarketplaceIds", "ATVPDKIKX0DER"), ("CreatedAfter", "2024-01-01")])
        .build();
    let b = CacheKey::new(Provider::SpApi, "GET", "/orders/v0/orders")
        .query([("CreatedAfter", "2024-01-01"), ("MarketplaceIds", "ATVPDKIKX0DER")])
        .build();
    assert_eq!(a, b);
    assert!(a.starts_with("sp-api:/orders/v0/orders:"));

    let other_query = CacheKey::new(Provider::SpApi, "GET", "/orders/v0/orders")
        .query([("CreatedAfter", "2024-02-01")])
        .build();
    assert_ne!(a, other_query);

    let nested_a = CacheKey::new(Provider::Associates, "POST", "/paapi5/searchitems")
        .body(&json!({"Keywords": "lamp", "Filters": {"MinPrice": 1, "MaxPrice": 9}}))
        .build();
    let nested_b = CacheKey::new(Provider::Associates, "POST", "/paapi5/searchitems")
        .body(&json!({"Filters": {"MaxPrice": 9, "MinPrice": 1}, "Keywords": "lamp"}))
        .build();
    assert_eq!(nested_a, nested_b);
}

#[test]
fn test_ttl_classes() {
    let config = CacheConfig::default();
    assert_eq!(config.ttl_for(TtlClass::Catalog), Duration::from_secs(7200));
    assert_eq!(config.ttl_for(TtlClass::Items), Duration::from_secs(3600));
    assert_eq!(config.ttl_for(TtlClass::Orders), Duration::from_secs(300));
    assert_eq!(config.ttl_for(TtlClass::Search), Duration::from_secs(600));
    assert_eq!(config.ttl_for(TtlClass::Reports), Duration::from_secs(1800));
    assert_eq!(config.ttl_for(TtlClass::Default), *config.default_ttl());
}

#[test]
fn test_bracket_pattern_is_literal() {
    let cache = small_cache(2);
    cache.set("[unclosed", json!(1), None);
    assert_eq!(cache.clear_pattern("[unclosed").unwrap(), 1);
    assert_eq!(cache.clear_pattern("[unclosed").unwrap(), 0);
}
