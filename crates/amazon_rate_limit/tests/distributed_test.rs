//! Tests for shared admission and header detection.

use amazon_error::{AmazonError, AmazonResult};
use amazon_rate_limit::{
    DistributedRateLimiter, HeaderRateLimitDetector, InMemoryRateLimitStorage, RateLimitConfig,
    RateLimitStorage, StorageStatus,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug)]
struct UnreachableStorage;

#[async_trait]
impl RateLimitStorage for UnreachableStorage {
    async fn consume(&self, _key: &str) -> AmazonResult<bool> {
        Err(AmazonError::config("storage offline"))
    }

    async fn status(&self, _key: &str) -> AmazonResult<StorageStatus> {
        Err(AmazonError::config("storage offline"))
    }

    async fn reset(&self, _key: &str) -> AmazonResult<()> {
        Err(AmazonError::config("storage offline"))
    }

    fn backend(&self) -> &'static str {
        "unreachable"
    }
}

fn shared_storage(burst: u32) -> Arc<dyn RateLimitStorage> {
    Arc::new(
        InMemoryRateLimitStorage::new(RateLimitConfig::new(0.01, burst).with_jitter(false))
            .unwrap(),
    )
}

#[tokio::test(start_paused = true)]
async fn test_instances_share_one_limit() {
    let storage = shared_storage(3);
    let local = RateLimitConfig::new(1.0, 5).with_jitter(false);
    let first = DistributedRateLimiter::new("sp-api:orders", local.clone(), Arc::clone(&storage))
        .unwrap();
    let second =
        DistributedRateLimiter::new("sp-api:orders", local, Arc::clone(&storage)).unwrap();

    let mut admitted = 0;
    for _ in 0..4 {
        if first.try_acquire().await {
            admitted += 1;
        }
        if second.try_acquire().await {
            admitted += 1;
        }
    }
    assert_eq!(admitted, 3);
}

#[tokio::test(start_paused = true)]
async fn test_shared_deny_refunds_local_token() {
    let storage = shared_storage(1);
    let limiter =
        DistributedRateLimiter::new("key", RateLimitConfig::new(1.0, 2), storage).unwrap();

    assert!(limiter.try_acquire().await);
    assert!(!limiter.try_acquire().await);

    let status = limiter.status().await;
    assert_eq!(status.local.tokens_remaining, 1.0);
    let shared = status.shared.unwrap();
    assert_eq!(shared.remaining, 0);
    assert_eq!(shared.limit, 1);
}

#[tokio::test(start_paused = true)]
async fn test_keys_are_independent() {
    let storage = shared_storage(1);
    let local = RateLimitConfig::new(1.0, 5);
    let orders = DistributedRateLimiter::new("orders", local.clone(), Arc::clone(&storage)).unwrap();
    let catalog = DistributedRateLimiter::new("catalog", local, storage).unwrap();

    assert!(orders.try_acquire().await);
    assert!(!orders.try_acquire().await);
    assert!(catalog.try_acquire().await);
}

#[tokio::test(start_paused = true)]
async fn test_storage_failure_falls_back_to_local_limit() {
    let limiter = DistributedRateLimiter::new(
        "key",
        RateLimitConfig::new(1.0, 2),
        Arc::new(UnreachableStorage),
    )
    .unwrap();

    assert!(limiter.try_acquire().await);
    assert!(limiter.try_acquire().await);
    assert!(!limiter.try_acquire().await);
    assert!(limiter.status().await.shared.is_none());
    assert!(limiter.reset().await.is_err());
}

#[tokio::test(start_paused = true)]
async fn test_wait_for_token_honours_shared_window() {
    // Shared store refills one token every 2 s
    let storage: Arc<dyn RateLimitStorage> = Arc::new(
        InMemoryRateLimitStorage::new(RateLimitConfig::new(0.5, 1).with_jitter(false)).unwrap(),
    );
    let limiter = DistributedRateLimiter::new(
        "key",
        RateLimitConfig::new(10.0, 10).with_jitter(false),
        storage,
    )
    .unwrap();

    assert!(limiter.try_acquire().await);
    let waited = limiter.wait_for_token().await;
    assert!(waited >= Duration::from_secs(2));

    limiter.reset().await.unwrap();
    assert!(limiter.try_acquire().await);
}

#[tokio::test(start_paused = true)]
async fn test_in_memory_storage_drops_idle_keys() -> AmazonResult<()> {
    let storage =
        InMemoryRateLimitStorage::new(RateLimitConfig::new(10.0, 1).with_jitter(false))?;
    for i in 0..64 {
        assert!(storage.consume(&format!("seller-{i}")).await?);
    }
    assert_eq!(storage.tracked_keys(), 64);

    tokio::time::advance(Duration::from_secs(1)).await;
    assert!(storage.consume("seller-0").await?);

    // New key triggers a sweep; only the drained key survives
    assert!(storage.consume("seller-new").await?);
    assert_eq!(storage.tracked_keys(), 2);
    assert!(!storage.consume("seller-0").await?);
    Ok(())
}

#[tokio::test]
async fn test_header_detector_tracks_endpoints() {
    let detector = HeaderRateLimitDetector::new();
    let mut headers = HashMap::new();
    headers.insert("x-amzn-ratelimit-limit".to_string(), "0.0167".to_string());

    assert_eq!(detector.observe("/orders/v0/orders", &headers).await, Some(0.0167));
    assert_eq!(detector.detected("/orders/v0/orders").await, Some(0.0167));
    assert_eq!(detector.detected("/catalog").await, None);

    assert_eq!(detector.all().await.len(), 1);

    headers.insert("x-amzn-ratelimit-limit".to_string(), "garbage".to_string());
    assert_eq!(detector.observe("/catalog", &headers).await, None);

    detector.clear_cache().await;
    assert!(detector.all().await.is_empty());
}
