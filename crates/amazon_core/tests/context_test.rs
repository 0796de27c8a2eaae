//! AmazonContext over scripted transports.

mod test_utils;

use amazon_core::{AmazonContext, HealthStatus, Provider};
use serde_json::json;
use std::sync::Arc;
use test_utils::{FixedTransport, associates, sp_api};

fn paapi_item() -> serde_json::Value {
    json!({"ItemsResult": {"Items": [{"ASIN": "B00ZV9RDKK"}]}})
}

#[tokio::test(start_paused = true)]
async fn test_empty_context() -> anyhow::Result<()> {
    let context = AmazonContext::new();

    assert!(context.providers().is_empty());
    assert!(context.sp_api().is_none());
    assert!(context.provider(Provider::Associates).is_none());
    assert!(context.health_check_all().await.is_empty());
    assert!(context.rate_limit_status().is_empty());
    assert_eq!(context.clear_all_caches(None)?, 0);
    context.initialize_all().await?;
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_health_check_all() {
    let sp_transport = Arc::new(FixedTransport::new().with_lwa_token().route(
        "/sellers/",
        503,
        json!({"errors": [{"code": "ServiceUnavailable", "message": "down"}]}),
    ));
    let paapi_transport = Arc::new(FixedTransport::new().route("/paapi5/getitems", 200, paapi_item()));
    let context = AmazonContext::new()
        .with_sp_api(sp_api(sp_transport.clone()))
        .with_associates(associates(paapi_transport));

    let report = context.health_check_all().await;

    assert_eq!(report.len(), 2);
    assert_eq!(report[&Provider::Associates], HealthStatus::Healthy);
    assert!(matches!(report[&Provider::SpApi], HealthStatus::Unhealthy { .. }));
    // One retry configured
    assert_eq!(sp_transport.call_count("/sellers/"), 2);
}

#[tokio::test(start_paused = true)]
async fn test_clones_share_providers() -> anyhow::Result<()> {
    let transport = Arc::new(FixedTransport::new().route("/paapi5/getitems", 200, paapi_item()));
    let context = AmazonContext::new().with_associates(associates(transport.clone()));
    let clone = context.clone();

    context
        .associates()
        .expect("associates configured")
        .get_item("B00ZV9RDKK")
        .await?;
    clone
        .associates()
        .expect("associates configured")
        .get_item("B00ZV9RDKK")
        .await?;

    // Second lookup is served from the shared cache
    assert_eq!(transport.call_count("/paapi5/getitems"), 1);
    let status = clone.rate_limit_status();
    assert!(status[&Provider::Associates]["default"].tokens_remaining < 50.0);

    assert_eq!(clone.clear_all_caches(Some("associates:*"))?, 1);
    assert_eq!(context.clear_all_caches(None)?, 0);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_initialize_all_stops_on_rejected_credentials() {
    let transport = Arc::new(FixedTransport::new().route(
        "/auth/o2/token",
        401,
        json!({"error": "invalid_client", "error_description": "Client authentication failed"}),
    ));
    let context = AmazonContext::new().with_sp_api(sp_api(transport));

    let err = context.initialize_all().await.unwrap_err();
    assert_eq!(err.provider(), Some(Provider::SpApi));
}
