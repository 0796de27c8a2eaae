//! SP-API provider tests against a scripted transport.

mod test_utils;

use amazon_error::{AmazonErrorKind, Provider};
use amazon_providers::{
    AmazonProvider, CatalogSearchQuery, HealthStatus, Method, OrdersQuery, ProcessingStatus,
    ReportSpecification, ReportsQuery,
};
use chrono::{TimeZone, Utc};
use serde_json::json;
use std::sync::Arc;
use test_utils::{MOCK_ACCESS_TOKEN, MockResponse, MockTransport, fast_settings, sp_api_provider};

const MARKETPLACE: &str = "ATVPDKIKX0DER";

fn orders_body() -> serde_json::Value {
    json!({
        "payload": {
            "Orders": [{
                "AmazonOrderId": "113-1234567-1234567",
                "PurchaseDate": "2024-01-10T08:00:00Z",
                "LastUpdateDate": "2024-01-11T08:00:00Z",
                "OrderStatus": "Shipped",
                "FulfillmentChannel": "AFN",
                "OrderTotal": {"CurrencyCode": "USD", "Amount": "19.99"},
                "MarketplaceId": MARKETPLACE
            }],
            "NextToken": "next-page"
        }
    })
}

#[tokio::test(start_paused = true)]
async fn test_get_orders_sends_query_and_token() -> anyhow::Result<()> {
    let transport = Arc::new(
        MockTransport::new()
            .with_lwa_token()
            .route("/orders/v0/orders", vec![MockResponse::ok(orders_body())]),
    );
    let provider = sp_api_provider(transport.clone(), fast_settings());

    let query = OrdersQuery::builder()
        .marketplace_ids(vec![MARKETPLACE.to_string()])
        .created_after(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
        .order_statuses(vec!["Shipped".to_string(), "Unshipped".to_string()])
        .max_results_per_page(50u32)
        .build()?;
    let orders = provider.get_orders(&query).await?;

    assert_eq!(orders.orders.len(), 1);
    assert_eq!(orders.orders[0].amazon_order_id, "113-1234567-1234567");
    assert_eq!(orders.next_token.as_deref(), Some("next-page"));

    let sent = &transport.requests_to("/orders/v0/orders")[0];
    assert_eq!(sent.method, Method::Get);
    assert_eq!(sent.header("x-amz-access-token"), Some(MOCK_ACCESS_TOKEN));
    assert!(sent.url.contains("MarketplaceIds=ATVPDKIKX0DER"));
    assert!(sent.url.contains("CreatedAfter=2024-01-01T00%3A00%3A00Z"));
    assert!(sent.url.contains("OrderStatuses=Shipped%2CUnshipped"));
    assert!(sent.url.contains("MaxResultsPerPage=50"));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_access_token_is_reused() -> anyhow::Result<()> {
    let transport = Arc::new(
        MockTransport::new()
            .with_lwa_token()
            .route("/orderItems", vec![MockResponse::ok(json!({
                "payload": {"AmazonOrderId": "113-1234567-1234567", "OrderItems": []}
            }))]),
    );
    let provider = sp_api_provider(transport.clone(), fast_settings());

    provider.get_order_items("113-1234567-1234567", None).await?;
    provider.get_order_items("113-1234567-1234567", Some("page-2")).await?;

    assert_eq!(transport.call_count("/auth/o2/token"), 1);
    assert_eq!(transport.call_count("/orderItems"), 2);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_token_refreshed_before_expiry() -> anyhow::Result<()> {
    let transport = Arc::new(
        MockTransport::new()
            .with_lwa_token()
            .route("/sellers/", vec![MockResponse::ok(json!({"payload": []}))]),
    );
    let provider = sp_api_provider(transport.clone(), fast_settings());

    provider.initialize().await?;
    // Token lives 3600 s and is renewed inside the last minute
    tokio::time::advance(std::time::Duration::from_secs(3545)).await;
    provider.get_marketplace_participations().await?;

    assert_eq!(transport.call_count("/auth/o2/token"), 2);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_order_validation_fails_before_network() {
    let transport = Arc::new(MockTransport::new().with_lwa_token());
    let provider = sp_api_provider(transport.clone(), fast_settings());

    let err = provider.get_order("not-an-order").await.unwrap_err();
    assert_eq!(err.code(), "INVALID_ORDER_ID");

    let query = OrdersQuery::builder()
        .marketplace_ids(vec![MARKETPLACE.to_string()])
        .max_results_per_page(101u32)
        .build()
        .unwrap();
    let err = provider.get_orders(&query).await.unwrap_err();
    // Missing date filter and page size both reported
    assert!(matches!(err.kind(), AmazonErrorKind::MultipleValidation { .. }));
    assert_eq!(err.violations().len(), 2);

    let too_many: Vec<String> = (0..51).map(|_| MARKETPLACE.to_string()).collect();
    let query = OrdersQuery::builder()
        .marketplace_ids(too_many)
        .created_after(Utc::now())
        .build()
        .unwrap();
    let err = provider.get_orders(&query).await.unwrap_err();
    assert_eq!(err.code(), "TOO_MANY_MARKETPLACES");

    assert!(transport.requests().is_empty());
    assert_eq!(
        provider.rate_limit_status()["default"].tokens_remaining,
        100.0
    );
}

#[tokio::test(start_paused = true)]
async fn test_get_order_is_cached() -> anyhow::Result<()> {
    let transport = Arc::new(MockTransport::new().with_lwa_token().route(
        "/orders/v0/orders/113-1234567-1234567",
        vec![MockResponse::ok(json!({"payload": orders_body()["payload"]["Orders"][0]}))],
    ));
    let provider = sp_api_provider(transport.clone(), fast_settings());

    let first = provider.get_order("113-1234567-1234567").await?;
    let second = provider.get_order("113-1234567-1234567").await?;

    assert_eq!(first, second);
    assert_eq!(first.order_total.map(|t| t.amount), Some("19.99".to_string()));
    assert_eq!(transport.call_count("/orders/v0/orders/"), 1);

    assert_eq!(provider.clear_cache(None)?, 1);
    provider.get_order("113-1234567-1234567").await?;
    assert_eq!(transport.call_count("/orders/v0/orders/"), 2);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_get_catalog_item() -> anyhow::Result<()> {
    let transport = Arc::new(MockTransport::new().with_lwa_token().route(
        "/catalog/2022-04-01/items/B00ZV9RDKK",
        vec![MockResponse::ok(json!({
            "asin": "B00ZV9RDKK",
            "summaries": [{"marketplaceId": MARKETPLACE, "itemName": "Fire TV Stick", "brand": "Amazon"}]
        }))],
    ));
    let provider = sp_api_provider(transport.clone(), fast_settings());

    let item = provider
        .get_catalog_item("B00ZV9RDKK", &[MARKETPLACE.to_string()], &["summaries"])
        .await?;

    assert_eq!(item.summaries[0].item_name.as_deref(), Some("Fire TV Stick"));
    let sent = &transport.requests_to("/catalog")[0];
    assert!(sent.url.contains("includedData=summaries"));

    let err = provider
        .get_catalog_item("b00zv9rdkk", &[MARKETPLACE.to_string()], &[])
        .await
        .unwrap_err();
    assert_eq!(err.code(), "INVALID_ASIN_FORMAT");
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_search_catalog_limits() -> anyhow::Result<()> {
    let transport = Arc::new(MockTransport::new().with_lwa_token().route(
        "/catalog/2022-04-01/items",
        vec![MockResponse::ok(json!({"numberOfResults": 0, "items": []}))],
    ));
    let provider = sp_api_provider(transport.clone(), fast_settings());
    let marketplaces = vec![MARKETPLACE.to_string()];

    let neither = CatalogSearchQuery::builder()
        .marketplace_ids(marketplaces.clone())
        .build()?;
    let err = provider.search_catalog_items(&neither).await.unwrap_err();
    assert_eq!(err.code(), "MISSING_SEARCH_CRITERIA");

    let identifiers: Vec<String> = (0..21).map(|i| format!("B00000{:04}", i)).collect();
    let too_many = CatalogSearchQuery::builder()
        .marketplace_ids(marketplaces.clone())
        .identifiers(identifiers)
        .identifiers_type("ASIN")
        .build()?;
    let err = provider.search_catalog_items(&too_many).await.unwrap_err();
    assert_eq!(err.code(), "TOO_MANY_IDENTIFIERS");

    let big_page = CatalogSearchQuery::builder()
        .marketplace_ids(marketplaces.clone())
        .keywords(vec!["kindle".to_string()])
        .page_size(21u32)
        .build()?;
    let err = provider.search_catalog_items(&big_page).await.unwrap_err();
    assert_eq!(err.code(), "INVALID_PAGINATION");
    assert!(transport.requests_to("/catalog").is_empty());

    let ok = CatalogSearchQuery::builder()
        .marketplace_ids(marketplaces)
        .keywords(vec!["kindle".to_string(), "paperwhite".to_string()])
        .page_size(20u32)
        .build()?;
    let results = provider.search_catalog_items(&ok).await?;
    assert_eq!(results.number_of_results, 0);
    assert!(transport.requests_to("/catalog")[0].url.contains("keywords=kindle%2Cpaperwhite"));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_get_inventory_summaries() -> anyhow::Result<()> {
    let transport = Arc::new(MockTransport::new().with_lwa_token().route(
        "/fba/inventory/v1/summaries",
        vec![MockResponse::ok(json!({
            "payload": {
                "granularity": {"granularityType": "Marketplace", "granularityId": MARKETPLACE},
                "inventorySummaries": [
                    {"asin": "B00ZV9RDKK", "sellerSku": "SKU-1", "totalQuantity": 42}
                ]
            },
            "pagination": {"nextToken": "inv-2"}
        }))],
    ));
    let provider = sp_api_provider(transport.clone(), fast_settings());

    let inventory = provider
        .get_inventory_summaries(MARKETPLACE, &["SKU-1".to_string()], None)
        .await?;

    assert_eq!(inventory.summaries[0].total_quantity, Some(42));
    assert_eq!(inventory.next_token.as_deref(), Some("inv-2"));
    let url = &transport.requests_to("/fba/")[0].url;
    assert!(url.contains("granularityType=Marketplace"));
    assert!(url.contains("sellerSkus=SKU-1"));

    let skus: Vec<String> = (0..51).map(|i| format!("SKU-{}", i)).collect();
    let err = provider
        .get_inventory_summaries(MARKETPLACE, &skus, None)
        .await
        .unwrap_err();
    assert_eq!(err.code(), "TOO_MANY_SKUS");
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_report_lifecycle() -> anyhow::Result<()> {
    let report = json!({
        "reportId": "50012",
        "reportType": "GET_MERCHANT_LISTINGS_ALL_DATA",
        "processingStatus": "DONE",
        "createdTime": "2024-01-15T12:00:00Z",
        "marketplaceIds": [MARKETPLACE],
        "reportDocumentId": "amzn1.tortuga.doc"
    });
    let transport = Arc::new(
        MockTransport::new()
            .with_lwa_token()
            .route("/reports/2021-06-30/reports/50012", vec![MockResponse::ok(report.clone())])
            .route("/reports/2021-06-30/documents/", vec![MockResponse::ok(json!({
                "reportDocumentId": "amzn1.tortuga.doc",
                "url": "https://d34o8swod1owfl.cloudfront.net/doc",
                "compressionAlgorithm": "GZIP"
            }))])
            .route("/reports/2021-06-30/reports", vec![
                MockResponse::status(202, json!({"reportId": "50012"})),
                MockResponse::ok(json!({"reports": [report], "nextToken": null})),
            ]),
    );
    let provider = sp_api_provider(transport.clone(), fast_settings());

    let specification = ReportSpecification::new(
        "GET_MERCHANT_LISTINGS_ALL_DATA",
        vec![MARKETPLACE.to_string()],
    );
    let created = provider.create_report(&specification).await?;
    assert_eq!(created.report_id, "50012");
    let post = &transport.requests_to("/reports/2021-06-30/reports")[0];
    assert_eq!(post.method, Method::Post);
    let body: serde_json::Value = serde_json::from_str(post.body.as_deref().unwrap_or(""))?;
    assert_eq!(body["reportType"], "GET_MERCHANT_LISTINGS_ALL_DATA");
    assert!(body.get("dataStartTime").is_none());

    // Status polling is never served from cache
    let status = provider.get_report("50012").await?;
    provider.get_report("50012").await?;
    assert_eq!(status.processing_status, ProcessingStatus::Done);
    assert_eq!(transport.call_count("/reports/50012"), 2);

    let document = provider
        .get_report_document(status.report_document_id.as_deref().unwrap_or_default())
        .await?;
    assert_eq!(document.compression_algorithm.as_deref(), Some("GZIP"));

    let query = ReportsQuery::builder()
        .report_types(vec!["GET_MERCHANT_LISTINGS_ALL_DATA".to_string()])
        .processing_statuses(vec![ProcessingStatus::Done, ProcessingStatus::InQueue])
        .build()?;
    let reports = provider.get_reports(&query).await?;
    assert_eq!(reports.reports.len(), 1);
    let list = transport
        .requests_to("/reports/2021-06-30/reports?")
        .pop()
        .expect("list request");
    assert!(list.url.contains("processingStatuses=DONE%2CIN_QUEUE"));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_report_validation() {
    let transport = Arc::new(MockTransport::new().with_lwa_token());
    let provider = sp_api_provider(transport.clone(), fast_settings());

    let err = provider.get_reports(&ReportsQuery::default()).await.unwrap_err();
    assert_eq!(err.code(), "MISSING_REPORT_TYPES");

    let inverted = ReportSpecification::new("GET_FLAT_FILE_OPEN_LISTINGS_DATA", vec![MARKETPLACE.to_string()])
        .with_window(
            Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        );
    let err = provider.create_report(&inverted).await.unwrap_err();
    assert_eq!(err.code(), "INVALID_DATE_RANGE");

    let err = provider.get_report("../etc").await.unwrap_err();
    assert_eq!(err.code(), "INVALID_IDENTIFIER");

    assert!(transport.requests().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_rejected_credentials_are_auth_errors() {
    let transport = Arc::new(MockTransport::new().route(
        "/auth/o2/token",
        vec![MockResponse::status(
            400,
            json!({"error": "invalid_grant", "error_description": "The request has an invalid grant parameter"}),
        )],
    ));
    let provider = sp_api_provider(transport.clone(), fast_settings());

    let err = provider.initialize().await.unwrap_err();
    assert!(matches!(
        err.kind(),
        AmazonErrorKind::Auth {
            provider: Provider::SpApi
        }
    ));
    assert!(err.message().contains("invalid grant"));
    assert!(!err.is_retryable());
}

#[tokio::test(start_paused = true)]
async fn test_health_check_classification() {
    let healthy = Arc::new(
        MockTransport::new()
            .with_lwa_token()
            .route("/sellers/", vec![MockResponse::ok(json!({"payload": []}))]),
    );
    let provider = sp_api_provider(healthy.clone(), fast_settings());
    assert_eq!(provider.health_check().await, HealthStatus::Healthy);
    assert_eq!(provider.pipeline().cache_stats().size, 0);

    let throttled = Arc::new(MockTransport::new().with_lwa_token().route(
        "/sellers/",
        vec![MockResponse::status(429, json!({"errors": [{"code": "TooManyRequests", "message": "slow"}]}))],
    ));
    let provider = sp_api_provider(throttled, fast_settings());
    assert!(matches!(provider.health_check().await, HealthStatus::Degraded { .. }));

    let down = Arc::new(MockTransport::new().with_lwa_token().route(
        "/sellers/",
        vec![MockResponse::status(403, json!({"errors": [{"code": "Unauthorized", "message": "denied"}]}))],
    ));
    let provider = sp_api_provider(down, fast_settings());
    let status = provider.health_check().await;
    assert!(!status.is_healthy());
    assert!(matches!(status, HealthStatus::Unhealthy { .. }));
}
