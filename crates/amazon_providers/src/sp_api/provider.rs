//! Selling Partner API provider.

use super::models::{
    CatalogItem, CatalogSearchQuery, CatalogSearchResults, CreateReportResponse, Envelope,
    InventoryPayload, InventorySummaries, Order, OrderItemsList, OrdersList, OrdersQuery, Report,
    ReportDocument, ReportSpecification, ReportsList, ReportsQuery,
};
use crate::auth::{AuthProvider, LwaTokenProvider};
use crate::config::SpApiConfig;
use crate::pipeline::{ApiRequest, RequestPipeline};
use crate::provider::{AmazonProvider, HealthStatus};
use crate::transport::{HttpTransport, ReqwestTransport};
use amazon_cache::TtlClass;
use amazon_error::{AmazonError, AmazonResult, Provider};
use amazon_validation::{
    ValidationResult, validate_asin, validate_date_range, validate_marketplace_id,
    validate_order_id, validate_pagination, validate_sku,
};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Most marketplace ids `getOrders` accepts.
pub const MAX_ORDER_MARKETPLACES: usize = 50;
/// Largest `getOrders` page.
pub const MAX_ORDERS_PER_PAGE: u32 = 100;
/// Most identifiers per catalog search.
pub const MAX_CATALOG_IDENTIFIERS: usize = 20;
/// Largest catalog search page.
pub const MAX_CATALOG_PAGE_SIZE: u32 = 20;
/// Most seller SKUs per inventory request.
pub const MAX_INVENTORY_SKUS: usize = 50;
/// Largest `getReports` page.
pub const MAX_REPORTS_PAGE_SIZE: u32 = 100;
/// Most report types per `getReports` request.
pub const MAX_REPORT_TYPES: usize = 10;

const ORDERS_PATH: &str = "/orders/v0/orders";
const CATALOG_PATH: &str = "/catalog/2022-04-01/items";
const INVENTORY_PATH: &str = "/fba/inventory/v1/summaries";
const REPORTS_PATH: &str = "/reports/2021-06-30/reports";
const DOCUMENTS_PATH: &str = "/reports/2021-06-30/documents";
const PARTICIPATIONS_PATH: &str = "/sellers/v1/marketplaceParticipations";

fn timestamp(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn validate_marketplaces(ids: &[String], max: usize) -> ValidationResult {
    let mut result = ValidationResult::default();
    if ids.is_empty() {
        result.push_error(
            "marketplace_ids",
            "EMPTY_MARKETPLACE_LIST",
            "at least one marketplace id is required",
        );
    } else if ids.len() > max {
        result.push_error(
            "marketplace_ids",
            "TOO_MANY_MARKETPLACES",
            format!("at most {} marketplace ids, got {}", max, ids.len()),
        );
    }
    ids.iter()
        .fold(result, |acc, id| acc.and(validate_marketplace_id(id)))
}

/// Report and document ids go into the URL path verbatim.
fn validate_path_id(field: &str, value: &str) -> ValidationResult {
    let mut result = ValidationResult::default();
    let valid = !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if !valid {
        result.push_error(
            field,
            "INVALID_IDENTIFIER",
            format!("'{}' must be non-empty and URL-safe", value),
        );
    }
    result
}

fn page_size_check(page_size: Option<u32>, max: u32) -> ValidationResult {
    page_size.map_or_else(ValidationResult::valid, |size| {
        validate_pagination(1, size, max)
    })
}

/// Client for orders, catalog, FBA inventory and reports.
///
/// Authorization uses Login with Amazon: the refresh token is exchanged for
/// an access token that is cached and renewed shortly before expiry.
///
/// # Example
///
/// ```no_run
/// use amazon_providers::{LwaCredentials, OrdersQuery, SpApiConfig, SpApiProvider};
/// use chrono::{Duration, Utc};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = SpApiConfig::builder()
///     .credentials(LwaCredentials::new("client", "secret", "refresh"))
///     .build()?;
/// let provider = SpApiProvider::new(config)?;
///
/// let query = OrdersQuery::builder()
///     .marketplace_ids(vec!["ATVPDKIKX0DER".to_string()])
///     .created_after(Utc::now() - Duration::days(7))
///     .build()?;
/// let orders = provider.get_orders(&query).await?;
/// println!("{} orders", orders.orders.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct SpApiProvider {
    config: SpApiConfig,
    tokens: Arc<LwaTokenProvider>,
    pipeline: RequestPipeline,
}

impl SpApiProvider {
    /// Provider over HTTPS.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the settings are invalid.
    pub fn new(config: SpApiConfig) -> AmazonResult<Self> {
        Self::with_transport(config, Arc::new(ReqwestTransport::new()))
    }

    /// Provider sending through `transport`; token refreshes use it too.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the settings are invalid.
    pub fn with_transport(
        config: SpApiConfig,
        transport: Arc<dyn HttpTransport>,
    ) -> AmazonResult<Self> {
        let tokens = Arc::new(
            LwaTokenProvider::new(config.credentials().clone(), Arc::clone(&transport))
                .with_token_url(config.token_url()),
        );
        let auth: Arc<dyn AuthProvider> = tokens.clone();
        let pipeline = RequestPipeline::new(
            Provider::SpApi,
            config.base_url(),
            config.settings(),
            config.cache().clone(),
            transport,
            auth,
        )?;
        info!(
            region = %config.region(),
            sandbox = config.sandbox(),
            "SP-API provider created"
        );
        Ok(Self {
            config,
            tokens,
            pipeline,
        })
    }

    /// Configuration in use.
    pub fn config(&self) -> &SpApiConfig {
        &self.config
    }

    /// Orders matching `query`.
    ///
    /// # Errors
    ///
    /// Returns a validation error for out-of-range parameters before any
    /// request is sent, otherwise the mapped upstream error.
    #[instrument(skip(self, query))]
    pub async fn get_orders(&self, query: &OrdersQuery) -> AmazonResult<OrdersList> {
        let mut checks = validate_marketplaces(query.marketplace_ids(), MAX_ORDER_MARKETPLACES)
            .and(page_size_check(*query.max_results_per_page(), MAX_ORDERS_PER_PAGE));
        if query.created_after().is_none() && query.last_updated_after().is_none() {
            checks.push_error(
                "created_after",
                "MISSING_DATE_FILTER",
                "created_after or last_updated_after is required",
            );
        }
        if let (Some(start), Some(end)) = (query.created_after(), query.created_before()) {
            checks.merge(validate_date_range(*start, *end));
        }
        checks.into_result()?;

        let request = ApiRequest::get(ORDERS_PATH)
            .with_query_list("MarketplaceIds", query.marketplace_ids())
            .with_optional_query("CreatedAfter", query.created_after().as_ref().map(timestamp))
            .with_optional_query("CreatedBefore", query.created_before().as_ref().map(timestamp))
            .with_optional_query(
                "LastUpdatedAfter",
                query.last_updated_after().as_ref().map(timestamp),
            )
            .with_query_list("OrderStatuses", query.order_statuses())
            .with_optional_query("MaxResultsPerPage", *query.max_results_per_page())
            .with_optional_query("NextToken", query.next_token().as_ref())
            .cached(TtlClass::Orders);

        let envelope: Envelope<OrdersList> = self.pipeline.execute_as(request).await?;
        debug!(count = envelope.payload.orders.len(), "Fetched orders");
        Ok(envelope.payload)
    }

    /// One order by id.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a malformed order id.
    #[instrument(skip(self))]
    pub async fn get_order(&self, order_id: &str) -> AmazonResult<Order> {
        validate_order_id(order_id).into_result()?;
        let request =
            ApiRequest::get(format!("{}/{}", ORDERS_PATH, order_id)).cached(TtlClass::Orders);
        let envelope: Envelope<Order> = self.pipeline.execute_as(request).await?;
        Ok(envelope.payload)
    }

    /// Line items of an order.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a malformed order id.
    #[instrument(skip(self))]
    pub async fn get_order_items(
        &self,
        order_id: &str,
        next_token: Option<&str>,
    ) -> AmazonResult<OrderItemsList> {
        validate_order_id(order_id).into_result()?;
        let request = ApiRequest::get(format!("{}/{}/orderItems", ORDERS_PATH, order_id))
            .with_optional_query("NextToken", next_token)
            .cached(TtlClass::Orders);
        let envelope: Envelope<OrderItemsList> = self.pipeline.execute_as(request).await?;
        Ok(envelope.payload)
    }

    /// Catalog item for `asin` in the given marketplaces.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a malformed ASIN or marketplace id.
    #[instrument(skip(self, marketplace_ids, included_data))]
    pub async fn get_catalog_item(
        &self,
        asin: &str,
        marketplace_ids: &[String],
        included_data: &[&str],
    ) -> AmazonResult<CatalogItem> {
        validate_asin(asin)
            .and(validate_marketplaces(marketplace_ids, MAX_ORDER_MARKETPLACES))
            .into_result()?;
        let request = ApiRequest::get(format!("{}/{}", CATALOG_PATH, asin))
            .with_query_list("marketplaceIds", marketplace_ids)
            .with_query_list("includedData", included_data)
            .cached(TtlClass::Catalog);
        self.pipeline.execute_as(request).await
    }

    /// Search the catalog by keywords or identifiers.
    ///
    /// # Errors
    ///
    /// Returns a validation error when both or neither of keywords and
    /// identifiers are set, or when a limit is exceeded.
    #[instrument(skip(self, query))]
    pub async fn search_catalog_items(
        &self,
        query: &CatalogSearchQuery,
    ) -> AmazonResult<CatalogSearchResults> {
        let mut checks = validate_marketplaces(query.marketplace_ids(), MAX_ORDER_MARKETPLACES)
            .and(page_size_check(*query.page_size(), MAX_CATALOG_PAGE_SIZE));
        match (query.keywords().is_empty(), query.identifiers().is_empty()) {
            (true, true) => checks.push_error(
                "keywords",
                "MISSING_SEARCH_CRITERIA",
                "keywords or identifiers are required",
            ),
            (false, false) => checks.push_error(
                "identifiers",
                "CONFLICTING_SEARCH_CRITERIA",
                "keywords and identifiers cannot be combined",
            ),
            _ => {}
        }
        if query.identifiers().len() > MAX_CATALOG_IDENTIFIERS {
            checks.push_error(
                "identifiers",
                "TOO_MANY_IDENTIFIERS",
                format!(
                    "at most {} identifiers, got {}",
                    MAX_CATALOG_IDENTIFIERS,
                    query.identifiers().len()
                ),
            );
        }
        if !query.identifiers().is_empty() && query.identifiers_type().is_none() {
            checks.push_error(
                "identifiers_type",
                "MISSING_IDENTIFIERS_TYPE",
                "identifiers_type is required with identifiers",
            );
        }
        checks.into_result()?;

        let request = ApiRequest::get(CATALOG_PATH)
            .with_query_list("marketplaceIds", query.marketplace_ids())
            .with_query_list("keywords", query.keywords())
            .with_query_list("identifiers", query.identifiers())
            .with_optional_query("identifiersType", query.identifiers_type().as_ref())
            .with_query_list("includedData", query.included_data())
            .with_optional_query("pageSize", *query.page_size())
            .with_optional_query("pageToken", query.page_token().as_ref())
            .cached(TtlClass::Search);
        self.pipeline.execute_as(request).await
    }

    /// FBA inventory in one marketplace, optionally limited to `seller_skus`.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a malformed marketplace id or SKU, or
    /// more than [`MAX_INVENTORY_SKUS`] SKUs.
    #[instrument(skip(self, seller_skus))]
    pub async fn get_inventory_summaries(
        &self,
        marketplace_id: &str,
        seller_skus: &[String],
        next_token: Option<&str>,
    ) -> AmazonResult<InventorySummaries> {
        let mut checks = seller_skus
            .iter()
            .fold(validate_marketplace_id(marketplace_id), |acc, sku| {
                acc.and(validate_sku(sku))
            });
        if seller_skus.len() > MAX_INVENTORY_SKUS {
            checks.push_error(
                "seller_skus",
                "TOO_MANY_SKUS",
                format!("at most {} SKUs, got {}", MAX_INVENTORY_SKUS, seller_skus.len()),
            );
        }
        checks.into_result()?;

        let request = ApiRequest::get(INVENTORY_PATH)
            .with_query("details", true)
            .with_query("granularityType", "Marketplace")
            .with_query("granularityId", marketplace_id)
            .with_query("marketplaceIds", marketplace_id)
            .with_query_list("sellerSkus", seller_skus)
            .with_optional_query("nextToken", next_token)
            .cached(TtlClass::Inventory);
        let envelope: Envelope<InventoryPayload> = self.pipeline.execute_as(request).await?;
        Ok(InventorySummaries {
            summaries: envelope.payload.inventory_summaries,
            next_token: envelope.pagination.and_then(|p| p.next_token),
        })
    }

    /// Reports matching `query`.
    ///
    /// # Errors
    ///
    /// Returns a validation error when no report type is given for a first
    /// page, or a limit is exceeded.
    #[instrument(skip(self, query))]
    pub async fn get_reports(&self, query: &ReportsQuery) -> AmazonResult<ReportsList> {
        let mut checks = page_size_check(*query.page_size(), MAX_REPORTS_PAGE_SIZE);
        let types = query.report_types().len();
        if query.next_token().is_none() && types == 0 {
            checks.push_error(
                "report_types",
                "MISSING_REPORT_TYPES",
                "report_types is required without next_token",
            );
        }
        if types > MAX_REPORT_TYPES {
            checks.push_error(
                "report_types",
                "TOO_MANY_REPORT_TYPES",
                format!("at most {} report types, got {}", MAX_REPORT_TYPES, types),
            );
        }
        if !query.marketplace_ids().is_empty() {
            checks.merge(validate_marketplaces(query.marketplace_ids(), MAX_ORDER_MARKETPLACES));
        }
        checks.into_result()?;

        let statuses: Vec<String> = query
            .processing_statuses()
            .iter()
            .map(ToString::to_string)
            .collect();
        let request = ApiRequest::get(REPORTS_PATH)
            .with_query_list("reportTypes", query.report_types())
            .with_query_list("processingStatuses", &statuses)
            .with_query_list("marketplaceIds", query.marketplace_ids())
            .with_optional_query("pageSize", *query.page_size())
            .with_optional_query("createdSince", query.created_since().as_ref().map(timestamp))
            .with_optional_query("nextToken", query.next_token().as_ref())
            .cached(TtlClass::Reports);
        self.pipeline.execute_as(request).await
    }

    /// Request a report.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an empty report type, bad marketplace
    /// ids or an inverted data window.
    #[instrument(skip(self, specification), fields(report_type = %specification.report_type))]
    pub async fn create_report(
        &self,
        specification: &ReportSpecification,
    ) -> AmazonResult<CreateReportResponse> {
        let mut checks = validate_marketplaces(&specification.marketplace_ids, MAX_ORDER_MARKETPLACES);
        if specification.report_type.trim().is_empty() {
            checks.push_error("report_type", "MISSING_REPORT_TYPE", "report_type is required");
        }
        if let (Some(start), Some(end)) =
            (specification.data_start_time, specification.data_end_time)
        {
            checks.merge(validate_date_range(start, end));
        }
        checks.into_result()?;

        let body = serde_json::to_value(specification)
            .map_err(|e| AmazonError::config(format!("Unserializable report specification: {}", e)))?;
        let response: CreateReportResponse = self
            .pipeline
            .execute_as(ApiRequest::post(REPORTS_PATH).with_body(body))
            .await?;
        info!(report_id = %response.report_id, "Report requested");
        Ok(response)
    }

    /// Report status. Never cached so polling sees state changes.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a malformed report id.
    #[instrument(skip(self))]
    pub async fn get_report(&self, report_id: &str) -> AmazonResult<Report> {
        validate_path_id("report_id", report_id).into_result()?;
        self.pipeline
            .execute_as(ApiRequest::get(format!("{}/{}", REPORTS_PATH, report_id)))
            .await
    }

    /// Download location of a finished report. Never cached because the URL
    /// expires within minutes.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a malformed document id.
    #[instrument(skip(self))]
    pub async fn get_report_document(&self, document_id: &str) -> AmazonResult<ReportDocument> {
        validate_path_id("report_document_id", document_id).into_result()?;
        self.pipeline
            .execute_as(ApiRequest::get(format!("{}/{}", DOCUMENTS_PATH, document_id)))
            .await
    }

    /// Marketplaces the seller participates in.
    ///
    /// # Errors
    ///
    /// Returns the mapped upstream error.
    #[instrument(skip(self))]
    pub async fn get_marketplace_participations(&self) -> AmazonResult<Value> {
        self.pipeline.execute(ApiRequest::get(PARTICIPATIONS_PATH)).await
    }
}

#[async_trait]
impl AmazonProvider for SpApiProvider {
    fn provider(&self) -> Provider {
        Provider::SpApi
    }

    fn pipeline(&self) -> &RequestPipeline {
        &self.pipeline
    }

    #[instrument(skip(self))]
    async fn initialize(&self) -> AmazonResult<()> {
        self.tokens.access_token().await?;
        info!("SP-API credentials verified");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn health_check(&self) -> HealthStatus {
        let status = HealthStatus::from_probe(&self.get_marketplace_participations().await);
        debug!(?status, "SP-API health check");
        status
    }
}
