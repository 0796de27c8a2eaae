//! SP-API request parameters and response payloads.
//!
//! Orders v0 uses PascalCase fields inside a `payload` envelope; catalog,
//! inventory and reports use camelCase.

use chrono::{DateTime, Utc};
use derive_builder::Builder;
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `{"payload": ...}` envelope used by Orders v0 and FBA inventory.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Envelope<T> {
    pub payload: T,
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

/// Monetary amount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Money {
    /// ISO-4217 code
    pub currency_code: String,
    /// Decimal amount as sent upstream
    pub amount: String,
}

/// Order header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Order {
    /// Amazon order id
    pub amazon_order_id: String,
    /// Purchase time
    pub purchase_date: DateTime<Utc>,
    /// Last change
    pub last_update_date: DateTime<Utc>,
    /// `Pending`, `Unshipped`, `Shipped`, `Canceled`, ...
    pub order_status: String,
    /// `AFN` or `MFN`
    #[serde(default)]
    pub fulfillment_channel: Option<String>,
    /// Storefront, e.g. `Amazon.com`
    #[serde(default)]
    pub sales_channel: Option<String>,
    /// Order total
    #[serde(default)]
    pub order_total: Option<Money>,
    /// Units shipped
    #[serde(default)]
    pub number_of_items_shipped: Option<u32>,
    /// Units not yet shipped
    #[serde(default)]
    pub number_of_items_unshipped: Option<u32>,
    /// Marketplace the order was placed in
    #[serde(default)]
    pub marketplace_id: Option<String>,
}

/// Page of orders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct OrdersList {
    /// Orders on this page
    #[serde(default)]
    pub orders: Vec<Order>,
    /// Token for the next page
    #[serde(default)]
    pub next_token: Option<String>,
    /// Upper bound used by the query
    #[serde(default)]
    pub created_before: Option<DateTime<Utc>>,
}

/// Line item of an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct OrderItem {
    /// ASIN
    #[serde(rename = "ASIN")]
    pub asin: String,
    /// Line item id
    pub order_item_id: String,
    /// Seller SKU
    #[serde(default, rename = "SellerSKU")]
    pub seller_sku: Option<String>,
    /// Product title
    #[serde(default)]
    pub title: Option<String>,
    /// Units ordered
    pub quantity_ordered: u32,
    /// Units shipped
    #[serde(default)]
    pub quantity_shipped: Option<u32>,
    /// Line price
    #[serde(default)]
    pub item_price: Option<Money>,
}

/// Page of order items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct OrderItemsList {
    /// Order the items belong to
    pub amazon_order_id: String,
    /// Items on this page
    #[serde(default)]
    pub order_items: Vec<OrderItem>,
    /// Token for the next page
    #[serde(default)]
    pub next_token: Option<String>,
}

/// Parameters for `getOrders`.
///
/// One of `created_after` or `last_updated_after` is required upstream.
#[derive(Debug, Clone, PartialEq, Builder, Getters)]
#[builder(setter(into))]
pub struct OrdersQuery {
    /// Marketplaces to search (1-50)
    marketplace_ids: Vec<String>,
    /// Orders created at or after
    #[builder(default, setter(strip_option))]
    created_after: Option<DateTime<Utc>>,
    /// Orders created before
    #[builder(default, setter(strip_option))]
    created_before: Option<DateTime<Utc>>,
    /// Orders changed at or after
    #[builder(default, setter(strip_option))]
    last_updated_after: Option<DateTime<Utc>>,
    /// Status filter
    #[builder(default)]
    order_statuses: Vec<String>,
    /// Page size (1-100)
    #[builder(default, setter(strip_option))]
    max_results_per_page: Option<u32>,
    /// Continuation token
    #[builder(default, setter(strip_option))]
    next_token: Option<String>,
}

impl OrdersQuery {
    /// Start building a query.
    pub fn builder() -> OrdersQueryBuilder {
        OrdersQueryBuilder::default()
    }
}

/// Per-marketplace catalog summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemSummary {
    /// Marketplace
    pub marketplace_id: String,
    /// Display name
    #[serde(default)]
    pub item_name: Option<String>,
    /// Brand
    #[serde(default)]
    pub brand: Option<String>,
    /// Manufacturer
    #[serde(default)]
    pub manufacturer: Option<String>,
    /// Model number
    #[serde(default)]
    pub model_number: Option<String>,
}

/// Catalog item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItem {
    /// ASIN
    pub asin: String,
    /// Summaries per marketplace
    #[serde(default)]
    pub summaries: Vec<ItemSummary>,
    /// Raw attribute map, present when requested
    #[serde(default)]
    pub attributes: Option<Value>,
    /// Raw sales ranks, present when requested
    #[serde(default)]
    pub sales_ranks: Option<Value>,
    /// Raw images, present when requested
    #[serde(default)]
    pub images: Option<Value>,
}

/// Cursor for paginated endpoints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    /// Next page
    #[serde(default)]
    pub next_token: Option<String>,
    /// Previous page
    #[serde(default)]
    pub previous_token: Option<String>,
}

/// Catalog search results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogSearchResults {
    /// Total matches
    #[serde(default)]
    pub number_of_results: u64,
    /// Cursor
    #[serde(default)]
    pub pagination: Option<Pagination>,
    /// Items on this page
    #[serde(default)]
    pub items: Vec<CatalogItem>,
}

/// Parameters for `searchCatalogItems`.
///
/// Exactly one of `keywords` or `identifiers` must be set.
#[derive(Debug, Clone, PartialEq, Builder, Getters)]
#[builder(setter(into))]
pub struct CatalogSearchQuery {
    /// Marketplaces to search
    marketplace_ids: Vec<String>,
    /// Search terms
    #[builder(default)]
    keywords: Vec<String>,
    /// Product identifiers (at most 20)
    #[builder(default)]
    identifiers: Vec<String>,
    /// Identifier type: `ASIN`, `EAN`, `GTIN`, `ISBN`, `JAN`, `MINSAN`, `SKU`, `UPC`
    #[builder(default, setter(strip_option))]
    identifiers_type: Option<String>,
    /// Data sets to include, e.g. `summaries`, `attributes`
    #[builder(default)]
    included_data: Vec<String>,
    /// Page size (1-20)
    #[builder(default, setter(strip_option))]
    page_size: Option<u32>,
    /// Continuation token
    #[builder(default, setter(strip_option))]
    page_token: Option<String>,
}

impl CatalogSearchQuery {
    /// Start building a query.
    pub fn builder() -> CatalogSearchQueryBuilder {
        CatalogSearchQueryBuilder::default()
    }
}

/// FBA inventory for one SKU.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventorySummary {
    /// ASIN
    #[serde(default)]
    pub asin: Option<String>,
    /// Fulfillment network SKU
    #[serde(default)]
    pub fn_sku: Option<String>,
    /// Seller SKU
    #[serde(default)]
    pub seller_sku: Option<String>,
    /// Item condition
    #[serde(default)]
    pub condition: Option<String>,
    /// Product name
    #[serde(default)]
    pub product_name: Option<String>,
    /// All units in the fulfillment network
    #[serde(default)]
    pub total_quantity: Option<u64>,
    /// Last change
    #[serde(default)]
    pub last_updated_time: Option<DateTime<Utc>>,
    /// Breakdown, present when details were requested
    #[serde(default)]
    pub inventory_details: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct InventoryPayload {
    #[serde(default)]
    pub inventory_summaries: Vec<InventorySummary>,
}

/// Page of inventory summaries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventorySummaries {
    /// Summaries on this page
    pub summaries: Vec<InventorySummary>,
    /// Token for the next page
    pub next_token: Option<String>,
}

/// Report processing state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ProcessingStatus {
    /// Cancelled before completion
    Cancelled,
    /// Document ready
    Done,
    /// Failed
    Fatal,
    /// Running
    InProgress,
    /// Waiting to run
    InQueue,
}

/// Report metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    /// Report id
    pub report_id: String,
    /// Report type, e.g. `GET_MERCHANT_LISTINGS_ALL_DATA`
    pub report_type: String,
    /// Processing state
    pub processing_status: ProcessingStatus,
    /// Submission time
    pub created_time: DateTime<Utc>,
    /// Marketplaces covered
    #[serde(default)]
    pub marketplace_ids: Vec<String>,
    /// Data window start
    #[serde(default)]
    pub data_start_time: Option<DateTime<Utc>>,
    /// Data window end
    #[serde(default)]
    pub data_end_time: Option<DateTime<Utc>>,
    /// Document id once `Done`
    #[serde(default)]
    pub report_document_id: Option<String>,
}

/// Page of reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportsList {
    /// Reports on this page
    #[serde(default)]
    pub reports: Vec<Report>,
    /// Token for the next page
    #[serde(default)]
    pub next_token: Option<String>,
}

/// Parameters for `getReports`.
#[derive(Debug, Clone, Default, PartialEq, Builder, Getters)]
#[builder(setter(into), default)]
pub struct ReportsQuery {
    /// Report types (1-10, required unless `next_token` is set)
    report_types: Vec<String>,
    /// State filter
    processing_statuses: Vec<ProcessingStatus>,
    /// Marketplace filter
    marketplace_ids: Vec<String>,
    /// Page size (1-100)
    #[builder(setter(strip_option))]
    page_size: Option<u32>,
    /// Reports created at or after
    #[builder(setter(strip_option))]
    created_since: Option<DateTime<Utc>>,
    /// Continuation token
    #[builder(setter(strip_option))]
    next_token: Option<String>,
}

impl ReportsQuery {
    /// Start building a query.
    pub fn builder() -> ReportsQueryBuilder {
        ReportsQueryBuilder::default()
    }
}

/// Body of `createReport`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSpecification {
    /// Report type
    pub report_type: String,
    /// Marketplaces to cover
    pub marketplace_ids: Vec<String>,
    /// Data window start
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_start_time: Option<DateTime<Utc>>,
    /// Data window end
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_end_time: Option<DateTime<Utc>>,
}

impl ReportSpecification {
    /// Specification without a data window.
    pub fn new(report_type: impl Into<String>, marketplace_ids: Vec<String>) -> Self {
        Self {
            report_type: report_type.into(),
            marketplace_ids,
            data_start_time: None,
            data_end_time: None,
        }
    }

    /// Limit the data window.
    pub fn with_window(mut self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        self.data_start_time = Some(start);
        self.data_end_time = Some(end);
        self
    }
}

/// Response of `createReport`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReportResponse {
    /// Id to poll with `get_report`
    pub report_id: String,
}

/// Download location of a finished report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportDocument {
    /// Document id
    pub report_document_id: String,
    /// Pre-signed download URL, valid for five minutes
    pub url: String,
    /// `GZIP` when compressed
    #[serde(default)]
    pub compression_algorithm: Option<String>,
}
