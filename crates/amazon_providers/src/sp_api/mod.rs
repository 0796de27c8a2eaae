//! Selling Partner API: orders, catalog, FBA inventory and reports.

mod models;
mod provider;

pub use models::{
    CatalogItem, CatalogSearchQuery, CatalogSearchQueryBuilder, CatalogSearchResults,
    CreateReportResponse, InventorySummaries, InventorySummary, ItemSummary, Money, Order,
    OrderItem, OrderItemsList, OrdersList, OrdersQuery, OrdersQueryBuilder, Pagination,
    ProcessingStatus, Report, ReportDocument, ReportSpecification, ReportsList, ReportsQuery,
    ReportsQueryBuilder,
};
pub use provider::{
    MAX_CATALOG_IDENTIFIERS, MAX_CATALOG_PAGE_SIZE, MAX_INVENTORY_SKUS, MAX_ORDER_MARKETPLACES,
    MAX_ORDERS_PER_PAGE, MAX_REPORT_TYPES, MAX_REPORTS_PAGE_SIZE, SpApiProvider,
};
