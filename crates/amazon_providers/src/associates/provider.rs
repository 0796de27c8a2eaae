//! Product Advertising API 5.0 provider.

use super::links::AffiliateLinks;
use super::models::{
    BrowseNodesEnvelope, BrowseNodesResponse, DEFAULT_BROWSE_NODE_RESOURCES,
    DEFAULT_ITEM_RESOURCES, GetItemsEnvelope, Item, ItemsResponse, PaapiError, SearchEnvelope,
    SearchQuery, SearchResult, VariationsEnvelope, VariationsResult,
};
use crate::auth::{AuthProvider, SigV4Signer};
use crate::config::AssociatesConfig;
use crate::pipeline::{ApiRequest, RequestPipeline};
use crate::provider::{AmazonProvider, HealthStatus};
use crate::transport::{HttpTransport, ReqwestTransport};
use amazon_cache::TtlClass;
use amazon_error::{AmazonError, AmazonResult, Provider};
use amazon_validation::{
    ValidationResult, validate_asin, validate_asins, validate_pagination, validate_partner_tag,
};
use async_trait::async_trait;
use serde_json::{Map, Value, json};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Most ASINs per `GetItems` request.
pub const MAX_ITEM_IDS: usize = 10;
/// Largest `SearchItems` page.
pub const MAX_SEARCH_ITEM_COUNT: u32 = 10;
/// Deepest `SearchItems` page.
pub const MAX_SEARCH_ITEM_PAGE: u32 = 10;
/// Most ids per `GetBrowseNodes` request.
pub const MAX_BROWSE_NODE_IDS: usize = 10;
/// Largest `GetVariations` page.
pub const MAX_VARIATION_COUNT: u32 = 10;

const GET_ITEMS_PATH: &str = "/paapi5/getitems";
const SEARCH_ITEMS_PATH: &str = "/paapi5/searchitems";
const GET_BROWSE_NODES_PATH: &str = "/paapi5/getbrowsenodes";
const GET_VARIATIONS_PATH: &str = "/paapi5/getvariations";

fn log_partial_errors(operation: &str, errors: &[PaapiError]) {
    for error in errors {
        warn!(operation, code = %error.code, message = %error.message, "Partial PA-API error");
    }
}

/// Client for item lookups, searches, browse nodes and variations, plus
/// affiliate link building.
///
/// Every request is a signed `POST` carrying the partner tag and
/// marketplace. Items the API cannot return are reported in the `errors` of
/// the response alongside the items it did return.
///
/// # Example
///
/// ```no_run
/// use amazon_providers::{AssociatesConfig, AssociatesProvider};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = AssociatesConfig::builder()
///     .access_key("AKIAEXAMPLE")
///     .secret_key("secret")
///     .partner_tag("mystore-20")
///     .build()?;
/// let provider = AssociatesProvider::new(config)?;
///
/// let item = provider.get_item("B00ZV9RDKK").await?;
/// println!("{:?}", item.title());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct AssociatesProvider {
    config: AssociatesConfig,
    links: AffiliateLinks,
    pipeline: RequestPipeline,
}

impl AssociatesProvider {
    /// Provider over HTTPS.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a malformed partner tag, or a
    /// configuration error if the settings are invalid.
    pub fn new(config: AssociatesConfig) -> AmazonResult<Self> {
        Self::with_transport(config, Arc::new(ReqwestTransport::new()))
    }

    /// Provider sending through `transport`.
    ///
    /// # Errors
    ///
    /// See [`new`](Self::new).
    pub fn with_transport(
        config: AssociatesConfig,
        transport: Arc<dyn HttpTransport>,
    ) -> AmazonResult<Self> {
        validate_partner_tag(config.partner_tag()).into_result()?;
        let marketplace = *config.marketplace();
        let signer: Arc<dyn AuthProvider> = Arc::new(SigV4Signer::new(
            config.access_key(),
            config.secret_key(),
            marketplace.aws_region(),
            marketplace.host(),
        ));
        let pipeline = RequestPipeline::new(
            Provider::Associates,
            config.base_url(),
            config.settings(),
            config.cache().clone(),
            transport,
            signer,
        )?;
        info!(marketplace = %marketplace, "Associates provider created");
        Ok(Self {
            links: AffiliateLinks::new(marketplace, config.partner_tag()),
            config,
            pipeline,
        })
    }

    /// Configuration in use.
    pub fn config(&self) -> &AssociatesConfig {
        &self.config
    }

    /// Affiliate link builder for this provider's marketplace and tag.
    pub fn links(&self) -> &AffiliateLinks {
        &self.links
    }

    /// Body fields every operation carries.
    fn base_body(&self, resources: &[&str]) -> Map<String, Value> {
        let mut body = Map::new();
        body.insert("PartnerTag".into(), json!(self.config.partner_tag()));
        body.insert("PartnerType".into(), json!("Associates"));
        body.insert("Marketplace".into(), json!(self.config.marketplace().domain()));
        body.insert("Resources".into(), json!(resources));
        body
    }

    async fn fetch_items(&self, asins: &[&str], cache: bool) -> AmazonResult<ItemsResponse> {
        let mut body = self.base_body(DEFAULT_ITEM_RESOURCES);
        body.insert("ItemIds".into(), json!(asins));
        body.insert("ItemIdType".into(), json!("ASIN"));
        let mut request = ApiRequest::post(GET_ITEMS_PATH).with_body(Value::Object(body));
        if cache {
            request = request.cached(TtlClass::Items);
        }

        let envelope: GetItemsEnvelope = self.pipeline.execute_as(request).await?;
        log_partial_errors("GetItems", &envelope.errors);
        debug!(
            found = envelope.items_result.items.len(),
            missing = envelope.errors.len(),
            "Fetched items"
        );
        Ok(ItemsResponse {
            items: envelope.items_result.items,
            errors: envelope.errors,
        })
    }

    /// Look up 1-10 items by ASIN.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an empty list, more than
    /// [`MAX_ITEM_IDS`] ASINs or a malformed ASIN.
    #[instrument(skip(self, asins), fields(count = asins.len()))]
    pub async fn get_items(&self, asins: &[&str]) -> AmazonResult<ItemsResponse> {
        validate_asins(asins, MAX_ITEM_IDS).into_result()?;
        self.fetch_items(asins, true).await
    }

    async fn fetch_item(&self, asin: &str, cache: bool) -> AmazonResult<Item> {
        validate_asin(asin).into_result()?;
        let response = self.fetch_items(&[asin], cache).await?;
        if let Some(item) = response.items.into_iter().find(|item| item.asin == asin) {
            return Ok(item);
        }
        let (code, message) = response
            .errors
            .into_iter()
            .next()
            .map(|e| (e.code, e.message))
            .unwrap_or_else(|| ("ItemNotAccessible".to_string(), format!("{} not returned", asin)));
        Err(AmazonError::api(Provider::Associates, 404, None, message).with_code(code))
    }

    /// Look up one item.
    ///
    /// # Errors
    ///
    /// Returns a non-retryable API error (status 404) carrying the upstream
    /// code when the item is not accessible.
    #[instrument(skip(self))]
    pub async fn get_item(&self, asin: &str) -> AmazonResult<Item> {
        self.fetch_item(asin, true).await
    }

    /// Search for items.
    ///
    /// # Errors
    ///
    /// Returns a validation error when no search criterion is set or the
    /// page bounds are exceeded.
    #[instrument(skip(self, query))]
    pub async fn search_items(&self, query: &SearchQuery) -> AmazonResult<SearchResult> {
        let mut checks = ValidationResult::default();
        let has_criterion = [
            query.keywords(),
            query.brand(),
            query.title(),
            query.browse_node_id(),
        ]
        .iter()
        .any(|value| value.as_deref().is_some_and(|v| !v.trim().is_empty()));
        if !has_criterion {
            checks.push_error(
                "keywords",
                "MISSING_SEARCH_CRITERIA",
                "keywords, brand, title or browse_node_id is required",
            );
        }
        let page = query.item_page().unwrap_or(1);
        if !(1..=MAX_SEARCH_ITEM_PAGE).contains(&page) {
            checks.push_error(
                "item_page",
                "INVALID_PAGINATION",
                format!("must be between 1 and {}, got {}", MAX_SEARCH_ITEM_PAGE, page),
            );
        }
        let count = query.item_count().unwrap_or(MAX_SEARCH_ITEM_COUNT);
        if !(1..=MAX_SEARCH_ITEM_COUNT).contains(&count) {
            checks.push_error(
                "item_count",
                "INVALID_PAGINATION",
                format!("must be between 1 and {}, got {}", MAX_SEARCH_ITEM_COUNT, count),
            );
        }
        if let (Some(min), Some(max)) = (query.min_price(), query.max_price())
            && min > max
        {
            checks.push_error(
                "min_price",
                "INVALID_PRICE_RANGE",
                format!("min_price {} exceeds max_price {}", min, max),
            );
        }
        checks.into_result()?;

        let mut body = self.base_body(DEFAULT_ITEM_RESOURCES);
        let optional = [
            ("Keywords", query.keywords().as_ref().map(|v| json!(v))),
            ("SearchIndex", query.search_index().as_ref().map(|v| json!(v))),
            ("Brand", query.brand().as_ref().map(|v| json!(v))),
            ("Title", query.title().as_ref().map(|v| json!(v))),
            ("BrowseNodeId", query.browse_node_id().as_ref().map(|v| json!(v))),
            ("ItemCount", query.item_count().map(|v| json!(v))),
            ("ItemPage", query.item_page().map(|v| json!(v))),
            ("SortBy", query.sort_by().as_ref().map(|v| json!(v))),
            ("MinPrice", query.min_price().map(|v| json!(v))),
            ("MaxPrice", query.max_price().map(|v| json!(v))),
        ];
        for (name, value) in optional {
            if let Some(value) = value {
                body.insert(name.into(), value);
            }
        }

        let request = ApiRequest::post(SEARCH_ITEMS_PATH)
            .with_body(Value::Object(body))
            .cached(TtlClass::Search);
        let envelope: SearchEnvelope = self.pipeline.execute_as(request).await?;
        log_partial_errors("SearchItems", &envelope.errors);
        let mut result = envelope.search_result.unwrap_or_default();
        result.errors = envelope.errors;
        Ok(result)
    }

    /// Look up 1-10 browse nodes with their ancestors and children.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an empty list, more than
    /// [`MAX_BROWSE_NODE_IDS`] ids or a non-numeric id.
    #[instrument(skip(self, node_ids), fields(count = node_ids.len()))]
    pub async fn get_browse_nodes(&self, node_ids: &[&str]) -> AmazonResult<BrowseNodesResponse> {
        let mut checks = ValidationResult::default();
        if node_ids.is_empty() {
            checks.push_error(
                "browse_node_ids",
                "EMPTY_BROWSE_NODE_LIST",
                "at least one browse node id is required",
            );
        }
        if node_ids.len() > MAX_BROWSE_NODE_IDS {
            checks.push_error(
                "browse_node_ids",
                "TOO_MANY_BROWSE_NODES",
                format!(
                    "at most {} browse node ids, got {}",
                    MAX_BROWSE_NODE_IDS,
                    node_ids.len()
                ),
            );
        }
        for (index, id) in node_ids.iter().enumerate() {
            if id.is_empty() || !id.chars().all(|c| c.is_ascii_digit()) {
                checks.push_error(
                    format!("browse_node_ids[{}]", index),
                    "INVALID_BROWSE_NODE_ID",
                    format!("'{}' must be numeric", id),
                );
            }
        }
        checks.into_result()?;

        let mut body = self.base_body(DEFAULT_BROWSE_NODE_RESOURCES);
        body.insert("BrowseNodeIds".into(), json!(node_ids));
        let request = ApiRequest::post(GET_BROWSE_NODES_PATH)
            .with_body(Value::Object(body))
            .cached(TtlClass::BrowseNodes);
        let envelope: BrowseNodesEnvelope = self.pipeline.execute_as(request).await?;
        log_partial_errors("GetBrowseNodes", &envelope.errors);
        Ok(BrowseNodesResponse {
            browse_nodes: envelope.browse_nodes_result.browse_nodes,
            errors: envelope.errors,
        })
    }

    /// Variations of a parent or child ASIN, one page at a time.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a malformed ASIN or out-of-range page.
    #[instrument(skip(self))]
    pub async fn get_variations(
        &self,
        asin: &str,
        variation_count: Option<u32>,
        variation_page: Option<u32>,
    ) -> AmazonResult<VariationsResult> {
        validate_asin(asin)
            .and(validate_pagination(
                variation_page.unwrap_or(1),
                variation_count.unwrap_or(MAX_VARIATION_COUNT),
                MAX_VARIATION_COUNT,
            ))
            .into_result()?;

        let mut body = self.base_body(DEFAULT_ITEM_RESOURCES);
        body.insert("ASIN".into(), json!(asin));
        if let Some(count) = variation_count {
            body.insert("VariationCount".into(), json!(count));
        }
        if let Some(page) = variation_page {
            body.insert("VariationPage".into(), json!(page));
        }
        let request = ApiRequest::post(GET_VARIATIONS_PATH)
            .with_body(Value::Object(body))
            .cached(TtlClass::Catalog);
        let envelope: VariationsEnvelope = self.pipeline.execute_as(request).await?;
        log_partial_errors("GetVariations", &envelope.errors);
        let mut result = envelope.variations_result.unwrap_or_default();
        result.errors = envelope.errors;
        Ok(result)
    }

    /// Tagged product page for `asin`.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a malformed ASIN.
    pub fn product_link(&self, asin: &str) -> AmazonResult<String> {
        self.links.product_link(asin)
    }

    /// Tagged search page.
    ///
    /// # Errors
    ///
    /// Returns a validation error for blank keywords.
    pub fn search_link(&self, keywords: &str, search_index: Option<&str>) -> AmazonResult<String> {
        self.links.search_link(keywords, search_index)
    }

    /// Tagged add-to-cart link.
    ///
    /// # Errors
    ///
    /// Returns a validation error for malformed items.
    pub fn add_to_cart_link(&self, items: &[(&str, u32)]) -> AmazonResult<String> {
        self.links.add_to_cart_link(items)
    }
}

#[async_trait]
impl AmazonProvider for AssociatesProvider {
    fn provider(&self) -> Provider {
        Provider::Associates
    }

    fn pipeline(&self) -> &RequestPipeline {
        &self.pipeline
    }

    /// Signing is local; there is nothing to exchange up front.
    async fn initialize(&self) -> AmazonResult<()> {
        validate_partner_tag(self.config.partner_tag()).into_result()?;
        Ok(())
    }

    #[instrument(skip(self), fields(asin = %self.config.health_check_asin()))]
    async fn health_check(&self) -> HealthStatus {
        let probe = self.fetch_item(self.config.health_check_asin(), false).await;
        let status = HealthStatus::from_probe(&probe);
        debug!(?status, "Associates health check");
        status
    }
}
