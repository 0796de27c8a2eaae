//! PA-API 5 request parameters and response payloads (PascalCase on the wire).

use derive_builder::Builder;
use derive_getters::Getters;
use serde::{Deserialize, Serialize};

/// Resources requested by default for item lookups and searches.
pub const DEFAULT_ITEM_RESOURCES: &[&str] = &[
    "ItemInfo.Title",
    "ItemInfo.ByLineInfo",
    "ItemInfo.Features",
    "Images.Primary.Large",
    "Offers.Listings.Price",
    "Offers.Listings.Availability.Message",
    "BrowseNodeInfo.BrowseNodes",
];

/// Resources requested by default for browse node lookups.
pub const DEFAULT_BROWSE_NODE_RESOURCES: &[&str] = &["BrowseNodes.Ancestor", "BrowseNodes.Children"];

/// Per-item error reported alongside partial results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PaapiError {
    /// Upstream code, e.g. `ItemNotAccessible`
    pub code: String,
    /// Description
    pub message: String,
}

/// Localized display value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DisplayValue {
    /// Text
    pub display_value: String,
}

/// List of localized display values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DisplayValues {
    /// Texts
    #[serde(default)]
    pub display_values: Vec<String>,
}

/// Brand and contributors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ByLineInfo {
    /// Brand
    #[serde(default)]
    pub brand: Option<DisplayValue>,
    /// Manufacturer
    #[serde(default)]
    pub manufacturer: Option<DisplayValue>,
}

/// Descriptive item information.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ItemInfo {
    /// Title
    #[serde(default)]
    pub title: Option<DisplayValue>,
    /// Brand and contributors
    #[serde(default)]
    pub by_line_info: Option<ByLineInfo>,
    /// Bullet points
    #[serde(default)]
    pub features: Option<DisplayValues>,
}

/// Image at one size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ImageSize {
    /// Location
    #[serde(rename = "URL")]
    pub url: String,
    /// Pixels
    #[serde(default)]
    pub height: Option<u32>,
    /// Pixels
    #[serde(default)]
    pub width: Option<u32>,
}

/// Image in the sizes requested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ImageType {
    /// Small
    #[serde(default)]
    pub small: Option<ImageSize>,
    /// Medium
    #[serde(default)]
    pub medium: Option<ImageSize>,
    /// Large
    #[serde(default)]
    pub large: Option<ImageSize>,
}

/// Item images.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Images {
    /// Main image
    #[serde(default)]
    pub primary: Option<ImageType>,
}

/// Offer price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct OfferPrice {
    /// Numeric amount
    pub amount: f64,
    /// ISO-4217 code
    pub currency: String,
    /// Formatted, e.g. `$19.99`
    #[serde(default)]
    pub display_amount: Option<String>,
}

/// Availability message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Availability {
    /// e.g. `In Stock.`
    #[serde(default)]
    pub message: Option<String>,
}

/// One seller's offer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct OfferListing {
    /// Price
    #[serde(default)]
    pub price: Option<OfferPrice>,
    /// Availability
    #[serde(default)]
    pub availability: Option<Availability>,
}

/// Offers for an item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Offers {
    /// Listings
    #[serde(default)]
    pub listings: Vec<OfferListing>,
}

/// Browse node, possibly with its ancestry and children.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BrowseNode {
    /// Node id
    pub id: String,
    /// Localized name
    #[serde(default)]
    pub display_name: Option<String>,
    /// Name without context
    #[serde(default)]
    pub context_free_name: Option<String>,
    /// Whether this is a top-level category
    #[serde(default)]
    pub is_root: Option<bool>,
    /// Parent, recursively
    #[serde(default)]
    pub ancestor: Option<Box<BrowseNode>>,
    /// Direct children
    #[serde(default)]
    pub children: Vec<BrowseNode>,
}

/// Browse nodes an item belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BrowseNodeInfo {
    /// Nodes
    #[serde(default)]
    pub browse_nodes: Vec<BrowseNode>,
}

/// Product returned by lookups, searches and variations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Item {
    /// ASIN
    #[serde(rename = "ASIN")]
    pub asin: String,
    /// Tagged product page
    #[serde(default, rename = "DetailPageURL")]
    pub detail_page_url: Option<String>,
    /// Parent ASIN for variations
    #[serde(default, rename = "ParentASIN")]
    pub parent_asin: Option<String>,
    /// Descriptive information
    #[serde(default)]
    pub item_info: Option<ItemInfo>,
    /// Images
    #[serde(default)]
    pub images: Option<Images>,
    /// Offers
    #[serde(default)]
    pub offers: Option<Offers>,
    /// Categories
    #[serde(default)]
    pub browse_node_info: Option<BrowseNodeInfo>,
}

impl Item {
    /// Title, when requested and present.
    pub fn title(&self) -> Option<&str> {
        self.item_info
            .as_ref()?
            .title
            .as_ref()
            .map(|t| t.display_value.as_str())
    }

    /// Lowest listed price.
    pub fn price(&self) -> Option<&OfferPrice> {
        self.offers
            .as_ref()?
            .listings
            .iter()
            .filter_map(|l| l.price.as_ref())
            .min_by(|a, b| a.amount.total_cmp(&b.amount))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct ItemsResult {
    #[serde(default)]
    pub items: Vec<Item>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct GetItemsEnvelope {
    #[serde(default)]
    pub items_result: ItemsResult,
    #[serde(default)]
    pub errors: Vec<PaapiError>,
}

/// `GetItems` result: items found plus errors for the ones that were not.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemsResponse {
    /// Items in request order
    pub items: Vec<Item>,
    /// Per-item errors
    pub errors: Vec<PaapiError>,
}

/// Parameters for `SearchItems`.
///
/// At least one of `keywords`, `brand`, `title` or `browse_node_id` is
/// required.
#[derive(Debug, Clone, Default, PartialEq, Builder, Getters)]
#[builder(setter(into, strip_option), default)]
pub struct SearchQuery {
    /// Search terms
    keywords: Option<String>,
    /// Search index, e.g. `Electronics` (`All` upstream when unset)
    search_index: Option<String>,
    /// Brand filter
    brand: Option<String>,
    /// Title filter
    title: Option<String>,
    /// Category filter
    browse_node_id: Option<String>,
    /// Results per page (1-10)
    item_count: Option<u32>,
    /// Page (1-10)
    item_page: Option<u32>,
    /// `Relevance`, `Price:LowToHigh`, ...
    sort_by: Option<String>,
    /// Minimum price in the lowest currency unit
    min_price: Option<u64>,
    /// Maximum price in the lowest currency unit
    max_price: Option<u64>,
}

impl SearchQuery {
    /// Start building a query.
    pub fn builder() -> SearchQueryBuilder {
        SearchQueryBuilder::default()
    }

    /// Keyword search with defaults.
    pub fn for_keywords(keywords: impl Into<String>) -> Self {
        Self {
            keywords: Some(keywords.into()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct SearchEnvelope {
    #[serde(default)]
    pub search_result: Option<SearchResult>,
    #[serde(default)]
    pub errors: Vec<PaapiError>,
}

/// `SearchItems` result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SearchResult {
    /// Total matches
    #[serde(default)]
    pub total_result_count: u64,
    /// Tagged search page on the storefront
    #[serde(default, rename = "SearchURL")]
    pub search_url: Option<String>,
    /// Items on this page
    #[serde(default)]
    pub items: Vec<Item>,
    /// Errors reported alongside the results
    #[serde(default)]
    pub errors: Vec<PaapiError>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct BrowseNodesResult {
    #[serde(default)]
    pub browse_nodes: Vec<BrowseNode>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct BrowseNodesEnvelope {
    #[serde(default)]
    pub browse_nodes_result: BrowseNodesResult,
    #[serde(default)]
    pub errors: Vec<PaapiError>,
}

/// `GetBrowseNodes` result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BrowseNodesResponse {
    /// Nodes found
    pub browse_nodes: Vec<BrowseNode>,
    /// Per-node errors
    pub errors: Vec<PaapiError>,
}

/// Counts over all variation pages.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct VariationSummary {
    /// Pages available
    #[serde(default)]
    pub page_count: u32,
    /// Variations in total
    #[serde(default)]
    pub variation_count: u32,
}

/// `GetVariations` result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct VariationsResult {
    /// Variations on this page
    #[serde(default)]
    pub items: Vec<Item>,
    /// Totals
    #[serde(default)]
    pub variation_summary: Option<VariationSummary>,
    /// Errors reported alongside the results
    #[serde(default)]
    pub errors: Vec<PaapiError>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct VariationsEnvelope {
    #[serde(default)]
    pub variations_result: Option<VariationsResult>,
    #[serde(default)]
    pub errors: Vec<PaapiError>,
}
