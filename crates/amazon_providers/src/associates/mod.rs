//! Associates (Product Advertising API 5.0): item lookups, search, browse
//! nodes, variations and affiliate links.

mod links;
mod models;
mod provider;

pub use links::{AffiliateLinks, MAX_CART_ITEMS};
pub use models::{
    Availability, BrowseNode, BrowseNodeInfo, BrowseNodesResponse, ByLineInfo,
    DEFAULT_BROWSE_NODE_RESOURCES, DEFAULT_ITEM_RESOURCES, DisplayValue, DisplayValues, ImageSize,
    ImageType, Images, Item, ItemInfo, ItemsResponse, OfferListing, OfferPrice, Offers,
    PaapiError, SearchQuery, SearchQueryBuilder, SearchResult, VariationSummary,
    VariationsResult,
};
pub use provider::{
    AssociatesProvider, MAX_BROWSE_NODE_IDS, MAX_ITEM_IDS, MAX_SEARCH_ITEM_COUNT,
    MAX_SEARCH_ITEM_PAGE, MAX_VARIATION_COUNT,
};
