//! Affiliate links carrying the partner tag.
//!
//! Links are built locally and never touch the API or its rate limits.

use crate::region::AssociatesMarketplace;
use amazon_error::{AmazonError, AmazonResult};
use amazon_validation::{ValidationResult, validate_asin, validate_asins};
use url::Url;

/// Most distinct items one add-to-cart link may carry.
pub const MAX_CART_ITEMS: usize = 10;

/// Builds tagged storefront URLs for one marketplace.
///
/// # Example
///
/// ```
/// use amazon_providers::{AffiliateLinks, AssociatesMarketplace};
///
/// let links = AffiliateLinks::new(AssociatesMarketplace::UnitedStates, "mystore-20");
/// assert_eq!(
///     links.product_link("B00ZV9RDKK").unwrap(),
///     "https://www.amazon.com/dp/B00ZV9RDKK?tag=mystore-20"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AffiliateLinks {
    marketplace: AssociatesMarketplace,
    partner_tag: String,
}

impl AffiliateLinks {
    /// Links for `marketplace` tagged with `partner_tag`.
    pub fn new(marketplace: AssociatesMarketplace, partner_tag: impl Into<String>) -> Self {
        Self {
            marketplace,
            partner_tag: partner_tag.into(),
        }
    }

    fn base(&self, path: &str) -> AmazonResult<Url> {
        let raw = format!("https://{}{}", self.marketplace.domain(), path);
        Url::parse(&raw).map_err(|e| AmazonError::config(format!("Invalid link '{}': {}", raw, e)))
    }

    /// Product page for `asin`.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a malformed ASIN.
    pub fn product_link(&self, asin: &str) -> AmazonResult<String> {
        validate_asin(asin).into_result()?;
        let mut url = self.base(&format!("/dp/{}", asin))?;
        url.query_pairs_mut().append_pair("tag", &self.partner_tag);
        Ok(url.into())
    }

    /// Search results for `keywords`, optionally within a search index.
    ///
    /// # Errors
    ///
    /// Returns a validation error for blank keywords.
    pub fn search_link(&self, keywords: &str, search_index: Option<&str>) -> AmazonResult<String> {
        let mut checks = ValidationResult::default();
        if keywords.trim().is_empty() {
            checks.push_error("keywords", "MISSING_KEYWORDS", "keywords must not be blank");
        }
        checks.into_result()?;

        let mut url = self.base("/s")?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("k", keywords.trim());
            if let Some(index) = search_index {
                query.append_pair("i", index);
            }
            query.append_pair("tag", &self.partner_tag);
        }
        Ok(url.into())
    }

    /// Cart pre-filled with `(asin, quantity)` pairs.
    ///
    /// # Errors
    ///
    /// Returns a validation error for malformed ASINs, zero quantities or
    /// more than [`MAX_CART_ITEMS`] items.
    pub fn add_to_cart_link(&self, items: &[(&str, u32)]) -> AmazonResult<String> {
        let asins: Vec<&str> = items.iter().map(|(asin, _)| *asin).collect();
        let mut checks = validate_asins(&asins, MAX_CART_ITEMS);
        for (index, (_, quantity)) in items.iter().enumerate() {
            if *quantity == 0 {
                checks.push_error(
                    format!("quantity[{}]", index),
                    "INVALID_QUANTITY",
                    "quantity must be at least 1",
                );
            }
        }
        checks.into_result()?;

        let mut url = self.base("/gp/aws/cart/add.html")?;
        {
            let mut query = url.query_pairs_mut();
            for (index, (asin, quantity)) in items.iter().enumerate() {
                query.append_pair(&format!("ASIN.{}", index + 1), asin);
                query.append_pair(&format!("Quantity.{}", index + 1), &quantity.to_string());
            }
            query.append_pair("AssociateTag", &self.partner_tag);
        }
        Ok(url.into())
    }
}
