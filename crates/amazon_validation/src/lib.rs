//! Request validation for the amazon-core client layer.
//!
//! Providers validate input locally before a request consumes a rate limit
//! token: an upstream 400 costs the same quota as a successful call.
//!
//! - [`SchemaValidator`] checks JSON payloads against declarative [`Schema`]s
//! - The `validate_*` functions check Amazon identifiers and parameters
//!
//! Both produce a [`ValidationResult`], which collects every violation and
//! converts to a single `AmazonError` via [`ValidationResult::into_result`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod amazon;
mod result;
mod schema;

pub use amazon::{
    MAX_DATE_RANGE_DAYS, MAX_SKU_LENGTH, validate_asin, validate_asins, validate_currency,
    validate_date_range, validate_date_range_at, validate_marketplace_id, validate_order_id,
    validate_pagination, validate_partner_tag, validate_seller_id, validate_sku,
};
pub use result::ValidationResult;
pub use schema::{CustomCheck, FieldRule, FieldType, Schema, SchemaValidator};
