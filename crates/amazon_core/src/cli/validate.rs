//! Offline identifier validation.

use super::ValueKind;
use amazon_core::{
    AmazonError, ValidationResult, validate_asin, validate_currency, validate_marketplace_id,
    validate_order_id, validate_partner_tag, validate_sku,
};

fn check(kind: ValueKind, value: &str) -> ValidationResult {
    match kind {
        ValueKind::Asin => validate_asin(value),
        ValueKind::Marketplace => validate_marketplace_id(value),
        ValueKind::Currency => validate_currency(value),
        ValueKind::Sku => validate_sku(value),
        ValueKind::OrderId => validate_order_id(value),
        ValueKind::PartnerTag => validate_partner_tag(value),
    }
}

/// Print whether `value` is a valid `kind`.
///
/// # Errors
///
/// Returns the validation error when the value is invalid.
pub fn validate_value(kind: ValueKind, value: &str) -> Result<(), AmazonError> {
    let warnings = check(kind, value).into_result()?;
    for warning in &warnings {
        println!("warning: {}", warning);
    }
    println!("✓ {} is a valid {:?}", value, kind);
    Ok(())
}
