//! Validators for Amazon identifiers and request parameters.
//!
//! Each validator returns a [`ValidationResult`] so callers can collect
//! several violations before raising a single error.

use crate::ValidationResult;
use chrono::{DateTime, Utc};

/// Longest date range the reporting endpoints serve without complaint.
pub const MAX_DATE_RANGE_DAYS: i64 = 90;

/// Longest seller SKU accepted by the listings APIs.
pub const MAX_SKU_LENGTH: usize = 40;

fn is_upper_alnum(s: &str) -> bool {
    s.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
}

/// ASIN: exactly 10 uppercase alphanumeric characters.
///
/// # Examples
///
/// ```
/// use amazon_validation::validate_asin;
///
/// assert!(validate_asin("B00ZV9RDKK").is_valid());
/// assert_eq!(validate_asin("short").errors()[0].code, "INVALID_ASIN_FORMAT");
/// ```
pub fn validate_asin(asin: &str) -> ValidationResult {
    let mut result = ValidationResult::default();
    if asin.len() != 10 || !is_upper_alnum(asin) {
        result.push_invalid(
            "asin",
            asin,
            "INVALID_ASIN_FORMAT",
            format!("'{}' must be 10 uppercase alphanumeric characters", asin),
        );
    }
    result
}

/// A non-empty list of at most `max` valid, distinct ASINs.
pub fn validate_asins<S: AsRef<str>>(asins: &[S], max: usize) -> ValidationResult {
    let mut result = ValidationResult::default();
    if asins.is_empty() {
        result.push_error("asins", "EMPTY_ASIN_LIST", "at least one ASIN is required");
        return result;
    }
    if asins.len() > max {
        result.push_error(
            "asins",
            "TOO_MANY_ASINS",
            format!("at most {} ASINs per request, got {}", max, asins.len()),
        );
    }
    for (index, asin) in asins.iter().enumerate() {
        let asin = asin.as_ref();
        if !validate_asin(asin).is_valid() {
            result.push_invalid(
                format!("asins[{}]", index),
                asin,
                "INVALID_ASIN_FORMAT",
                format!("'{}' must be 10 uppercase alphanumeric characters", asin),
            );
        }
    }
    let mut seen = std::collections::HashSet::new();
    for asin in asins.iter().map(AsRef::as_ref) {
        if !seen.insert(asin) {
            result.push_warning("asins", "DUPLICATE_ASIN", format!("'{}' requested twice", asin));
        }
    }
    result
}

/// Seller SKU: 1–40 characters without surrounding whitespace.
pub fn validate_sku(sku: &str) -> ValidationResult {
    let mut result = ValidationResult::default();
    let length = sku.chars().count();
    if length == 0 || length > MAX_SKU_LENGTH {
        result.push_invalid(
            "sku",
            sku,
            "INVALID_SKU_FORMAT",
            format!("must be 1-{} characters, got {}", MAX_SKU_LENGTH, length),
        );
    } else if sku.trim() != sku {
        result.push_invalid(
            "sku",
            sku,
            "INVALID_SKU_FORMAT",
            "must not start or end with whitespace",
        );
    }
    result
}

fn validate_amazon_id(value: &str, field: &str, code: &str) -> ValidationResult {
    let mut result = ValidationResult::default();
    if !(13..=14).contains(&value.len()) || !is_upper_alnum(value) {
        result.push_invalid(
            field,
            value,
            code,
            format!("'{}' must be 13-14 uppercase alphanumeric characters", value),
        );
    }
    result
}

/// Marketplace id, e.g. `ATVPDKIKX0DER`.
pub fn validate_marketplace_id(marketplace_id: &str) -> ValidationResult {
    validate_amazon_id(marketplace_id, "marketplace_id", "INVALID_MARKETPLACE_ID")
}

/// Seller (merchant) id.
pub fn validate_seller_id(seller_id: &str) -> ValidationResult {
    validate_amazon_id(seller_id, "seller_id", "INVALID_SELLER_ID")
}

/// ISO-4217 currency code: three uppercase letters.
pub fn validate_currency(code: &str) -> ValidationResult {
    let mut result = ValidationResult::default();
    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_uppercase()) {
        result.push_invalid(
            "currency",
            code,
            "INVALID_CURRENCY_CODE",
            format!("'{}' must be a 3-letter ISO-4217 code", code),
        );
    }
    result
}

/// Date range relative to the current time.
///
/// See [`validate_date_range_at`].
pub fn validate_date_range(start: DateTime<Utc>, end: DateTime<Utc>) -> ValidationResult {
    validate_date_range_at(start, end, Utc::now())
}

/// Date range: `start` must precede `end`.
///
/// Ranges longer than [`MAX_DATE_RANGE_DAYS`] and starts after `now` are
/// warnings, not errors; upstream may still serve them.
///
/// # Examples
///
/// ```
/// use amazon_validation::validate_date_range_at;
/// use chrono::{TimeZone, Utc};
///
/// let earlier = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
/// let later = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
/// let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
///
/// assert!(validate_date_range_at(earlier, later, now).is_valid());
/// let reversed = validate_date_range_at(later, earlier, now);
/// assert_eq!(reversed.errors()[0].code, "INVALID_DATE_RANGE");
/// ```
pub fn validate_date_range_at(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    now: DateTime<Utc>,
) -> ValidationResult {
    let mut result = ValidationResult::default();
    if start >= end {
        result.push_error(
            "date_range",
            "INVALID_DATE_RANGE",
            format!("start {} must be before end {}", start.to_rfc3339(), end.to_rfc3339()),
        );
        return result;
    }
    let days = (end - start).num_days();
    if days > MAX_DATE_RANGE_DAYS {
        result.push_warning(
            "date_range",
            "DATE_RANGE_TOO_LARGE",
            format!("spans {} days; upstream may truncate beyond {}", days, MAX_DATE_RANGE_DAYS),
        );
    }
    if start > now {
        result.push_warning(
            "date_range",
            "FUTURE_START_DATE",
            "start is in the future; no data will be returned yet",
        );
    }
    result
}

/// Amazon order id: `3-7-7` digit groups, e.g. `113-1234567-1234567`.
pub fn validate_order_id(order_id: &str) -> ValidationResult {
    let mut result = ValidationResult::default();
    let groups: Vec<&str> = order_id.split('-').collect();
    let valid = groups.len() == 3
        && groups
            .iter()
            .zip([3, 7, 7])
            .all(|(group, len)| group.len() == len && group.chars().all(|c| c.is_ascii_digit()));
    if !valid {
        result.push_invalid(
            "order_id",
            order_id,
            "INVALID_ORDER_ID",
            format!("'{}' must look like '113-1234567-1234567'", order_id),
        );
    }
    result
}

/// Page number (1-based) and page size within `1..=max_page_size`.
pub fn validate_pagination(page: u32, page_size: u32, max_page_size: u32) -> ValidationResult {
    let mut result = ValidationResult::default();
    if page == 0 {
        result.push_invalid("page", "0", "INVALID_PAGINATION", "page numbers start at 1");
    }
    if page_size == 0 || page_size > max_page_size {
        result.push_invalid(
            "page_size",
            page_size.to_string(),
            "INVALID_PAGINATION",
            format!("must be between 1 and {}, got {}", max_page_size, page_size),
        );
    }
    result
}

/// Associates partner tag, e.g. `mystore-20`.
pub fn validate_partner_tag(tag: &str) -> ValidationResult {
    let mut result = ValidationResult::default();
    let valid = tag.rsplit_once('-').is_some_and(|(name, suffix)| {
        !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
            && suffix.len() == 2
            && suffix.chars().all(|c| c.is_ascii_digit())
    });
    if !valid {
        result.push_invalid(
            "partner_tag",
            tag,
            "INVALID_PARTNER_TAG",
            format!("'{}' must look like 'storename-20'", tag),
        );
    }
    result
}
