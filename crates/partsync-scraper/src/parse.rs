//! Per-item parsing from raw feed items into [`RawProductRecord`].
//!
//! Field locations come from the supplier's `scrape_selectors` map: field
//! name → dot-separated JSON path into the item (e.g. `"pricing.wholesale"`).
//! Unconfigured fields fall back to conventional feed field names.

use chrono::Utc;
use partsync_core::{RawProductRecord, SupplierConfig};
use rust_decimal::Decimal;
use serde_json::Value;

use crate::error::ScrapeError;

/// Walks a dot-separated path into a JSON value.
fn select<'a>(item: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = item;
    for segment in path.split('.') {
        current = current.get(segment)?;
    }
    Some(current)
}

fn selector<'a>(supplier: &'a SupplierConfig, field: &str, default: &'a str) -> &'a str {
    supplier
        .scrape_selectors
        .get(field)
        .map_or(default, String::as_str)
}

/// Accepts both `"12.99"` and `12.99` — supplier feeds disagree on whether
/// prices are strings or numbers.
fn decimal_at(item: &Value, path: &str) -> Option<Decimal> {
    match select(item, path)? {
        Value::String(s) => s.parse().ok(),
        Value::Number(n) => n.to_string().parse().ok(),
        _ => None,
    }
}

fn string_at(item: &Value, path: &str) -> Option<String> {
    match select(item, path)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Parses one raw feed item into a [`RawProductRecord`].
///
/// `title`, `external_id`, and a non-negative `price` are required; the rest
/// degrade to sensible defaults. When the feed carries no explicit `in_stock`
/// flag, availability is derived from the stock quantity.
///
/// # Errors
///
/// Returns [`ScrapeError::ItemParse`] naming the missing/invalid field. The
/// adapter skips such items and keeps the rest of the batch.
pub fn parse_record(
    supplier: &SupplierConfig,
    item: &Value,
) -> Result<RawProductRecord, ScrapeError> {
    let item_parse = |reason: String| ScrapeError::ItemParse {
        supplier_id: supplier.id.clone(),
        reason,
    };

    let external_id = string_at(item, selector(supplier, "external_id", "id"))
        .ok_or_else(|| item_parse("missing external id".to_string()))?;

    let title = string_at(item, selector(supplier, "title", "title"))
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| item_parse(format!("item '{external_id}' has no title")))?;

    let price_path = selector(supplier, "price", "price");
    let supplier_price = decimal_at(item, price_path)
        .ok_or_else(|| item_parse(format!("item '{external_id}' has no price at '{price_path}'")))?;
    if supplier_price.is_sign_negative() {
        return Err(item_parse(format!(
            "item '{external_id}' has negative price {supplier_price}"
        )));
    }

    let category = string_at(item, selector(supplier, "category", "category"));
    let image_url = string_at(item, selector(supplier, "image", "image"));
    let description = string_at(item, selector(supplier, "description", "description"));

    let stock_quantity = select(item, selector(supplier, "stock_quantity", "stock_quantity"))
        .and_then(Value::as_i64)
        .and_then(|n| i32::try_from(n).ok())
        .unwrap_or(0);

    let in_stock = select(item, selector(supplier, "in_stock", "in_stock"))
        .and_then(Value::as_bool)
        .unwrap_or(stock_quantity > 0);

    Ok(RawProductRecord {
        supplier_id: supplier.id.clone(),
        external_id,
        title,
        supplier_price,
        category,
        image_url,
        description,
        in_stock,
        stock_quantity,
        scraped_at: Utc::now(),
    })
}
