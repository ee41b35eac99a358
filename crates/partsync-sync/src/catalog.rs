//! Raw record → priced catalog product.

use partsync_core::{CatalogProduct, PricingConfig, PricingError, RawProductRecord};

/// Prices one scraped record into a catalog product.
///
/// The supplier's raw category is mapped through the taxonomy table first;
/// the mapped name is what the markup lookup and the stored product use.
///
/// # Errors
///
/// Returns [`PricingError::InvalidCost`] for a negative supplier price. The
/// orchestrator skips such records with a warning.
pub fn price_record(
    pricing: &PricingConfig,
    raw: &RawProductRecord,
) -> Result<CatalogProduct, PricingError> {
    let category = raw.category.as_deref().map(|c| pricing.map_category(c));
    let resale_price = pricing.calculate_price(raw.supplier_price, category.as_deref())?;

    Ok(CatalogProduct {
        id: raw.key().to_string(),
        supplier_id: raw.supplier_id.clone(),
        external_id: raw.external_id.clone(),
        title: raw.title.clone(),
        supplier_price: raw.supplier_price,
        resale_price,
        category,
        description: raw.description.clone(),
        local_image_path: None,
        original_image_url: raw.image_url.clone(),
        in_stock: raw.in_stock,
        stock_quantity: raw.stock_quantity,
        last_price_update: raw.scraped_at,
        last_synced_at: raw.scraped_at,
    })
}
