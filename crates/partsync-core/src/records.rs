//! Domain records flowing through the sync pipeline.
//!
//! A [`RawProductRecord`] is the output of one scrape pass over one supplier
//! item. The orchestrator folds it — priced and category-mapped — into a
//! [`CatalogProduct`], the persisted/sellable entity the storefront reads.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Composite key identifying a catalog entry: one product at one supplier.
///
/// All diffing and upserting is keyed on this pair, so the same part carried
/// by two suppliers produces two independent catalog rows.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProductKey {
    pub supplier_id: String,
    pub external_id: String,
}

impl ProductKey {
    #[must_use]
    pub fn new(supplier_id: impl Into<String>, external_id: impl Into<String>) -> Self {
        Self {
            supplier_id: supplier_id.into(),
            external_id: external_id.into(),
        }
    }
}

impl std::fmt::Display for ProductKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.supplier_id, self.external_id)
    }
}

/// One product as scraped from a supplier feed, before pricing or category
/// mapping. Immutable once created; discarded after folding into a
/// [`CatalogProduct`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawProductRecord {
    pub supplier_id: String,
    /// Supplier-side product identifier, stored as a string to avoid
    /// precision loss on numeric ids.
    pub external_id: String,
    pub title: String,
    pub supplier_price: Decimal,
    /// The supplier's raw category string, before mapping to the internal
    /// taxonomy.
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub description: Option<String>,
    pub in_stock: bool,
    pub stock_quantity: i32,
    pub scraped_at: DateTime<Utc>,
}

impl RawProductRecord {
    #[must_use]
    pub fn key(&self) -> ProductKey {
        ProductKey::new(self.supplier_id.clone(), self.external_id.clone())
    }
}

/// The persisted, sellable catalog entity.
///
/// Invariant: `resale_price >= supplier_price + minimum_profit` holds for
/// every record produced by the pricing engine. Only a sync pass mutates
/// these records; the storefront reads them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogProduct {
    /// Stable catalog id, `{supplier_id}:{external_id}`.
    pub id: String,
    pub supplier_id: String,
    pub external_id: String,
    pub title: String,
    pub supplier_price: Decimal,
    pub resale_price: Decimal,
    /// Internal taxonomy category (already mapped from the supplier's raw
    /// string).
    pub category: Option<String>,
    pub description: Option<String>,
    /// Local path of the downloaded primary image, or the placeholder path
    /// when the download degraded.
    pub local_image_path: Option<String>,
    pub original_image_url: Option<String>,
    pub in_stock: bool,
    pub stock_quantity: i32,
    pub last_price_update: DateTime<Utc>,
    pub last_synced_at: DateTime<Utc>,
}

impl CatalogProduct {
    #[must_use]
    pub fn key(&self) -> ProductKey {
        ProductKey::new(self.supplier_id.clone(), self.external_id.clone())
    }

    /// Returns `true` if `other` represents a real upstream change that a
    /// sync pass must write: a different resale price, stock flag, or stock
    /// quantity. Timestamp-only differences do not count, which is what makes
    /// back-to-back syncs over identical scrape input idempotent.
    #[must_use]
    pub fn differs_from(&self, other: &CatalogProduct) -> bool {
        self.resale_price != other.resale_price
            || self.supplier_price != other.supplier_price
            || self.in_stock != other.in_stock
            || self.stock_quantity != other.stock_quantity
    }
}
