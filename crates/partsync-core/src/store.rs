//! Catalog persistence seam.
//!
//! The pipeline treats the catalog as a key-value upsert interface keyed by
//! `(supplier_id, external_id)`. Production runs go through the Postgres
//! implementation in `partsync-db`; tests and `test` mode use
//! [`MemoryCatalogStore`].

use std::collections::BTreeMap;
use std::sync::Mutex;

use thiserror::Error;

use crate::records::{CatalogProduct, ProductKey};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("catalog store unavailable: {0}")]
    Unavailable(String),

    #[error("catalog store backend error: {0}")]
    Backend(String),
}

/// Upsert interface over the persisted catalog.
///
/// `upsert_many` must be atomic at batch granularity: either every record in
/// the batch is written or none is. That contract is what lets a failed
/// persist phase abort a sync without leaving partial state behind.
#[allow(async_fn_in_trait)]
pub trait CatalogStore: Send + Sync {
    async fn get(&self, key: &ProductKey) -> Result<Option<CatalogProduct>, StoreError>;

    async fn upsert_many(&self, records: &[CatalogProduct]) -> Result<(), StoreError>;

    /// Ids of all products currently in the catalog, in stable (key) order.
    async fn list_active_ids(&self) -> Result<Vec<String>, StoreError>;

    /// Every product in the catalog, in stable (key) order. Used by image
    /// re-download runs that operate on the stored catalog.
    async fn list_all(&self) -> Result<Vec<CatalogProduct>, StoreError>;

    /// Lookup by catalog product id (`{supplier_id}:{external_id}`), used by
    /// order forwarding to resolve the responsible supplier.
    async fn find_product(&self, product_id: &str) -> Result<Option<CatalogProduct>, StoreError>;

    async fn count(&self) -> Result<usize, StoreError>;
}

/// In-memory catalog store. `BTreeMap` keeps iteration order deterministic
/// for fixtures.
#[derive(Debug, Default)]
pub struct MemoryCatalogStore {
    products: Mutex<BTreeMap<ProductKey, CatalogProduct>>,
}

impl MemoryCatalogStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl CatalogStore for MemoryCatalogStore {
    async fn get(&self, key: &ProductKey) -> Result<Option<CatalogProduct>, StoreError> {
        let products = self.products.lock().expect("catalog lock poisoned");
        Ok(products.get(key).cloned())
    }

    async fn upsert_many(&self, records: &[CatalogProduct]) -> Result<(), StoreError> {
        // Single lock acquisition makes the whole batch atomic.
        let mut products = self.products.lock().expect("catalog lock poisoned");
        for record in records {
            products.insert(record.key(), record.clone());
        }
        Ok(())
    }

    async fn list_active_ids(&self) -> Result<Vec<String>, StoreError> {
        let products = self.products.lock().expect("catalog lock poisoned");
        Ok(products.values().map(|p| p.id.clone()).collect())
    }

    async fn list_all(&self) -> Result<Vec<CatalogProduct>, StoreError> {
        let products = self.products.lock().expect("catalog lock poisoned");
        Ok(products.values().cloned().collect())
    }

    async fn find_product(&self, product_id: &str) -> Result<Option<CatalogProduct>, StoreError> {
        let products = self.products.lock().expect("catalog lock poisoned");
        Ok(products.values().find(|p| p.id == product_id).cloned())
    }

    async fn count(&self) -> Result<usize, StoreError> {
        let products = self.products.lock().expect("catalog lock poisoned");
        Ok(products.len())
    }
}
