//! `CatalogStore` backed by the `catalog_products` table.

use chrono::{DateTime, Utc};
use partsync_core::{CatalogProduct, CatalogStore, ProductKey, StoreError};
use rust_decimal::Decimal;
use sqlx::PgPool;

/// A row from the `catalog_products` table.
#[derive(Debug, Clone, sqlx::FromRow)]
struct CatalogProductRow {
    id: String,
    supplier_id: String,
    external_id: String,
    title: String,
    supplier_price: Decimal,
    resale_price: Decimal,
    category: Option<String>,
    description: Option<String>,
    local_image_path: Option<String>,
    original_image_url: Option<String>,
    in_stock: bool,
    stock_quantity: i32,
    last_price_update: DateTime<Utc>,
    last_synced_at: DateTime<Utc>,
}

impl From<CatalogProductRow> for CatalogProduct {
    fn from(row: CatalogProductRow) -> Self {
        Self {
            id: row.id,
            supplier_id: row.supplier_id,
            external_id: row.external_id,
            title: row.title,
            supplier_price: row.supplier_price,
            resale_price: row.resale_price,
            category: row.category,
            description: row.description,
            local_image_path: row.local_image_path,
            original_image_url: row.original_image_url,
            in_stock: row.in_stock,
            stock_quantity: row.stock_quantity,
            last_price_update: row.last_price_update,
            last_synced_at: row.last_synced_at,
        }
    }
}

const SELECT_COLUMNS: &str = "id, supplier_id, external_id, title, supplier_price, \
     resale_price, category, description, local_image_path, original_image_url, \
     in_stock, stock_quantity, last_price_update, last_synced_at";

fn map_sqlx(e: sqlx::Error) -> StoreError {
    match e {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            StoreError::Unavailable(e.to_string())
        }
        other => StoreError::Backend(other.to_string()),
    }
}

/// Production catalog store. Clones share the underlying pool.
#[derive(Debug, Clone)]
pub struct PgCatalogStore {
    pool: PgPool,
}

impl PgCatalogStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl CatalogStore for PgCatalogStore {
    async fn get(&self, key: &ProductKey) -> Result<Option<CatalogProduct>, StoreError> {
        let row: Option<CatalogProductRow> = sqlx::query_as(&format!(
            "SELECT {SELECT_COLUMNS} FROM catalog_products \
             WHERE supplier_id = $1 AND external_id = $2"
        ))
        .bind(&key.supplier_id)
        .bind(&key.external_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(row.map(CatalogProduct::from))
    }

    /// One transaction for the whole batch: either every record lands or
    /// none does.
    async fn upsert_many(&self, records: &[CatalogProduct]) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx)?;
        for record in records {
            sqlx::query(
                "INSERT INTO catalog_products \
                     (id, supplier_id, external_id, title, supplier_price, resale_price, \
                      category, description, local_image_path, original_image_url, \
                      in_stock, stock_quantity, last_price_update, last_synced_at) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14) \
                 ON CONFLICT (supplier_id, external_id) DO UPDATE SET \
                     title              = EXCLUDED.title, \
                     supplier_price     = EXCLUDED.supplier_price, \
                     resale_price       = EXCLUDED.resale_price, \
                     category           = EXCLUDED.category, \
                     description        = EXCLUDED.description, \
                     local_image_path   = EXCLUDED.local_image_path, \
                     original_image_url = EXCLUDED.original_image_url, \
                     in_stock           = EXCLUDED.in_stock, \
                     stock_quantity     = EXCLUDED.stock_quantity, \
                     last_price_update  = EXCLUDED.last_price_update, \
                     last_synced_at     = EXCLUDED.last_synced_at",
            )
            .bind(&record.id)
            .bind(&record.supplier_id)
            .bind(&record.external_id)
            .bind(&record.title)
            .bind(record.supplier_price)
            .bind(record.resale_price)
            .bind(&record.category)
            .bind(&record.description)
            .bind(&record.local_image_path)
            .bind(&record.original_image_url)
            .bind(record.in_stock)
            .bind(record.stock_quantity)
            .bind(record.last_price_update)
            .bind(record.last_synced_at)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx)?;
        }
        tx.commit().await.map_err(map_sqlx)?;
        tracing::debug!(records = records.len(), "catalog batch upserted");
        Ok(())
    }

    async fn list_active_ids(&self) -> Result<Vec<String>, StoreError> {
        sqlx::query_scalar::<_, String>(
            "SELECT id FROM catalog_products ORDER BY supplier_id, external_id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)
    }

    async fn list_all(&self) -> Result<Vec<CatalogProduct>, StoreError> {
        let rows: Vec<CatalogProductRow> = sqlx::query_as(&format!(
            "SELECT {SELECT_COLUMNS} FROM catalog_products ORDER BY supplier_id, external_id"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(rows.into_iter().map(CatalogProduct::from).collect())
    }

    async fn find_product(&self, product_id: &str) -> Result<Option<CatalogProduct>, StoreError> {
        let row: Option<CatalogProductRow> = sqlx::query_as(&format!(
            "SELECT {SELECT_COLUMNS} FROM catalog_products WHERE id = $1"
        ))
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(row.map(CatalogProduct::from))
    }

    async fn count(&self) -> Result<usize, StoreError> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM catalog_products")
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx)?;
        Ok(usize::try_from(n).unwrap_or(0))
    }
}
