//! Full-sync orchestrator.

use std::collections::HashSet;

use partsync_core::{CancelToken, CatalogProduct, CatalogStore, PricingConfig, SupplierRegistry};
use partsync_images::{ImageFetcher, ImagePipeline};
use partsync_scraper::{ProductSource, ScraperAdapter, SupplierFailure};

use crate::catalog::price_record;
use crate::error::SyncError;

/// Where a running sync currently is. `Idle` between runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    Idle,
    Scraping,
    Pricing,
    Diffing,
    ImageSync,
    Persisting,
}

impl std::fmt::Display for SyncPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Scraping => "scraping",
            Self::Pricing => "pricing",
            Self::Diffing => "diffing",
            Self::ImageSync => "image-sync",
            Self::Persisting => "persisting",
        };
        f.write_str(s)
    }
}

/// Summary of one full sync.
#[derive(Debug)]
pub struct SyncResult {
    pub total_scraped: usize,
    pub added: usize,
    pub updated: usize,
    /// Catalog ids no active supplier reported this run. Flagged for review,
    /// never deleted automatically.
    pub removed_candidates: Vec<String>,
    pub new_database_size: usize,
    pub supplier_failures: Vec<SupplierFailure>,
}

/// Result of a scrape-and-price run that stops short of the catalog.
#[derive(Debug)]
pub struct PricedRun {
    pub products: Vec<CatalogProduct>,
    pub supplier_failures: Vec<SupplierFailure>,
}

pub struct SyncOrchestrator<Src, F, St> {
    scraper: ScraperAdapter<Src>,
    images: ImagePipeline<F>,
    store: St,
    registry: SupplierRegistry,
    pricing: PricingConfig,
    image_max_concurrent: usize,
    /// Single-flight guard: two concurrent full syncs must not interleave
    /// catalog writes.
    run_lock: tokio::sync::Mutex<()>,
    phase: std::sync::Mutex<SyncPhase>,
}

impl<Src, F, St> SyncOrchestrator<Src, F, St>
where
    Src: ProductSource,
    F: ImageFetcher,
    St: CatalogStore,
{
    #[must_use]
    pub fn new(
        scraper: ScraperAdapter<Src>,
        images: ImagePipeline<F>,
        store: St,
        registry: SupplierRegistry,
        pricing: PricingConfig,
        image_max_concurrent: usize,
    ) -> Self {
        Self {
            scraper,
            images,
            store,
            registry,
            pricing,
            image_max_concurrent,
            run_lock: tokio::sync::Mutex::new(()),
            phase: std::sync::Mutex::new(SyncPhase::Idle),
        }
    }

    /// Current phase, readable concurrently with a running sync.
    #[must_use]
    pub fn phase(&self) -> SyncPhase {
        *self.phase.lock().expect("phase lock poisoned")
    }

    #[must_use]
    pub fn store(&self) -> &St {
        &self.store
    }

    /// Runs the full pipeline: scrape → price → diff → images → persist.
    ///
    /// Single-flight: a second call while one is in progress returns
    /// [`SyncError::AlreadyRunning`] immediately. Cancellation is honored at
    /// every phase boundary; nothing is written unless the persist phase is
    /// reached, and the persist batch is atomic.
    ///
    /// # Errors
    ///
    /// [`SyncError::AlreadyRunning`], [`SyncError::Cancelled`], or
    /// [`SyncError::Store`] when the catalog backend fails.
    pub async fn run_full_sync(
        &self,
        query: &str,
        max_per_supplier: usize,
        cancel: &CancelToken,
    ) -> Result<SyncResult, SyncError> {
        let Ok(_guard) = self.run_lock.try_lock() else {
            tracing::warn!("full sync requested while another sync is in progress");
            return Err(SyncError::AlreadyRunning);
        };
        let result = self.full_sync_inner(query, max_per_supplier, cancel).await;
        self.set_phase(SyncPhase::Idle);
        result
    }

    async fn full_sync_inner(
        &self,
        query: &str,
        max_per_supplier: usize,
        cancel: &CancelToken,
    ) -> Result<SyncResult, SyncError> {
        self.enter(SyncPhase::Scraping, cancel)?;
        let run = self
            .scraper
            .scrape_all_suppliers(&self.registry, query, max_per_supplier)
            .await;
        let total_scraped = run.records.len();

        self.enter(SyncPhase::Pricing, cancel)?;
        let mut priced = Vec::with_capacity(run.records.len());
        for raw in &run.records {
            match price_record(&self.pricing, raw) {
                Ok(product) => priced.push(product),
                Err(e) => {
                    tracing::warn!(
                        product = %raw.key(),
                        error = %e,
                        "skipping record that failed pricing"
                    );
                }
            }
        }

        self.enter(SyncPhase::Diffing, cancel)?;
        let mut seen: HashSet<String> = HashSet::with_capacity(priced.len());
        let mut added: Vec<CatalogProduct> = Vec::new();
        let mut updated: Vec<CatalogProduct> = Vec::new();
        for product in priced {
            seen.insert(product.id.clone());
            match self.store.get(&product.key()).await? {
                None => added.push(product),
                Some(existing) => {
                    if product.differs_from(&existing) {
                        updated.push(merge_update(product, &existing));
                    }
                }
            }
        }
        let removed_candidates: Vec<String> = self
            .store
            .list_active_ids()
            .await?
            .into_iter()
            .filter(|id| !seen.contains(id))
            .collect();
        let (added_count, updated_count) = (added.len(), updated.len());

        self.enter(SyncPhase::ImageSync, cancel)?;
        let mut changed = added;
        changed.extend(updated);
        let changed = self
            .images
            .download_all(changed, self.image_max_concurrent, cancel)
            .await;

        self.enter(SyncPhase::Persisting, cancel)?;
        self.store.upsert_many(&changed).await?;
        let new_database_size = self.store.count().await?;

        tracing::info!(
            total_scraped,
            added = added_count,
            updated = updated_count,
            removed_candidates = removed_candidates.len(),
            new_database_size,
            failed_suppliers = run.failures.len(),
            "full sync complete"
        );
        Ok(SyncResult {
            total_scraped,
            added: added_count,
            updated: updated_count,
            removed_candidates,
            new_database_size,
            supplier_failures: run.failures,
        })
    }

    /// Scrapes and prices without touching images or the catalog. Used by
    /// dry runs that only want to see what the suppliers currently offer.
    pub async fn scrape_and_price(&self, query: &str, max_per_supplier: usize) -> PricedRun {
        let run = self
            .scraper
            .scrape_all_suppliers(&self.registry, query, max_per_supplier)
            .await;
        let mut products = Vec::with_capacity(run.records.len());
        for raw in &run.records {
            match price_record(&self.pricing, raw) {
                Ok(product) => products.push(product),
                Err(e) => {
                    tracing::warn!(product = %raw.key(), error = %e, "skipping record that failed pricing");
                }
            }
        }
        PricedRun {
            products,
            supplier_failures: run.failures,
        }
    }

    /// Re-downloads images for the whole stored catalog and persists the
    /// refreshed paths. Returns the number of products processed.
    ///
    /// # Errors
    ///
    /// [`SyncError::Store`] when the catalog cannot be read or written;
    /// individual image failures degrade to the placeholder as usual.
    pub async fn refresh_images(
        &self,
        max_concurrent: usize,
        cancel: &CancelToken,
    ) -> Result<usize, SyncError> {
        let products = self.store.list_all().await?;
        let refreshed = self.images.download_all(products, max_concurrent, cancel).await;
        if cancel.is_cancelled() {
            return Err(SyncError::Cancelled {
                phase: SyncPhase::Persisting,
            });
        }
        self.store.upsert_many(&refreshed).await?;
        Ok(refreshed.len())
    }

    /// Marks the phase boundary, honoring cancellation before entering.
    fn enter(&self, phase: SyncPhase, cancel: &CancelToken) -> Result<(), SyncError> {
        if cancel.is_cancelled() {
            tracing::info!(%phase, "sync cancelled at phase boundary");
            return Err(SyncError::Cancelled { phase });
        }
        self.set_phase(phase);
        Ok(())
    }

    fn set_phase(&self, phase: SyncPhase) {
        *self.phase.lock().expect("phase lock poisoned") = phase;
    }
}

/// An updated product keeps its stored image path and, when the price is
/// unchanged, its original price timestamp.
fn merge_update(mut incoming: CatalogProduct, existing: &CatalogProduct) -> CatalogProduct {
    incoming.local_image_path = existing.local_image_path.clone();
    if incoming.supplier_price == existing.supplier_price
        && incoming.resale_price == existing.resale_price
    {
        incoming.last_price_update = existing.last_price_update;
    }
    incoming
}

#[cfg(test)]
#[path = "orchestrator_test.rs"]
mod tests;
