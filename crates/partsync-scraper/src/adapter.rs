//! Scraper adapter: drives one [`ProductSource`] per supplier with pacing,
//! timeout, and retry, and normalizes the results.

use std::time::Duration;

use partsync_core::{RawProductRecord, SupplierConfig, SupplierRegistry};
use serde_json::Value;

use crate::error::ScrapeError;
use crate::limiter::SupplierRateLimiter;
use crate::parse::parse_record;
use crate::retry::retry_with_backoff;
use crate::source::ProductSource;

/// One supplier's failure in a multi-supplier run, recorded instead of
/// propagated so sibling suppliers are unaffected.
#[derive(Debug)]
pub struct SupplierFailure {
    pub supplier_id: String,
    pub error: String,
}

/// Result of scraping all active suppliers: the concatenated records in
/// registry order, plus the isolated per-supplier failures.
#[derive(Debug, Default)]
pub struct ScrapeRun {
    pub records: Vec<RawProductRecord>,
    pub failures: Vec<SupplierFailure>,
}

pub struct ScraperAdapter<S> {
    source: S,
    limiter: SupplierRateLimiter,
    /// Base delay for exponential retry backoff.
    backoff_base_ms: u64,
    /// Fixed politeness gap between successive suppliers in a full run,
    /// independent of each supplier's own rate limit.
    inter_supplier_delay_ms: u64,
}

impl<S: ProductSource> ScraperAdapter<S> {
    #[must_use]
    pub fn new(source: S, backoff_base_ms: u64, inter_supplier_delay_ms: u64) -> Self {
        Self {
            source,
            limiter: SupplierRateLimiter::new(),
            backoff_base_ms,
            inter_supplier_delay_ms,
        }
    }

    /// Scrapes one supplier.
    ///
    /// The fetch is paced by the supplier's rate limit, wrapped in the
    /// supplier's `timeout_ms`, and retried with backoff up to
    /// `supplier.max_retries` on transient errors. Items that fail to parse
    /// are skipped with a warning; the rest of the batch survives.
    ///
    /// # Errors
    ///
    /// Returns the final [`ScrapeError`] once retries are exhausted, or
    /// immediately for non-retriable errors.
    pub async fn scrape(
        &self,
        supplier: &SupplierConfig,
        query: &str,
        max_items: usize,
    ) -> Result<Vec<RawProductRecord>, ScrapeError> {
        self.limiter.acquire(&supplier.id, supplier.rate_limit).await;

        let items: Vec<Value> =
            retry_with_backoff(supplier.max_retries, self.backoff_base_ms, || async {
                match tokio::time::timeout(
                    Duration::from_millis(supplier.timeout_ms),
                    self.source.fetch_items(supplier, query, max_items),
                )
                .await
                {
                    Ok(result) => result,
                    Err(_) => Err(ScrapeError::Timeout {
                        supplier_id: supplier.id.clone(),
                        timeout_ms: supplier.timeout_ms,
                    }),
                }
            })
            .await?;

        let mut records = Vec::with_capacity(items.len());
        let mut skipped = 0usize;
        for item in &items {
            match parse_record(supplier, item) {
                Ok(record) => records.push(record),
                Err(e) => {
                    skipped += 1;
                    tracing::warn!(supplier = %supplier.id, error = %e, "skipping unparseable feed item");
                }
            }
        }
        records.truncate(max_items);

        tracing::info!(
            supplier = %supplier.id,
            records = records.len(),
            skipped,
            "supplier scrape complete"
        );
        Ok(records)
    }

    /// Scrapes every active supplier in registry order.
    ///
    /// A supplier's failure is recorded in the returned [`ScrapeRun`] and the
    /// run continues with the remaining suppliers; it never aborts siblings.
    pub async fn scrape_all_suppliers(
        &self,
        registry: &SupplierRegistry,
        query: &str,
        max_per_supplier: usize,
    ) -> ScrapeRun {
        let mut run = ScrapeRun::default();
        let mut first = true;

        for supplier in registry.active_suppliers() {
            if !first && self.inter_supplier_delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(self.inter_supplier_delay_ms)).await;
            }
            first = false;

            match self.scrape(supplier, query, max_per_supplier).await {
                Ok(records) => run.records.extend(records),
                Err(e) => {
                    tracing::error!(
                        supplier = %supplier.id,
                        error = %e,
                        "supplier scrape failed — continuing with remaining suppliers"
                    );
                    run.failures.push(SupplierFailure {
                        supplier_id: supplier.id.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        tracing::info!(
            records = run.records.len(),
            failed_suppliers = run.failures.len(),
            "multi-supplier scrape complete"
        );
        run
    }
}

#[cfg(test)]
#[path = "adapter_test.rs"]
mod tests;
