//! Command handlers, called from `main` after config and logging are set up.
//!
//! Per-supplier failures inside a run are reported in the summary rather
//! than propagated; a command only exits non-zero when the operation itself
//! cannot complete.

use std::time::Duration;

use anyhow::Context;
use partsync_core::{
    load_supplier_file, AppConfig, CancelToken, CatalogStore, MemoryCatalogStore, SupplierFile,
    SupplierRegistry,
};
use partsync_db::PgCatalogStore;
use partsync_images::{cleanup_unused_images, HttpImageFetcher, ImagePipeline};
use partsync_scraper::{HttpProductSource, ScraperAdapter};
use partsync_sync::{SyncOrchestrator, SyncResult};

/// Image downloads use one fixed client timeout rather than the per-supplier
/// `timeout_ms`: product images usually come off a CDN, not the supplier's
/// API host, and a slow fetch already degrades to the placeholder.
const IMAGE_FETCH_TIMEOUT_SECS: u64 = 30;

/// Per-supplier record cap for scheduled runs, which take whatever the feeds
/// offer rather than a user-provided limit.
const SCHEDULED_MAX_PER_SUPPLIER: usize = 500;

fn load_suppliers(config: &AppConfig) -> anyhow::Result<SupplierFile> {
    load_supplier_file(&config.suppliers_path).with_context(|| {
        format!(
            "failed to load supplier file {}",
            config.suppliers_path.display()
        )
    })
}

fn build_orchestrator<St: CatalogStore>(
    config: &AppConfig,
    file: &SupplierFile,
    store: St,
) -> anyhow::Result<SyncOrchestrator<HttpProductSource, HttpImageFetcher, St>> {
    let source = HttpProductSource::new(&config.user_agent)
        .map_err(|e| anyhow::anyhow!("failed to build product source: {e}"))?;
    let scraper = ScraperAdapter::new(
        source,
        config.backoff_base_ms,
        config.inter_supplier_delay_ms,
    );

    let fetcher = HttpImageFetcher::new(IMAGE_FETCH_TIMEOUT_SECS, &config.user_agent)
        .map_err(|e| anyhow::anyhow!("failed to build image fetcher: {e}"))?;
    let images = ImagePipeline::new(
        fetcher,
        config.image_dir.clone(),
        config.placeholder_image.clone(),
        config.image_batch_pause_ms,
    );

    Ok(SyncOrchestrator::new(
        scraper,
        images,
        store,
        SupplierRegistry::new(file.suppliers.clone()),
        file.pricing.clone(),
        config.image_max_concurrent,
    ))
}

/// Cancels the returned token on the first Ctrl-C, so a running sync stops
/// at its next phase boundary instead of mid-write.
fn cancel_on_interrupt() -> CancelToken {
    let cancel = CancelToken::new();
    let token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received; cancelling at the next phase boundary");
            token.cancel();
        }
    });
    cancel
}

fn format_sync_summary(result: &SyncResult) -> String {
    let mut summary = format!(
        "sync complete: {} scraped, {} added, {} updated, {} removal candidates, {} products in catalog",
        result.total_scraped,
        result.added,
        result.updated,
        result.removed_candidates.len(),
        result.new_database_size,
    );
    for failure in &result.supplier_failures {
        summary.push_str(&format!(
            "\n  supplier '{}' failed: {}",
            failure.supplier_id, failure.error
        ));
    }
    summary
}

pub(crate) async fn run_full_sync(
    config: &AppConfig,
    query: &str,
    max_per_supplier: usize,
) -> anyhow::Result<()> {
    let file = load_suppliers(config)?;
    let pool = partsync_db::connect_pool_from_config(config)
        .await
        .context("failed to connect to the catalog database")?;
    let applied = partsync_db::run_migrations(&pool).await?;
    if applied > 0 {
        tracing::info!(applied, "database migrations applied");
    }

    let orchestrator = build_orchestrator(config, &file, PgCatalogStore::new(pool))?;
    let cancel = cancel_on_interrupt();
    let result = orchestrator
        .run_full_sync(query, max_per_supplier, &cancel)
        .await?;

    println!("{}", format_sync_summary(&result));
    Ok(())
}

pub(crate) async fn run_products_only(
    config: &AppConfig,
    query: &str,
    max_per_supplier: usize,
) -> anyhow::Result<()> {
    let file = load_suppliers(config)?;
    let orchestrator = build_orchestrator(config, &file, MemoryCatalogStore::new())?;

    let run = orchestrator.scrape_and_price(query, max_per_supplier).await;
    for product in &run.products {
        println!(
            "{}  {}  cost {} -> resale {} (+{} est. shipping)  (stock {})",
            product.id,
            product.title,
            product.supplier_price,
            product.resale_price,
            file.pricing.shipping_estimate(product.resale_price),
            product.stock_quantity,
        );
    }
    println!(
        "{} products priced from {} suppliers ({} failed)",
        run.products.len(),
        file.suppliers.iter().filter(|s| s.enabled).count(),
        run.supplier_failures.len(),
    );
    for failure in &run.supplier_failures {
        println!("  supplier '{}' failed: {}", failure.supplier_id, failure.error);
    }
    Ok(())
}

pub(crate) async fn run_images_only(
    config: &AppConfig,
    max_concurrent: Option<usize>,
) -> anyhow::Result<()> {
    let file = load_suppliers(config)?;
    let pool = partsync_db::connect_pool_from_config(config)
        .await
        .context("failed to connect to the catalog database")?;
    let store = PgCatalogStore::new(pool);

    let active_ids = store.list_active_ids().await?;
    let orchestrator = build_orchestrator(config, &file, store)?;
    let cancel = cancel_on_interrupt();

    let processed = orchestrator
        .refresh_images(
            max_concurrent.unwrap_or(config.image_max_concurrent),
            &cancel,
        )
        .await?;
    let report = cleanup_unused_images(&config.image_dir, &active_ids).await?;

    println!(
        "images refreshed for {processed} products; {} stale files removed, {} kept",
        report.removed, report.kept
    );
    Ok(())
}

pub(crate) async fn run_test(config: &AppConfig, max_per_supplier: usize) -> anyhow::Result<()> {
    let file = load_suppliers(config)?;
    let active = file.suppliers.iter().filter(|s| s.enabled).count();
    let orchestrator = build_orchestrator(config, &file, MemoryCatalogStore::new())?;

    let result = orchestrator
        .run_full_sync("", max_per_supplier, &CancelToken::new())
        .await?;

    println!("{}", format_sync_summary(&result));
    if active > 0 && result.supplier_failures.len() == active {
        anyhow::bail!("every active supplier failed; check supplier configuration");
    }
    Ok(())
}

pub(crate) async fn run_schedule(config: &AppConfig) -> anyhow::Result<()> {
    let file = load_suppliers(config)?;
    let pool = partsync_db::connect_pool_from_config(config)
        .await
        .context("failed to connect to the catalog database")?;
    let applied = partsync_db::run_migrations(&pool).await?;
    if applied > 0 {
        tracing::info!(applied, "database migrations applied");
    }

    let sync_interval = Duration::from_millis(file.automation.sync_interval_ms);
    let orchestrator = build_orchestrator(config, &file, PgCatalogStore::new(pool))?;
    let cancel = cancel_on_interrupt();

    tracing::info!(interval_secs = sync_interval.as_secs(), "sync schedule started");
    let mut interval = tokio::time::interval(sync_interval);
    loop {
        tokio::select! {
            _ = interval.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("schedule interrupted; exiting");
                return Ok(());
            }
        }
        match orchestrator
            .run_full_sync("", SCHEDULED_MAX_PER_SUPPLIER, &cancel)
            .await
        {
            Ok(result) => println!("{}", format_sync_summary(&result)),
            Err(e) => {
                tracing::error!(error = %e, "scheduled sync failed; next run at the usual interval");
            }
        }
        if cancel.is_cancelled() {
            tracing::info!("schedule interrupted; exiting");
            return Ok(());
        }
    }
}

#[cfg(test)]
mod tests {
    use partsync_scraper::SupplierFailure;

    use super::*;

    #[test]
    fn summary_lists_counts_and_failures() {
        let result = SyncResult {
            total_scraped: 12,
            added: 3,
            updated: 2,
            removed_candidates: vec!["partspro:gone-1".to_owned()],
            new_database_size: 40,
            supplier_failures: vec![SupplierFailure {
                supplier_id: "gaskets-inc".to_owned(),
                error: "404 on feed".to_owned(),
            }],
        };

        let summary = format_sync_summary(&result);
        assert!(summary.contains("12 scraped"));
        assert!(summary.contains("3 added"));
        assert!(summary.contains("2 updated"));
        assert!(summary.contains("1 removal candidates"));
        assert!(summary.contains("40 products in catalog"));
        assert!(summary.contains("gaskets-inc"));
    }
}
