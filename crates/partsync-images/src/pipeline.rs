//! Batched image downloads.
//!
//! Downloads run in fixed-size batches: everything in batch *n* resolves
//! before anything in batch *n+1* starts. The barrier is backpressure toward
//! the image host, not a throughput device. Individual download failures
//! degrade to the placeholder path and never surface to the caller.

use std::path::{Path, PathBuf};
use std::time::Duration;

use futures::future::join_all;
use partsync_core::{CancelToken, CatalogProduct};
use sha2::{Digest, Sha256};

use crate::fetcher::ImageFetcher;

pub struct ImagePipeline<F> {
    fetcher: F,
    image_dir: PathBuf,
    placeholder: String,
    /// Optional pause between batches to avoid saturating the image host.
    batch_pause_ms: u64,
}

/// Filesystem-safe stem for a catalog product id (`alpha:p1` → `alpha-p1`).
/// Cleanup keys on this stem, so it must stay stable across runs.
pub(crate) fn image_stem(product_id: &str) -> String {
    product_id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '-' })
        .collect()
}

fn url_extension(url: &str) -> &str {
    let path_part = url.split(['?', '#']).next().unwrap_or(url);
    match path_part.rsplit('.').next() {
        Some(ext) if ["jpg", "jpeg", "png", "gif", "webp"].contains(&ext.to_ascii_lowercase().as_str()) => ext,
        _ => "jpg",
    }
}

impl<F: ImageFetcher> ImagePipeline<F> {
    #[must_use]
    pub fn new(
        fetcher: F,
        image_dir: impl Into<PathBuf>,
        placeholder: impl Into<String>,
        batch_pause_ms: u64,
    ) -> Self {
        Self {
            fetcher,
            image_dir: image_dir.into(),
            placeholder: placeholder.into(),
            batch_pause_ms,
        }
    }

    /// Local path an image for this product/URL pair would be stored at.
    /// The URL hash keeps the name stable per source image while letting a
    /// changed upstream URL produce a fresh file.
    #[must_use]
    pub fn local_path_for(&self, product_id: &str, url: &str) -> PathBuf {
        let mut hasher = Sha256::new();
        hasher.update(url.as_bytes());
        let hash = format!("{:x}", hasher.finalize());
        self.image_dir.join(format!(
            "{}_{}.{}",
            image_stem(product_id),
            &hash[..8],
            url_extension(url)
        ))
    }

    /// Downloads the product's primary image and returns its local path.
    ///
    /// Never fails: a missing URL, network error, or write error degrades to
    /// the well-known placeholder path with a warning. An already-present
    /// file is reused without a network call.
    pub async fn download_product_image(&self, product: &CatalogProduct) -> String {
        let Some(url) = product.original_image_url.as_deref() else {
            tracing::debug!(product = %product.id, "no image URL; using placeholder");
            return self.placeholder.clone();
        };

        let local_path = self.local_path_for(&product.id, url);
        if local_path.exists() {
            return local_path.to_string_lossy().into_owned();
        }

        match self.fetch_and_store(url, &local_path).await {
            Ok(()) => {
                crate::variants::materialize_variants(&local_path).await;
                local_path.to_string_lossy().into_owned()
            }
            Err(e) => {
                tracing::warn!(
                    product = %product.id,
                    url,
                    error = %e,
                    "image download failed; using placeholder"
                );
                self.placeholder.clone()
            }
        }
    }

    async fn fetch_and_store(&self, url: &str, local_path: &Path) -> Result<(), crate::ImageError> {
        let bytes = self.fetcher.fetch(url).await?;

        tokio::fs::create_dir_all(&self.image_dir)
            .await
            .map_err(|e| crate::ImageError::Io {
                path: self.image_dir.display().to_string(),
                source: e,
            })?;
        tokio::fs::write(local_path, &bytes)
            .await
            .map_err(|e| crate::ImageError::Io {
                path: local_path.display().to_string(),
                source: e,
            })?;
        Ok(())
    }

    /// Downloads images for all products in fixed-size concurrent batches of
    /// `max_concurrent`, returning the products augmented with
    /// `local_image_path`. Result order matches input order.
    ///
    /// No download in batch *n+1* starts before every download in batch *n*
    /// has resolved (to a real path or the placeholder). Cancellation is
    /// honored between batches: remaining products are returned untouched.
    pub async fn download_all(
        &self,
        products: Vec<CatalogProduct>,
        max_concurrent: usize,
        cancel: &CancelToken,
    ) -> Vec<CatalogProduct> {
        let max_concurrent = max_concurrent.max(1);
        let total = products.len();
        let mut out: Vec<CatalogProduct> = Vec::with_capacity(total);

        let mut batches = products.into_iter().peekable();
        let mut first = true;
        while batches.peek().is_some() {
            let batch: Vec<CatalogProduct> = batches.by_ref().take(max_concurrent).collect();

            if cancel.is_cancelled() {
                tracing::info!(
                    done = out.len(),
                    total,
                    "image batch run cancelled; passing remaining products through"
                );
                out.extend(batch);
                out.extend(batches);
                return out;
            }

            if !first && self.batch_pause_ms > 0 {
                tokio::time::sleep(Duration::from_millis(self.batch_pause_ms)).await;
            }
            first = false;

            let downloads = batch.into_iter().map(|mut product| async move {
                let path = self.download_product_image(&product).await;
                product.local_image_path = Some(path);
                product
            });
            out.extend(join_all(downloads).await);
        }

        tracing::info!(total, "image batch run complete");
        out
    }
}

#[cfg(test)]
#[path = "pipeline_test.rs"]
mod tests;
