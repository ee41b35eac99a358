//! Pluggable product sources.
//!
//! The fetch-and-parse technique varies per supplier (JSON feed, vendor API,
//! headless browser); the adapter only needs raw feed items back. The core's
//! tests run against in-memory fakes of this trait.

use partsync_core::SupplierConfig;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use crate::error::ScrapeError;

/// Fetches raw feed items for one supplier. Implementations perform exactly
/// one network operation per call; timeout and retry policy are applied by
/// the adapter around it.
#[allow(async_fn_in_trait)]
pub trait ProductSource: Send + Sync {
    async fn fetch_items(
        &self,
        supplier: &SupplierConfig,
        query: &str,
        max_items: usize,
    ) -> Result<Vec<Value>, ScrapeError>;
}

/// Top-level shape of a supplier JSON feed response.
#[derive(Debug, Deserialize)]
struct FeedResponse {
    products: Vec<Value>,
}

/// HTTP implementation against a supplier's `products.json` feed.
///
/// Classifies 404, 429 (honoring `Retry-After`), and other non-2xx responses
/// as typed errors so the adapter's retry policy can tell transient from
/// permanent failures.
pub struct HttpProductSource {
    client: Client,
}

impl HttpProductSource {
    /// Creates the source with a shared `User-Agent`.
    ///
    /// No client-level timeout is set here; the adapter enforces each
    /// supplier's `timeout_ms` around the whole fetch.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(user_agent: &str) -> Result<Self, ScrapeError> {
        let client = Client::builder()
            .connect_timeout(std::time::Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self { client })
    }

    /// Builds the feed URL for the given supplier, query, and page size.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::InvalidBaseUrl`] if the supplier's `base_url`
    /// cannot be parsed.
    fn feed_url(
        supplier: &SupplierConfig,
        query: &str,
        max_items: usize,
    ) -> Result<String, ScrapeError> {
        let base = format!(
            "{}/products.json",
            supplier.base_url.trim_end_matches('/')
        );
        let mut url =
            reqwest::Url::parse(&base).map_err(|e| ScrapeError::InvalidBaseUrl {
                supplier_id: supplier.id.clone(),
                reason: format!("\"{}\" is not a valid URL base: {e}", supplier.base_url),
            })?;

        url.query_pairs_mut()
            .append_pair("limit", &max_items.to_string());
        if !query.is_empty() {
            url.query_pairs_mut().append_pair("q", query);
        }
        Ok(url.to_string())
    }
}

impl ProductSource for HttpProductSource {
    async fn fetch_items(
        &self,
        supplier: &SupplierConfig,
        query: &str,
        max_items: usize,
    ) -> Result<Vec<Value>, ScrapeError> {
        let url = Self::feed_url(supplier, query, max_items)?;

        let mut request = self
            .client
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/json");
        if let Some(api_key) = &supplier.api_key {
            request = request.header("X-Api-Key", api_key);
        }

        let response = request.send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(60);
            return Err(ScrapeError::RateLimited {
                supplier_id: supplier.id.clone(),
                retry_after_secs,
            });
        }

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ScrapeError::NotFound { url });
        }

        if !status.is_success() {
            return Err(ScrapeError::UnexpectedStatus {
                status: status.as_u16(),
                url,
            });
        }

        let body = response.text().await?;
        let parsed = serde_json::from_str::<FeedResponse>(&body).map_err(|e| {
            ScrapeError::Deserialize {
                context: format!("products feed from supplier '{}'", supplier.id),
                source: e,
            }
        })?;

        let mut items = parsed.products;
        items.truncate(max_items);
        Ok(items)
    }
}
