//! Retry with exponential back-off and jitter for supplier fetches.
//!
//! [`retry_with_backoff`] wraps any fallible async fetch and retries on
//! transient errors (timeouts, 429s, network failures, 5xx). Configuration
//! and parse errors are returned immediately — retrying would return the same
//! result.

use std::future::Future;
use std::time::Duration;

use crate::error::ScrapeError;

/// Returns `true` for errors worth retrying after a back-off delay.
///
/// **Retriable:**
/// - [`ScrapeError::Timeout`] — the supplier was slow, not wrong.
/// - [`ScrapeError::RateLimited`] — HTTP 429; the supplier asked us to back off.
/// - [`ScrapeError::Http`] — network-level failure (connection reset, TLS).
/// - [`ScrapeError::UnexpectedStatus`] with a 5xx status.
///
/// **Not retriable (hard stop):**
/// - [`ScrapeError::NotFound`] — 404; the feed path is wrong.
/// - [`ScrapeError::UnexpectedStatus`] with a 4xx status.
/// - [`ScrapeError::Deserialize`] / [`ScrapeError::ItemParse`] — the payload
///   shape is wrong; retrying won't fix it.
/// - [`ScrapeError::InvalidBaseUrl`] — configuration problem.
pub(crate) fn is_retriable(err: &ScrapeError) -> bool {
    match err {
        ScrapeError::Timeout { .. } | ScrapeError::RateLimited { .. } | ScrapeError::Http(_) => {
            true
        }
        ScrapeError::UnexpectedStatus { status, .. } => *status >= 500,
        ScrapeError::NotFound { .. }
        | ScrapeError::Deserialize { .. }
        | ScrapeError::InvalidBaseUrl { .. }
        | ScrapeError::ItemParse { .. } => false,
    }
}

/// Runs `operation` with up to `max_retries` additional attempts on transient
/// errors.
///
/// Back-off schedule with `backoff_base_ms = 2_000`:
///
/// | Attempt | Sleep before next attempt   |
/// |---------|-----------------------------|
/// | 1       | 2 000 ms × 2⁰ ± 25 % jitter |
/// | 2       | 2 000 ms × 2¹ ± 25 % jitter |
/// | 3       | 2 000 ms × 2² ± 25 % jitter |
///
/// Delay is capped at 60 s. Non-retriable errors are returned immediately.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, ScrapeError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ScrapeError>>,
{
    const MAX_DELAY_MS: u64 = 60_000;
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= max_retries {
                    return Err(err);
                }
                attempt += 1;
                let computed = backoff_base_ms.saturating_mul(1u64 << (attempt - 1).min(10));
                let capped = computed.min(MAX_DELAY_MS);
                #[allow(
                    clippy::cast_possible_truncation,
                    clippy::cast_sign_loss,
                    clippy::cast_precision_loss
                )]
                let delay_ms = (capped as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;
                tracing::warn!(
                    attempt,
                    max_retries,
                    delay_ms,
                    error = %err,
                    "transient supplier error — retrying after back-off"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}
