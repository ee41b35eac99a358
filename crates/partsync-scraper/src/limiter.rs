//! Per-supplier request pacing.
//!
//! Each supplier declares a `rate_limit` in requests per minute. The limiter
//! turns that into a minimum interval between successive requests to the same
//! supplier and sleeps off whatever remains of it. Different suppliers never
//! delay each other.
//!
//! Built on `tokio::time::Instant` so tests drive it with a paused runtime
//! clock instead of wall-clock waits.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use tokio::time::Instant;

#[derive(Debug, Default)]
pub struct SupplierRateLimiter {
    last_request: Mutex<HashMap<String, Instant>>,
}

impl SupplierRateLimiter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits until a request to `supplier_id` is allowed under
    /// `rate_limit_per_min`, then records the request instant.
    ///
    /// Callers are expected to serialize requests per supplier (the adapter
    /// scrapes suppliers one call at a time); concurrent acquires for the
    /// same supplier would both be admitted after the same interval.
    pub async fn acquire(&self, supplier_id: &str, rate_limit_per_min: u32) {
        let interval =
            Duration::from_millis(60_000 / u64::from(rate_limit_per_min.max(1)));

        let wait = {
            let last = self.last_request.lock().expect("limiter lock poisoned");
            last.get(supplier_id)
                .and_then(|t| interval.checked_sub(t.elapsed()))
        };

        if let Some(wait) = wait {
            tracing::debug!(
                supplier = %supplier_id,
                wait_ms = u64::try_from(wait.as_millis()).unwrap_or(u64::MAX),
                "pacing request to supplier"
            );
            tokio::time::sleep(wait).await;
        }

        self.last_request
            .lock()
            .expect("limiter lock poisoned")
            .insert(supplier_id.to_string(), Instant::now());
    }
}
