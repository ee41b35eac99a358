//! Supplier scraping: pluggable product sources, rate limiting, retry with
//! backoff, and normalization into [`partsync_core::RawProductRecord`].

mod adapter;
mod error;
mod limiter;
mod parse;
mod retry;
mod source;

pub use adapter::{ScrapeRun, ScraperAdapter, SupplierFailure};
pub use error::ScrapeError;
pub use limiter::SupplierRateLimiter;
pub use parse::parse_record;
pub use source::{HttpProductSource, ProductSource};
