//! Sync orchestration: the full supplier-to-catalog pipeline.
//!
//! A full sync scrapes every active supplier, prices the records, diffs them
//! against the stored catalog, downloads images for what changed, and
//! persists the result in one atomic batch. Exactly one sync runs at a time.

mod catalog;
mod error;
mod orchestrator;

pub use catalog::price_record;
pub use error::SyncError;
pub use orchestrator::{PricedRun, SyncOrchestrator, SyncPhase, SyncResult};
