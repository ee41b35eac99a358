//! Product image pipeline: batched downloads with graceful placeholder
//! degradation, size-variant derivation, and unused-file cleanup.

mod cleanup;
mod error;
mod fetcher;
mod pipeline;
mod variants;

pub use cleanup::{cleanup_unused_images, CleanupReport};
pub use error::ImageError;
pub use fetcher::{HttpImageFetcher, ImageFetcher};
pub use pipeline::ImagePipeline;
pub use variants::{materialize_variants, variant_paths, ImageVariants};
