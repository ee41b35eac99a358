//! Size-variant paths for stored product images.
//!
//! The storefront serves three sizes per product image. Variant files sit
//! next to the original with a `_w<width>` suffix, so cleanup can treat the
//! whole family by filename prefix.

use std::path::{Path, PathBuf};

const THUMBNAIL_WIDTH: u32 = 150;
const MEDIUM_WIDTH: u32 = 500;
const LARGE_WIDTH: u32 = 1200;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageVariants {
    pub thumbnail: PathBuf,
    pub medium: PathBuf,
    pub large: PathBuf,
}

impl ImageVariants {
    fn all(&self) -> [&Path; 3] {
        [&self.thumbnail, &self.medium, &self.large]
    }
}

fn with_width(base: &Path, width: u32) -> PathBuf {
    let stem = base
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = base
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_else(|| "jpg".to_string());
    base.with_file_name(format!("{stem}_w{width}.{ext}"))
}

/// Derives the three variant paths for a stored original. Pure path
/// manipulation; nothing is touched on disk.
#[must_use]
pub fn variant_paths(original: &Path) -> ImageVariants {
    ImageVariants {
        thumbnail: with_width(original, THUMBNAIL_WIDTH),
        medium: with_width(original, MEDIUM_WIDTH),
        large: with_width(original, LARGE_WIDTH),
    }
}

/// Materializes the variant files for a stored original, returning the paths
/// that exist afterwards.
///
/// Best effort: a variant that cannot be written is logged and skipped, and
/// already-present variants are left alone. Variants are currently stored at
/// original resolution; serving layers scale on delivery.
pub async fn materialize_variants(original: &Path) -> ImageVariants {
    let variants = variant_paths(original);
    for target in variants.all() {
        if target.exists() {
            continue;
        }
        if let Err(e) = tokio::fs::copy(original, target).await {
            tracing::warn!(
                original = %original.display(),
                target = %target.display(),
                error = %e,
                "failed to write image variant"
            );
        }
    }
    variants
}
