//! Removal of image files whose products left the catalog.

use std::collections::HashSet;
use std::path::Path;

use crate::error::ImageError;
use crate::pipeline::image_stem;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CleanupReport {
    pub removed: usize,
    pub kept: usize,
}

/// Deletes every image file in `image_dir` that does not belong to one of
/// the given active product ids, including size variants. Files are matched
/// by the sanitized product-id prefix the pipeline names them with.
///
/// Idempotent: a second pass over the same directory removes nothing.
/// Subdirectories are left alone.
///
/// # Errors
///
/// Returns [`ImageError::Io`] if the directory cannot be read or a stale
/// file cannot be removed. A missing directory counts as already clean.
pub async fn cleanup_unused_images<I, S>(
    image_dir: &Path,
    active_ids: I,
) -> Result<CleanupReport, ImageError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let active_stems: HashSet<String> = active_ids
        .into_iter()
        .map(|id| image_stem(id.as_ref()))
        .collect();

    let mut entries = match tokio::fs::read_dir(image_dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Ok(CleanupReport::default());
        }
        Err(e) => {
            return Err(ImageError::Io {
                path: image_dir.display().to_string(),
                source: e,
            });
        }
    };

    let mut report = CleanupReport::default();
    while let Some(entry) = entries.next_entry().await.map_err(|e| ImageError::Io {
        path: image_dir.display().to_string(),
        source: e,
    })? {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();

        if active_stems.iter().any(|stem| is_owned_by(&name, stem)) {
            report.kept += 1;
            continue;
        }

        tokio::fs::remove_file(&path)
            .await
            .map_err(|e| ImageError::Io {
                path: path.display().to_string(),
                source: e,
            })?;
        tracing::debug!(file = %name, "removed stale product image");
        report.removed += 1;
    }

    tracing::info!(
        removed = report.removed,
        kept = report.kept,
        dir = %image_dir.display(),
        "image cleanup complete"
    );
    Ok(report)
}

/// A file belongs to a product when its name starts with the product's stem
/// followed by the `_` that precedes the URL hash. Plain prefix matching
/// would let `alpha-p1` claim `alpha-p10`'s files.
fn is_owned_by(file_name: &str, stem: &str) -> bool {
    file_name
        .strip_prefix(stem)
        .is_some_and(|rest| rest.starts_with('_'))
}
