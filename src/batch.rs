//! Batch resizing of every image under a directory.
//!
//! Walks the tree, skips the cache folders themselves, and feeds each image
//! through one shared [`Resizer`] in parallel on the rayon pool. Every file
//! gets a [`BatchItem`]; a hard failure on one image does not stop the
//! others.
//!
//! Running the same batch twice is cheap: the second run is all cache hits.

use crate::cache::CacheStats;
use crate::imaging::{Dimensions, ImageBackend};
use crate::resize::{FallbackReason, ResizeOutcome, Resizer};
use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

/// Extensions picked up by a batch walk. Whether a file actually decodes is
/// up to the backend; failures become fallbacks.
const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "bmp", "tif", "tiff", "webp", "avif", "heic", "heif",
];

/// Result for one source image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchItem {
    pub source: PathBuf,
    #[serde(flatten)]
    pub status: ItemStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum ItemStatus {
    Cached { output: PathBuf },
    Created { output: PathBuf, dimensions: Dimensions },
    Skipped { reason: FallbackReason },
    Failed { error: String },
}

/// Everything a batch run did.
#[derive(Debug, Default, Serialize)]
pub struct BatchReport {
    pub items: Vec<BatchItem>,
    pub stats: CacheStats,
    pub failures: u32,
}

/// Find every image file under `root`, in walk order, excluding anything
/// inside a folder named `cache_folder`.
pub fn find_images(root: &Path, cache_folder: &str) -> Vec<PathBuf> {
    let is_cache_dir =
        |e: &DirEntry| e.depth() > 0 && e.file_type().is_dir() && e.file_name() == cache_folder;

    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_cache_dir(e))
        .filter_map(|entry| match entry {
            Ok(e) => Some(e),
            Err(err) => {
                debug!(error = %err, "skipping unreadable entry");
                None
            }
        })
        .filter(|e| e.file_type().is_file() && has_image_extension(e.path()))
        .map(DirEntry::into_path)
        .collect()
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
}

/// Resize every image under `root` into the resizer's cache.
pub fn run_batch<B: ImageBackend>(
    resizer: &Resizer<B>,
    root: &Path,
    width: Option<u32>,
    height: Option<u32>,
) -> BatchReport {
    let sources = find_images(root, resizer.resolver().folder());

    let items: Vec<BatchItem> = sources
        .into_par_iter()
        .map(|source| {
            let status = match resizer.resize_with_outcome(&source, width, height) {
                Ok(ResizeOutcome::Cached(output)) => ItemStatus::Cached { output },
                Ok(ResizeOutcome::Created { path, dimensions }) => ItemStatus::Created {
                    output: path,
                    dimensions,
                },
                Ok(ResizeOutcome::Fallback { reason, .. }) => ItemStatus::Skipped { reason },
                Err(e) => ItemStatus::Failed {
                    error: e.to_string(),
                },
            };
            BatchItem { source, status }
        })
        .collect();

    let mut report = BatchReport::default();
    for item in &items {
        match item.status {
            ItemStatus::Cached { .. } => report.stats.hit(),
            ItemStatus::Created { .. } => report.stats.create(),
            ItemStatus::Skipped { .. } => report.stats.fallback(),
            ItemStatus::Failed { .. } => report.failures += 1,
        }
    }
    report.items = items;
    report
}
