//! Cache path derivation for resized images.
//!
//! Every resized file lives next to its source, inside the cache folder,
//! under a name built from the source stem and the *requested* box:
//!
//! ```text
//! photos/dawn.png  --(100 x -)-->   photos/.resized/dawn-100x.jpg
//! photos/dawn.png  --(- x 50)-->    photos/.resized/dawn-x50.jpg
//! photos/dawn.png  --(100 x 50)-->  photos/.resized/dawn-100x50.jpg
//! ```
//!
//! An absent dimension is written as an empty string, so the three request
//! shapes can never collide. The name depends only on the request, not on the
//! source pixels, which is what lets a cache hit skip decoding entirely.
//!
//! The existence of that file is the whole cache: there is no index to keep
//! in sync, and deleting the file invalidates the entry.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Output extension. Every cached file is a JPEG whatever the source format.
const CACHE_EXTENSION: &str = "jpg";

/// Maps resize requests to cache paths under a fixed folder name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathResolver {
    folder: String,
}

impl PathResolver {
    pub fn new(folder: impl Into<String>) -> Self {
        Self {
            folder: folder.into(),
        }
    }

    pub fn folder(&self) -> &str {
        &self.folder
    }

    /// Derive the cache path for `source` resized into `width` x `height`.
    ///
    /// Returns `None` when `source` has no file name to derive a stem from
    /// (empty path, `/`, `..`).
    pub fn resolve_path(
        &self,
        source: &Path,
        width: Option<u32>,
        height: Option<u32>,
    ) -> Option<PathBuf> {
        let stem = source.file_stem()?;
        let dir = source.parent().unwrap_or_else(|| Path::new(""));
        Some(dir.join(&self.folder).join(cache_file_name(stem, width, height)))
    }

    /// True when a previously resized file is on disk.
    pub fn exists(&self, cache_path: &Path) -> bool {
        cache_path.is_file()
    }
}

/// `{stem}-{W}x{H}.jpg`, with an absent dimension left empty.
pub fn cache_file_name(
    stem: impl AsRef<std::ffi::OsStr>,
    width: Option<u32>,
    height: Option<u32>,
) -> OsString {
    let mut name = stem.as_ref().to_os_string();
    name.push(format!(
        "-{}.{}",
        size_suffix(width, height),
        CACHE_EXTENSION
    ));
    name
}

/// The `WxH` part of a cache file name.
pub fn size_suffix(width: Option<u32>, height: Option<u32>) -> String {
    let side = |v: Option<u32>| v.map(|n| n.to_string()).unwrap_or_default();
    format!("{}x{}", side(width), side(height))
}
