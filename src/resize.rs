//! The resize-with-cache workflow.
//!
//! ```text
//! validate ──✗──> original path (warn)
//!    │
//! resolve cache path ──hit──> cache path
//!    │ miss
//! identify source ──✗──> original path (warn)
//!    │
//! fit_within → create cache dir → backend resize → cache path
//!                     ✗                  ✗
//!                 CreateDir       decode ──> original path (warn)
//!                (propagated)     other  ──> Encode (propagated)
//! ```
//!
//! Bad input (no dimensions, unreadable image) degrades to returning the
//! source path so a page that embeds the result still renders something.
//! `identify` only reads the header, so pixel data that turns out to be
//! corrupt during the resize is handled the same way.
//! Failures to *write* the cache are real errors and reach the caller.
//!
//! A [`Resizer`] is `Sync`; share one across threads. Concurrent requests for
//! the same cache path are collapsed onto a single build (see
//! [`InFlight`](crate::cache::InFlight)).

use crate::cache::{Claim, InFlight};
use crate::config::ResizeConfig;
use crate::imaging::{BackendError, Dimensions, ImageBackend, Quality, ResizeParams, fit_within};
use crate::naming::PathResolver;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Hard failures of a resize call.
#[derive(Error, Debug)]
pub enum ResizeError {
    #[error("failed to create cache directory {}: {source}", .path.display())]
    CreateDir { path: PathBuf, source: io::Error },
    #[error("failed to write {}: {source}", .path.display())]
    Encode {
        path: PathBuf,
        source: BackendError,
    },
}

/// A request that cannot be served as asked.
#[derive(Error, Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UsageError {
    #[error("width and height can't both be absent")]
    NoDimensions,
    #[error("dimensions must be positive, got {}", crate::naming::size_suffix(*.width, *.height))]
    ZeroDimension {
        width: Option<u32>,
        height: Option<u32>,
    },
    #[error("{} has no file name", .path.display())]
    NoFileName { path: PathBuf },
}

/// Why a request was answered with the original path.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "detail")]
pub enum FallbackReason {
    /// Neither width nor height was given, a dimension was zero, or the
    /// path has no file name.
    InvalidRequest(UsageError),
    /// The backend could not read the source image.
    Unreadable(String),
}

impl std::fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidRequest(e) => write!(f, "invalid request: {}", e),
            Self::Unreadable(msg) => write!(f, "unreadable: {}", msg),
        }
    }
}

/// What a successful resize call did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResizeOutcome {
    /// The cached file already existed; nothing was decoded.
    Cached(PathBuf),
    /// A new file was written at `dimensions`.
    Created { path: PathBuf, dimensions: Dimensions },
    /// The request was not served; `path` is the original source.
    Fallback { path: PathBuf, reason: FallbackReason },
}

impl ResizeOutcome {
    /// The path to hand back to the caller.
    pub fn path(&self) -> &Path {
        match self {
            Self::Cached(path) => path,
            Self::Created { path, .. } => path,
            Self::Fallback { path, .. } => path,
        }
    }

    pub fn into_path(self) -> PathBuf {
        match self {
            Self::Cached(path) => path,
            Self::Created { path, .. } => path,
            Self::Fallback { path, .. } => path,
        }
    }
}

/// A validated request: a source with at least one positive dimension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResizeRequest {
    source: PathBuf,
    width: Option<u32>,
    height: Option<u32>,
}

impl ResizeRequest {
    pub fn new(
        source: impl Into<PathBuf>,
        width: Option<u32>,
        height: Option<u32>,
    ) -> Result<Self, UsageError> {
        let source = source.into();
        if width.is_none() && height.is_none() {
            return Err(UsageError::NoDimensions);
        }
        if width == Some(0) || height == Some(0) {
            return Err(UsageError::ZeroDimension { width, height });
        }
        if source.file_name().is_none() {
            return Err(UsageError::NoFileName { path: source });
        }
        Ok(Self {
            source,
            width,
            height,
        })
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn width(&self) -> Option<u32> {
        self.width
    }

    pub fn height(&self) -> Option<u32> {
        self.height
    }
}

/// Resizes images into a per-directory cache folder using one backend.
pub struct Resizer<B> {
    resolver: PathResolver,
    quality: Quality,
    backend: B,
    in_flight: InFlight,
}

impl<B: ImageBackend> Resizer<B> {
    pub fn new(config: &ResizeConfig, backend: B) -> Self {
        Self {
            resolver: PathResolver::new(config.folder.clone()),
            quality: config.quality(),
            backend,
            in_flight: InFlight::new(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn resolver(&self) -> &PathResolver {
        &self.resolver
    }

    /// Resize `file` to fit `width` x `height`, returning the cached file's
    /// path, or `file` itself when the request cannot be served.
    pub fn resize(
        &self,
        file: impl AsRef<Path>,
        width: Option<u32>,
        height: Option<u32>,
    ) -> Result<PathBuf, ResizeError> {
        self.resize_with_outcome(file, width, height)
            .map(ResizeOutcome::into_path)
    }

    /// Like [`resize`](Self::resize), but reports whether the result was a
    /// cache hit, a new file, or a fallback.
    pub fn resize_with_outcome(
        &self,
        file: impl AsRef<Path>,
        width: Option<u32>,
        height: Option<u32>,
    ) -> Result<ResizeOutcome, ResizeError> {
        let file = file.as_ref();
        match ResizeRequest::new(file, width, height) {
            Ok(request) => self.run(&request),
            Err(e) => {
                warn!(source = %file.display(), "{}", e);
                Ok(ResizeOutcome::Fallback {
                    path: file.to_path_buf(),
                    reason: FallbackReason::InvalidRequest(e),
                })
            }
        }
    }

    /// Serve a validated request.
    pub fn run(&self, request: &ResizeRequest) -> Result<ResizeOutcome, ResizeError> {
        let source = request.source();
        let Some(cache_path) =
            self.resolver
                .resolve_path(source, request.width(), request.height())
        else {
            let e = UsageError::NoFileName {
                path: source.to_path_buf(),
            };
            warn!(source = %source.display(), "{}", e);
            return Ok(ResizeOutcome::Fallback {
                path: source.to_path_buf(),
                reason: FallbackReason::InvalidRequest(e),
            });
        };

        // Claim before looking at the disk: while a build is running its
        // output file may exist but be incomplete.
        loop {
            match self.in_flight.claim(&cache_path) {
                Claim::Leader(_guard) => {
                    if self.resolver.exists(&cache_path) {
                        debug!(path = %cache_path.display(), "cache hit");
                        return Ok(ResizeOutcome::Cached(cache_path));
                    }
                    return self.build(request, cache_path);
                }
                Claim::Follower(waiter) => {
                    debug!(path = %cache_path.display(), "waiting for in-flight resize");
                    self.in_flight.wait(waiter);
                }
            }
        }
    }

    fn build(
        &self,
        request: &ResizeRequest,
        cache_path: PathBuf,
    ) -> Result<ResizeOutcome, ResizeError> {
        let source = request.source();
        let original = match self.backend.identify(source) {
            Ok(dims) => dims,
            Err(e) => {
                warn!(source = %source.display(), error = %e, "cannot read image, using original");
                return Ok(ResizeOutcome::Fallback {
                    path: source.to_path_buf(),
                    reason: FallbackReason::Unreadable(e.to_string()),
                });
            }
        };

        let target = fit_within(original, request.width(), request.height());
        debug!(
            source = %source.display(),
            %original,
            %target,
            "computed target size"
        );

        if let Some(dir) = cache_path.parent() {
            ensure_cache_dir(dir)?;
        }

        let params = ResizeParams {
            source: source.to_path_buf(),
            output: cache_path.clone(),
            width: target.width,
            height: target.height,
            quality: self.quality,
        };
        match self.backend.resize(&params) {
            Ok(()) => {}
            Err(e @ BackendError::Decode { .. }) => {
                // Headers can be fine while the pixel data is not.
                remove_partial(&cache_path);
                warn!(source = %source.display(), error = %e, "cannot decode image, using original");
                return Ok(ResizeOutcome::Fallback {
                    path: source.to_path_buf(),
                    reason: FallbackReason::Unreadable(e.to_string()),
                });
            }
            Err(e) => {
                remove_partial(&cache_path);
                return Err(ResizeError::Encode {
                    path: cache_path,
                    source: e,
                });
            }
        }

        info!(
            path = %cache_path.display(),
            %target,
            backend = self.backend.name(),
            "resized"
        );
        Ok(ResizeOutcome::Created {
            path: cache_path,
            dimensions: target,
        })
    }
}

/// Delete whatever a failed build left at `path`; a leftover file would be
/// served as a cache hit.
fn remove_partial(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => debug!(path = %path.display(), "removed partial output"),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => warn!(
            path = %path.display(),
            error = %e,
            "failed to remove partial output; delete it by hand"
        ),
    }
}

/// Create the cache folder if it is missing.
///
/// Only the last path segment is created; the source's own directory must
/// already exist. Losing a creation race to another writer is fine as long
/// as a directory is what ends up there.
fn ensure_cache_dir(dir: &Path) -> Result<(), ResizeError> {
    if dir.as_os_str().is_empty() || dir.is_dir() {
        return Ok(());
    }
    match fs::create_dir(dir) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists && dir.is_dir() => Ok(()),
        Err(e) => Err(ResizeError::CreateDir {
            path: dir.to_path_buf(),
            source: e,
        }),
    }
}
