//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the two operations every backend must
//! support: identify (read pixel dimensions) and resize (scale + encode to
//! JPEG at a given quality, writing straight to the output path).
//!
//! Two implementations exist:
//!
//! | Backend | Decode | Scale | Encode |
//! |---|---|---|---|
//! | [`MagickBackend`](super::magick_backend::MagickBackend) | anything ImageMagick reads | `-thumbnail` | `-quality` JPEG |
//! | [`RustBackend`](super::rust_backend::RustBackend) | `image` crate raster formats | Lanczos3 | `JpegEncoder` |
//!
//! Which one runs is decided once at startup by
//! [`select_backend`](super::select::select_backend).

use super::params::ResizeParams;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to decode {path}: {reason}")]
    Decode { path: String, reason: String },
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

impl BackendError {
    pub(crate) fn decode(path: &Path, reason: impl std::fmt::Display) -> Self {
        Self::Decode {
            path: path.display().to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Pixel dimensions of an image, both axes positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl std::fmt::Display for Dimensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Trait for image processing backends.
///
/// `Sync` is required because one backend instance serves every thread of
/// a batch run.
pub trait ImageBackend: Sync {
    /// Short identifier used in logs and the `backend` command.
    fn name(&self) -> &'static str;

    /// Get image dimensions.
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError>;

    /// Scale the source to exactly `params.width` x `params.height` and write
    /// a JPEG to `params.output`.
    fn resize(&self, params: &ResizeParams) -> Result<(), BackendError>;
}
