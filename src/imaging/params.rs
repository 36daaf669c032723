//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between the [`Resizer`](crate::resize::Resizer) (which decides
//! what file to create and at what size) and the [`backend`](super::backend)
//! (which does the actual pixel work). This separation allows swapping backends
//! (ImageMagick, pure Rust, or a mock in tests) without changing the workflow.
//!
//! ## Types
//!
//! - [`Quality`]: JPEG encoding quality (1–100, default 85). Clamped on construction.
//! - [`ResizeParams`]: Full specification for a resize: source, output path, target dimensions, quality.

use std::path::PathBuf;

/// Quality setting for JPEG encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(u32);

impl Quality {
    /// Encoders reject quality 0, so a configured `0` becomes the lowest
    /// usable setting.
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(85)
    }
}

/// Parameters for a resize-and-encode operation.
///
/// `width` and `height` are the exact output dimensions; aspect-ratio math
/// has already happened by the time a backend sees them.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeParams {
    pub source: PathBuf,
    pub output: PathBuf,
    pub width: u32,
    pub height: u32,
    pub quality: Quality,
}
