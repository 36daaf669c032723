//! Image processing behind a swappable backend.
//!
//! | Operation | ImageMagick | Native |
//! |---|---|---|
//! | **Identify** | `identify -format "%w %h"` | `image::ImageReader::into_dimensions` |
//! | **Resize → JPEG** | `-thumbnail WxH! -quality Q` | Lanczos3 + `JpegEncoder` |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`MagickBackend`] and `RustBackend`
//! - **Select**: the startup capability probe that picks a backend

pub mod backend;
mod calculations;
pub mod magick_backend;
mod params;
#[cfg(feature = "native")]
pub mod rust_backend;
pub mod select;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use calculations::{BindingAxis, fit_within};
pub use magick_backend::MagickBackend;
pub use params::{Quality, ResizeParams};
#[cfg(feature = "native")]
pub use rust_backend::RustBackend;
pub use select::{BackendPreference, SelectedBackend, StartupError, select_backend};
