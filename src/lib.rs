//! # fitcache
//!
//! Aspect-fit JPEG resizing with a deterministic on-disk cache. Ask for an
//! image at a width, a height, or both; get back the path of a JPEG that fits,
//! computed at most once per (source, requested size) pair.
//!
//! ```no_run
//! use fitcache::config::ResizeConfig;
//! use fitcache::imaging::{BackendPreference, select_backend};
//! use fitcache::resize::Resizer;
//!
//! let backend = select_backend(BackendPreference::Auto)?;
//! let resizer = Resizer::new(&ResizeConfig::default(), backend);
//!
//! // photos/dawn.png → photos/.resized/dawn-400x.jpg
//! let path = resizer.resize("photos/dawn.png", Some(400), None)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`resize`] | The workflow: validate → cache check → identify → fit → write |
//! | [`naming`] | Cache path derivation (`dir/.resized/stem-WxH.jpg`) and hit check |
//! | [`imaging`] | Dimension math, the [`ImageBackend`](imaging::ImageBackend) trait, ImageMagick and native backends, startup selection |
//! | [`cache`] | In-flight build registry and hit/miss statistics |
//! | [`batch`] | Parallel resizing of a whole directory tree |
//! | [`config`] | `fitcache.toml` loading, merging, and validation |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## The Filename Is the Cache Key
//!
//! A resized file's path is derived from the source path and the requested
//! box, never from pixel data. A hit costs one `stat`: no decode, no hashing,
//! no index. The flip side is that editing a source image in place does not
//! refresh its resized copies; delete the cache folder to force that.
//!
//! ## Never Upscale
//!
//! If the requested box is larger than the image along either axis, the
//! image is re-encoded at its original size. Enlarged photos only look
//! worse, and a page asking for 2000px of a 600px image should get 600px.
//!
//! ## Soft Failures for Bad Input, Hard Failures for Bad Storage
//!
//! A request with no dimensions, or a source that will not decode, returns
//! the original path and logs a warning. A page rendering a hundred images
//! should not break on one of them. Failing to create the cache folder or
//! write the JPEG is returned as an error: those mean the cache itself is
//! broken.
//!
//! ## Two Backends, One Trait
//!
//! ImageMagick reads nearly everything, but it is a system dependency. The
//! pure-Rust backend reads the common raster formats with nothing to install.
//! The choice is made once at startup by probing `PATH`; after that the
//! resize workflow only sees [`ImageBackend`](imaging::ImageBackend).

pub mod batch;
pub mod cache;
pub mod config;
pub mod imaging;
pub mod naming;
pub mod output;
pub mod resize;
