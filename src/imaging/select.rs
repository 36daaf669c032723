//! Startup backend selection.
//!
//! The capability probe runs once, before any resize is served. The result
//! is a [`SelectedBackend`] that implements [`ImageBackend`] by delegation,
//! so the resize workflow never looks at which backend it got.

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::magick_backend::MagickBackend;
use super::params::ResizeParams;
#[cfg(feature = "native")]
use super::rust_backend::RustBackend;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Which backend the user wants. `Auto` prefers ImageMagick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendPreference {
    #[default]
    Auto,
    Magick,
    Native,
}

#[derive(Error, Debug)]
pub enum StartupError {
    #[error(
        "no image backend available: install ImageMagick (`magick` or `convert`) \
         or build with the `native` feature"
    )]
    NoBackend,
    #[error("ImageMagick was requested but neither `magick` nor `convert` was found on PATH")]
    MagickUnavailable,
    #[error("the native backend was requested but this binary was built without the `native` feature")]
    NativeUnavailable,
}

/// The backend chosen at startup.
#[derive(Debug)]
pub enum SelectedBackend {
    Magick(MagickBackend),
    #[cfg(feature = "native")]
    Native(RustBackend),
}

/// Probe the environment and pick a backend according to `preference`.
pub fn select_backend(preference: BackendPreference) -> Result<SelectedBackend, StartupError> {
    select_with(preference, MagickBackend::detect)
}

/// Selection logic with the ImageMagick probe injected, for tests.
fn select_with(
    preference: BackendPreference,
    probe_magick: impl FnOnce() -> Option<MagickBackend>,
) -> Result<SelectedBackend, StartupError> {
    match preference {
        BackendPreference::Magick => probe_magick()
            .map(SelectedBackend::Magick)
            .ok_or(StartupError::MagickUnavailable),
        BackendPreference::Native => native().ok_or(StartupError::NativeUnavailable),
        BackendPreference::Auto => probe_magick()
            .map(SelectedBackend::Magick)
            .or_else(native)
            .ok_or(StartupError::NoBackend),
    }
}

#[cfg(feature = "native")]
fn native() -> Option<SelectedBackend> {
    Some(SelectedBackend::Native(RustBackend::new()))
}

#[cfg(not(feature = "native"))]
fn native() -> Option<SelectedBackend> {
    None
}

impl SelectedBackend {
    fn inner(&self) -> &dyn ImageBackend {
        match self {
            Self::Magick(b) => b,
            #[cfg(feature = "native")]
            Self::Native(b) => b,
        }
    }
}

impl ImageBackend for SelectedBackend {
    fn name(&self) -> &'static str {
        self.inner().name()
    }

    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError> {
        self.inner().identify(path)
    }

    fn resize(&self, params: &ResizeParams) -> Result<(), BackendError> {
        self.inner().resize(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::magick_backend::MagickFlavor;

    fn present() -> Option<MagickBackend> {
        Some(MagickBackend::new(MagickFlavor::V7))
    }

    fn absent() -> Option<MagickBackend> {
        None
    }

    #[test]
    fn auto_prefers_magick() {
        let backend = select_with(BackendPreference::Auto, present).unwrap();
        assert_eq!(backend.name(), "magick");
    }

    #[cfg(feature = "native")]
    #[test]
    fn auto_falls_back_to_native() {
        let backend = select_with(BackendPreference::Auto, absent).unwrap();
        assert_eq!(backend.name(), "native");
    }

    #[cfg(not(feature = "native"))]
    #[test]
    fn auto_without_any_backend_fails() {
        let err = select_with(BackendPreference::Auto, absent).unwrap_err();
        assert!(matches!(err, StartupError::NoBackend));
    }

    #[test]
    fn explicit_magick_fails_when_missing() {
        let err = select_with(BackendPreference::Magick, absent).unwrap_err();
        assert!(matches!(err, StartupError::MagickUnavailable));
    }

    #[cfg(feature = "native")]
    #[test]
    fn explicit_native_skips_probe() {
        let backend = select_with(BackendPreference::Native, || {
            panic!("probe must not run")
        })
        .unwrap();
        assert_eq!(backend.name(), "native");
    }

    #[test]
    fn preference_parses_lowercase() {
        #[derive(Deserialize)]
        struct Wrapper {
            prefer: BackendPreference,
        }
        let w: Wrapper = toml::from_str(r#"prefer = "magick""#).unwrap();
        assert_eq!(w.prefer, BackendPreference::Magick);
    }
}
