//! ImageMagick backend: the widest format support.
//!
//! Shells out to the ImageMagick CLI, so it decodes every format the local
//! install understands (HEIC, RAW, PSD, ...) and uses `-thumbnail`, which
//! strips profiles and scales in one pass.
//!
//! Both command layouts are supported:
//!
//! | Version | Identify | Convert |
//! |---|---|---|
//! | 7.x | `magick identify` | `magick` |
//! | 6.x | `identify` | `convert` |

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::params::ResizeParams;
use std::ffi::OsString;
use std::path::Path;
use std::process::{Command, Output};

/// Which ImageMagick command layout is installed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MagickFlavor {
    /// Single `magick` entry point (ImageMagick 7).
    V7,
    /// Separate `convert` / `identify` binaries (ImageMagick 6).
    V6,
}

#[derive(Debug)]
pub struct MagickBackend {
    flavor: MagickFlavor,
}

impl MagickBackend {
    pub fn new(flavor: MagickFlavor) -> Self {
        Self { flavor }
    }

    /// Probe `PATH` for a working ImageMagick install, preferring v7.
    pub fn detect() -> Option<Self> {
        if runs_ok("magick") {
            return Some(Self::new(MagickFlavor::V7));
        }
        // Windows ships an unrelated `convert.exe`; runs_ok checks the banner.
        if runs_ok("convert") && runs_ok("identify") {
            return Some(Self::new(MagickFlavor::V6));
        }
        None
    }

    fn identify_command(&self) -> Command {
        match self.flavor {
            MagickFlavor::V7 => {
                let mut cmd = Command::new("magick");
                cmd.arg("identify");
                cmd
            }
            MagickFlavor::V6 => Command::new("identify"),
        }
    }

    fn convert_command(&self) -> Command {
        match self.flavor {
            MagickFlavor::V7 => Command::new("magick"),
            MagickFlavor::V6 => Command::new("convert"),
        }
    }
}

/// Run `<program> -version` and check that it is really ImageMagick.
fn runs_ok(program: &str) -> bool {
    Command::new(program)
        .arg("-version")
        .output()
        .map(|o| o.status.success() && String::from_utf8_lossy(&o.stdout).contains("ImageMagick"))
        .unwrap_or(false)
}

/// Select the first frame so animated GIFs and multi-page TIFFs identify as
/// a single image.
fn first_frame(path: &Path) -> OsString {
    let mut arg = path.as_os_str().to_os_string();
    arg.push("[0]");
    arg
}

/// Arguments for `identify`.
pub fn identify_args(source: &Path) -> Vec<OsString> {
    vec!["-format".into(), "%w %h".into(), first_frame(source)]
}

/// Arguments for the resize + JPEG encode step.
///
/// The `!` geometry flag forces the exact size; aspect math has already been
/// done. The `jpg:` prefix forces JPEG output whatever the extension says.
pub fn thumbnail_args(params: &ResizeParams) -> Vec<OsString> {
    let mut output = OsString::from("jpg:");
    output.push(params.output.as_os_str());
    vec![
        first_frame(&params.source),
        "-thumbnail".into(),
        format!("{}x{}!", params.width, params.height).into(),
        "-quality".into(),
        params.quality.value().to_string().into(),
        output,
    ]
}

/// Parse `identify -format "%w %h"` output.
pub fn parse_identify_output(stdout: &str) -> Option<Dimensions> {
    let mut parts = stdout.split_whitespace();
    let width = parts.next()?.parse().ok()?;
    let height = parts.next()?.parse().ok()?;
    if width == 0 || height == 0 {
        return None;
    }
    Some(Dimensions { width, height })
}

/// Classify a failed convert run from its stderr.
///
/// ImageMagick tags messages with the coder routine that raised them, e.g.
/// `@ error/png.c/ReadPNGImage/...`. A `Read*` routine or a missing decode
/// delegate means the source is the problem; anything else is treated as a
/// failure to produce the output.
pub fn classify_convert_failure(source: &Path, stderr: &str) -> BackendError {
    let read_side = stderr.contains("no decode delegate")
        || stderr
            .split('/')
            .any(|segment| segment.starts_with("Read") && segment.ends_with("Image"));
    if read_side {
        BackendError::decode(source, stderr)
    } else {
        BackendError::ProcessingFailed(format!(
            "ImageMagick failed on {}: {}",
            source.display(),
            stderr
        ))
    }
}

fn stderr_text(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).trim().to_string()
}

impl ImageBackend for MagickBackend {
    fn name(&self) -> &'static str {
        "magick"
    }

    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError> {
        let output = self.identify_command().args(identify_args(path)).output()?;
        if !output.status.success() {
            return Err(BackendError::decode(path, stderr_text(&output)));
        }
        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_identify_output(&stdout).ok_or_else(|| {
            BackendError::decode(path, format!("unexpected identify output: {:?}", stdout))
        })
    }

    fn resize(&self, params: &ResizeParams) -> Result<(), BackendError> {
        let output = self.convert_command().args(thumbnail_args(params)).output()?;
        if !output.status.success() {
            return Err(classify_convert_failure(&params.source, &stderr_text(&output)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::params::Quality;

    fn params() -> ResizeParams {
        ResizeParams {
            source: "/photos/dawn.png".into(),
            output: "/photos/.resized/dawn-400x.jpg".into(),
            width: 400,
            height: 300,
            quality: Quality::new(85),
        }
    }

    #[test]
    fn thumbnail_args_force_exact_geometry_and_jpeg() {
        let args = thumbnail_args(&params());
        let args: Vec<String> = args
            .iter()
            .map(|a| a.to_string_lossy().to_string())
            .collect();
        assert_eq!(
            args,
            vec![
                "/photos/dawn.png[0]",
                "-thumbnail",
                "400x300!",
                "-quality",
                "85",
                "jpg:/photos/.resized/dawn-400x.jpg",
            ]
        );
    }

    #[test]
    fn identify_args_select_first_frame() {
        let args = identify_args(Path::new("/photos/anim.gif"));
        assert_eq!(args.last().unwrap().to_string_lossy(), "/photos/anim.gif[0]");
        assert_eq!(args[1].to_string_lossy(), "%w %h");
    }

    #[test]
    fn parse_identify_plain() {
        assert_eq!(
            parse_identify_output("1024 768"),
            Some(Dimensions {
                width: 1024,
                height: 768
            })
        );
    }

    #[test]
    fn parse_identify_tolerates_trailing_newline() {
        assert_eq!(
            parse_identify_output("12 34\n"),
            Some(Dimensions {
                width: 12,
                height: 34
            })
        );
    }

    #[test]
    fn parse_identify_rejects_garbage() {
        assert_eq!(parse_identify_output(""), None);
        assert_eq!(parse_identify_output("abc def"), None);
        assert_eq!(parse_identify_output("100"), None);
        assert_eq!(parse_identify_output("0 100"), None);
    }

    #[test]
    fn convert_read_errors_are_decode_failures() {
        let stderr = "convert: insufficient image data in file `/p/cut.png' \
                      @ error/png.c/ReadPNGImage/4290.";
        let err = classify_convert_failure(Path::new("/p/cut.png"), stderr);
        assert!(matches!(err, BackendError::Decode { .. }));

        let stderr = "magick: no decode delegate for this image format `' @ \
                      error/constitute.c/ReadImage/746.";
        let err = classify_convert_failure(Path::new("/p/x.png"), stderr);
        assert!(matches!(err, BackendError::Decode { .. }));
    }

    #[test]
    fn convert_write_errors_are_processing_failures() {
        let stderr = "convert: unable to open image `/ro/.resized/x-10x.jpg': \
                      Permission denied @ error/blob.c/OpenBlob/3596.";
        let err = classify_convert_failure(Path::new("/ro/x.png"), stderr);
        assert!(matches!(err, BackendError::ProcessingFailed(_)));
    }

    #[test]
    fn v7_identify_goes_through_magick() {
        let backend = MagickBackend::new(MagickFlavor::V7);
        let cmd = backend.identify_command();
        assert_eq!(cmd.get_program(), "magick");
        assert_eq!(cmd.get_args().collect::<Vec<_>>(), vec!["identify"]);
    }

    #[test]
    fn v6_uses_separate_binaries() {
        let backend = MagickBackend::new(MagickFlavor::V6);
        assert_eq!(backend.identify_command().get_program(), "identify");
        assert_eq!(backend.convert_command().get_program(), "convert");
    }

    #[test]
    fn resize_and_identify_with_installed_imagemagick() {
        let Some(backend) = MagickBackend::detect() else {
            eprintln!("ImageMagick not found - skipping");
            return;
        };
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("source.png");
        let status = backend
            .convert_command()
            .args(["-size", "80x60", "xc:gray"])
            .arg(&source)
            .status()
            .unwrap();
        assert!(status.success());

        assert_eq!(
            backend.identify(&source).unwrap(),
            Dimensions {
                width: 80,
                height: 60
            }
        );

        let output = tmp.path().join("out.jpg");
        backend
            .resize(&ResizeParams {
                source,
                output: output.clone(),
                width: 40,
                height: 30,
                quality: Quality::new(85),
            })
            .unwrap();
        assert_eq!(
            backend.identify(&output).unwrap(),
            Dimensions {
                width: 40,
                height: 30
            }
        );
    }
}
