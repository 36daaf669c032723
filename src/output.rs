//! CLI output formatting.
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.
//!
//! # Output Format
//!
//! ## Resize
//!
//! The resulting path on its own line, so the command composes in scripts:
//!
//! ```text
//! photos/.resized/dawn-400x.jpg
//! ```
//!
//! ## Batch
//!
//! ```text
//! dawn.jpg → .resized/dawn-400x.jpg (400x300)
//! trips/rome.jpg → trips/.resized/rome-400x.jpg (cached)
//! notes/scan.heic: skipped (unreadable: ...)
//! Cache: 1 cached, 1 created, 1 skipped (3 total)
//! ```
//!
//! Paths are shown relative to the batch root.

use crate::batch::{BatchReport, ItemStatus};
use std::path::Path;

fn relative<'a>(path: &'a Path, root: &Path) -> std::path::Display<'a> {
    path.strip_prefix(root).unwrap_or(path).display()
}

/// One line per batch item plus a summary line.
pub fn format_batch_report(report: &BatchReport, root: &Path) -> Vec<String> {
    let mut lines: Vec<String> = report
        .items
        .iter()
        .map(|item| {
            let source = relative(&item.source, root);
            match &item.status {
                ItemStatus::Cached { output } => {
                    format!("{} → {} (cached)", source, relative(output, root))
                }
                ItemStatus::Created { output, dimensions } => {
                    format!("{} → {} ({})", source, relative(output, root), dimensions)
                }
                ItemStatus::Skipped { reason } => format!("{}: skipped ({})", source, reason),
                ItemStatus::Failed { error } => format!("{}: FAILED ({})", source, error),
            }
        })
        .collect();

    let mut summary = format!("Cache: {}", report.stats);
    if report.failures > 0 {
        summary.push_str(&format!(", {} failed", report.failures));
    }
    lines.push(summary);
    lines
}

pub fn print_batch_report(report: &BatchReport, root: &Path) {
    for line in format_batch_report(report, root) {
        println!("{}", line);
    }
}
