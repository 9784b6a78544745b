//! CLI output formatting for batch runs.
//!
//! One header line echoing the effective settings, one line per file, one
//! totals line. Format functions are pure and return `Vec<String>` for
//! testability; `print_*` wrappers write to stdout.
//!
//! ```text
//! Rewriting with scan engine (unit: rem, lazy: on)
//! about.php: 2 images, 2 sized
//! index.html: 3 images, 2 sized
//! blog/draft.html: FAILED (stream did not contain valid UTF-8)
//! Rewrote 3 files: 5 images, 4 sized, 1 failed
//! ```

use crate::run::{FileReport, RunSummary};

/// Format the full run output: header, per-file lines, totals.
pub fn format_run_output(summary: &RunSummary) -> Vec<String> {
    let mut lines = Vec::with_capacity(summary.files.len() + 2);
    lines.push(format!(
        "Rewriting with {} engine (unit: {}, lazy: {})",
        summary.engine,
        summary.unit,
        if summary.lazy { "on" } else { "off" }
    ));
    for file in &summary.files {
        lines.push(file_line(file));
    }
    lines.push(totals_line(summary));
    lines
}

fn file_line(file: &FileReport) -> String {
    match &file.error {
        Some(error) => format!("{}: FAILED ({})", file.name, error),
        None => format!("{}: {} images, {} sized", file.name, file.images, file.sized),
    }
}

fn totals_line(summary: &RunSummary) -> String {
    let failures = summary.failures();
    let mut line = format!(
        "Rewrote {} files: {} images, {} sized",
        summary.files.len(),
        summary.images,
        summary.sized
    );
    if failures > 0 {
        line.push_str(&format!(", {} failed", failures));
    }
    line
}

/// Print the run output to stdout.
pub fn print_run_output(summary: &RunSummary) {
    for line in format_run_output(summary) {
        println!("{line}");
    }
}
