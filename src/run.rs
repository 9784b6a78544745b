//! Batch driver: enumerate input documents, rewrite each, write results.
//!
//! One run walks the input directory for `.html`/`.php` files, rewrites every
//! file through [`crate::rewrite::rewrite_document`], and writes the results
//! under the output directory preserving relative subpaths. Files are
//! independent, so they are rewritten in parallel with
//! [rayon](https://docs.rs/rayon); per-file failures land in that file's
//! report instead of aborting the batch.
//!
//! Filenames are never changed — `input/about.php` comes out as
//! `output/about.php`, overwriting any previous run's result.

use crate::config::RewriteConfig;
use crate::rewrite::{self, RewriteStats};
use rayon::prelude::*;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum RunError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to walk input directory: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("No .html or .php files found in {0}")]
    NoInputFiles(PathBuf),
}

/// Everything one batch run needs.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub config: RewriteConfig,
    /// Directory of documents to rewrite.
    pub input_dir: PathBuf,
    /// Directory rewritten documents are written to.
    pub output_dir: PathBuf,
    /// Root for root-relative and bare image references.
    pub project_root: PathBuf,
}

/// Outcome for one document.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FileReport {
    /// Path relative to the input directory, forward slashes.
    pub name: String,
    /// `<img>` tags encountered.
    pub images: usize,
    /// Tags that received dimensions from a readable image.
    pub sized: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FileReport {
    pub fn failed(&self) -> bool {
        self.error.is_some()
    }
}

/// Aggregated outcome of one run, serializable as the `--report` JSON.
#[derive(Debug, Serialize)]
pub struct RunSummary {
    pub engine: String,
    pub unit: String,
    pub base_width: u32,
    pub lazy: bool,
    pub files: Vec<FileReport>,
    pub images: usize,
    pub sized: usize,
}

impl RunSummary {
    pub fn failures(&self) -> usize {
        self.files.iter().filter(|f| f.failed()).count()
    }
}

/// Rewrite every `.html`/`.php` file under the input directory.
///
/// Fatal errors are limited to setup: an unreadable input tree, an empty one,
/// or an output directory that cannot be created. Everything after that is
/// per-file and recorded in the corresponding [`FileReport`].
pub fn run(options: &RunOptions) -> Result<RunSummary, RunError> {
    let files = collect_input_files(&options.input_dir)?;
    if files.is_empty() {
        return Err(RunError::NoInputFiles(options.input_dir.clone()));
    }
    fs::create_dir_all(&options.output_dir)?;

    let reports: Vec<FileReport> = files
        .par_iter()
        .map(|relative| rewrite_file(options, relative))
        .collect();

    Ok(summarize(&options.config, reports))
}

/// True when the directory exists and holds at least one rewritable file.
/// Used by the CLI's first-run bootstrap loop.
pub fn has_input_files(input_dir: &Path) -> bool {
    collect_input_files(input_dir).is_ok_and(|files| !files.is_empty())
}

/// Relative paths of every `.html`/`.php` file under `input_dir`, sorted for
/// deterministic report order.
fn collect_input_files(input_dir: &Path) -> Result<Vec<PathBuf>, RunError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(input_dir) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        if !has_markup_extension(entry.path()) {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(input_dir)
            .expect("walked entries live under the walk root")
            .to_path_buf();
        files.push(relative);
    }
    files.sort();
    Ok(files)
}

fn has_markup_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("html") || e.eq_ignore_ascii_case("php"))
}

/// Rewrite one file; any failure becomes the report's `error`.
fn rewrite_file(options: &RunOptions, relative: &Path) -> FileReport {
    let name = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/");

    match rewrite_one(options, relative) {
        Ok(stats) => FileReport {
            name,
            images: stats.images_seen,
            sized: stats.images_sized,
            error: None,
        },
        Err(message) => FileReport {
            name,
            images: 0,
            sized: 0,
            error: Some(message),
        },
    }
}

fn rewrite_one(options: &RunOptions, relative: &Path) -> Result<RewriteStats, String> {
    let source_path = options.input_dir.join(relative);
    let text = fs::read_to_string(&source_path).map_err(|e| e.to_string())?;

    let html_dir = source_path
        .parent()
        .unwrap_or(&options.input_dir)
        .to_path_buf();
    let (rewritten, stats) =
        rewrite::rewrite_document(&text, &options.config, &html_dir, &options.project_root)
            .map_err(|e| e.to_string())?;

    let target_path = options.output_dir.join(relative);
    if let Some(parent) = target_path.parent() {
        fs::create_dir_all(parent).map_err(|e| e.to_string())?;
    }
    fs::write(&target_path, rewritten).map_err(|e| e.to_string())?;
    Ok(stats)
}

fn summarize(config: &RewriteConfig, files: Vec<FileReport>) -> RunSummary {
    let images = files.iter().map(|f| f.images).sum();
    let sized = files.iter().map(|f| f.sized).sum();
    RunSummary {
        engine: config.engine.as_str().to_string(),
        unit: config.size_unit.as_str().to_string(),
        base_width: config.base_width_px,
        lazy: config.apply_lazy_loading,
        files,
        images,
        sized,
    }
}
