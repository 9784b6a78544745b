//! Run configuration: the immutable [`RewriteConfig`] threaded through the
//! rewrite pipeline, plus the optional `imghint.toml` defaults file.
//!
//! Precedence, highest first: CLI arguments → `imghint.toml` in the project
//! root → built-in defaults. The parsed value is immutable for the duration
//! of a run; nothing in the pipeline mutates shared settings.
//!
//! Argument parsing is deliberately lenient, matching the tool's historical
//! behavior: an unknown unit falls back to `rem`, an unknown engine to
//! `scan`, and lazy loading stays on unless the argument is literally
//! `false`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse {path}: {source}")]
    Toml {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Unit used for the injected inline `width:` declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SizeUnit {
    #[default]
    Rem,
    Vw,
    /// No inline style at all; plain `width`/`height` attributes only.
    None,
}

impl SizeUnit {
    /// Lenient parse: `vw` and `none` are recognized, anything else is `rem`.
    pub fn parse_lenient(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "vw" => SizeUnit::Vw,
            "none" => SizeUnit::None,
            _ => SizeUnit::Rem,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SizeUnit::Rem => "rem",
            SizeUnit::Vw => "vw",
            SizeUnit::None => "none",
        }
    }
}

/// Which rewrite engine performs the `<img>` pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Engine {
    /// Regex pattern scanning over tags in isolation.
    #[default]
    Scan,
    /// Structural pass over the tokenized document.
    Tree,
}

impl Engine {
    /// Lenient parse: `tree` is recognized, anything else is `scan`.
    pub fn parse_lenient(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "tree" => Engine::Tree,
            _ => Engine::Scan,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Engine::Scan => "scan",
            Engine::Tree => "tree",
        }
    }
}

/// Immutable settings for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RewriteConfig {
    pub size_unit: SizeUnit,
    /// Reference viewport width in pixels; only meaningful for [`SizeUnit::Vw`].
    pub base_width_px: u32,
    /// Inject `loading="lazy"` / `decoding="async"` on images missing them.
    pub apply_lazy_loading: bool,
    pub engine: Engine,
}

pub const DEFAULT_BASE_WIDTH_PX: u32 = 1920;

impl Default for RewriteConfig {
    fn default() -> Self {
        Self {
            size_unit: SizeUnit::Rem,
            base_width_px: DEFAULT_BASE_WIDTH_PX,
            apply_lazy_loading: true,
            engine: Engine::Scan,
        }
    }
}

/// Optional defaults loaded from `imghint.toml` in the project root.
///
/// Every field is optional; missing fields fall through to the built-in
/// defaults, and CLI arguments override everything here.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub unit: Option<String>,
    pub base_width: Option<u32>,
    pub lazy: Option<bool>,
    pub engine: Option<String>,
    /// Directory of `.html`/`.php` files to rewrite, relative to the root.
    pub input: Option<PathBuf>,
    /// Directory rewritten files are written to, relative to the root.
    pub output: Option<PathBuf>,
}

pub const CONFIG_FILE_NAME: &str = "imghint.toml";

/// Load `imghint.toml` from the project root if present.
///
/// A missing file is `Ok(None)`; a file that exists but does not parse is an
/// error — silently ignoring a typo'd config would be worse than stopping.
pub fn load_file_config(project_root: &Path) -> Result<Option<FileConfig>, ConfigError> {
    let path = project_root.join(CONFIG_FILE_NAME);
    if !path.exists() {
        return Ok(None);
    }
    let text = std::fs::read_to_string(&path)?;
    let config = toml::from_str(&text).map_err(|source| ConfigError::Toml { path, source })?;
    Ok(Some(config))
}

impl RewriteConfig {
    /// Apply `imghint.toml` values on top of the built-in defaults.
    pub fn with_file_defaults(file: &FileConfig) -> Self {
        let mut config = Self::default();
        if let Some(unit) = &file.unit {
            config.size_unit = SizeUnit::parse_lenient(unit);
        }
        if let Some(base) = file.base_width {
            config.base_width_px = base;
        }
        if let Some(lazy) = file.lazy {
            config.apply_lazy_loading = lazy;
        }
        if let Some(engine) = &file.engine {
            config.engine = Engine::parse_lenient(engine);
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lenient_unit_parsing() {
        assert_eq!(SizeUnit::parse_lenient("vw"), SizeUnit::Vw);
        assert_eq!(SizeUnit::parse_lenient("NONE"), SizeUnit::None);
        assert_eq!(SizeUnit::parse_lenient("rem"), SizeUnit::Rem);
        assert_eq!(SizeUnit::parse_lenient("bogus"), SizeUnit::Rem);
        assert_eq!(SizeUnit::parse_lenient(""), SizeUnit::Rem);
    }

    #[test]
    fn lenient_engine_parsing() {
        assert_eq!(Engine::parse_lenient("tree"), Engine::Tree);
        assert_eq!(Engine::parse_lenient("Tree"), Engine::Tree);
        assert_eq!(Engine::parse_lenient("cheerio"), Engine::Scan);
        assert_eq!(Engine::parse_lenient("scan"), Engine::Scan);
    }

    #[test]
    fn defaults() {
        let config = RewriteConfig::default();
        assert_eq!(config.size_unit, SizeUnit::Rem);
        assert_eq!(config.base_width_px, 1920);
        assert!(config.apply_lazy_loading);
        assert_eq!(config.engine, Engine::Scan);
    }

    #[test]
    fn file_config_overrides_defaults() {
        let file: FileConfig = toml::from_str(
            r#"
            unit = "vw"
            base_width = 1440
            lazy = false
            engine = "tree"
            "#,
        )
        .unwrap();
        let config = RewriteConfig::with_file_defaults(&file);
        assert_eq!(config.size_unit, SizeUnit::Vw);
        assert_eq!(config.base_width_px, 1440);
        assert!(!config.apply_lazy_loading);
        assert_eq!(config.engine, Engine::Tree);
    }

    #[test]
    fn missing_config_file_is_none() {
        let tmp = tempfile::TempDir::new().unwrap();
        assert!(load_file_config(tmp.path()).unwrap().is_none());
    }

    #[test]
    fn malformed_config_file_is_an_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        std::fs::write(tmp.path().join(CONFIG_FILE_NAME), "unit = [").unwrap();
        assert!(load_file_config(tmp.path()).is_err());
    }

    #[test]
    fn unknown_keys_rejected() {
        let tmp = tempfile::TempDir::new().unwrap();
        std::fs::write(tmp.path().join(CONFIG_FILE_NAME), "uint = \"rem\"").unwrap();
        assert!(load_file_config(tmp.path()).is_err());
    }
}
