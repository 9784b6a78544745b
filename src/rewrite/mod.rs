//! Markup rewriting: the `Masked → ImgRewritten → Unmasked` pipeline.
//!
//! [`rewrite_document`] drives one document through three linear stages:
//! protected regions are masked out, every `<img>` tag (and its parent's
//! class list) is rewritten by the configured engine, and the protected
//! regions are restored verbatim.
//!
//! Two engines implement the middle stage behind the same contract:
//!
//! | Engine | Module | Approach |
//! |--------|--------|----------|
//! | `scan` | [`scan`] | regex pattern matching, each tag in isolation |
//! | `tree` | [`tree`] | tokenized structural pass over the whole document |
//!
//! Both are no-ops on documents without `<img>` elements and idempotent on
//! their own output: attributes are only ever added, never overwritten.

pub mod scan;
pub mod tree;

use crate::attrs::{AttrList, width_style_value};
use crate::config::{Engine, RewriteConfig};
use crate::mask::Masker;
use crate::sniff::{self, ImageDimensions};
use std::cell::Cell;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RewriteError {
    /// The tree engine could not tokenize the document. The scan engine
    /// never produces this; malformed markup simply fails to match.
    #[error("Failed to tokenize document: {0}")]
    Tokenize(String),
}

/// Class token injected on the element containing an `<img>`.
pub const PARENT_CLASS_TOKEN: &str = "flex-cc";
/// Class tokens that suppress the injection when already present.
pub const PARENT_CLASS_SKIP: &[&str] = &["flex", "flex-cc"];

/// Document-root-level elements never receive the parent class token.
pub(crate) fn is_root_level(tag_lower: &str) -> bool {
    matches!(tag_lower, "html" | "body" | "head")
}

/// Everything an engine needs to rewrite one document: the immutable run
/// configuration and the directories image references resolve against.
pub struct RewriteContext<'a> {
    pub config: &'a RewriteConfig,
    /// Directory of the HTML/PHP file being rewritten.
    pub html_dir: &'a Path,
    /// Fallback root for root-relative and bare references.
    pub project_root: &'a Path,
    images_seen: Cell<usize>,
    images_sized: Cell<usize>,
}

impl<'a> RewriteContext<'a> {
    pub fn new(config: &'a RewriteConfig, html_dir: &'a Path, project_root: &'a Path) -> Self {
        Self {
            config,
            html_dir,
            project_root,
            images_seen: Cell::new(0),
            images_sized: Cell::new(0),
        }
    }

    /// Resolve and sniff one image reference. `None` covers every failure
    /// mode — missing file, unreadable file, unrecognized format — and the
    /// caller reacts identically to all of them.
    fn dimensions_for(&self, src: &str) -> Option<ImageDimensions> {
        let path = sniff::resolve_reference(src, self.html_dir, self.project_root)?;
        sniff::read_dimensions(&path)
    }

    fn stats(&self) -> RewriteStats {
        RewriteStats {
            images_seen: self.images_seen.get(),
            images_sized: self.images_sized.get(),
        }
    }
}

/// Per-document counters reported back to the driver.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RewriteStats {
    /// `<img>` tags encountered.
    pub images_seen: usize,
    /// Tags that received width/height from a readable image.
    pub images_sized: usize,
}

/// The `ImgRewritten` stage: one engine, one contract.
///
/// Input is the masked document text; output is the rewritten masked text.
/// Engines must not touch placeholder tokens beyond incidental attribute
/// decoration (which unmasking strips).
pub trait RewriteEngine {
    fn rewrite_images(&self, masked: &str, ctx: &RewriteContext) -> Result<String, RewriteError>;
}

fn engine_for(engine: Engine) -> &'static dyn RewriteEngine {
    match engine {
        Engine::Scan => &scan::ScanEngine,
        Engine::Tree => &tree::TreeEngine,
    }
}

/// Rewrite one document: mask, run the configured engine, unmask.
pub fn rewrite_document(
    text: &str,
    config: &RewriteConfig,
    html_dir: &Path,
    project_root: &Path,
) -> Result<(String, RewriteStats), RewriteError> {
    let masker = Masker::new();
    let (masked, spans) = masker.mask(text);

    let ctx = RewriteContext::new(config, html_dir, project_root);
    let rewritten = engine_for(config.engine).rewrite_images(&masked, &ctx)?;

    Ok((masker.unmask(&rewritten, &spans), ctx.stats()))
}

/// Shared `<img>` attribute rewrite used by both engines.
///
/// Injection order is fixed: existing attributes stay first, then `width`,
/// `height`, `style`, `loading`, `decoding` — each only when absent. Sizing
/// attributes require readable dimensions; `loading`/`decoding` are injected
/// regardless (when lazy loading is enabled), so a missing image still gets
/// its loading hints.
pub(crate) fn apply_img_attributes(attrs: &mut AttrList, ctx: &RewriteContext) {
    ctx.images_seen.set(ctx.images_seen.get() + 1);

    let dims = attrs
        .get("src")
        .filter(|s| !s.is_empty())
        .and_then(|src| ctx.dimensions_for(src));
    if let Some(dims) = dims {
        attrs.set_if_absent("width", dims.width.to_string());
        attrs.set_if_absent("height", dims.height.to_string());
        if let Some(width_value) =
            width_style_value(ctx.config.size_unit, ctx.config.base_width_px, dims.width)
        {
            attrs.merge_style(&[("width", width_value), ("flex-shrink", "0".to_string())]);
        }
        ctx.images_sized.set(ctx.images_sized.get() + 1);
    }

    if ctx.config.apply_lazy_loading {
        attrs.set_if_absent("loading", "lazy");
        attrs.set_if_absent("decoding", "async");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SizeUnit;
    use crate::test_helpers::{png_bytes, write_image};

    #[test]
    fn concrete_scenario_attribute_order() {
        let tmp = tempfile::TempDir::new().unwrap();
        write_image(tmp.path(), "a.png", &png_bytes(300, 150));

        let config = RewriteConfig::default();
        for engine in [Engine::Scan, Engine::Tree] {
            let config = RewriteConfig { engine, ..config };
            let (out, stats) =
                rewrite_document(r#"<img src="a.png">"#, &config, tmp.path(), tmp.path()).unwrap();
            assert_eq!(
                out,
                r#"<img src="a.png" width="300" height="150" style="width: 30.0rem; flex-shrink: 0;" loading="lazy" decoding="async">"#,
                "engine {:?}",
                engine
            );
            assert_eq!(stats.images_seen, 1);
            assert_eq!(stats.images_sized, 1);
        }
    }

    #[test]
    fn missing_image_still_gets_loading_hints() {
        let tmp = tempfile::TempDir::new().unwrap();
        let config = RewriteConfig::default();
        for engine in [Engine::Scan, Engine::Tree] {
            let config = RewriteConfig { engine, ..config };
            let (out, stats) =
                rewrite_document(r#"<img src="missing.png">"#, &config, tmp.path(), tmp.path())
                    .unwrap();
            assert_eq!(
                out,
                r#"<img src="missing.png" loading="lazy" decoding="async">"#
            );
            assert_eq!(stats.images_sized, 0);
        }
    }

    #[test]
    fn lazy_loading_disabled_injects_nothing_for_missing_image() {
        let tmp = tempfile::TempDir::new().unwrap();
        let config = RewriteConfig {
            apply_lazy_loading: false,
            ..RewriteConfig::default()
        };
        let (out, _) =
            rewrite_document(r#"<img src="missing.png">"#, &config, tmp.path(), tmp.path())
                .unwrap();
        assert_eq!(out, r#"<img src="missing.png">"#);
    }

    #[test]
    fn vw_unit_uses_base_width() {
        let tmp = tempfile::TempDir::new().unwrap();
        write_image(tmp.path(), "a.png", &png_bytes(1200, 800));
        let config = RewriteConfig {
            size_unit: SizeUnit::Vw,
            apply_lazy_loading: false,
            ..RewriteConfig::default()
        };
        let (out, _) =
            rewrite_document(r#"<img src="a.png">"#, &config, tmp.path(), tmp.path()).unwrap();
        assert!(out.contains("width: 62.5000vw;"), "got: {out}");
    }

    #[test]
    fn unit_none_skips_style_but_keeps_dimensions() {
        let tmp = tempfile::TempDir::new().unwrap();
        write_image(tmp.path(), "a.png", &png_bytes(300, 150));
        let config = RewriteConfig {
            size_unit: SizeUnit::None,
            ..RewriteConfig::default()
        };
        let (out, _) =
            rewrite_document(r#"<img src="a.png">"#, &config, tmp.path(), tmp.path()).unwrap();
        assert!(out.contains(r#"width="300" height="150""#));
        assert!(!out.contains("style="));
    }

    #[test]
    fn protected_regions_round_trip_through_both_engines() {
        let tmp = tempfile::TempDir::new().unwrap();
        write_image(tmp.path(), "a.png", &png_bytes(300, 150));
        let input = "<?php header('X'); ?>\n<div><img src=\"a.png\"></div>\n<!-- note: <img src=\"ghost.png\"> -->\n<?php footer(); ?>";
        for engine in [Engine::Scan, Engine::Tree] {
            let config = RewriteConfig { engine, ..RewriteConfig::default() };
            let (out, stats) = rewrite_document(input, &config, tmp.path(), tmp.path()).unwrap();
            assert!(out.starts_with("<?php header('X'); ?>"), "engine {engine:?}");
            assert!(out.contains("<!-- note: <img src=\"ghost.png\"> -->"));
            assert!(out.ends_with("<?php footer(); ?>"));
            // The commented-out img is invisible to the engines
            assert_eq!(stats.images_seen, 1, "engine {engine:?}");
        }
    }

    #[test]
    fn idempotent_under_both_engines() {
        let tmp = tempfile::TempDir::new().unwrap();
        write_image(tmp.path(), "a.png", &png_bytes(300, 150));
        let input = "<!DOCTYPE html>\n<div class=\"card\">\n  <img src=\"a.png\" alt=\"x\">\n</div>\n<img src=\"missing.png\">";
        for engine in [Engine::Scan, Engine::Tree] {
            let config = RewriteConfig { engine, ..RewriteConfig::default() };
            let (once, _) = rewrite_document(input, &config, tmp.path(), tmp.path()).unwrap();
            let (twice, _) = rewrite_document(&once, &config, tmp.path(), tmp.path()).unwrap();
            assert_eq!(once, twice, "engine {engine:?}");
        }
    }

    #[test]
    fn no_img_documents_pass_through() {
        let tmp = tempfile::TempDir::new().unwrap();
        let input = "<html><body><p>text &amp; more</p></body></html>";
        for engine in [Engine::Scan, Engine::Tree] {
            let config = RewriteConfig { engine, ..RewriteConfig::default() };
            let (out, stats) = rewrite_document(input, &config, tmp.path(), tmp.path()).unwrap();
            assert_eq!(out, input, "engine {engine:?}");
            assert_eq!(stats.images_seen, 0);
        }
    }

    #[test]
    fn author_attributes_never_clobbered() {
        let tmp = tempfile::TempDir::new().unwrap();
        write_image(tmp.path(), "a.png", &png_bytes(300, 150));
        let input = r#"<img src="a.png" width="640" loading="eager" style="width: 5vw">"#;
        for engine in [Engine::Scan, Engine::Tree] {
            let config = RewriteConfig { engine, ..RewriteConfig::default() };
            let (out, _) = rewrite_document(input, &config, tmp.path(), tmp.path()).unwrap();
            assert!(out.contains(r#"width="640""#), "engine {engine:?}: {out}");
            assert!(out.contains(r#"loading="eager""#));
            assert!(out.contains("width: 5vw"));
            assert!(!out.contains("30.0rem"));
            // height was absent and is still injected
            assert!(out.contains(r#"height="150""#));
        }
    }
}
