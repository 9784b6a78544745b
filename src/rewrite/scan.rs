//! Pattern-scanning rewrite engine.
//!
//! Two regex passes over the masked document, each tag handled in isolation:
//!
//! 1. Every element open tag immediately preceding an `<img>` (only
//!    whitespace between) gets the parent class token, unless its class list
//!    already opts out or the element is document-root-level.
//! 2. Every `<img …>` tag (non-greedy up to the first `>`) has its attribute
//!    text extracted, rewritten through [`AttrList`], and reassembled,
//!    preserving a self-closing slash when the original had one.
//!
//! Attribute values containing a literal `>` will derail the match — a known
//! limit of pattern scanning; the tree engine handles those documents.

use super::{
    PARENT_CLASS_SKIP, PARENT_CLASS_TOKEN, RewriteContext, RewriteEngine, RewriteError,
    apply_img_attributes, is_root_level,
};
use crate::attrs::AttrList;
use regex::{Captures, Regex};
use std::sync::LazyLock;

/// `<img …>` with its raw attribute text captured.
static IMG_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<img\b([^>]*)>").expect("img pattern"));

/// An element open tag, trailing whitespace, and the `<img` that follows it.
/// The `<img` prefix is consumed and re-emitted so no lookahead is needed;
/// the later img pass matches the full tag independently.
static PARENT_BEFORE_IMG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<([a-z][a-z0-9]*)\b([^>]*)>(\s*<img\b)").expect("parent pattern")
});

pub struct ScanEngine;

impl RewriteEngine for ScanEngine {
    fn rewrite_images(&self, masked: &str, ctx: &RewriteContext) -> Result<String, RewriteError> {
        let with_parents = PARENT_BEFORE_IMG.replace_all(masked, |caps: &Captures| {
            rewrite_parent_tag(&caps[1], &caps[2], &caps[3]).unwrap_or_else(|| caps[0].to_string())
        });

        let rewritten = IMG_TAG.replace_all(&with_parents, |caps: &Captures| {
            rewrite_img_tag(&caps[1], ctx)
        });

        Ok(rewritten.into_owned())
    }
}

/// Rebuild a parent open tag with the class token added, or `None` to leave
/// the match untouched.
fn rewrite_parent_tag(name: &str, attr_text: &str, tail: &str) -> Option<String> {
    if is_root_level(&name.to_ascii_lowercase()) {
        return None;
    }

    let (raw, self_closing) = split_self_closing(attr_text);
    let mut attrs = AttrList::parse(raw);
    if !attrs.add_class_token(PARENT_CLASS_TOKEN, PARENT_CLASS_SKIP) {
        return None;
    }

    Some(format!(
        "<{name} {}{}>{tail}",
        attrs.serialize(),
        if self_closing { " /" } else { "" }
    ))
}

/// Extract, rewrite, and reassemble one `<img>` tag.
fn rewrite_img_tag(attr_text: &str, ctx: &RewriteContext) -> String {
    let (raw, self_closing) = split_self_closing(attr_text);
    let mut attrs = AttrList::parse(raw);
    apply_img_attributes(&mut attrs, ctx);

    let serialized = attrs.serialize();
    let space = if serialized.is_empty() { "" } else { " " };
    let suffix = if self_closing { " /" } else { "" };
    format!("<img{space}{serialized}{suffix}>")
}

/// Detect and strip a trailing self-closing slash from raw attribute text.
fn split_self_closing(attr_text: &str) -> (&str, bool) {
    let trimmed = attr_text.trim_end();
    match trimmed.strip_suffix('/') {
        Some(rest) => (rest.trim_end(), true),
        None => (attr_text, false),
    }
}
