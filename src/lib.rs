//! # imghint
//!
//! Injects image performance hints into static HTML and PHP pages: explicit
//! `width`/`height` attributes read straight from the image files on disk, an
//! inline `width:` style in `rem` or `vw`, and `loading="lazy"` /
//! `decoding="async"`. Pages stop reflowing as images arrive and the browser
//! can defer offscreen fetches — without anyone hand-maintaining dimensions
//! in markup.
//!
//! # Architecture: One Pipeline, Two Engines
//!
//! Every document goes through the same three linear stages:
//!
//! ```text
//! 1. Mask      PHP blocks and HTML comments → inert placeholder tokens
//! 2. Rewrite   every <img> (and its parent's class list) gets its hints
//! 3. Unmask    placeholder tokens → original text, byte for byte
//! ```
//!
//! The middle stage is pluggable. Two engines implement it:
//!
//! - **scan** — regex pattern matching, each tag handled in isolation. Fast,
//!   survives arbitrarily broken markup, but only sees a parent element when
//!   its open tag immediately precedes the `<img>`.
//! - **tree** — a tokenized structural pass. Knows real nesting, so parents
//!   are found across intervening text and siblings, at the cost of needing
//!   the document to tokenize.
//!
//! Both engines only ever add attributes. Anything the page author wrote —
//! existing dimensions, `loading="eager"`, an inline `width:` — wins, which
//! also makes the whole rewrite idempotent.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`sniff`] | Reads pixel dimensions out of PNG/JPEG/WebP headers, no decoder |
//! | [`attrs`] | Order- and quote-preserving attribute list parsing and editing |
//! | [`mask`] | Masks PHP blocks and comments behind placeholder tokens |
//! | [`rewrite`] | The pipeline driver plus the `scan` and `tree` engines |
//! | [`config`] | CLI/`imghint.toml` settings resolved into one immutable config |
//! | [`run`] | Batch driver — walks the input tree, rewrites files in parallel |
//! | [`output`] | CLI output formatting for run results |
//!
//! # Design Decisions
//!
//! ## Header Sniffing Over Image Decoding
//!
//! Dimensions come from byte-offset reads of container headers, not from an
//! image decoder. The tool touches hundreds of images per run and needs only
//! two integers from each; decoding would be orders of magnitude more work
//! and drag in format-specific failure modes. Unsupported formats simply
//! contribute no dimensions — the image still gets its loading hints.
//!
//! ## Text In, Text Out
//!
//! Documents are rewritten as text, never round-tripped through a DOM
//! serializer. Mixed PHP/HTML sources are not valid markup and a serializer
//! would normalize quoting, entity forms, and whitespace across the whole
//! file. Here, untouched markup is re-emitted verbatim; only rewritten tags
//! are reformatted.
//!
//! ## Masking Instead of PHP Awareness
//!
//! Neither engine knows PHP exists. Server-side blocks are swapped for inert
//! alphanumeric tokens before the rewrite and restored afterwards, so a `>`
//! inside a PHP expression or an `<img` inside a comment can never derail
//! tag matching.

pub mod attrs;
pub mod config;
pub mod mask;
pub mod output;
pub mod rewrite;
pub mod run;
pub mod sniff;

#[cfg(test)]
pub(crate) mod test_helpers;
