//! Structural rewrite engine over a tokenized document.
//!
//! The masked document is tokenized with quick-xml; an element stack tracks
//! nesting so every `img` token knows its enclosing element. Tokens are
//! collected into pieces, `img` pieces (and their parents' class lists) are
//! rewritten, and the pieces are serialized back in order. Untouched pieces
//! re-emit their original raw text, so only rewritten tags are reformatted.
//!
//! Serialization fixups: elements that require an explicit closing tag are
//! never emitted self-closing — a collapsed `<script src="x"/>` comes back
//! out as `<script src="x"></script>`. Void elements keep their form.
//!
//! Unlike the scan engine, parentage here is structural: the enclosing
//! element counts even when text or siblings sit between its open tag and
//! the `<img>`.

use super::{
    PARENT_CLASS_SKIP, PARENT_CLASS_TOKEN, RewriteContext, RewriteEngine, RewriteError,
    apply_img_attributes, is_root_level,
};
use crate::attrs::AttrList;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

pub struct TreeEngine;

/// HTML void elements: no content, no closing tag, never pushed on the stack.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Elements a strict serializer tends to collapse but which browsers require
/// an explicit closing tag for.
const EXPLICIT_CLOSE_ELEMENTS: &[&str] = &[
    "script", "div", "span", "p", "a", "iframe", "canvas", "video", "audio", "title", "textarea",
    "select", "button",
];

fn is_void(tag_lower: &str) -> bool {
    VOID_ELEMENTS.contains(&tag_lower)
}

fn needs_explicit_close(tag_lower: &str) -> bool {
    EXPLICIT_CLOSE_ELEMENTS.contains(&tag_lower)
}

/// One tokenized region of the document, in source order.
enum Piece {
    /// Text, references, end tags, doctype — emitted verbatim.
    Raw(String),
    /// A start or empty tag that may be rewritten.
    Tag(TagPiece),
}

struct TagPiece {
    /// Tag name as written.
    name: String,
    name_lower: String,
    /// Raw text between `<` and `>` (or `/>`), for verbatim re-emission.
    raw: String,
    /// Raw attribute text (raw minus the tag name).
    attr_text: String,
    self_closing: bool,
    /// Parsed attributes, present once the tag has been rewritten.
    attrs: Option<AttrList>,
}

impl TagPiece {
    fn from_start(event: &BytesStart, self_closing: bool) -> Self {
        let raw = String::from_utf8_lossy(event).into_owned();
        let name_len = event.name().as_ref().len();
        let name = raw[..name_len].to_string();
        let attr_text = raw[name_len..].to_string();
        Self {
            name_lower: name.to_ascii_lowercase(),
            name,
            raw,
            attr_text,
            self_closing,
            attrs: None,
        }
    }

    /// Parse attributes on first modification; later edits reuse the list.
    fn attrs_mut(&mut self) -> &mut AttrList {
        if self.attrs.is_none() {
            self.attrs = Some(AttrList::parse(&self.attr_text));
        }
        self.attrs.as_mut().expect("just populated")
    }

    fn serialize(&self, out: &mut String) {
        match &self.attrs {
            None => {
                // Untouched: original text, except for the explicit-close fixup.
                if self.self_closing && needs_explicit_close(&self.name_lower) {
                    out.push('<');
                    out.push_str(self.raw.trim_end());
                    out.push_str("></");
                    out.push_str(&self.name);
                    out.push('>');
                } else {
                    out.push('<');
                    out.push_str(&self.raw);
                    if self.self_closing {
                        out.push_str("/>");
                    } else {
                        out.push('>');
                    }
                }
            }
            Some(attrs) => {
                out.push('<');
                out.push_str(&self.name);
                if !attrs.is_empty() {
                    out.push(' ');
                    out.push_str(&attrs.serialize());
                }
                if self.self_closing && !needs_explicit_close(&self.name_lower) {
                    out.push_str(" />");
                } else if self.self_closing {
                    out.push_str("></");
                    out.push_str(&self.name);
                    out.push('>');
                } else {
                    out.push('>');
                }
            }
        }
    }
}

impl RewriteEngine for TreeEngine {
    fn rewrite_images(&self, masked: &str, ctx: &RewriteContext) -> Result<String, RewriteError> {
        let mut pieces = tokenize_and_rewrite(masked, ctx)?;

        let mut out = String::with_capacity(masked.len() + masked.len() / 8);
        for piece in pieces.drain(..) {
            match piece {
                Piece::Raw(text) => out.push_str(&text),
                Piece::Tag(tag) => tag.serialize(&mut out),
            }
        }
        Ok(out)
    }
}

fn tokenize_and_rewrite(masked: &str, ctx: &RewriteContext) -> Result<Vec<Piece>, RewriteError> {
    let mut reader = Reader::from_str(masked);
    let config = reader.config_mut();
    // HTML leniency: void elements never close, stray end tags happen.
    config.check_end_names = false;
    config.allow_unmatched_ends = true;

    let mut pieces: Vec<Piece> = Vec::new();
    // Open-element stack of indices into `pieces`.
    let mut stack: Vec<usize> = Vec::new();

    loop {
        let event = reader
            .read_event()
            .map_err(|e| RewriteError::Tokenize(e.to_string()))?;
        match event {
            Event::Start(e) => {
                let tag = TagPiece::from_start(&e, false);
                push_tag(&mut pieces, &mut stack, tag, ctx);
            }
            Event::Empty(e) => {
                let tag = TagPiece::from_start(&e, true);
                push_tag(&mut pieces, &mut stack, tag, ctx);
            }
            Event::End(e) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                let name_lower = name.to_ascii_lowercase();
                // Pop the matching open element if there is one; a stray end
                // tag leaves the stack alone.
                if let Some(at) = stack.iter().rposition(|&i| opens(&pieces[i], &name_lower)) {
                    stack.truncate(at);
                }
                pieces.push(Piece::Raw(format!("</{name}>")));
            }
            Event::Text(e) => {
                pieces.push(Piece::Raw(String::from_utf8_lossy(&e).into_owned()));
            }
            Event::GeneralRef(e) => {
                pieces.push(Piece::Raw(format!("&{};", String::from_utf8_lossy(&e))));
            }
            Event::CData(e) => {
                pieces.push(Piece::Raw(format!(
                    "<![CDATA[{}]]>",
                    String::from_utf8_lossy(&e)
                )));
            }
            Event::Comment(e) => {
                pieces.push(Piece::Raw(format!("<!--{}-->", String::from_utf8_lossy(&e))));
            }
            Event::DocType(e) => {
                pieces.push(Piece::Raw(format!(
                    "<!DOCTYPE {}>",
                    String::from_utf8_lossy(&e)
                )));
            }
            Event::PI(e) => {
                pieces.push(Piece::Raw(format!("<?{}?>", String::from_utf8_lossy(&e))));
            }
            Event::Decl(e) => {
                pieces.push(Piece::Raw(format!("<?{}?>", String::from_utf8_lossy(&e))));
            }
            Event::Eof => break,
        }
    }

    Ok(pieces)
}

fn opens(piece: &Piece, name_lower: &str) -> bool {
    match piece {
        Piece::Tag(tag) => tag.name_lower == name_lower,
        Piece::Raw(_) => false,
    }
}

/// Record a tag piece, rewriting it (and its parent) when it is an `img`.
fn push_tag(pieces: &mut Vec<Piece>, stack: &mut Vec<usize>, mut tag: TagPiece, ctx: &RewriteContext) {
    if tag.name_lower == "img" {
        apply_img_attributes(tag.attrs_mut(), ctx);

        if let Some(&parent_index) = stack.last() {
            if let Piece::Tag(parent) = &mut pieces[parent_index] {
                if !is_root_level(&parent.name_lower) {
                    // attrs_mut marks the parent as rewritten even when the
                    // class token is blocked; add_class_token decides.
                    parent
                        .attrs_mut()
                        .add_class_token(PARENT_CLASS_TOKEN, PARENT_CLASS_SKIP);
                }
            }
        }
    }

    let leaf = tag.self_closing || is_void(&tag.name_lower);
    pieces.push(Piece::Tag(tag));
    if !leaf {
        stack.push(pieces.len() - 1);
    }
}
