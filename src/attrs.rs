//! Ordered HTML attribute lists with format-preserving serialization.
//!
//! Both rewrite engines funnel tag rewrites through [`AttrList`]: the raw
//! attribute text of a start tag is parsed into an ordered list, new
//! attributes are merged in (never overwriting author-specified values), and
//! the list is serialized back. Untouched attributes keep their original
//! name casing, quoting style, and relative order; injected attributes are
//! appended at the end with double quotes.
//!
//! A `style` value is treated as a semicolon-delimited list of declarations;
//! [`AttrList::merge_style`] appends a declaration only when no existing
//! declaration has the same property name.

use crate::config::SizeUnit;

/// Quoting style of an attribute value, preserved on output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Quote {
    Double,
    Single,
    /// Unquoted value (`width=300`).
    Bare,
}

impl Quote {
    fn delimiter(self) -> &'static str {
        match self {
            Quote::Double => "\"",
            Quote::Single => "'",
            Quote::Bare => "",
        }
    }
}

/// One attribute as written in the source: name, optional value, quoting.
#[derive(Debug, Clone)]
struct Attr {
    name: String,
    /// `None` for boolean attributes (`<input disabled>`).
    value: Option<String>,
    quote: Quote,
}

/// Ordered attribute list parsed from the raw text of a start tag.
#[derive(Debug, Clone, Default)]
pub struct AttrList {
    attrs: Vec<Attr>,
}

impl AttrList {
    /// Parse the raw attribute text of a start tag (everything between the
    /// tag name and the closing `>`, without a trailing self-closing `/`).
    ///
    /// The grammar is deliberately lenient: names are any run of characters
    /// other than whitespace and `=`; values may be double-quoted,
    /// single-quoted, or bare; an unterminated quote swallows the rest of the
    /// text. Nothing here ever fails — garbage tokens become boolean
    /// attributes and round-trip unchanged.
    pub fn parse(raw: &str) -> Self {
        let bytes = raw.as_bytes();
        let mut attrs = Vec::new();
        let mut pos = 0usize;

        while pos < bytes.len() {
            while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
                pos += 1;
            }
            if pos >= bytes.len() {
                break;
            }

            let name_start = pos;
            while pos < bytes.len() && !bytes[pos].is_ascii_whitespace() && bytes[pos] != b'=' {
                pos += 1;
            }
            let name = raw[name_start..pos].to_string();
            if name.is_empty() {
                // Stray `=` with no name; skip it rather than loop in place.
                pos += 1;
                continue;
            }

            let mut lookahead = pos;
            while lookahead < bytes.len() && bytes[lookahead].is_ascii_whitespace() {
                lookahead += 1;
            }
            if lookahead >= bytes.len() || bytes[lookahead] != b'=' {
                attrs.push(Attr { name, value: None, quote: Quote::Double });
                continue;
            }

            pos = lookahead + 1;
            while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
                pos += 1;
            }

            let (value, quote) = if pos < bytes.len() && (bytes[pos] == b'"' || bytes[pos] == b'\'') {
                let delim = bytes[pos];
                pos += 1;
                let value_start = pos;
                while pos < bytes.len() && bytes[pos] != delim {
                    pos += 1;
                }
                let value = raw[value_start..pos].to_string();
                if pos < bytes.len() {
                    pos += 1; // closing quote
                }
                let quote = if delim == b'"' { Quote::Double } else { Quote::Single };
                (value, quote)
            } else {
                let value_start = pos;
                while pos < bytes.len() && !bytes[pos].is_ascii_whitespace() {
                    pos += 1;
                }
                (raw[value_start..pos].to_string(), Quote::Bare)
            };

            attrs.push(Attr { name, value: Some(value), quote });
        }

        Self { attrs }
    }

    /// Serialize back to raw attribute text, attributes separated by single
    /// spaces, insertion order preserved.
    pub fn serialize(&self) -> String {
        let mut out = String::new();
        for attr in &self.attrs {
            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str(&attr.name);
            if let Some(value) = &attr.value {
                let q = attr.quote.delimiter();
                out.push('=');
                out.push_str(q);
                out.push_str(value);
                out.push_str(q);
            }
        }
        out
    }

    pub fn is_empty(&self) -> bool {
        self.attrs.is_empty()
    }

    /// Case-insensitive presence check on the attribute name.
    pub fn has(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    /// Case-insensitive lookup. Boolean attributes report an empty value.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.find(name)
            .map(|i| self.attrs[i].value.as_deref().unwrap_or(""))
    }

    /// Append `name="value"` unless an attribute with that name (any casing)
    /// already exists. Returns true when the attribute was added.
    pub fn set_if_absent(&mut self, name: &str, value: impl Into<String>) -> bool {
        if self.has(name) {
            return false;
        }
        self.attrs.push(Attr {
            name: name.to_string(),
            value: Some(value.into()),
            quote: Quote::Double,
        });
        true
    }

    /// Merge declarations into the `style` attribute.
    ///
    /// An existing `style` is updated in place (keeping its position and
    /// quoting); otherwise one is appended. Each declaration is added only
    /// when no existing declaration has the same property, compared
    /// case-insensitively on the trimmed property name.
    pub fn merge_style(&mut self, declarations: &[(&str, String)]) {
        match self.find("style") {
            Some(i) => {
                let existing = self.attrs[i].value.as_deref().unwrap_or("");
                let merged = merge_declarations(existing, declarations);
                self.attrs[i].value = Some(merged);
            }
            None => {
                let merged = merge_declarations("", declarations);
                self.attrs.push(Attr {
                    name: "style".to_string(),
                    value: Some(merged),
                    quote: Quote::Double,
                });
            }
        }
    }

    /// Add a class token unless the class list already contains any of
    /// `skip_tokens`. A missing `class` attribute is created. Returns true
    /// when the token was added.
    pub fn add_class_token(&mut self, token: &str, skip_tokens: &[&str]) -> bool {
        match self.find("class") {
            Some(i) => {
                let existing = self.attrs[i].value.as_deref().unwrap_or("");
                let blocked = existing
                    .split_whitespace()
                    .any(|t| skip_tokens.iter().any(|s| t.eq_ignore_ascii_case(s)));
                if blocked {
                    return false;
                }
                let mut value = existing.trim_end().to_string();
                if !value.is_empty() {
                    value.push(' ');
                }
                value.push_str(token);
                self.attrs[i].value = Some(value);
                true
            }
            None => {
                self.attrs.push(Attr {
                    name: "class".to_string(),
                    value: Some(token.to_string()),
                    quote: Quote::Double,
                });
                true
            }
        }
    }

    fn find(&self, name: &str) -> Option<usize> {
        self.attrs
            .iter()
            .position(|a| a.name.eq_ignore_ascii_case(name))
    }
}

/// Append declarations to a semicolon-delimited style value, skipping
/// properties that are already declared. Separators are normalized to exactly
/// one `;` between declarations, none dangling at the start.
fn merge_declarations(existing: &str, declarations: &[(&str, String)]) -> String {
    let mut out = existing.trim().to_string();
    for (property, value) in declarations {
        let declared = out.split(';').any(|d| {
            d.split_once(':')
                .is_some_and(|(p, _)| p.trim().eq_ignore_ascii_case(property))
        });
        if declared {
            continue;
        }
        if !out.is_empty() {
            if !out.ends_with(';') {
                out.push(';');
            }
            out.push(' ');
        }
        out.push_str(property);
        out.push_str(": ");
        out.push_str(value);
        out.push(';');
    }
    out
}

/// Convert a pixel width into the inline-style value for the configured unit.
///
/// `rem` divides by 10 with one decimal place; `vw` scales against the base
/// width with four decimal places; `none` yields no style at all.
pub fn width_style_value(unit: SizeUnit, base_width_px: u32, pixel_width: u32) -> Option<String> {
    match unit {
        SizeUnit::Rem => Some(format!("{:.1}rem", f64::from(pixel_width) / 10.0)),
        SizeUnit::Vw => Some(format!(
            "{:.4}vw",
            f64::from(pixel_width) / f64::from(base_width_px) * 100.0
        )),
        SizeUnit::None => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_serialize_round_trip() {
        let attrs = AttrList::parse(r#"src="a.png" alt='photo' width=300 disabled"#);
        assert_eq!(
            attrs.serialize(),
            r#"src="a.png" alt='photo' width=300 disabled"#
        );
    }

    #[test]
    fn parse_normalizes_internal_whitespace() {
        let attrs = AttrList::parse("src=\"a.png\"\n      alt = \"x\"");
        assert_eq!(attrs.serialize(), r#"src="a.png" alt="x""#);
    }

    #[test]
    fn parse_unterminated_quote_swallows_rest() {
        let attrs = AttrList::parse(r#"src="a.png alt=b"#);
        assert_eq!(attrs.get("src"), Some("a.png alt=b"));
    }

    #[test]
    fn get_is_case_insensitive_and_preserves_case() {
        let attrs = AttrList::parse(r#"SRC="a.png""#);
        assert_eq!(attrs.get("src"), Some("a.png"));
        assert_eq!(attrs.serialize(), r#"SRC="a.png""#);
    }

    #[test]
    fn boolean_attribute_round_trips_bare() {
        let mut attrs = AttrList::parse("async data-x");
        assert!(attrs.has("ASYNC"));
        assert_eq!(attrs.get("async"), Some(""));
        attrs.set_if_absent("loading", "lazy");
        assert_eq!(attrs.serialize(), r#"async data-x loading="lazy""#);
    }

    #[test]
    fn set_if_absent_never_overwrites() {
        let mut attrs = AttrList::parse(r#"width="999""#);
        assert!(!attrs.set_if_absent("WIDTH", "300"));
        assert_eq!(attrs.serialize(), r#"width="999""#);
    }

    #[test]
    fn injected_attributes_append_in_order() {
        let mut attrs = AttrList::parse(r#"src="a.png""#);
        attrs.set_if_absent("width", "300");
        attrs.set_if_absent("height", "150");
        attrs.merge_style(&[("width", "30.0rem".into()), ("flex-shrink", "0".into())]);
        attrs.set_if_absent("loading", "lazy");
        attrs.set_if_absent("decoding", "async");
        assert_eq!(
            attrs.serialize(),
            r#"src="a.png" width="300" height="150" style="width: 30.0rem; flex-shrink: 0;" loading="lazy" decoding="async""#
        );
    }

    #[test]
    fn merge_style_fresh_value() {
        assert_eq!(
            merge_declarations("", &[("width", "30.0rem".into()), ("flex-shrink", "0".into())]),
            "width: 30.0rem; flex-shrink: 0;"
        );
    }

    #[test]
    fn merge_style_appends_missing_separator() {
        assert_eq!(
            merge_declarations("color: red", &[("width", "1.0rem".into())]),
            "color: red; width: 1.0rem;"
        );
        assert_eq!(
            merge_declarations("color: red;", &[("width", "1.0rem".into())]),
            "color: red; width: 1.0rem;"
        );
    }

    #[test]
    fn merge_style_skips_declared_property() {
        assert_eq!(
            merge_declarations(
                "WIDTH : 5px",
                &[("width", "1.0rem".into()), ("flex-shrink", "0".into())]
            ),
            "WIDTH : 5px; flex-shrink: 0;"
        );
    }

    #[test]
    fn merge_style_updates_existing_attribute_in_place() {
        let mut attrs = AttrList::parse(r#"style='color: red' src="a.png""#);
        attrs.merge_style(&[("width", "1.0rem".into())]);
        assert_eq!(
            attrs.serialize(),
            r#"style='color: red; width: 1.0rem;' src="a.png""#
        );
    }

    #[test]
    fn class_token_added_and_blocked() {
        let mut attrs = AttrList::parse(r#"class="card""#);
        assert!(attrs.add_class_token("flex-cc", &["flex", "flex-cc"]));
        assert_eq!(attrs.serialize(), r#"class="card flex-cc""#);

        let mut flexed = AttrList::parse(r#"class="flex card""#);
        assert!(!flexed.add_class_token("flex-cc", &["flex", "flex-cc"]));
        assert_eq!(flexed.serialize(), r#"class="flex card""#);
    }

    #[test]
    fn class_token_not_fooled_by_substrings() {
        // "flexible" is not the token "flex"
        let mut attrs = AttrList::parse(r#"class="flexible""#);
        assert!(attrs.add_class_token("flex-cc", &["flex", "flex-cc"]));
        assert_eq!(attrs.serialize(), r#"class="flexible flex-cc""#);
    }

    #[test]
    fn class_attribute_created_when_missing() {
        let mut attrs = AttrList::parse(r#"id="hero""#);
        attrs.add_class_token("flex-cc", &["flex", "flex-cc"]);
        assert_eq!(attrs.serialize(), r#"id="hero" class="flex-cc""#);
    }

    #[test]
    fn rem_conversion_one_decimal() {
        assert_eq!(
            width_style_value(SizeUnit::Rem, 1920, 1200),
            Some("120.0rem".to_string())
        );
        assert_eq!(
            width_style_value(SizeUnit::Rem, 1920, 305),
            Some("30.5rem".to_string())
        );
    }

    #[test]
    fn vw_conversion_four_decimals() {
        assert_eq!(
            width_style_value(SizeUnit::Vw, 1920, 1200),
            Some("62.5000vw".to_string())
        );
        assert_eq!(
            width_style_value(SizeUnit::Vw, 1920, 300),
            Some("15.6250vw".to_string())
        );
    }

    #[test]
    fn none_injects_nothing() {
        assert_eq!(width_style_value(SizeUnit::None, 1920, 1200), None);
    }
}
