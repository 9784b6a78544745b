//! Protected-region masking for server-side code and comments.
//!
//! PHP processing instructions and HTML comments must pass through the
//! rewrite untouched — neither engine can be allowed to see them, because a
//! `<img` inside a comment or a `>` inside a PHP block would derail tag
//! matching. [`Masker::mask`] swaps every such span for an inert placeholder
//! token before rewriting; [`Masker::unmask`] substitutes the original text
//! back in afterwards, byte for byte.
//!
//! Tokens are alphanumeric only and carry a process-unique prefix, so they
//! cannot collide with plausible document text and survive being mistaken
//! for markup. A structural rewrite stage may still decorate a token it
//! took for a boolean attribute (`token=""`) or drift its casing; unmasking
//! strips that decoration before substituting.

use regex::Regex;
use std::sync::LazyLock;

/// PHP blocks and HTML comments, non-greedy, spanning newlines, matched
/// left-to-right over the whole document in one pass.
static PROTECTED_REGION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<\?php.*?\?>|<!--.*?-->").expect("protected-region pattern"));

/// One masked span: its sequence index and the exact original text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtectedSpan {
    pub index: u32,
    pub original: String,
}

/// Replaces protected regions with placeholder tokens and restores them.
#[derive(Debug)]
pub struct Masker {
    prefix: String,
}

impl Default for Masker {
    fn default() -> Self {
        Self::new()
    }
}

impl Masker {
    pub fn new() -> Self {
        Self {
            prefix: format!("IMGHINTPB{}", std::process::id()),
        }
    }

    fn token(&self, index: usize) -> String {
        format!("{}N{}E", self.prefix, index)
    }

    /// Replace every protected region with a placeholder token, returning the
    /// masked text and the spans needed to restore it.
    pub fn mask(&self, text: &str) -> (String, Vec<ProtectedSpan>) {
        let mut spans = Vec::new();
        let masked = PROTECTED_REGION
            .replace_all(text, |caps: &regex::Captures| {
                let token = self.token(spans.len());
                spans.push(ProtectedSpan {
                    index: spans.len() as u32,
                    original: caps[0].to_string(),
                });
                token
            })
            .into_owned();
        (masked, spans)
    }

    /// Substitute each span's original text back in place of its token.
    ///
    /// Tolerates decoration a structural rewrite may have added: matching is
    /// case-insensitive and an attached `=""` suffix is consumed along with
    /// the token. Restoration is exact — the replacement is the original
    /// bytes, not a regex template.
    pub fn unmask(&self, masked: &str, spans: &[ProtectedSpan]) -> String {
        let mut text = masked.to_string();
        for span in spans {
            let pattern = format!(
                r#"(?i){}(?:="")?"#,
                regex::escape(&self.token(span.index as usize))
            );
            let matcher = Regex::new(&pattern).expect("escaped token is a valid pattern");
            // Closure replacement: the original text must land verbatim even
            // when it contains `$` sequences regex would treat as templates.
            text = matcher
                .replace(&text, |_: &regex::Captures| span.original.clone())
                .into_owned();
        }
        text
    }
}
