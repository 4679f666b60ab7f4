//! # Text Sanitizer
//!
//! Normalizes an SMS text the way handsets do before hashing it: whitespace
//! variants become a plain space, extended characters are folded to a 7-bit
//! equivalent and runs of spaces are collapsed. Accented letters that sit
//! inside a URL are left alone.

use std::borrow::Cow;

use super::substitutions;
use super::url_finder::{UrlSpan, UrlSpanFinder};

#[derive(Debug, Default, Clone, Copy)]
pub struct TextSanitizer {
    finder: UrlSpanFinder,
}

impl TextSanitizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sanitize `text`. Returns `Cow::Borrowed` when nothing changed.
    pub fn sanitize<'a>(&self, text: &'a str) -> Cow<'a, str> {
        let spans = self.finder.find(text);
        let substituted = substitute_outside_urls(text, &spans);
        let current = substituted.as_deref().unwrap_or(text);

        match (collapse_spaces(current), substituted) {
            (Some(collapsed), _) => Cow::Owned(collapsed),
            (None, Some(substituted)) => Cow::Owned(substituted),
            (None, None) => Cow::Borrowed(text),
        }
    }
}

/// Apply the substitution table. `None` when no character was replaced.
fn substitute_outside_urls(text: &str, spans: &[UrlSpan]) -> Option<String> {
    let mut in_url = false;
    let mut builder: Option<String> = None;

    for (index, (byte_pos, c)) in text.char_indices().enumerate() {
        let whitespace = substitutions::is_whitespace(c);

        // A URL starts at its first non-whitespace character and lasts
        // until the next whitespace.
        if !in_url && !whitespace && spans.iter().any(|span| span.contains(index)) {
            in_url = true;
        }
        if in_url && whitespace {
            in_url = false;
        }

        let replacement = if in_url && substitutions::is_accent(c) {
            None
        } else {
            substitutions::substitute(c)
        };

        match (replacement, builder.as_mut()) {
            (Some(r), Some(out)) => out.push(r),
            (Some(r), None) => {
                let mut out = String::with_capacity(text.len());
                out.push_str(&text[..byte_pos]);
                out.push(r);
                builder = Some(out);
            }
            (None, Some(out)) => out.push(c),
            (None, None) => {}
        }
    }

    builder
}

/// Trim spaces and collapse repeated ones. `None` when already clean.
fn collapse_spaces(text: &str) -> Option<String> {
    let clean = !text.starts_with(' ') && !text.ends_with(' ') && !text.contains("  ");
    if clean {
        return None;
    }
    let collapsed = text
        .split(' ')
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    Some(collapsed)
}
