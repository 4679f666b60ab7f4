//! # URL Span Finder
//!
//! Locates URL-like substrings so the sanitizer can leave accented letters
//! inside them untouched.
//!
//! Two shapes are recognised:
//!
//! - **Schemed**: `http://`, `https://` or `rtsp://` (any case) followed by at
//!   least one character. The scheme is lower-cased in the normalized URL, the
//!   rest is kept verbatim.
//! - **Bare domain**: `label.label[:port][/path]` where the final label is a
//!   delegated top-level domain (see `tlds.txt`, IDN labels in Unicode form)
//!   or a punycode `xn--` label. `http://` is prepended.
//!
//! Anything shaped like an e-mail address is dropped.
//!
//! ## Classification view
//!
//! Characters are classified (stop character, host character, punctuation)
//! after applying the sanitizer's whitespace and seven-bit substitutions, so a
//! sanitized text yields the same spans as its source. Offsets and the
//! returned URL text always refer to the original characters.

use std::collections::HashSet;

use lazy_static::lazy_static;

use super::substitutions;

/// Schemes recognised at the start of a URL. The first one is the default.
pub const SUPPORTED_SCHEMES: [&str; 3] = ["http://", "https://", "rtsp://"];

const DEFAULT_SCHEME: &str = SUPPORTED_SCHEMES[0];

/// Delegated top-level domains, one per line, `#` comments.
const TLD_LIST: &str = include_str!("tlds.txt");

lazy_static! {
    static ref TLDS: HashSet<&'static str> = TLD_LIST
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .collect();
}

/// A URL found in a text.
///
/// `start` and `end` are character offsets; `end` is exclusive for slicing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlSpan {
    /// Normalized URL (lower-case scheme, default scheme added when missing).
    pub url: String,
    pub start: usize,
    pub end: usize,
}

impl UrlSpan {
    pub fn new(url: impl Into<String>, start: usize, end: usize) -> Self {
        Self {
            url: url.into(),
            start,
            end,
        }
    }

    /// Inclusive at both ends: the character right after the span counts.
    ///
    /// Deployed hash generators use this test, so hashes only match theirs
    /// when it is kept.
    pub fn contains(&self, index: usize) -> bool {
        self.start <= index && index <= self.end
    }
}

/// Stateless URL scanner.
#[derive(Debug, Default, Clone, Copy)]
pub struct UrlSpanFinder;

impl UrlSpanFinder {
    pub fn new() -> Self {
        Self
    }

    /// Find every URL in `text`, in order of appearance.
    pub fn find(&self, text: &str) -> Vec<UrlSpan> {
        let original: Vec<char> = text.chars().collect();
        let view: Vec<char> = original.iter().map(|&c| classify(c)).collect();

        let mut spans = Vec::new();
        let mut pos = 0;
        while pos < view.len() {
            if is_stop(view[pos]) {
                pos += 1;
                continue;
            }
            let run_start = pos;
            while pos < view.len() && !is_stop(view[pos]) {
                pos += 1;
            }
            if let Some((start, end)) = match_run(&view[run_start..pos]) {
                let (start, end) = (run_start + start, run_start + end);
                let candidate = &view[start..end];
                if looks_like_email(candidate) {
                    continue;
                }
                spans.push(UrlSpan::new(
                    normalize(candidate, &original[start..end]),
                    start,
                    end,
                ));
            }
        }
        spans
    }
}

// =============================================================================
// CHARACTER CLASSES
// =============================================================================

fn classify(c: char) -> char {
    substitutions::plain_substitute(c).unwrap_or(c)
}

fn is_stop(c: char) -> bool {
    c.is_whitespace() || matches!(c, '<' | '>' | '"' | '\'' | ';' | '\u{3000}')
}

fn is_host_char(c: char) -> bool {
    c == '-' || c.is_alphanumeric()
}

fn is_trailing_punctuation(c: char) -> bool {
    matches!(c, '.' | ',' | '!' | '?' | ':')
}

fn opening_of(close: char) -> Option<char> {
    match close {
        ')' => Some('('),
        ']' => Some('['),
        '}' => Some('{'),
        _ => None,
    }
}

// =============================================================================
// MATCHING
// =============================================================================

/// Match one run of non-stop characters. Returns the span relative to the run.
fn match_run(run: &[char]) -> Option<(usize, usize)> {
    if let Some(start) = find_scheme(run) {
        let end = start + trimmed_len(&run[start..]);
        let scheme_len = scheme_at(&run[start..])?.len();
        return (end > start + scheme_len).then_some((start, end));
    }

    let start = run.iter().position(|c| c.is_alphanumeric())?;
    let trimmed = trimmed_len(&run[start..]);
    let len = match_bare_domain(&run[start..start + trimmed])?;
    Some((start, start + len))
}

/// Position of the first supported scheme inside the run.
fn find_scheme(run: &[char]) -> Option<usize> {
    (0..run.len()).find(|&i| scheme_at(&run[i..]).is_some())
}

fn scheme_at(chars: &[char]) -> Option<&'static str> {
    SUPPORTED_SCHEMES.iter().copied().find(|scheme| {
        scheme.len() <= chars.len()
            && scheme
                .chars()
                .zip(chars)
                .all(|(s, c)| c.eq_ignore_ascii_case(&s))
    })
}

/// Length after dropping trailing sentence punctuation and unbalanced closers.
fn trimmed_len(candidate: &[char]) -> usize {
    let mut end = candidate.len();
    while end > 0 {
        let last = candidate[end - 1];
        let strip = if is_trailing_punctuation(last) {
            true
        } else if let Some(open) = opening_of(last) {
            let head = &candidate[..end];
            let opened = head.iter().filter(|&&c| c == open).count();
            let closed = head.iter().filter(|&&c| c == last).count();
            closed > opened
        } else {
            false
        };
        if !strip {
            break;
        }
        end -= 1;
    }
    end
}

/// `host[:port][/path]`; returns the matched length.
fn match_bare_domain(candidate: &[char]) -> Option<usize> {
    let host_end = candidate
        .iter()
        .position(|c| matches!(c, ':' | '/' | '?' | '#'))
        .unwrap_or(candidate.len());
    if !is_domain(&candidate[..host_end]) {
        return None;
    }

    let rest = &candidate[host_end..];
    if rest.first() != Some(&':') {
        return Some(candidate.len());
    }

    let digits = rest[1..].iter().take_while(|c| c.is_ascii_digit()).count();
    let after_port = &rest[1 + digits..];
    let port_ok = (1..=5).contains(&digits)
        && after_port
            .first()
            .map_or(true, |c| matches!(c, '/' | '?' | '#'));
    if port_ok {
        Some(candidate.len())
    } else {
        Some(host_end)
    }
}

fn is_domain(host: &[char]) -> bool {
    let labels: Vec<&[char]> = host.split(|&c| c == '.').collect();
    if labels.len() < 2 {
        return false;
    }
    let labels_ok = labels.iter().all(|label| {
        !label.is_empty()
            && label.iter().all(|&c| is_host_char(c))
            && label.first() != Some(&'-')
            && label.last() != Some(&'-')
    });
    labels_ok && labels.last().is_some_and(|tld| is_known_tld(tld))
}

fn is_known_tld(label: &[char]) -> bool {
    let lower: String = label.iter().flat_map(|c| c.to_lowercase()).collect();
    if lower.starts_with("xn--") {
        return lower.len() > 4;
    }
    TLDS.contains(lower.as_str())
}

/// Shape `x@y.z` with no `@` inside `y.z`.
fn looks_like_email(candidate: &[char]) -> bool {
    let segments: Vec<&[char]> = candidate.split(|&c| c == '@').collect();
    segments.windows(2).any(|pair| {
        let (local, domain) = (pair[0], pair[1]);
        !local.is_empty()
            && domain
                .iter()
                .enumerate()
                .any(|(i, &c)| c == '.' && i > 0 && i + 1 < domain.len())
    })
}

/// Lower-case the scheme, or prepend the default one.
fn normalize(view: &[char], original: &[char]) -> String {
    match scheme_at(view) {
        Some(scheme) => {
            let rest: String = original[scheme.len()..].iter().collect();
            format!("{scheme}{rest}")
        }
        None => {
            let text: String = original.iter().collect();
            format!("{DEFAULT_SCHEME}{text}")
        }
    }
}
