//! G-code word and comment extraction
//!
//! Shared scanning utilities for the parser and generator. Lines are
//! matched case-insensitively; callers pass the cleaned (comment-stripped,
//! uppercased) form to the word helpers and the original line to the
//! comment helpers.

use probekit_core::Axis;
use regex::Regex;
use std::sync::OnceLock;

fn comment_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\([^)]*\)").expect("invalid regex pattern"))
}

fn trailing_comment_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\(([^()]*)\)\s*$").expect("invalid regex pattern"))
}

fn axis_word_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"([XYZ])\s*([+-]?(?:\d+\.?\d*|\.\d+))").expect("invalid regex pattern")
    })
}

/// Strip comments, trim, and uppercase a line for command matching
///
/// A comment-only line cleans to the empty string; such lines are skipped
/// for command purposes but are not blank, so they never break the
/// consecutiveness of a buffer-clear block.
pub(crate) fn clean_line(raw: &str) -> String {
    comment_regex()
        .replace_all(raw, "")
        .trim()
        .to_ascii_uppercase()
}

/// Extract the trailing parenthesized comment of a line, if any
///
/// Works on the original (non-uppercased) line so descriptions keep their
/// authored casing.
pub(crate) fn trailing_comment(raw: &str) -> Option<String> {
    trailing_comment_regex()
        .captures(raw)
        .map(|caps| caps[1].trim().to_string())
}

/// Extract all axis letter/value pairs in the order they appear
pub(crate) fn axis_words(cleaned: &str) -> Vec<(Axis, f64)> {
    axis_word_regex()
        .captures_iter(cleaned)
        .filter_map(|caps| {
            let axis = Axis::from_char(caps[1].chars().next()?)?;
            let value = caps[2].parse::<f64>().ok()?;
            Some((axis, value))
        })
        .collect()
}

/// Extract the numeric value following a word letter (F, P, S)
///
/// Returns `None` when the letter is absent or carries no parseable
/// number; per the error-handling policy, a missing value is "not found"
/// rather than an error.
pub(crate) fn word_value(cleaned: &str, letter: char) -> Option<f64> {
    let bytes = cleaned.as_bytes();
    for (i, c) in cleaned.char_indices() {
        if c != letter {
            continue;
        }
        // Must be a word start, not the tail of another token.
        if i > 0 && (bytes[i - 1].is_ascii_alphanumeric() || bytes[i - 1] == b'.') {
            continue;
        }
        let rest = cleaned[i + c.len_utf8()..].trim_start();
        let number: String = rest
            .chars()
            .take_while(|ch| ch.is_ascii_digit() || *ch == '.' || *ch == '-' || *ch == '+')
            .collect();
        if let Ok(value) = number.parse::<f64>() {
            return Some(value);
        }
    }
    None
}

/// Whether a cleaned line contains a G/M/L code word at token granularity
///
/// `G0` must not match inside `G90`, and `M4` must not match `M40`: a code
/// occurrence only counts when the preceding character is not part of a
/// word and the following character is neither a digit nor a dot.
pub(crate) fn has_code(cleaned: &str, code: &str) -> bool {
    let bytes = cleaned.as_bytes();
    let mut start = 0;
    while let Some(pos) = cleaned[start..].find(code) {
        let at = start + pos;
        let end = at + code.len();
        let before_ok = at == 0 || !(bytes[at - 1].is_ascii_alphanumeric() || bytes[at - 1] == b'.');
        let after_ok = end >= cleaned.len() || {
            let next = bytes[end];
            !next.is_ascii_digit() && next != b'.'
        };
        if before_ok && after_ok {
            return true;
        }
        start = at + 1;
    }
    false
}

/// Render a number the way the dialect writes it
///
/// `f64` display already drops the fractional part of whole numbers
/// (`10.0` → `"10"`) and keeps significant decimals (`1.5875`), which is
/// exactly the canonical form.
pub(crate) fn fmt_num(value: f64) -> String {
    format!("{}", value)
}
