//! Text canonicalization for owner names, addresses and title numbers.
//!
//! Canonical forms are the natural keys the table builder deduplicates and
//! joins on, so every function here is pure: the same input always yields
//! the same output. Absent values pass through as absent.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static WHITESPACE_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s{2,}").expect("valid whitespace pattern"));

/// Letter/digit runs. `_` and punctuation separate tokens.
static TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\p{L}\p{N}]+").expect("valid token pattern"));

static DISALLOWED_OWNER_CHARS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[^()A-Z0-9&@£$€¥#.,:; ]").expect("valid owner character pattern")
});

/// Collapse whitespace runs, trim and upper-case. Used for addresses and
/// title numbers.
pub fn canonicalize_text(value: Option<&str>) -> Option<String> {
    value.map(clean_text)
}

/// [`canonicalize_text`] plus `LTD` → `LIMITED` and removal of characters
/// outside the owner-name alphabet.
pub fn canonicalize_owner(value: Option<&str>) -> Option<String> {
    value.map(clean_owner)
}

fn clean_text(raw: &str) -> String {
    WHITESPACE_RUN.replace_all(raw.trim(), " ").to_uppercase()
}

fn clean_owner(raw: &str) -> String {
    let upper = clean_text(raw);
    let expanded = TOKEN.replace_all(&upper, |caps: &Captures| match &caps[0] {
        "LTD" => "LIMITED".to_string(),
        token => token.to_string(),
    });
    DISALLOWED_OWNER_CHARS.replace_all(&expanded, "").into_owned()
}
