//! Text normalization shared by the adapters and the reconciler.

use regex::Regex;
use std::sync::LazyLock;

static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]+>").expect("valid tag pattern"));

static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace pattern"));

static YEAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{4})").expect("valid year pattern"));

/// Characters with meaning in the DOAJ query syntax
const DOAJ_SPECIAL: &[char] = &[
    '+', '-', '!', '(', ')', '{', '}', '[', ']', '^', '"', '~', '*', '?', ':', '\\', '/',
];

/// Provider language codes and their two-letter equivalents
const LANGUAGE_TABLE: &[(&str, &str)] = &[("eng", "en"), ("por", "pt"), ("spa", "es"), ("fra", "fr")];

/// Strip markup tags and collapse whitespace
pub fn clean_abstract(raw: &str) -> String {
    let without_tags = TAG_RE.replace_all(raw, " ");
    collapse_whitespace(&without_tags)
}

/// Collapse runs of whitespace to single spaces and trim
pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE_RE.replace_all(text, " ").trim().to_string()
}

/// Lowercase, collapse internal whitespace, trim
pub fn normalize_title(title: &str) -> String {
    collapse_whitespace(&title.to_lowercase())
}

/// Map a provider language code through the fixed table; unmapped codes pass through
pub fn map_language(code: &str) -> String {
    let code = code.trim();
    LANGUAGE_TABLE
        .iter()
        .find(|(from, _)| *from == code)
        .map(|(_, to)| to.to_string())
        .unwrap_or_else(|| code.to_string())
}

/// Optional variant of [`map_language`]; blank codes become `None`
pub fn map_language_opt(code: Option<&str>) -> Option<String> {
    code.map(map_language).filter(|c| !c.is_empty())
}

/// Backslash-escape DOAJ query metacharacters
pub fn escape_doaj_query(q: &str) -> String {
    let mut escaped = String::with_capacity(q.len());
    for c in q.chars() {
        if DOAJ_SPECIAL.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// First run of four digits in a date string, as a year
pub fn first_year(date: &str) -> Option<i32> {
    YEAR_RE
        .captures(date)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}
