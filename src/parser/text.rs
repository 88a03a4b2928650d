use std::sync::LazyLock;

use regex::Regex;

static MARKUP_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());

pub fn strip_markup(s: &str) -> String {
    MARKUP_RE.replace_all(s, "").into_owned()
}

pub fn remove_whitespace(s: &str) -> String {
    s.chars().filter(|c| !c.is_whitespace()).collect()
}

pub fn remove_line_breaks(s: &str) -> String {
    s.replace(['\r', '\n'], "")
}

/// Markup and line breaks removed, surrounding whitespace trimmed. Used for skill
/// names (the dedup key) and effect text.
pub fn prose(s: &str) -> String {
    remove_line_breaks(&strip_markup(s)).trim().to_string()
}

/// Markup and every whitespace character removed.
pub fn compact(s: &str) -> String {
    remove_whitespace(&strip_markup(s))
}

/// Integer after removing markup, whitespace and each of `noise`; zero if unparsable.
pub fn parse_int(s: &str, noise: &[&str]) -> i64 {
    let mut cleaned = compact(s);
    for n in noise {
        cleaned = cleaned.replace(n, "");
    }
    cleaned.parse().unwrap_or(0)
}

/// Max-level stat written as `base+bonus+...`; unparsable parts count as zero and a sum
/// that overflows reads as zero.
pub fn sum_stats(s: &str) -> i64 {
    compact(s)
        .split('+')
        .try_fold(0i64, |acc, part| acc.checked_add(parse_int(part, &[","])))
        .unwrap_or(0)
}
