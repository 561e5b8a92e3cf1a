//! UTF-8-safe text helpers for listing text
//!
//! Listing names and snippets are mostly Hangul (3 bytes per character), so
//! every truncation here works on character counts, never byte offsets.

/// Truncate to at most `max_chars` characters without splitting a code point.
///
/// # Examples
/// ```
/// # use placerank::utils::string_utils::safe_truncate_chars;
/// assert_eq!(safe_truncate_chars("스타벅스 강남점", 4), "스타벅스");
/// assert_eq!(safe_truncate_chars("Hi", 100), "Hi");
/// ```
#[inline]
pub fn safe_truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        None => s,
        Some((byte_idx, _)) => &s[..byte_idx],
    }
}

/// Collapse runs of whitespace (including newlines) into single spaces.
///
/// # Examples
/// ```
/// # use placerank::utils::string_utils::collapse_whitespace;
/// assert_eq!(collapse_whitespace("  교촌치킨\n\n  역삼점 "), "교촌치킨 역삼점");
/// ```
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Fill a `{name}` style template.
///
/// Unknown placeholders are left untouched.
pub fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = template.to_string();
    for (key, value) in values {
        out = out.replace(&format!("{{{key}}}"), value);
    }
    out
}
