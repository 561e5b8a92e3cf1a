//! Place identifier (CID) recovery from listing markup

use regex::Regex;
use std::sync::LazyLock;

/// Href shapes that embed a numeric place id, most specific first
static HREF_ID_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"/p/(?:entry/place/)?(\d{4,})",
        r"/restaurant/(\d{4,})",
        r"/place/(\d{4,})",
        r"/hospital/(\d{4,})",
        r"/hairshop/(\d{4,})",
        r"[?&]cid=(\d{4,})",
        r"[?&]id=(\d{4,})",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("HREF_ID_PATTERNS: hardcoded regex is valid"))
    .collect()
});

static NCLICK_CID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[,\s])cid:(\d{4,})").expect("NCLICK_CID: hardcoded regex is valid")
});

/// Attributes carrying the id directly
pub const ID_ATTRIBUTES: [&str; 3] = ["data-cid", "data-place-id", "data-id"];

#[must_use]
pub fn from_href(href: &str) -> Option<String> {
    HREF_ID_PATTERNS
        .iter()
        .find_map(|re| re.captures(href).map(|c| c[1].to_string()))
}

/// Parse `cid:NNN` out of a click-tracking attribute
#[must_use]
pub fn from_nclick(value: &str) -> Option<String> {
    NCLICK_CID.captures(value).map(|c| c[1].to_string())
}

/// Accept a bare attribute value only when it is a plausible numeric id
#[must_use]
pub fn from_attribute(value: &str) -> Option<String> {
    let value = value.trim();
    (value.len() >= 4 && value.bytes().all(|b| b.is_ascii_digit())).then(|| value.to_string())
}
