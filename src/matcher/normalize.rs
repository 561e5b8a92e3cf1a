//! Name normalization and character-bigram similarity

use std::collections::HashSet;

/// Trim, casefold and keep only word characters.
///
/// `char::is_alphanumeric` covers Hangul syllables, so "교촌 치킨 (강남점)"
/// becomes "교촌치킨강남점".
#[must_use]
pub fn normalize_name(name: &str) -> String {
    name.trim()
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_')
        .flat_map(char::to_lowercase)
        .collect()
}

fn bigrams(s: &str) -> HashSet<(char, char)> {
    let chars: Vec<char> = s.chars().collect();
    chars.windows(2).map(|w| (w[0], w[1])).collect()
}

/// Jaccard index over character bigrams, in `[0, 1]`
#[must_use]
pub fn bigram_jaccard(a: &str, b: &str) -> f64 {
    let left = bigrams(a);
    let right = bigrams(b);
    if left.is_empty() && right.is_empty() {
        return 0.0;
    }
    let shared = left.intersection(&right).count();
    let union = left.union(&right).count();
    shared as f64 / union as f64
}
