//! Decide whether a listing is the tracked place
//!
//! Rules in priority order:
//! 1. both sides carry a place id: ids decide alone
//! 2. normalized names are equal
//! 3. one normalized name contains the other (both at least 3 chars)
//! 4. both raw names match the same brand alias pattern
//! 5. bigram Jaccard similarity at or above the threshold (both at least 4 chars)
//!
//! Empty normalized names never match.

pub mod normalize;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::RankConfig;
use crate::config::builder::compile_alias_pattern;
use crate::error::RankResult;
use crate::extract::ListingEntry;

pub use normalize::{bigram_jaccard, normalize_name};

const MIN_CONTAINMENT_CHARS: usize = 3;
const MIN_SIMILARITY_CHARS: usize = 4;

/// What the session is looking for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchTarget {
    pub name: String,
    pub id: Option<String>,
}

impl MatchTarget {
    #[must_use]
    pub fn new(name: impl Into<String>, id: Option<String>) -> Self {
        Self {
            name: name.into(),
            id: id.filter(|s| !s.trim().is_empty()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    Identifier,
    Exact,
    Containment,
    BrandAlias,
    Similarity,
}

#[derive(Debug, Clone)]
pub struct Matcher {
    threshold: f64,
    aliases: Vec<Regex>,
}

impl Matcher {
    #[must_use]
    pub fn new(threshold: f64, aliases: Vec<Regex>) -> Self {
        Self { threshold, aliases }
    }

    /// # Errors
    ///
    /// Returns a configuration error when an alias pattern does not compile.
    pub fn from_config(config: &RankConfig) -> RankResult<Self> {
        let aliases = if config.brand_aliases_compiled().len() == config.brand_aliases().len() {
            config.brand_aliases_compiled().to_vec()
        } else {
            // config was deserialized or defaulted without going through build()
            config
                .brand_aliases()
                .iter()
                .map(|p| compile_alias_pattern(p))
                .collect::<RankResult<Vec<_>>>()?
        };
        Ok(Self::new(config.match_threshold(), aliases))
    }

    #[must_use]
    pub fn is_match(&self, target: &MatchTarget, candidate: &ListingEntry) -> bool {
        self.match_kind(target, candidate).is_some()
    }

    #[must_use]
    pub fn match_kind(&self, target: &MatchTarget, candidate: &ListingEntry) -> Option<MatchKind> {
        if let (Some(want), Some(have)) = (target.id.as_deref(), candidate.source_id.as_deref()) {
            return (want == have).then_some(MatchKind::Identifier);
        }
        let kind = self.names_match(&target.name, &candidate.display_name);
        if let Some(kind) = kind {
            debug!("'{}' matched '{}' by {kind:?}", candidate.display_name, target.name);
        }
        kind
    }

    /// Name-only comparison. Symmetric in its arguments.
    #[must_use]
    pub fn names_match(&self, a: &str, b: &str) -> Option<MatchKind> {
        let left = normalize_name(a);
        let right = normalize_name(b);
        if left.is_empty() || right.is_empty() {
            return None;
        }
        if left == right {
            return Some(MatchKind::Exact);
        }

        let (left_len, right_len) = (left.chars().count(), right.chars().count());
        if left_len >= MIN_CONTAINMENT_CHARS
            && right_len >= MIN_CONTAINMENT_CHARS
            && (left.contains(&right) || right.contains(&left))
        {
            return Some(MatchKind::Containment);
        }

        let (raw_a, raw_b) = (a.to_lowercase(), b.to_lowercase());
        if self
            .aliases
            .iter()
            .any(|re| re.is_match(&raw_a) && re.is_match(&raw_b))
        {
            return Some(MatchKind::BrandAlias);
        }

        if left_len >= MIN_SIMILARITY_CHARS
            && right_len >= MIN_SIMILARITY_CHARS
            && bigram_jaccard(&left, &right) >= self.threshold
        {
            return Some(MatchKind::Similarity);
        }
        None
    }
}
