//! Page content to ordered listing entries
//!
//! Two strategies are tried in order and the first non-empty result wins:
//! 1. `StructuredState`: the serialized client-side cache embedded in the page
//! 2. `SelectorCascade`: CSS selectors over the rendered markup
//!
//! Ranks are assigned after extraction: non-sponsored entries are numbered
//! 1..n in display order and sponsored entries carry no rank.

pub mod identifier;
pub mod selectors;
pub mod structured;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::RankConfig;
use crate::error::RankResult;

pub use selectors::SelectorCascade;
pub use structured::StructuredStateParser;

/// One listing as displayed on the result page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingEntry {
    /// 1-based organic position; `None` for sponsored entries
    pub rank: Option<u32>,
    pub display_name: String,
    /// Stable place identifier (CID) when the page exposes one
    pub source_id: Option<String>,
    pub is_sponsored: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_count: Option<u64>,
    /// Truncated item text, for diagnostics only
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub raw_snippet: String,
}

impl ListingEntry {
    #[must_use]
    pub fn new(display_name: impl Into<String>) -> Self {
        Self {
            rank: None,
            display_name: display_name.into(),
            source_id: None,
            is_sponsored: false,
            category: None,
            address: None,
            distance: None,
            review_count: None,
            raw_snippet: String::new(),
        }
    }

    #[must_use]
    pub fn with_source_id(mut self, id: impl Into<String>) -> Self {
        self.source_id = Some(id.into());
        self
    }

    #[must_use]
    pub fn sponsored(mut self) -> Self {
        self.is_sponsored = true;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionStrategy {
    StructuredState,
    SelectorCascade,
}

#[derive(Debug, Clone, Default)]
pub struct Extraction {
    /// `None` when every strategy came back empty
    pub strategy: Option<ExtractionStrategy>,
    pub entries: Vec<ListingEntry>,
}

impl Extraction {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Number non-sponsored entries `offset + 1, offset + 2, ...` in order.
///
/// Returns how many entries were ranked.
pub fn assign_ranks(entries: &mut [ListingEntry], offset: u32) -> u32 {
    let mut next = offset;
    for entry in entries.iter_mut() {
        if entry.is_sponsored {
            entry.rank = None;
        } else {
            next += 1;
            entry.rank = Some(next);
        }
    }
    next - offset
}

pub struct ResultExtractor {
    structured: StructuredStateParser,
    cascade: SelectorCascade,
}

impl ResultExtractor {
    /// Build both strategies from config
    ///
    /// # Errors
    ///
    /// Returns a configuration error if any selector fails to parse.
    pub fn from_config(config: &RankConfig) -> RankResult<Self> {
        Ok(Self {
            structured: StructuredStateParser::from_config(config),
            cascade: SelectorCascade::from_config(config)?,
        })
    }

    /// Extract ranked entries. Deterministic: the same input always yields
    /// the same output.
    #[must_use]
    pub fn extract(&self, page_content: &str) -> Extraction {
        let structured = self.structured.parse(page_content);
        if !structured.is_empty() {
            return Self::ranked(ExtractionStrategy::StructuredState, structured);
        }
        let cascade = self.cascade.parse(page_content);
        if !cascade.is_empty() {
            return Self::ranked(ExtractionStrategy::SelectorCascade, cascade);
        }
        Extraction::default()
    }

    fn ranked(strategy: ExtractionStrategy, mut entries: Vec<ListingEntry>) -> Extraction {
        assign_ranks(&mut entries, 0);
        debug!("{strategy:?} extracted {} entries", entries.len());
        Extraction {
            strategy: Some(strategy),
            entries,
        }
    }
}
