//! CSS selector cascade over rendered result markup
//!
//! Used when the page carries no structured state. Item selectors are tried
//! in order; the first one that yields enough substantial items wins.

use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use std::sync::LazyLock;
use tracing::debug;

use super::{ListingEntry, identifier};
use crate::config::RankConfig;
use crate::error::{RankError, RankResult};
use crate::utils::{RAW_SNIPPET_CHARS, collapse_whitespace, safe_truncate_chars};

static LINK_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("a[href]").expect("BUG: hardcoded CSS selector 'a[href]' is invalid")
});

fn parse_all(selectors: &[String], what: &str) -> RankResult<Vec<Selector>> {
    selectors
        .iter()
        .map(|s| {
            Selector::parse(s).map_err(|e| RankError::config(format!("invalid {what} selector '{s}': {e:?}")))
        })
        .collect()
}

pub struct SelectorCascade {
    items: Vec<Selector>,
    names: Vec<Selector>,
    ad_markers: Vec<Selector>,
    ad_keywords: Vec<String>,
    min_items: usize,
    min_text_chars: usize,
}

impl SelectorCascade {
    /// # Errors
    ///
    /// Returns a configuration error naming the first selector that fails to parse.
    pub fn from_config(config: &RankConfig) -> RankResult<Self> {
        let table = config.selectors();
        Ok(Self {
            items: parse_all(&table.item_selectors, "item")?,
            names: parse_all(&table.name_selectors, "name")?,
            ad_markers: parse_all(config.ad_markers(), "ad marker")?,
            ad_keywords: config.ad_keywords().iter().map(|k| k.to_lowercase()).collect(),
            min_items: table.min_items,
            min_text_chars: table.min_item_text_chars,
        })
    }

    #[must_use]
    pub fn parse(&self, html: &str) -> Vec<ListingEntry> {
        let document = Html::parse_document(html);

        for (index, selector) in self.items.iter().enumerate() {
            let items = self.substantial_items(&document, selector);
            if items.len() >= self.min_items {
                debug!("item selector #{index} matched {} items", items.len());
                return items
                    .into_iter()
                    .filter_map(|item| self.entry_from_item(item))
                    .collect();
            }
        }
        Vec::new()
    }

    /// Outermost matches with enough text; a match nested in another match is
    /// the same listing seen twice
    fn substantial_items<'a>(&self, document: &'a Html, selector: &Selector) -> Vec<ElementRef<'a>> {
        let matched: Vec<ElementRef<'a>> = document.select(selector).collect();
        let ids: HashSet<_> = matched.iter().map(|e| e.id()).collect();

        matched
            .into_iter()
            .filter(|element| !element.ancestors().any(|a| ids.contains(&a.id())))
            .filter(|element| {
                let text: String = element.text().collect();
                text.trim().chars().count() > self.min_text_chars
            })
            .collect()
    }

    fn entry_from_item(&self, item: ElementRef<'_>) -> Option<ListingEntry> {
        let name = self.item_name(item)?;
        let mut entry = ListingEntry::new(name);
        entry.source_id = item_source_id(item);
        entry.is_sponsored = self.is_sponsored(item);

        let text = collapse_whitespace(&item.text().collect::<Vec<_>>().join(" "));
        entry.raw_snippet = safe_truncate_chars(&text, RAW_SNIPPET_CHARS).to_string();
        Some(entry)
    }

    fn item_name(&self, item: ElementRef<'_>) -> Option<String> {
        let from_selectors = self.names.iter().find_map(|selector| {
            item.select(selector).find_map(|node| {
                let text = collapse_whitespace(&node.text().collect::<String>());
                let plausible =
                    text.chars().count() > 1 && !text.chars().all(|c| c.is_ascii_digit());
                plausible.then_some(text)
            })
        });

        from_selectors.or_else(|| {
            item.text()
                .map(str::trim)
                .find(|t| !t.is_empty())
                .map(collapse_whitespace)
        })
    }

    fn is_sponsored(&self, item: ElementRef<'_>) -> bool {
        let marked = self
            .ad_markers
            .iter()
            .any(|m| m.matches(&item) || item.select(m).next().is_some());
        if marked {
            return true;
        }

        item.text().flat_map(str::split_whitespace).any(|token| {
            let token = token
                .trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase();
            !token.is_empty() && self.ad_keywords.contains(&token)
        })
    }
}

fn item_source_id(item: ElementRef<'_>) -> Option<String> {
    let element = item.value();
    identifier::ID_ATTRIBUTES
        .iter()
        .find_map(|attr| element.attr(attr).and_then(identifier::from_attribute))
        .or_else(|| element.attr("data-nclick").and_then(identifier::from_nclick))
        .or_else(|| {
            item.select(&LINK_SELECTOR)
                .filter_map(|a| a.value().attr("href"))
                .find_map(identifier::from_href)
        })
}
