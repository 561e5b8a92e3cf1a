//! Structured-state extraction
//!
//! Result pages embed their client-side cache as a script assignment such as
//! `naver.search.ext.nmb.salt.__APOLLO_STATE__ = {...};`. The object is
//! parsed with a streaming deserializer that stops after one JSON value, so a
//! `};` inside a string literal can't cut it short.
//!
//! Listing records are the entries whose key starts with a known prefix.
//! Display order comes from, in priority:
//! 1. the first reference list in the cache that points at listing records
//! 2. an explicit numeric order field present on every record
//! 3. parsed distance, nearest first, unparseable last

use serde_json::{Map, Value};
use std::collections::HashSet;
use tracing::debug;

use super::ListingEntry;
use crate::config::RankConfig;

const ADDRESS_FIELDS: [&str; 4] = ["commonAddress", "roadAddress", "fullAddress", "address"];
const REVIEW_FIELDS: [&str; 3] = ["visitorReviewCount", "reviewCount", "totalReviewCount"];

pub struct StructuredStateParser {
    variables: Vec<String>,
    prefixes: Vec<String>,
    ad_fields: Vec<String>,
    order_fields: Vec<String>,
}

impl StructuredStateParser {
    #[must_use]
    pub fn new(
        variables: Vec<String>,
        prefixes: Vec<String>,
        ad_fields: Vec<String>,
        order_fields: Vec<String>,
    ) -> Self {
        Self {
            variables,
            prefixes,
            ad_fields,
            order_fields,
        }
    }

    #[must_use]
    pub fn from_config(config: &RankConfig) -> Self {
        let table = config.selectors();
        Self::new(
            table.state_variables.clone(),
            table.listing_prefixes.clone(),
            table.ad_fields.clone(),
            table.order_fields.clone(),
        )
    }

    /// Listings in display order, or empty when no usable state is present
    #[must_use]
    pub fn parse(&self, html: &str) -> Vec<ListingEntry> {
        for variable in &self.variables {
            let Some(state) = locate_state(html, variable) else {
                continue;
            };
            let entries = self.entries_from_state(&state);
            if !entries.is_empty() {
                debug!("{variable}: {} listing records", entries.len());
                return entries;
            }
        }
        Vec::new()
    }

    fn is_listing_key(&self, key: &str) -> bool {
        self.prefixes.iter().any(|p| key.starts_with(p.as_str()))
    }

    fn entries_from_state(&self, state: &Map<String, Value>) -> Vec<ListingEntry> {
        let keys: Vec<&String> = state.keys().filter(|k| self.is_listing_key(k)).collect();
        if keys.is_empty() {
            return Vec::new();
        }

        let key_set: HashSet<&str> = keys.iter().map(|k| k.as_str()).collect();
        if let Some(order) = reference_order(state, &key_set) {
            return order
                .iter()
                .filter_map(|key| state.get(key).and_then(|v| self.entry_from_record(v)))
                .collect();
        }

        let mut records: Vec<(&Value, ListingEntry)> = keys
            .iter()
            .filter_map(|key| {
                let record = state.get(key.as_str())?;
                self.entry_from_record(record).map(|entry| (record, entry))
            })
            .collect();

        let explicit: Option<Vec<u64>> = records
            .iter()
            .map(|(record, _)| self.order_value(record))
            .collect();

        match explicit {
            Some(order) => {
                let mut indexed: Vec<(u64, ListingEntry)> = order
                    .into_iter()
                    .zip(records.into_iter().map(|(_, e)| e))
                    .collect();
                indexed.sort_by_key(|(order, _)| *order);
                indexed.into_iter().map(|(_, e)| e).collect()
            }
            None => {
                records.sort_by(|(_, a), (_, b)| {
                    let da = a.distance.as_deref().and_then(parse_distance_m);
                    let db = b.distance.as_deref().and_then(parse_distance_m);
                    match (da, db) {
                        (Some(x), Some(y)) => x.total_cmp(&y),
                        (Some(_), None) => std::cmp::Ordering::Less,
                        (None, Some(_)) => std::cmp::Ordering::Greater,
                        (None, None) => std::cmp::Ordering::Equal,
                    }
                });
                records.into_iter().map(|(_, e)| e).collect()
            }
        }
    }

    fn order_value(&self, record: &Value) -> Option<u64> {
        self.order_fields.iter().find_map(|f| match record.get(f)? {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        })
    }

    fn entry_from_record(&self, record: &Value) -> Option<ListingEntry> {
        let name = string_field(record, "name")?;
        let mut entry = ListingEntry::new(name);
        entry.source_id = match record.get("id") {
            Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        };
        entry.category = string_field(record, "category");
        entry.address = ADDRESS_FIELDS.iter().find_map(|f| string_field(record, f));
        entry.distance = string_field(record, "distance");
        entry.review_count = REVIEW_FIELDS.iter().find_map(|f| count_field(record, f));
        entry.is_sponsored = self
            .ad_fields
            .iter()
            .any(|f| record.get(f).is_some_and(is_truthy));
        Some(entry)
    }
}

/// Find `<variable> = {` and parse exactly one JSON object from the brace
fn locate_state(html: &str, variable: &str) -> Option<Map<String, Value>> {
    let mut search_from = 0;
    while let Some(found) = html[search_from..].find(variable) {
        let after = search_from + found + variable.len();
        search_from = after;

        let rest = html[after..].trim_start();
        let Some(rest) = rest.strip_prefix('=') else {
            continue;
        };
        let rest = rest.trim_start();
        if !rest.starts_with('{') {
            continue;
        }

        let mut stream = serde_json::Deserializer::from_str(rest).into_iter::<Value>();
        match stream.next() {
            Some(Ok(Value::Object(map))) => return Some(map),
            Some(Err(e)) => debug!("{variable} assignment is not valid JSON: {e}"),
            _ => {}
        }
    }
    None
}

/// Depth-first search for the first array of `{"__ref": key}` items that
/// points at listing records
fn reference_order(state: &Map<String, Value>, listing_keys: &HashSet<&str>) -> Option<Vec<String>> {
    fn walk(value: &Value, keys: &HashSet<&str>, depth: usize) -> Option<Vec<String>> {
        if depth > 8 {
            return None;
        }
        match value {
            Value::Array(items) => {
                let refs: Vec<String> = items
                    .iter()
                    .filter_map(|item| item.get("__ref").and_then(Value::as_str))
                    .filter(|r| keys.contains(r))
                    .map(str::to_string)
                    .collect();
                if !refs.is_empty() {
                    return Some(refs);
                }
                items.iter().find_map(|item| walk(item, keys, depth + 1))
            }
            Value::Object(map) => map.values().find_map(|v| walk(v, keys, depth + 1)),
            _ => None,
        }
    }

    // listing records themselves never hold the ordering list
    state
        .iter()
        .filter(|(key, _)| !listing_keys.contains(key.as_str()))
        .find_map(|(_, value)| walk(value, listing_keys, 0))
}

fn string_field(record: &Value, field: &str) -> Option<String> {
    record
        .get(field)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn count_field(record: &Value, field: &str) -> Option<u64> {
    match record.get(field)? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => {
            let digits: String = s.chars().filter(char::is_ascii_digit).collect();
            digits.parse().ok()
        }
        _ => None,
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty() && s != "false" && s != "0",
        Value::Array(a) => !a.is_empty(),
        Value::Object(_) => true,
    }
}

/// Parse `"8.2km"`, `"350m"` or `"1,200m"` into meters
#[must_use]
pub fn parse_distance_m(text: &str) -> Option<f64> {
    let cleaned: String = text.trim().to_lowercase().replace(',', "");
    let (number, scale) = if let Some(n) = cleaned.strip_suffix("km") {
        (n, 1000.0)
    } else if let Some(n) = cleaned.strip_suffix('m') {
        (n, 1.0)
    } else {
        return None;
    };
    number.trim().parse::<f64>().ok().map(|v| v * scale)
}
