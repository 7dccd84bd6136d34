//! Relevance search over catalog items.
//!
//! Ranking is a plain term-presence score, computed in memory for every
//! item that passes the facet filters. There is no index: catalogs are small
//! and the whole pipeline is re-run on every keystroke.
//!
//! # Scoring Algorithm
//!
//! 1. Lower-case the query, split on whitespace, strip every character that
//!    is not a word character or `-`, drop tokens shorter than 2 chars.
//! 2. Build the item haystack: name, short description, price, tags and the
//!    item's value tokens for every known property key, normalized the
//!    same way (whitespace kept).
//! 3. Per token: `+1` if it occurs in the haystack, `+2` more if it occurs in
//!    the lower-cased name, `+1.5` more if it occurs in the lower-cased short
//!    description.
//! 4. Sum over tokens.
//!
//! With no usable tokens every item scores `1` and the original order is
//! kept. Otherwise items scoring `0` are dropped and the rest are stably
//! sorted by score, descending.

use serde::Serialize;

use crate::filter::{matches_filters, FacetSelection};
use crate::models::CatalogItem;
use crate::properties::PropertyDefinition;

/// Score contributed by a token found anywhere in the haystack.
pub const BASE_WEIGHT: f64 = 1.0;
/// Extra score for a token found in the item name.
pub const NAME_BONUS: f64 = 2.0;
/// Extra score for a token found in the short description.
pub const DESCRIPTION_BONUS: f64 = 1.5;
/// Shorter query tokens are ignored.
pub const MIN_TOKEN_CHARS: usize = 2;

/// Score given to every item when the query has no usable tokens.
const NEUTRAL_SCORE: f64 = 1.0;

/// An item that passed filtering, with its relevance score.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SearchHit<'a> {
    #[serde(flatten)]
    pub item: &'a CatalogItem,
    pub score: f64,
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Split a free-text query into normalized search tokens.
pub fn tokenize_query(query: &str) -> Vec<String> {
    query
        .to_lowercase()
        .split_whitespace()
        .map(|t| {
            t.chars()
                .filter(|c| is_word_char(*c) || *c == '-')
                .collect::<String>()
        })
        .filter(|t| t.chars().count() >= MIN_TOKEN_CHARS)
        .collect()
}

/// Concatenated, normalized searchable text of `item`.
pub fn build_haystack(item: &CatalogItem, defs: &[PropertyDefinition]) -> String {
    let mut parts: Vec<&str> = vec![
        item.name.as_str(),
        item.short_description.as_deref().unwrap_or_default(),
        item.price.as_deref().unwrap_or_default(),
    ];
    parts.extend(item.tags.iter().map(String::as_str));
    for def in defs {
        parts.extend(item.values_for(&def.key));
    }

    parts
        .join(" ")
        .to_lowercase()
        .chars()
        .filter(|c| is_word_char(*c) || c.is_whitespace() || *c == '-')
        .collect()
}

fn score_tokens(item: &CatalogItem, tokens: &[String], defs: &[PropertyDefinition]) -> f64 {
    if tokens.is_empty() {
        return NEUTRAL_SCORE;
    }

    let haystack = build_haystack(item, defs);
    let name = item.name.to_lowercase();
    let description = item
        .short_description
        .as_deref()
        .map(str::to_lowercase)
        .unwrap_or_default();

    tokens
        .iter()
        .map(|t| {
            let mut s = 0.0;
            if haystack.contains(t.as_str()) {
                s += BASE_WEIGHT;
            }
            if name.contains(t.as_str()) {
                s += NAME_BONUS;
            }
            if description.contains(t.as_str()) {
                s += DESCRIPTION_BONUS;
            }
            s
        })
        .sum()
}

/// Relevance of `item` for `query`. Returns `1.0` for an empty query.
pub fn score(item: &CatalogItem, query: &str, defs: &[PropertyDefinition]) -> f64 {
    score_tokens(item, &tokenize_query(query), defs)
}

/// Apply facet filters, then rank by relevance.
///
/// Items failing the filters are dropped. With a non-empty query, items
/// scoring `0` are dropped too and the rest are sorted by score, descending,
/// ties keeping their input order. With an empty query the input order is
/// returned untouched.
pub fn filter_and_rank<'a>(
    items: &'a [CatalogItem],
    selected: &FacetSelection,
    query: &str,
    defs: &[PropertyDefinition],
) -> Vec<SearchHit<'a>> {
    let tokens = tokenize_query(query);
    let searching = !tokens.is_empty();

    let mut hits: Vec<SearchHit<'a>> = items
        .iter()
        .filter(|item| matches_filters(item, selected))
        .map(|item| SearchHit {
            item,
            score: score_tokens(item, &tokens, defs),
        })
        .filter(|hit| !searching || hit.score > 0.0)
        .collect();

    if searching {
        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
    }

    hits
}
