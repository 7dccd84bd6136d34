//! Listing pipeline and its explicit view state.
//!
//! A [`ListingState`] carries everything the user controls (facet
//! selection, search text, current page) as one immutable value. Changing the
//! selection or the query yields a new state on page 1; only
//! [`ListingState::with_page`] moves between pages.
//!
//! [`run_listing`] is the whole read path in one call:
//! filter → rank → paginate, plus the facet tiers to render next to it.

use serde::{Deserialize, Serialize};

use crate::filter::FacetSelection;
use crate::models::CatalogItem;
use crate::paginate::{paginate, Page};
use crate::properties::{group_by_priority, FacetTiers, PropertyDefinition};
use crate::search::{filter_and_rank, SearchHit};

/// User-controlled listing inputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingState {
    selection: FacetSelection,
    query: String,
    page: usize,
}

impl Default for ListingState {
    fn default() -> Self {
        Self {
            selection: FacetSelection::default(),
            query: String::new(),
            page: 1,
        }
    }
}

impl ListingState {
    pub fn new(selection: FacetSelection, query: &str, page: usize) -> Self {
        Self {
            selection,
            query: query.to_string(),
            page: page.max(1),
        }
    }

    pub fn selection(&self) -> &FacetSelection {
        &self.selection
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn with_query(&self, query: &str) -> Self {
        Self::new(self.selection.clone(), query, 1)
    }

    pub fn with_selection(&self, selection: FacetSelection) -> Self {
        Self::new(selection, &self.query, 1)
    }

    pub fn with_facet_toggled(&self, key: &str, value: &str) -> Self {
        self.with_selection(self.selection.toggled(key, value))
    }

    pub fn with_facet_cleared(&self, key: &str) -> Self {
        self.with_selection(self.selection.cleared(key))
    }

    pub fn with_page(&self, page: usize) -> Self {
        Self::new(self.selection.clone(), &self.query, page)
    }
}

/// A rendered listing: one page of hits and the facets to show.
#[derive(Debug, Clone, Serialize)]
pub struct Listing<'a> {
    #[serde(flatten)]
    pub page: Page<SearchHit<'a>>,
    pub facets: FacetTiers<'a>,
}

/// Run filter, ranking and pagination for `state`.
pub fn run_listing<'a>(
    items: &'a [CatalogItem],
    defs: &'a [PropertyDefinition],
    state: &ListingState,
    page_size: usize,
) -> Listing<'a> {
    let hits = filter_and_rank(items, &state.selection, &state.query, defs);
    Listing {
        page: paginate(hits, state.page, page_size),
        facets: group_by_priority(defs),
    }
}
