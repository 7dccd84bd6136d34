//! In-memory [`CatalogSource`] and [`CounterStore`] implementations for
//! testing and WASM targets.
//!
//! Counters live behind a single `std::sync::Mutex`, so the like check and
//! the increment happen under one lock.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;

use crate::models::CatalogItem;

use super::{CatalogSource, CounterStore, ItemCounts, LikeOutcome, ViewOutcome};

/// Catalog held in memory.
pub struct InMemoryCatalog {
    items: Vec<CatalogItem>,
}

impl InMemoryCatalog {
    pub fn new(items: Vec<CatalogItem>) -> Self {
        Self { items }
    }
}

#[async_trait]
impl CatalogSource for InMemoryCatalog {
    fn name(&self) -> &str {
        "memory"
    }

    async fn fetch_catalog_items(&self) -> Result<Vec<CatalogItem>> {
        Ok(self.items.clone())
    }
}

/// A source that always fails. Useful for exercising degraded paths.
pub struct FailingCatalog;

#[async_trait]
impl CatalogSource for FailingCatalog {
    fn name(&self) -> &str {
        "failing"
    }

    async fn fetch_catalog_items(&self) -> Result<Vec<CatalogItem>> {
        bail!("catalog unavailable")
    }
}

#[derive(Default)]
struct CounterState {
    counts: HashMap<String, ItemCounts>,
    likes: HashSet<(String, String)>,
}

/// In-memory counters.
///
/// When built with [`InMemoryCounters::for_items`], ids outside that set are
/// not counted.
#[derive(Default)]
pub struct InMemoryCounters {
    known: Option<HashSet<String>>,
    state: Mutex<CounterState>,
}

impl InMemoryCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_items(items: &[CatalogItem]) -> Self {
        Self {
            known: Some(items.iter().map(|i| i.id.clone()).collect()),
            state: Mutex::new(CounterState::default()),
        }
    }

    fn accepts(&self, item_id: &str) -> bool {
        !item_id.trim().is_empty() && self.known.as_ref().map_or(true, |k| k.contains(item_id))
    }
}

#[async_trait]
impl CounterStore for InMemoryCounters {
    async fn increment_view(&self, item_id: &str) -> Result<ViewOutcome> {
        if !self.accepts(item_id) {
            return Ok(ViewOutcome::NotApplicable);
        }
        let mut state = self
            .state
            .lock()
            .map_err(|_| anyhow!("counter state poisoned"))?;
        state.counts.entry(item_id.to_string()).or_default().views += 1;
        Ok(ViewOutcome::Recorded)
    }

    async fn increment_like(&self, item_id: &str, identity: &str) -> Result<LikeOutcome> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| anyhow!("counter state poisoned"))?;
        let current = state.counts.get(item_id).map(|c| c.likes).unwrap_or(0);
        if !self.accepts(item_id) || identity.trim().is_empty() {
            return Ok(LikeOutcome {
                success: false,
                likes: current,
            });
        }
        if !state
            .likes
            .insert((item_id.to_string(), identity.to_string()))
        {
            return Ok(LikeOutcome {
                success: false,
                likes: current,
            });
        }
        let entry = state.counts.entry(item_id.to_string()).or_default();
        entry.likes += 1;
        Ok(LikeOutcome {
            success: true,
            likes: entry.likes,
        })
    }

    async fn counts(&self, item_ids: &[String]) -> Result<HashMap<String, ItemCounts>> {
        let state = self
            .state
            .lock()
            .map_err(|_| anyhow!("counter state poisoned"))?;
        Ok(item_ids
            .iter()
            .filter_map(|id| state.counts.get(id).map(|c| (id.clone(), *c)))
            .collect())
    }
}
