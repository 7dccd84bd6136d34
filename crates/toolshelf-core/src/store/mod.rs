//! Collaborator contracts for Toolshelf.
//!
//! The listing pipeline itself is pure. Everything it needs from the outside
//! world comes through two traits:
//!
//! | Trait | Purpose |
//! |-------|---------|
//! | [`CatalogSource`] | Load the catalog items (headless CMS, JSON file, memory) |
//! | [`CounterStore`] | View and like counters attached to items |
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use std::collections::HashMap;

use crate::models::CatalogItem;

/// Source of catalog items.
///
/// One fetch per page view. No ordering is assumed beyond "stable within
/// one fetch".
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Fetch every catalog item.
    async fn fetch_catalog_items(&self) -> Result<Vec<CatalogItem>>;
}

/// Result of recording a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewOutcome {
    Recorded,
    /// Nothing was counted (unknown or blank item id).
    NotApplicable,
}

/// Result of recording a like.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LikeOutcome {
    /// False when this identity already liked the item.
    pub success: bool,
    /// Like count after the call.
    pub likes: u64,
}

/// Current counters for one item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ItemCounts {
    pub views: u64,
    pub likes: u64,
}

/// View and like counters.
///
/// Likes are at most once per caller identity per item. How the identity is
/// derived (client address, session, account) is up to the caller.
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Add one view to `item_id`.
    async fn increment_view(&self, item_id: &str) -> Result<ViewOutcome>;

    /// Add one like from `identity` to `item_id`, unless already recorded.
    async fn increment_like(&self, item_id: &str, identity: &str) -> Result<LikeOutcome>;

    /// Counters for the given ids. Ids never counted are absent.
    async fn counts(&self, item_ids: &[String]) -> Result<HashMap<String, ItemCounts>>;
}

/// Fetch the catalog, degrading to an empty collection on failure.
///
/// The pipeline handles an empty catalog like any other, so callers render
/// an empty listing rather than an error page.
pub async fn load_or_empty<S: CatalogSource + ?Sized>(source: &S) -> Vec<CatalogItem> {
    match source.fetch_catalog_items().await {
        Ok(items) => {
            tracing::debug!(source = source.name(), items = items.len(), "catalog loaded");
            items
        }
        Err(e) => {
            tracing::warn!(source = source.name(), error = %e, "catalog load failed, using empty catalog");
            Vec::new()
        }
    }
}

/// Overlay stored counters onto freshly loaded items.
pub fn apply_counts(
    mut items: Vec<CatalogItem>,
    counts: &HashMap<String, ItemCounts>,
) -> Vec<CatalogItem> {
    for item in &mut items {
        if let Some(c) = counts.get(&item.id) {
            item.views = c.views;
            item.likes = c.likes;
        }
    }
    items
}
