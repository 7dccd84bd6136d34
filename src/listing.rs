//! Listing commands: `shelf search` and `shelf properties`.
//!
//! Both load a fresh [`CatalogSnapshot`] (items plus derived property
//! definitions) and run the pure pipeline from `toolshelf_core` over it.

use anyhow::Result;

use toolshelf_core::filter::FacetSelection;
use toolshelf_core::listing::{run_listing, ListingState};
use toolshelf_core::models::CatalogItem;
use toolshelf_core::properties::{
    build_property_definitions, facet_definitions, PropertyDefinition,
};
use toolshelf_core::store::CounterStore;

use crate::config::Config;
use crate::counters::SqliteCounters;
use crate::loader::{catalog_source, load_catalog};

/// Items of one load plus the definitions derived from them.
///
/// Snapshots are immutable. A new load builds a new snapshot.
#[derive(Debug, Clone, Default)]
pub struct CatalogSnapshot {
    pub items: Vec<CatalogItem>,
    pub definitions: Vec<PropertyDefinition>,
}

impl CatalogSnapshot {
    pub fn new(items: Vec<CatalogItem>) -> Self {
        let definitions = build_property_definitions(&items);
        Self { items, definitions }
    }

    pub fn find(&self, id: &str) -> Option<&CatalogItem> {
        self.items.iter().find(|i| i.id == id)
    }
}

/// Load the configured catalog, overlaying counters when the counter
/// database already exists.
pub async fn load_snapshot(config: &Config) -> Result<CatalogSnapshot> {
    let source = catalog_source(config)?;

    let counters = if config.db.path.exists() {
        match SqliteCounters::open(config).await {
            Ok(c) => Some(c),
            Err(e) => {
                tracing::warn!(error = %e, "counter database unavailable");
                None
            }
        }
    } else {
        None
    };

    let items = load_catalog(
        source.as_ref(),
        counters.as_ref().map(|c| c as &dyn CounterStore),
    )
    .await;

    if let Some(c) = counters {
        c.close().await;
    }

    Ok(CatalogSnapshot::new(items))
}

/// One-line summary of the first-declared value per property key.
pub fn format_display_properties(item: &CatalogItem) -> String {
    item.display_properties()
        .into_iter()
        .filter(|p| !p.value.trim().is_empty())
        .map(|p| match p.icon() {
            Some(icon) => format!("{} {}: {}", icon, p.label(), p.value.trim()),
            None => format!("{}: {}", p.label(), p.value.trim()),
        })
        .collect::<Vec<_>>()
        .join(" · ")
}

pub async fn run_search(
    config: &Config,
    query: Option<&str>,
    filters: &[String],
    page: usize,
    json: bool,
) -> Result<()> {
    let selection = FacetSelection::parse_args(filters)?;
    let snapshot = load_snapshot(config).await?;

    let state = ListingState::new(selection, query.unwrap_or_default(), page);
    let listing = run_listing(
        &snapshot.items,
        &snapshot.definitions,
        &state,
        config.listing.page_size,
    );

    if json {
        println!("{}", serde_json::to_string_pretty(&listing)?);
        return Ok(());
    }

    if listing.page.items.is_empty() {
        println!("No results.");
        return Ok(());
    }

    println!(
        "Page {}/{} · {} results",
        listing.page.page, listing.page.page_count, listing.page.total
    );
    let offset = (listing.page.page - 1) * listing.page.page_size;
    for (i, hit) in listing.page.items.iter().enumerate() {
        let item = hit.item;
        println!(
            "{}. [{:.2}] {} ({})",
            offset + i + 1,
            hit.score,
            item.name,
            item.id
        );
        if let Some(desc) = item.short_description.as_deref() {
            println!("    {}", desc);
        }
        let props = format_display_properties(item);
        if !props.is_empty() {
            println!("    {}", props);
        }
    }

    Ok(())
}

pub async fn run_properties(config: &Config, all: bool, json: bool) -> Result<()> {
    let snapshot = load_snapshot(config).await?;
    let defs: Vec<&PropertyDefinition> = if all {
        snapshot.definitions.iter().collect()
    } else {
        facet_definitions(&snapshot.definitions)
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&defs)?);
        return Ok(());
    }

    if defs.is_empty() {
        println!("No properties.");
        return Ok(());
    }

    println!(
        "{:<20} {:<24} {:<12} {:<4} OPTIONS",
        "KEY", "NAME", "TYPE", "TIER"
    );
    for def in defs {
        println!(
            "{:<20} {:<24} {:<12} {:<4} {}",
            def.key,
            def.display_name,
            def.property_type.as_str(),
            def.filter_priority.rank(),
            def.options.join(", ")
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use toolshelf_core::models::{PropertyType, PropertyValue};

    #[test]
    fn test_display_properties_first_wins() {
        let item = CatalogItem::new("a", "Alpha")
            .with_property(PropertyValue {
                display_name: Some("Pricing".into()),
                icon: Some("$".into()),
                ..PropertyValue::new("pricing", PropertyType::Select, "free")
            })
            .with_property(PropertyValue::new("pricing", PropertyType::Select, "paid"))
            .with_property(PropertyValue::new("platform", PropertyType::Multiselect, "web, ios"));

        assert_eq!(
            format_display_properties(&item),
            "$ Pricing: free · platform: web, ios"
        );
    }

    #[test]
    fn test_snapshot_derives_definitions() {
        let snapshot = CatalogSnapshot::new(vec![CatalogItem::new("a", "Alpha").with_property(
            PropertyValue::new("pricing", PropertyType::Select, "free"),
        )]);
        assert_eq!(snapshot.definitions.len(), 1);
        assert!(snapshot.find("a").is_some());
        assert!(snapshot.find("b").is_none());
    }
}
