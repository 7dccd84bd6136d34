//! Single-item retrieval.
//!
//! Used by both the `shelf get` CLI command and `GET /items/{id}`. The
//! response carries the raw property list (every declaration) and the
//! display list (first declaration per key) side by side.

use anyhow::{bail, Result};
use serde::Serialize;

use toolshelf_core::models::{CatalogItem, PropertyValue};

use crate::config::Config;
use crate::listing::{load_snapshot, CatalogSnapshot};

/// Item detail response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemResponse<'a> {
    #[serde(flatten)]
    pub item: &'a CatalogItem,
    pub display_properties: Vec<&'a PropertyValue>,
}

/// Look up `id` in a loaded snapshot.
pub fn get_item<'a>(snapshot: &'a CatalogSnapshot, id: &str) -> Result<ItemResponse<'a>> {
    match snapshot.find(id) {
        Some(item) => Ok(ItemResponse {
            item,
            display_properties: item.display_properties(),
        }),
        None => bail!("item not found: {}", id),
    }
}

pub async fn run_get(config: &Config, id: &str) -> Result<()> {
    let snapshot = load_snapshot(config).await?;
    let resp = get_item(&snapshot, id)?;
    let item = resp.item;

    println!("--- Item ---");
    println!("id:       {}", item.id);
    println!("name:     {}", item.name);
    if let Some(slug) = &item.slug {
        println!("slug:     {}", slug);
    }
    if let Some(price) = &item.price {
        println!("price:    {}", price);
    }
    if let Some(website) = &item.website {
        println!("website:  {}", website);
    }
    if !item.tags.is_empty() {
        println!("tags:     {}", item.tags.join(", "));
    }
    println!("views:    {}", item.views);
    println!("likes:    {}", item.likes);

    if let Some(desc) = &item.short_description {
        println!();
        println!("{}", desc);
    }

    if !resp.display_properties.is_empty() {
        println!();
        println!("--- Properties ---");
        for p in &resp.display_properties {
            let icon = p.icon().map(|i| format!("{} ", i)).unwrap_or_default();
            println!("{}{}: {}", icon, p.label(), p.value.trim());
        }
    }

    Ok(())
}
