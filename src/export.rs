//! Export the catalog snapshot as JSON.
//!
//! Produces a single document with the derived property definitions and the
//! loaded items (counters overlaid), suitable for a static site build or
//! for debugging what the CMS currently returns.

use anyhow::Result;
use serde::Serialize;
use std::path::Path;

use toolshelf_core::models::CatalogItem;
use toolshelf_core::properties::PropertyDefinition;

use crate::config::Config;
use crate::listing::load_snapshot;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ExportData<'a> {
    generated_at: String,
    definitions: &'a [PropertyDefinition],
    items: &'a [CatalogItem],
}

/// Export definitions and items as JSON.
///
/// If `output` is `Some`, writes to that file path. Otherwise writes
/// to stdout for piping.
pub async fn run_export(config: &Config, output: Option<&Path>) -> Result<()> {
    let snapshot = load_snapshot(config).await?;

    let data = ExportData {
        generated_at: chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string(),
        definitions: &snapshot.definitions,
        items: &snapshot.items,
    };
    let json = serde_json::to_string_pretty(&data)?;

    match output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, &json)?;
            tracing::info!(
                definitions = snapshot.definitions.len(),
                items = snapshot.items.len(),
                path = %path.display(),
                "exported catalog"
            );
        }
        None => {
            println!("{}", json);
        }
    }

    Ok(())
}
