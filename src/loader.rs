//! Catalog loaders.
//!
//! Two [`CatalogSource`] implementations cover how the directory is fed:
//!
//! | Source | Reads |
//! |--------|-------|
//! | [`FileCatalog`] | A JSON export on disk |
//! | [`HttpCatalog`] | A headless CMS query endpoint |
//!
//! Both accept the same payload shapes: a bare JSON array of items, or an
//! object carrying the array under `result` (CMS query responses) or `items`.
//! Individual records that cannot be read as a [`CatalogItem`] are skipped
//! and counted in the log; they never fail the whole load.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::path::PathBuf;
use std::time::Duration;

use toolshelf_core::models::CatalogItem;
use toolshelf_core::store::{apply_counts, load_or_empty, CatalogSource, CounterStore};

use crate::config::{CatalogSourceKind, Config};

/// Extract catalog items from a loader payload.
pub fn parse_catalog(payload: Value) -> Result<Vec<CatalogItem>> {
    let records = match payload {
        Value::Array(records) => records,
        Value::Object(mut map) => match map.remove("result").or_else(|| map.remove("items")) {
            Some(Value::Array(records)) => records,
            Some(Value::Null) => Vec::new(),
            Some(_) => bail!("catalog payload field is not an array"),
            None => bail!("catalog payload has no 'result' or 'items' array"),
        },
        _ => bail!("catalog payload must be an array or an object"),
    };

    let total = records.len();
    let items: Vec<CatalogItem> = records
        .into_iter()
        .filter_map(|r| serde_json::from_value::<CatalogItem>(r).ok())
        .filter(|item| !item.id.trim().is_empty())
        .collect();

    if items.len() < total {
        tracing::warn!(
            skipped = total - items.len(),
            total,
            "skipped unreadable catalog records"
        );
    }

    Ok(items)
}

/// Catalog read from a JSON file.
pub struct FileCatalog {
    path: PathBuf,
}

impl FileCatalog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl CatalogSource for FileCatalog {
    fn name(&self) -> &str {
        "file"
    }

    async fn fetch_catalog_items(&self) -> Result<Vec<CatalogItem>> {
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read catalog file: {}", self.path.display()))?;
        let payload: Value = serde_json::from_str(&raw)
            .with_context(|| format!("Invalid JSON in catalog file: {}", self.path.display()))?;
        parse_catalog(payload)
    }
}

/// Catalog fetched from a headless CMS over HTTP.
pub struct HttpCatalog {
    client: reqwest::Client,
    url: String,
    token: Option<String>,
}

impl HttpCatalog {
    pub fn new(url: &str, token: Option<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.to_string(),
            token,
        })
    }
}

#[async_trait]
impl CatalogSource for HttpCatalog {
    fn name(&self) -> &str {
        "http"
    }

    async fn fetch_catalog_items(&self) -> Result<Vec<CatalogItem>> {
        let mut request = self.client.get(&self.url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let resp = request
            .send()
            .await
            .with_context(|| format!("Catalog request failed: {}", self.url))?;

        let status = resp.status();
        if !status.is_success() {
            bail!("Catalog endpoint returned {}", status);
        }

        let payload: Value = resp
            .json()
            .await
            .with_context(|| "Catalog endpoint returned invalid JSON")?;
        parse_catalog(payload)
    }
}

/// Build the configured catalog source.
pub fn catalog_source(config: &Config) -> Result<Box<dyn CatalogSource>> {
    let catalog = &config.catalog;
    match catalog.source {
        CatalogSourceKind::File => {
            let path = catalog
                .path
                .clone()
                .context("catalog.path must be set when catalog.source is 'file'")?;
            Ok(Box::new(FileCatalog::new(path)))
        }
        CatalogSourceKind::Http => {
            let url = catalog
                .url
                .as_deref()
                .context("catalog.url must be set when catalog.source is 'http'")?;
            Ok(Box::new(HttpCatalog::new(
                url,
                catalog.token.clone(),
                Duration::from_secs(catalog.timeout_secs),
            )?))
        }
    }
}

/// Load the catalog and overlay stored counters.
///
/// Loader failures yield an empty catalog. A counter lookup failure keeps
/// the items with the counts the source reported.
pub async fn load_catalog(
    source: &dyn CatalogSource,
    counters: Option<&dyn CounterStore>,
) -> Vec<CatalogItem> {
    let items = load_or_empty(source).await;

    let Some(counters) = counters else {
        return items;
    };
    if items.is_empty() {
        return items;
    }

    let ids: Vec<String> = items.iter().map(|i| i.id.clone()).collect();
    match counters.counts(&ids).await {
        Ok(counts) => apply_counts(items, &counts),
        Err(e) => {
            tracing::warn!(error = %e, "counter lookup failed, showing source counts");
            items
        }
    }
}
