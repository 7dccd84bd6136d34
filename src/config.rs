//! TOML configuration.
//!
//! ```toml
//! [catalog]
//! source = "http"                      # or "file"
//! url = "https://cms.example.com/v1/query?q=*[_type=='tool']"
//! token = "sk-..."                     # optional bearer token
//! timeout_secs = 15
//!
//! [listing]
//! page_size = 12
//!
//! [db]
//! path = "./data/counters.sqlite"
//!
//! [server]
//! bind = "127.0.0.1:7340"
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use toolshelf_core::paginate::DEFAULT_PAGE_SIZE;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub listing: ListingConfig,
    pub db: DbConfig,
    pub server: ServerConfig,
}

/// Where catalog items come from.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CatalogSourceKind {
    File,
    Http,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CatalogConfig {
    pub source: CatalogSourceKind,
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    15
}

#[derive(Debug, Deserialize, Clone)]
pub struct ListingConfig {
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub bind: String,
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    match config.catalog.source {
        CatalogSourceKind::File => {
            if config.catalog.path.is_none() {
                anyhow::bail!("catalog.path must be set when catalog.source is 'file'");
            }
        }
        CatalogSourceKind::Http => match config.catalog.url.as_deref() {
            None | Some("") => {
                anyhow::bail!("catalog.url must be set when catalog.source is 'http'")
            }
            Some(url) if !(url.starts_with("http://") || url.starts_with("https://")) => {
                anyhow::bail!("catalog.url must be an http(s) URL, got '{}'", url)
            }
            Some(_) => {}
        },
    }

    if config.catalog.timeout_secs == 0 {
        anyhow::bail!("catalog.timeout_secs must be > 0");
    }

    if config.listing.page_size == 0 {
        anyhow::bail!("listing.page_size must be >= 1");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> Result<Config> {
        let config: Config = toml::from_str(raw)?;
        validate(&config)?;
        Ok(config)
    }

    const BASE: &str = r#"
[db]
path = "/tmp/counters.sqlite"

[server]
bind = "127.0.0.1:7340"
"#;

    #[test]
    fn test_file_source_defaults() {
        let cfg = parse(&format!(
            "[catalog]\nsource = \"file\"\npath = \"catalog.json\"\n{}",
            BASE
        ))
        .unwrap();
        assert_eq!(cfg.catalog.source, CatalogSourceKind::File);
        assert_eq!(cfg.listing.page_size, 12);
        assert_eq!(cfg.catalog.timeout_secs, 15);
    }

    #[test]
    fn test_file_source_requires_path() {
        let err = parse(&format!("[catalog]\nsource = \"file\"\n{}", BASE)).unwrap_err();
        assert!(err.to_string().contains("catalog.path"));
    }

    #[test]
    fn test_http_source_requires_http_url() {
        let err = parse(&format!(
            "[catalog]\nsource = \"http\"\nurl = \"ftp://cms\"\n{}",
            BASE
        ))
        .unwrap_err();
        assert!(err.to_string().contains("catalog.url"));
    }

    #[test]
    fn test_zero_page_size_rejected() {
        let err = parse(&format!(
            "[catalog]\nsource = \"file\"\npath = \"c.json\"\n[listing]\npage_size = 0\n{}",
            BASE
        ))
        .unwrap_err();
        assert!(err.to_string().contains("page_size"));
    }

    #[test]
    fn test_unknown_source_rejected() {
        assert!(parse(&format!("[catalog]\nsource = \"ftp\"\n{}", BASE)).is_err());
    }
}
