//! End-to-end tests for the HTTP API.
//!
//! Each test starts the real axum server on a free port with an in-memory
//! catalog and a temporary counter database, then drives it with `reqwest`.

use serde_json::Value;
use std::sync::Arc;
use tempfile::TempDir;

use toolshelf::config::Config;
use toolshelf::models::{CatalogItem, PropertyType, PropertyValue};
use toolshelf::server::run_server_with_source;
use toolshelf::store::memory::InMemoryCatalog;
use toolshelf::store::CatalogSource;

// ─── Helpers ────────────────────────────────────────────────────────

fn test_config(tmp: &TempDir, port: u16) -> Config {
    let config_content = format!(
        r#"
[catalog]
source = "file"
path = "{}/unused.json"

[listing]
page_size = 2

[db]
path = "{}/counters.sqlite"

[server]
bind = "127.0.0.1:{}"
"#,
        tmp.path().display(),
        tmp.path().display(),
        port
    );
    toml::from_str(&config_content).unwrap()
}

fn catalog() -> Vec<CatalogItem> {
    vec![
        CatalogItem {
            short_description: Some("Edit video right in the browser".into()),
            ..CatalogItem::new("clipforge", "ClipForge")
        }
        .with_property(PropertyValue {
            display_name: Some("Pricing".into()),
            filter_priority: toolshelf::models::FilterPriority::Main,
            ..PropertyValue::new("pricing", PropertyType::Select, "free")
        })
        .with_property(PropertyValue::new(
            "platform",
            PropertyType::Multiselect,
            "web, ios",
        )),
        CatalogItem {
            short_description: Some("Desktop editor for video teams".into()),
            ..CatalogItem::new("framekit", "FrameKit Video Editor")
        }
        .with_property(PropertyValue::new("pricing", PropertyType::Select, "paid"))
        .with_property(PropertyValue::new(
            "platform",
            PropertyType::Multiselect,
            "macos",
        )),
        CatalogItem::new("inkwell", "Inkwell")
            .with_property(PropertyValue::new("pricing", PropertyType::Select, "free"))
            .with_property(PropertyValue::new("rating", PropertyType::Number, "4.5")),
    ]
}

fn find_free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

async fn wait_for_server(port: u16) {
    let client = reqwest::Client::new();
    let url = format!("http://127.0.0.1:{}/health", port);
    for _ in 0..50 {
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        if let Ok(resp) = client.get(&url).send().await {
            if resp.status().is_success() {
                return;
            }
        }
    }
    panic!("Server did not become ready within 5 seconds");
}

/// Start a server in the background and return its base URL.
async fn start_server(tmp: &TempDir) -> String {
    let port = find_free_port();
    let cfg = test_config(tmp, port);
    let source: Arc<dyn CatalogSource> = Arc::new(InMemoryCatalog::new(catalog()));

    tokio::spawn(async move {
        run_server_with_source(&cfg, source).await.unwrap();
    });
    wait_for_server(port).await;

    format!("http://127.0.0.1:{}", port)
}

// ─── Tests ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_health_and_properties() {
    let tmp = TempDir::new().unwrap();
    let base = start_server(&tmp).await;
    let client = reqwest::Client::new();

    let health: Value = client
        .get(format!("{}/health", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["status"], "ok");
    assert_eq!(health["version"], env!("CARGO_PKG_VERSION"));

    let props: Value = client
        .get(format!("{}/properties", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let defs = props["definitions"].as_array().unwrap();
    assert_eq!(defs.len(), 2);
    assert_eq!(defs[0]["key"], "pricing");
    assert_eq!(defs[1]["options"], serde_json::json!(["ios", "macos", "web"]));

    let all: Value = client
        .get(format!("{}/properties?all=true", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(all["definitions"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_items_listing_filters_search_and_pages() {
    let tmp = TempDir::new().unwrap();
    let base = start_server(&tmp).await;
    let client = reqwest::Client::new();

    let listing: Value = client
        .get(format!("{}/items", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(listing["total"], 3);
    assert_eq!(listing["pageCount"], 2);
    assert_eq!(listing["items"].as_array().unwrap().len(), 2);
    assert_eq!(listing["facets"]["main"][0]["key"], "pricing");

    let listing: Value = client
        .get(format!("{}/items?q=video&pricing=free,paid", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(listing["total"], 2);
    assert_eq!(listing["items"][0]["id"], "framekit");

    let listing: Value = client
        .get(format!("{}/items?pricing=free&page=2", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(listing["total"], 2);
    assert_eq!(listing["page"], 1);

    let listing: Value = client
        .get(format!("{}/items?page=0", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(listing["page"], 1);
    assert_eq!(listing["items"][0]["id"], "clipforge");

    let resp = client
        .get(format!("{}/items?page=abc", base))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "bad_request");
}

#[tokio::test]
async fn test_get_item_and_not_found() {
    let tmp = TempDir::new().unwrap();
    let base = start_server(&tmp).await;
    let client = reqwest::Client::new();

    let item: Value = client
        .get(format!("{}/items/clipforge", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(item["name"], "ClipForge");
    assert_eq!(item["displayProperties"].as_array().unwrap().len(), 2);

    let resp = client
        .get(format!("{}/items/missing", base))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "not_found");
}

#[tokio::test]
async fn test_view_and_like_counters() {
    let tmp = TempDir::new().unwrap();
    let base = start_server(&tmp).await;
    let client = reqwest::Client::new();

    let view: Value = client
        .post(format!("{}/items/inkwell/view", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(view["status"], "ok");

    let view: Value = client
        .post(format!("{}/items/missing/view", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(view["status"], "not_applicable");

    let like = |forwarded: &'static str| {
        client
            .post(format!("{}/items/inkwell/like", base))
            .header("x-forwarded-for", forwarded)
            .send()
    };

    let first: Value = like("203.0.113.7").await.unwrap().json().await.unwrap();
    assert_eq!(first["success"], true);
    assert_eq!(first["likes"], 1);

    let repeat: Value = like("203.0.113.7, 10.0.0.1").await.unwrap().json().await.unwrap();
    assert_eq!(repeat["success"], false);
    assert_eq!(repeat["likes"], 1);

    let other: Value = like("198.51.100.2").await.unwrap().json().await.unwrap();
    assert_eq!(other["success"], true);
    assert_eq!(other["likes"], 2);

    let item: Value = client
        .get(format!("{}/items/inkwell", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(item["views"], 1);
    assert_eq!(item["likes"], 2);

    let resp = client
        .post(format!("{}/items/missing/like", base))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}
