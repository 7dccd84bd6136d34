//! HTTP API for the tool directory.
//!
//! Serves the listing pipeline and the view/like counters as JSON so a
//! page renderer (or any browser client) can drive facets, search and
//! pagination without reimplementing them.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/health` | Health check (returns version) |
//! | `GET`  | `/properties` | Facet definitions (`?all=true` for every definition) |
//! | `GET`  | `/items` | One listing page: `?q=`, `?page=`, every other pair is a facet |
//! | `GET`  | `/items/{id}` | One item with its display properties |
//! | `POST` | `/items/{id}/view` | Record a view |
//! | `POST` | `/items/{id}/like` | Record a like from the calling client |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "page must be a non-negative integer" } }
//! ```
//!
//! Error codes: `bad_request` (400), `not_found` (404), `internal` (500).
//! The view endpoint never returns an error status: failures are logged and
//! reported as `not_applicable`.
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted so listing pages hosted
//! elsewhere can call the API directly.

use axum::{
    extract::{ConnectInfo, Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use toolshelf_core::filter::FacetSelection;
use toolshelf_core::listing::{run_listing, ListingState};
use toolshelf_core::properties::{facet_definitions, PropertyDefinition};
use toolshelf_core::store::{load_or_empty, CatalogSource, CounterStore, LikeOutcome, ViewOutcome};

use crate::config::Config;
use crate::counters::SqliteCounters;
use crate::get::get_item;
use crate::listing::CatalogSnapshot;
use crate::loader::{catalog_source, load_catalog};

/// Query keys with a fixed meaning on `GET /items`.
const RESERVED_KEYS: &[&str] = &["q", "page"];

/// Shared application state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
struct AppState {
    config: Arc<Config>,
    source: Arc<dyn CatalogSource>,
    counters: Arc<dyn CounterStore>,
}

impl AppState {
    /// Fetch the catalog with counters overlaid.
    async fn snapshot(&self) -> CatalogSnapshot {
        let items = load_catalog(self.source.as_ref(), Some(self.counters.as_ref())).await;
        CatalogSnapshot::new(items)
    }

    /// Whether the catalog currently lists `id`. Counters are skipped.
    async fn knows_item(&self, id: &str) -> bool {
        load_or_empty(self.source.as_ref())
            .await
            .iter()
            .any(|item| item.id == id)
    }
}

/// Starts the HTTP server using the configured catalog source.
///
/// Binds to the address configured in `[server].bind`, creates the counter
/// schema if needed, and runs until the process is terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let source: Arc<dyn CatalogSource> = Arc::from(catalog_source(config)?);
    run_server_with_source(config, source).await
}

/// Starts the HTTP server with an explicit catalog source.
///
/// Like [`run_server`], but the catalog comes from `source` instead of the
/// `[catalog]` section. Counters still use the configured database.
pub async fn run_server_with_source(
    config: &Config,
    source: Arc<dyn CatalogSource>,
) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();
    let counters = SqliteCounters::open(config).await?;

    let state = AppState {
        config: Arc::new(config.clone()),
        source,
        counters: Arc::new(counters),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/health", get(handle_health))
        .route("/properties", get(handle_properties))
        .route("/items", get(handle_list_items))
        .route("/items/{id}", get(handle_get_item))
        .route("/items/{id}/view", post(handle_view))
        .route("/items/{id}/like", post(handle_like))
        .layer(cors)
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "toolshelf server listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

/// Internal error type that converts into an Axum HTTP response.
#[derive(Debug)]
struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

fn not_found(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        code: "not_found".to_string(),
        message: message.into(),
    }
}

fn internal(err: anyhow::Error) -> AppError {
    tracing::error!(error = %err, "request failed");
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal".to_string(),
        message: err.to_string(),
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ GET /properties ============

#[derive(Deserialize)]
struct PropertiesParams {
    #[serde(default)]
    all: bool,
}

#[derive(Serialize)]
struct PropertiesResponse<'a> {
    definitions: Vec<&'a PropertyDefinition>,
}

async fn handle_properties(
    State(state): State<AppState>,
    Query(params): Query<PropertiesParams>,
) -> Response {
    let snapshot = state.snapshot().await;
    let definitions = if params.all {
        snapshot.definitions.iter().collect()
    } else {
        facet_definitions(&snapshot.definitions)
    };
    Json(PropertiesResponse { definitions }).into_response()
}

// ============ GET /items ============

/// Build the listing state from raw query pairs.
///
/// `q` is the search text and `page` the 1-based page. Every other pair is a
/// facet constraint; repeated keys and comma-separated values accumulate.
fn listing_state_from_query(pairs: &[(String, String)]) -> Result<ListingState, AppError> {
    let mut query = String::new();
    let mut page = 1;

    for (key, value) in pairs {
        match key.as_str() {
            "q" => query = value.clone(),
            "page" => {
                // Out-of-range pages are clamped by pagination; only
                // non-numeric input is rejected.
                page = value
                    .trim()
                    .parse::<usize>()
                    .map_err(|_| bad_request("page must be a non-negative integer"))?
                    .max(1);
            }
            _ => {}
        }
    }

    let selection = FacetSelection::from_pairs(
        pairs
            .iter()
            .filter(|(k, _)| !RESERVED_KEYS.contains(&k.as_str()))
            .map(|(k, v)| (k.as_str(), v.as_str())),
    );

    Ok(ListingState::new(selection, &query, page))
}

async fn handle_list_items(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Response, AppError> {
    let listing_state = listing_state_from_query(&pairs)?;
    let snapshot = state.snapshot().await;
    let listing = run_listing(
        &snapshot.items,
        &snapshot.definitions,
        &listing_state,
        state.config.listing.page_size,
    );
    Ok(Json(&listing).into_response())
}

// ============ GET /items/{id} ============

async fn handle_get_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let snapshot = state.snapshot().await;
    let item = get_item(&snapshot, &id).map_err(|e| not_found(e.to_string()))?;
    Ok(Json(&item).into_response())
}

// ============ POST /items/{id}/view ============

#[derive(Serialize)]
struct ViewResponse {
    status: &'static str,
}

async fn handle_view(State(state): State<AppState>, Path(id): Path<String>) -> Json<ViewResponse> {
    let outcome = if state.knows_item(&id).await {
        match state.counters.increment_view(&id).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!(item = %id, error = %e, "failed to record view");
                ViewOutcome::NotApplicable
            }
        }
    } else {
        ViewOutcome::NotApplicable
    };

    Json(ViewResponse {
        status: match outcome {
            ViewOutcome::Recorded => "ok",
            ViewOutcome::NotApplicable => "not_applicable",
        },
    })
}

// ============ POST /items/{id}/like ============

/// Caller identity for like deduplication: the first `X-Forwarded-For`
/// entry when present, otherwise the peer address.
fn client_identity(headers: &HeaderMap, peer: &SocketAddr) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| peer.ip().to_string())
}

async fn handle_like(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<LikeOutcome>, AppError> {
    if !state.knows_item(&id).await {
        return Err(not_found(format!("item not found: {}", id)));
    }

    let identity = client_identity(&headers, &peer);
    let outcome = state
        .counters
        .increment_like(&id, &identity)
        .await
        .map_err(internal)?;

    Ok(Json(outcome))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
        raw.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_listing_state_from_query() {
        let state = listing_state_from_query(&pairs(&[
            ("q", "video editor"),
            ("page", "2"),
            ("pricing", "free,paid"),
            ("platform", "web"),
            ("platform", "ios"),
        ]))
        .unwrap();

        assert_eq!(state.query(), "video editor");
        assert_eq!(state.page(), 2);
        assert_eq!(state.selection().len(), 2);
        assert_eq!(state.selection().get("platform").unwrap(), ["web", "ios"]);
        assert!(state.selection().get("q").is_none());
    }

    #[test]
    fn test_listing_state_rejects_bad_page() {
        assert!(listing_state_from_query(&pairs(&[("page", "zero")])).is_err());
        assert!(listing_state_from_query(&pairs(&[("page", "-1")])).is_err());
    }

    #[test]
    fn test_listing_state_clamps_page_zero() {
        let state = listing_state_from_query(&pairs(&[("page", "0")])).unwrap();
        assert_eq!(state.page(), 1);
    }

    #[test]
    fn test_client_identity_prefers_forwarded_for() {
        let peer: SocketAddr = "10.0.0.9:5000".parse().unwrap();
        let mut headers = HeaderMap::new();
        assert_eq!(client_identity(&headers, &peer), "10.0.0.9");

        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.7, 10.0.0.1"),
        );
        assert_eq!(client_identity(&headers, &peer), "203.0.113.7");
    }
}
