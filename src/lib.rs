//! # Toolshelf
//!
//! A directory of tools backed by a headless CMS, with faceted filtering,
//! free-text ranking, pagination and view/like counters.
//!
//! The listing pipeline itself lives in [`toolshelf_core`] and is pure. This
//! crate wires it to the outside world: configuration, catalog loaders, the
//! SQLite counter store, the `shelf` CLI, and the HTTP API.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌──────────────────────┐   ┌──────────┐
//! │   Loader    │──▶│   toolshelf-core     │◀──│ Counters │
//! │ File / HTTP │   │ schema·filter·rank·  │   │  SQLite  │
//! └─────────────┘   │ paginate             │   └──────────┘
//!                   └──────────┬───────────┘
//!                      ┌───────┴───────┐
//!                      ▼               ▼
//!                 ┌──────────┐   ┌──────────┐
//!                 │   CLI    │   │   HTTP   │
//!                 │ (shelf)  │   │  (axum)  │
//!                 └──────────┘   └──────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`loader`] | File and HTTP catalog sources |
//! | [`migrate`] | Counter schema |
//! | [`counters`] | SQLite connection and view/like counters |
//! | [`listing`] | `search` and `properties` commands |
//! | [`get`] | Single-item lookup |
//! | [`export`] | JSON snapshot export |
//! | [`server`] | HTTP API |
//! | [`logging`] | Tracing subscriber |

pub mod config;
pub mod counters;
pub mod export;
pub mod get;
pub mod listing;
pub mod loader;
pub mod logging;
pub mod migrate;
pub mod server;

pub use toolshelf_core::{filter, models, paginate, properties, search, store};
