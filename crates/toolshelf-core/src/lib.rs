//! # Toolshelf Core
//!
//! Shared, WASM-safe logic for Toolshelf: catalog models, the property
//! schema builder, facet filtering, relevance ranking, pagination and the
//! collaborator traits for catalog loading and counters.
//!
//! This crate contains no tokio, sqlx, filesystem I/O, or other
//! native-only dependencies. Every pipeline stage is a pure function over an
//! in-memory item collection.
//!
//! ```text
//! CatalogSource ─▶ build_property_definitions ─▶ filter_and_rank ─▶ paginate
//! ```

pub mod filter;
pub mod listing;
pub mod models;
pub mod paginate;
pub mod properties;
pub mod search;
pub mod store;
