//! # Toolshelf CLI (`shelf`)
//!
//! The `shelf` binary runs the listing pipeline against the configured
//! catalog, manages the counter database, and starts the HTTP API.
//!
//! ## Usage
//!
//! ```bash
//! shelf --config ./config/shelf.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `shelf init` | Create the counter database |
//! | `shelf properties` | List facet definitions derived from the catalog |
//! | `shelf search "<query>"` | Filter, rank and paginate the catalog |
//! | `shelf get <id>` | Show one item |
//! | `shelf view <id>` | Record a view |
//! | `shelf like <id> --identity <s>` | Record a like |
//! | `shelf export` | Dump definitions and items as JSON |
//! | `shelf serve` | Start the HTTP API |
//!
//! ## Examples
//!
//! ```bash
//! shelf search "video editor" --filter pricing=free --filter platform=web,ios
//! shelf search --filter category=design --page 2 --json
//! shelf properties --all
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use toolshelf::config;
use toolshelf::counters::SqliteCounters;
use toolshelf::store::{CounterStore, ViewOutcome};
use toolshelf::{export, get, listing, logging, migrate, server};

/// Toolshelf: faceted search over a headless-CMS tool catalog.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/shelf.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "shelf",
    about = "Toolshelf: faceted search over a headless-CMS tool catalog",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/shelf.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the counter database. Safe to run repeatedly.
    Init,

    /// List the property definitions derived from the catalog.
    ///
    /// By default only filterable (select/multiselect) properties are shown.
    Properties {
        /// Include every property type, not just facets.
        #[arg(long)]
        all: bool,

        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Filter, rank and paginate the catalog.
    Search {
        /// Free-text query. Omit to list in catalog order.
        query: Option<String>,

        /// Facet constraint `key=v1,v2`. Repeat for more keys.
        #[arg(long = "filter", short = 'f')]
        filters: Vec<String>,

        /// 1-based page number.
        #[arg(long, default_value_t = 1)]
        page: usize,

        /// Print the listing as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show one catalog item.
    Get {
        /// Item id.
        id: String,
    },

    /// Record a view for an item.
    View {
        /// Item id.
        id: String,
    },

    /// Record a like for an item, at most once per identity.
    Like {
        /// Item id.
        id: String,

        /// Caller identity (e.g. client address).
        #[arg(long)]
        identity: String,
    },

    /// Export property definitions and items as JSON.
    Export {
        /// Write to a file instead of stdout.
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Start the HTTP API on `[server].bind`.
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init();

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Properties { all, json } => {
            listing::run_properties(&cfg, all, json).await?;
        }
        Commands::Search {
            query,
            filters,
            page,
            json,
        } => {
            listing::run_search(&cfg, query.as_deref(), &filters, page, json).await?;
        }
        Commands::Get { id } => {
            get::run_get(&cfg, &id).await?;
        }
        Commands::View { id } => {
            let snapshot = listing::load_snapshot(&cfg).await?;
            let outcome = if snapshot.find(&id).is_some() {
                let counters = SqliteCounters::open(&cfg).await?;
                let outcome = counters.increment_view(&id).await?;
                counters.close().await;
                outcome
            } else {
                ViewOutcome::NotApplicable
            };
            match outcome {
                ViewOutcome::Recorded => println!("View recorded for {}", id),
                ViewOutcome::NotApplicable => println!("No view recorded for '{}'", id),
            }
        }
        Commands::Like { id, identity } => {
            let snapshot = listing::load_snapshot(&cfg).await?;
            if snapshot.find(&id).is_none() {
                anyhow::bail!("item not found: {}", id);
            }
            let counters = SqliteCounters::open(&cfg).await?;
            let outcome = counters.increment_like(&id, &identity).await?;
            counters.close().await;
            if outcome.success {
                println!("Liked {} ({} likes)", id, outcome.likes);
            } else {
                println!("Already liked {} ({} likes)", id, outcome.likes);
            }
        }
        Commands::Export { output } => {
            export::run_export(&cfg, output.as_deref()).await?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
