//! Tracing subscriber setup.
//!
//! Log lines go to stderr so command output on stdout stays pipeable.
//! `RUST_LOG` overrides the default `info` filter.

use tracing_subscriber::EnvFilter;

/// Install the global subscriber. Call once, at startup.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // A second init (e.g. from tests) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
