/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Word-relationship graph explorer.
//!
//! A typed word seeds a node; expanding a node asks a suggestion source for
//! semantically and visually similar words and merges them into a
//! deduplicated, persisted graph.

pub mod app;
pub mod cli;
pub mod config;
pub mod graph;
pub mod layout;
pub mod persistence;
pub mod services;

pub use app::{ExpandOutcome, ExpansionReport, LexiGraphApp, SeedOutcome};

pub const VERSION: &str = concat!("lexigraph/", env!("CARGO_PKG_VERSION"));

/// Install the global subscriber. `filter` wins over `RUST_LOG`; `log`
/// records are bridged into it.
#[cfg(feature = "tracing")]
pub fn init_tracing(filter: Option<&str>) {
    use tracing_subscriber::EnvFilter;

    let env_filter = match filter {
        Some(directives) => EnvFilter::new(directives),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    if tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .try_init()
        .is_err()
    {
        return;
    }
    tracing::debug!("{VERSION} tracing initialized");
}

#[cfg(not(feature = "tracing"))]
pub fn init_tracing(_filter: Option<&str>) {}
