/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Command-line front end.
//!
//! Each invocation restores the canvas, applies one command, flushes pending
//! writes and exits.

use std::path::PathBuf;
use std::sync::Arc;

use bpaf::Bpaf;
use euclid::default::Point2D;
use log::{info, warn};
use time::{Date, OffsetDateTime};
use tokio_util::sync::CancellationToken;

use crate::app::{ExpandOutcome, LexiGraphApp, SeedOutcome};
use crate::config::{ConfigError, EngineConfig};
use crate::graph::{ExpansionState, Viewport, resolve};
use crate::layout::RadialLayout;
use crate::persistence::export::{ExportError, export_document, to_pretty_json, write_export};
use crate::persistence::{FileStore, KeyValueStore, PersistenceBridge, StorageError};
use crate::services::history::SearchHistory;
use crate::services::settings::{ApiSettings, SettingsError};
use crate::services::suggest::{OpenAiCompatibleSource, SuggestError};

/// Explore word relationships as a growing graph.
#[derive(Debug, Clone, Bpaf)]
#[bpaf(options, version)]
pub struct Cli {
    /// Directory holding canvas, settings and history
    #[bpaf(long("data-dir"), argument("DIR"))]
    pub data_dir: Option<PathBuf>,

    /// Configuration file (default: <config dir>/lexigraph/config.toml)
    #[bpaf(long("config"), argument("FILE"))]
    pub config: Option<PathBuf>,

    /// Log filter, e.g. "info" or "lexigraph=debug" (falls back to RUST_LOG)
    #[bpaf(long("log"), argument("FILTER"))]
    pub log: Option<String>,

    #[bpaf(external(command))]
    pub command: Command,
}

#[derive(Debug, Clone, Bpaf)]
pub enum Command {
    /// Start a graph from a word, or locate it if already present
    #[bpaf(command)]
    Seed {
        #[bpaf(positional("WORD"))]
        word: String,
    },

    /// Fetch related words for a node on the canvas
    #[bpaf(command)]
    Expand {
        #[bpaf(positional("WORD"))]
        word: String,
    },

    /// Print the canvas
    #[bpaf(command)]
    Show {
        /// Print the raw canvas document
        #[bpaf(long("json"))]
        json: bool,
    },

    /// Move a node
    #[bpaf(command("move"))]
    Move {
        #[bpaf(positional("WORD"))]
        word: String,
        #[bpaf(positional("X"))]
        x: f32,
        #[bpaf(positional("Y"))]
        y: f32,
    },

    /// Set the canvas viewport
    #[bpaf(command)]
    Viewport {
        #[bpaf(positional("X"))]
        x: f32,
        #[bpaf(positional("Y"))]
        y: f32,
        #[bpaf(positional("ZOOM"))]
        zoom: f32,
    },

    /// Write word-canvas-YYYY-MM-DD.json
    #[bpaf(command)]
    Export {
        /// Target directory (default: current directory)
        #[bpaf(long("out"), argument("DIR"))]
        out: Option<PathBuf>,
    },

    /// Remove every node and edge
    #[bpaf(command)]
    Clear,

    /// Look up related words without touching the canvas
    #[bpaf(command)]
    Lookup {
        #[bpaf(positional("WORD"))]
        word: String,
    },

    /// Show or clear lookup history
    #[bpaf(command)]
    History {
        /// Forget all past lookups
        #[bpaf(long("clear"))]
        clear: bool,
    },

    /// Show or change API settings
    #[bpaf(command)]
    Settings {
        #[bpaf(long("api-url"), argument("URL"))]
        api_url: Option<String>,
        #[bpaf(long("api-key"), argument("KEY"))]
        api_key: Option<String>,
        #[bpaf(long("model"), argument("MODEL"))]
        model: Option<String>,
    },

    /// List models offered by the configured endpoint
    #[bpaf(command)]
    Models,
}

#[derive(Debug)]
pub enum CliError {
    NoDataDir,
    Config(ConfigError),
    Storage(StorageError),
    Settings(SettingsError),
    Suggest(SuggestError),
    Export(ExportError),
    /// Command ran but did not do what was asked.
    Refused(String),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::NoDataDir => write!(f, "No data directory available; pass --data-dir"),
            CliError::Config(e) => write!(f, "{e}"),
            CliError::Storage(e) => write!(f, "{e}"),
            CliError::Settings(e) => write!(f, "{e}"),
            CliError::Suggest(e) => write!(f, "{e}"),
            CliError::Export(e) => write!(f, "{e}"),
            CliError::Refused(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for CliError {}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::Config(e)
    }
}

impl From<StorageError> for CliError {
    fn from(e: StorageError) -> Self {
        CliError::Storage(e)
    }
}

impl From<SettingsError> for CliError {
    fn from(e: SettingsError) -> Self {
        CliError::Settings(e)
    }
}

impl From<SuggestError> for CliError {
    fn from(e: SuggestError) -> Self {
        CliError::Suggest(e)
    }
}

impl From<ExportError> for CliError {
    fn from(e: ExportError) -> Self {
        CliError::Export(e)
    }
}

fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    match chars.len() {
        0 => "(not set)".to_string(),
        1..=8 => "****".to_string(),
        n => {
            let head: String = chars[..3].iter().collect();
            let tail: String = chars[n - 4..].iter().collect();
            format!("{head}…{tail}")
        },
    }
}

fn state_label(state: ExpansionState) -> &'static str {
    match state {
        ExpansionState::Idle => "idle",
        ExpansionState::Expanding => "expanding",
        ExpansionState::Expanded => "expanded",
    }
}

fn print_canvas(app: &LexiGraphApp<OpenAiCompatibleSource>) {
    app.with_graph(|graph| {
        println!("{} nodes, {} edges", graph.node_count(), graph.edge_count());
        for node in graph.nodes() {
            let note = node
                .definition()
                .or_else(|| node.similarity_note())
                .unwrap_or("");
            println!(
                "  {:<20} ({:>8.1}, {:>8.1})  {:<9}  {note}",
                node.display_word,
                node.position.x,
                node.position.y,
                state_label(node.state)
            );
        }
        for edge in graph.edges() {
            println!("  {} -> {} [{}]", edge.source, edge.target, edge.kind.as_str());
        }
    });
}

/// Today's date in the local time zone, or UTC when the offset is unknown.
///
/// Call before any threads exist: the local offset cannot be read soundly
/// from a multi-threaded process on Unix.
pub fn local_today() -> Date {
    OffsetDateTime::now_local()
        .unwrap_or_else(|_| OffsetDateTime::now_utc())
        .date()
}

/// Execute one command against the stored state. `today` names exports.
pub async fn run(cli: Cli, today: Date) -> Result<(), CliError> {
    let config = EngineConfig::load(cli.config.as_deref())?;
    let data_dir = cli
        .data_dir
        .or_else(|| config.data_dir.clone())
        .or_else(FileStore::default_dir)
        .ok_or(CliError::NoDataDir)?;
    let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::open(data_dir)?);
    let settings = ApiSettings::load(store.as_ref());

    match cli.command {
        Command::Settings {
            api_url,
            api_key,
            model,
        } => {
            let changed = api_url.is_some() || api_key.is_some() || model.is_some();
            let updated = ApiSettings {
                api_url: api_url.unwrap_or(settings.api_url),
                api_key: api_key.unwrap_or(settings.api_key),
                selected_model: model.unwrap_or(settings.selected_model),
            };
            if changed {
                updated.save(store.as_ref())?;
                info!("Saved API settings");
            }
            println!("api url: {}", updated.api_url);
            println!("api key: {}", mask_key(&updated.api_key));
            println!("model:   {}", updated.model());
            Ok(())
        },
        Command::Models => {
            let source = OpenAiCompatibleSource::new(settings, config.request_timeout())?;
            for id in source.list_models().await? {
                println!("{id}");
            }
            Ok(())
        },
        Command::History { clear } => {
            let history = SearchHistory::new(store);
            if clear {
                history.clear();
                println!("History cleared");
                return Ok(());
            }
            for record in history.entries() {
                let when = OffsetDateTime::from_unix_timestamp_nanos(
                    i128::from(record.timestamp) * 1_000_000,
                )
                .map(|at| at.date().to_string())
                .unwrap_or_default();
                println!(
                    "{:<20} {when}  {} semantic, {} similar",
                    record.word,
                    record.semantic_words.len(),
                    record.similar_words.len()
                );
            }
            Ok(())
        },
        Command::Lookup { word } => {
            let source = OpenAiCompatibleSource::new(settings, config.request_timeout())?;
            let history = SearchHistory::new(store);
            let Some(record) = history.lookup(&source, &word).await? else {
                return Err(CliError::Refused("Nothing to look up".to_string()));
            };
            println!("Semantic:");
            for item in &record.semantic_words {
                println!("  {:<20} {}", item.word, item.definition);
            }
            println!("Similar spelling:");
            for item in &record.similar_words {
                println!("  {:<20} {}", item.word, item.similarity);
            }
            Ok(())
        },
        command => {
            let source = OpenAiCompatibleSource::new(settings, config.request_timeout())?;
            let bridge = Arc::new(PersistenceBridge::new(store, config.persist_debounce()));
            let cancel = CancellationToken::new();
            let autosave = bridge
                .clone()
                .spawn_autosave(config.autosave_tick(), cancel.clone());
            let app = LexiGraphApp::restore(
                source,
                RadialLayout::new(config.layout_radius),
                bridge,
            );

            let result = run_canvas_command(&app, command, today).await;

            app.flush();
            cancel.cancel();
            if let Err(e) = autosave.await {
                warn!("Autosave task ended abnormally: {e}");
            }
            result
        },
    }
}

async fn run_canvas_command(
    app: &LexiGraphApp<OpenAiCompatibleSource>,
    command: Command,
    today: Date,
) -> Result<(), CliError> {
    match command {
        Command::Seed { word } => match app.seed(&word).await {
            SeedOutcome::Rejected => Err(CliError::Refused(format!(
                "'{word}' is not a word (letters and hyphens only)"
            ))),
            SeedOutcome::AlreadyPresent { key, focus } => {
                println!("'{key}' is already on the canvas at ({}, {})", focus.x, focus.y);
                Ok(())
            },
            SeedOutcome::Seeded { report, .. } => {
                println!(
                    "Seeded '{}': {} related, {} nodes and {} edges added",
                    report.word, report.related_count, report.nodes_added, report.edges_added
                );
                Ok(())
            },
            SeedOutcome::Failed { error, .. } => Err(error.into()),
        },
        Command::Expand { word } => match app.expand(&resolve(&word)).await {
            ExpandOutcome::Ignored => Err(CliError::Refused(format!(
                "'{word}' is not on the canvas or is already expanded"
            ))),
            ExpandOutcome::Failed(error) => Err(error.into()),
            ExpandOutcome::Expanded(report) => {
                println!(
                    "Expanded '{}': {} related, {} nodes and {} edges added",
                    report.word, report.related_count, report.nodes_added, report.edges_added
                );
                Ok(())
            },
        },
        Command::Show { json } => {
            if json {
                println!("{}", to_pretty_json(&app.snapshot())?);
            } else {
                print_canvas(app);
            }
            Ok(())
        },
        Command::Move { word, x, y } => {
            if app.move_node(&resolve(&word), Point2D::new(x, y)) {
                Ok(())
            } else {
                Err(CliError::Refused(format!("'{word}' is not on the canvas")))
            }
        },
        Command::Viewport { x, y, zoom } => {
            app.set_viewport(Viewport { x, y, zoom });
            Ok(())
        },
        Command::Export { out } => {
            let dir = out.unwrap_or_else(|| PathBuf::from("."));
            let path = write_export(&export_document(app), &dir, today)?;
            println!("{}", path.display());
            Ok(())
        },
        Command::Clear => {
            app.clear();
            println!("Canvas cleared");
            Ok(())
        },
        Command::Settings { .. }
        | Command::Models
        | Command::History { .. }
        | Command::Lookup { .. } => Ok(()),
    }
}
