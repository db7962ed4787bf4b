/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Export of the canvas document as a dated, pretty-printed JSON file.

use std::path::{Path, PathBuf};

use log::info;
use time::Date;
use time::macros::format_description;

use super::types::CanvasDocument;
use crate::app::LexiGraphApp;
use crate::services::suggest::SuggestionSource;

/// Current graph and viewport. Pure read.
pub fn export_document<S: SuggestionSource>(app: &LexiGraphApp<S>) -> CanvasDocument {
    app.snapshot()
}

pub fn to_pretty_json(document: &CanvasDocument) -> Result<String, ExportError> {
    serde_json::to_string_pretty(document).map_err(|e| ExportError::Encode(e.to_string()))
}

/// `word-canvas-YYYY-MM-DD.json`
pub fn export_file_name(date: Date) -> Result<String, ExportError> {
    let stamp = date
        .format(format_description!("[year]-[month]-[day]"))
        .map_err(|e| ExportError::Encode(e.to_string()))?;
    Ok(format!("word-canvas-{stamp}.json"))
}

/// Write `document` into `dir` and return the file path.
pub fn write_export(
    document: &CanvasDocument,
    dir: &Path,
    date: Date,
) -> Result<PathBuf, ExportError> {
    let path = dir.join(export_file_name(date)?);
    let json = to_pretty_json(document)?;
    std::fs::create_dir_all(dir)
        .map_err(|e| ExportError::Io(format!("Failed to create {}: {e}", dir.display())))?;
    std::fs::write(&path, json)
        .map_err(|e| ExportError::Io(format!("Failed to write {}: {e}", path.display())))?;
    info!("Exported {} nodes to {}", document.nodes.len(), path.display());
    Ok(path)
}

#[derive(Debug)]
pub enum ExportError {
    Encode(String),
    Io(String),
}

impl std::fmt::Display for ExportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportError::Encode(e) => write!(f, "Encode error: {e}"),
            ExportError::Io(e) => write!(f, "IO error: {e}"),
        }
    }
}

impl std::error::Error for ExportError {}
