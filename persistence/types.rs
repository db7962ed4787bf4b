/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Serializable types for the canvas document.
//!
//! One schema serves both the persisted `canvasState` value and exports:
//! `{ nodes, edges, viewport }`. Unknown fields are ignored on read so
//! documents written by other canvas front ends still load.

use serde::{Deserialize, Serialize};

use crate::graph::{EdgeKind, Viewport};

/// Persisted 2-D position.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PersistedPosition {
    pub x: f32,
    pub y: f32,
}

/// Per-node payload.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PersistedWordData {
    /// Display surface form.
    pub word: String,
    #[serde(default)]
    pub definition: Option<String>,
    #[serde(default)]
    pub similarity: Option<String>,
    #[serde(default)]
    pub expanded: bool,
    /// In-flight expansion marker. Not restored: a reloaded node is never busy.
    #[serde(default)]
    pub loading: bool,
}

/// Persisted node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedNode {
    pub id: String,
    #[serde(default)]
    pub position: PersistedPosition,
    pub data: PersistedWordData,
}

/// Persisted edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    /// Absent in documents that only encode the kind as the id suffix.
    #[serde(default)]
    pub kind: Option<EdgeKind>,
}

impl PersistedEdge {
    /// Relation kind, falling back to the `-semantic` / `-visual` id suffix.
    pub fn resolved_kind(&self) -> Option<EdgeKind> {
        self.kind.or_else(|| {
            if self.id.ends_with("-semantic") {
                Some(EdgeKind::Semantic)
            } else if self.id.ends_with("-visual") {
                Some(EdgeKind::Visual)
            } else {
                None
            }
        })
    }
}

/// Full graph document.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CanvasDocument {
    #[serde(default)]
    pub nodes: Vec<PersistedNode>,
    #[serde(default)]
    pub edges: Vec<PersistedEdge>,
    #[serde(default)]
    pub viewport: Viewport,
}

impl CanvasDocument {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}
