/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Graph data structures for the word explorer.
//!
//! Core structures:
//! - `WordGraph`: main graph container backed by petgraph::StableGraph
//! - `WordNode`: one word with its annotation, position and expansion state
//! - `WordEdge`: a typed relation (`semantic` or `visual`) between two words
//!
//! Edge existence is symmetric per kind. The store keys edges by an unordered
//! `EdgePairKey`, so A→B and B→A of the same kind can never both exist.
//!
//! Boundary: `WordGraph` is plain data plus invariants. Rendering layers read
//! it through `to_document` snapshots; all writes go through the app layer.

pub mod identity;

use std::collections::HashMap;

use euclid::default::Point2D;
use log::debug;
use petgraph::Directed;
use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableGraph};
use serde::{Deserialize, Serialize};

pub use identity::{NodeId, is_plausible_word, resolve};

use crate::persistence::types::{
    CanvasDocument, PersistedEdge, PersistedNode, PersistedPosition, PersistedWordData,
};

/// Relation kind carried by an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    /// Similar meaning.
    Semantic,
    /// Similar spelling.
    Visual,
}

impl EdgeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EdgeKind::Semantic => "semantic",
            EdgeKind::Visual => "visual",
        }
    }

    /// Semantic edges are drawn animated.
    pub fn is_animated(self) -> bool {
        matches!(self, EdgeKind::Semantic)
    }

    /// Visual edges are drawn dashed.
    pub fn is_dashed(self) -> bool {
        matches!(self, EdgeKind::Visual)
    }
}

/// Per-node expansion lifecycle.
///
/// `Idle → Expanding` on expand start, `Expanding → Expanded` on completion,
/// `Expanding → Idle` on failure. `Expanded` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExpansionState {
    #[default]
    Idle,
    Expanding,
    Expanded,
}

impl ExpansionState {
    pub fn is_busy(self) -> bool {
        self == ExpansionState::Expanding
    }

    pub fn is_expanded(self) -> bool {
        self == ExpansionState::Expanded
    }

    /// Merge a partial flag update into the state machine.
    pub fn apply(self, update: NodeStateUpdate) -> Self {
        if self == ExpansionState::Expanded || update.expanded == Some(true) {
            return ExpansionState::Expanded;
        }
        match update.busy {
            Some(true) => ExpansionState::Expanding,
            Some(false) => ExpansionState::Idle,
            None => self,
        }
    }
}

/// Partial `{busy?, expanded?}` update for `WordGraph::set_node_state`.
///
/// `expanded: Some(false)` is accepted but never un-expands a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NodeStateUpdate {
    pub busy: Option<bool>,
    pub expanded: Option<bool>,
}

impl NodeStateUpdate {
    pub fn busy(busy: bool) -> Self {
        Self {
            busy: Some(busy),
            expanded: None,
        }
    }

    /// Expansion finished: not busy, expanded.
    pub fn completed() -> Self {
        Self {
            busy: Some(false),
            expanded: Some(true),
        }
    }
}

/// How a node was first introduced. A node carries at most one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Annotation {
    Definition(String),
    SimilarityNote(String),
}

/// A word node in the graph
#[derive(Debug, Clone, PartialEq)]
pub struct WordNode {
    /// Canonical key.
    pub id: NodeId,

    /// Surface form of the input that created the node.
    pub display_word: String,

    /// Definition or similarity note, fixed at creation.
    pub annotation: Option<Annotation>,

    /// Position in graph space
    pub position: Point2D<f32>,

    pub state: ExpansionState,
}

impl WordNode {
    pub fn new(display_word: impl Into<String>, position: Point2D<f32>) -> Self {
        let display_word = display_word.into();
        Self {
            id: resolve(&display_word),
            display_word,
            annotation: None,
            position,
            state: ExpansionState::Idle,
        }
    }

    pub fn with_annotation(mut self, annotation: Annotation) -> Self {
        self.annotation = Some(annotation);
        self
    }

    pub fn definition(&self) -> Option<&str> {
        match &self.annotation {
            Some(Annotation::Definition(text)) => Some(text),
            _ => None,
        }
    }

    pub fn similarity_note(&self) -> Option<&str> {
        match &self.annotation {
            Some(Annotation::SimilarityNote(text)) => Some(text),
            _ => None,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.state.is_busy()
    }

    pub fn is_expanded(&self) -> bool {
        self.state.is_expanded()
    }
}

/// A typed relation between two words.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordEdge {
    /// `"{source}-{target}-{kind}"`.
    pub id: String,
    pub source: NodeId,
    pub target: NodeId,
    pub kind: EdgeKind,
}

impl WordEdge {
    pub fn edge_id(source: &NodeId, target: &NodeId, kind: EdgeKind) -> String {
        format!("{source}-{target}-{}", kind.as_str())
    }
}

/// Direction-free identity of an edge: both endpoints sorted, plus kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EdgePairKey {
    low: NodeId,
    high: NodeId,
    kind: EdgeKind,
}

impl EdgePairKey {
    pub fn new(a: &NodeId, b: &NodeId, kind: EdgeKind) -> Self {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        Self {
            low: low.clone(),
            high: high.clone(),
            kind,
        }
    }
}

/// Canvas camera state, persisted alongside the graph.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub zoom: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            zoom: 1.0,
        }
    }
}

/// Main graph structure backed by petgraph::StableGraph
#[derive(Clone, Default)]
pub struct WordGraph {
    inner: StableGraph<WordNode, WordEdge, Directed>,

    /// Canonical key to node mapping.
    id_to_node: HashMap<NodeId, NodeIndex>,

    /// Unordered endpoint pair (per kind) to edge mapping.
    pair_to_edge: HashMap<EdgePairKey, EdgeIndex>,
}

impl WordGraph {
    /// Create a new empty graph
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_node(&self, id: &NodeId) -> bool {
        self.id_to_node.contains_key(id)
    }

    /// True when an edge of `kind` joins `a` and `b` in either direction.
    pub fn has_edge(&self, a: &NodeId, b: &NodeId, kind: EdgeKind) -> bool {
        self.pair_to_edge.contains_key(&EdgePairKey::new(a, b, kind))
    }

    /// Get a node by canonical key
    pub fn node(&self, id: &NodeId) -> Option<&WordNode> {
        let index = *self.id_to_node.get(id)?;
        self.inner.node_weight(index)
    }

    /// Insert `node` unless its key is taken. Returns whether it was inserted.
    ///
    /// An existing node is left untouched: annotation, position and state
    /// all stay as they were.
    pub fn upsert_node(&mut self, node: WordNode) -> bool {
        if node.id.is_empty() || self.id_to_node.contains_key(&node.id) {
            return false;
        }
        let id = node.id.clone();
        let index = self.inner.add_node(node);
        self.id_to_node.insert(id, index);
        true
    }

    /// Add a `source → target` edge unless an equivalent edge exists.
    ///
    /// Returns `false` for duplicates, self-loops and missing endpoints.
    pub fn add_edge(&mut self, source: &NodeId, target: &NodeId, kind: EdgeKind) -> bool {
        if source == target {
            return false;
        }
        let (Some(&from), Some(&to)) = (self.id_to_node.get(source), self.id_to_node.get(target))
        else {
            debug!("Refusing edge {source} -> {target}: endpoint missing");
            return false;
        };
        let pair = EdgePairKey::new(source, target, kind);
        if self.pair_to_edge.contains_key(&pair) {
            return false;
        }
        let edge = WordEdge {
            id: WordEdge::edge_id(source, target, kind),
            source: source.clone(),
            target: target.clone(),
            kind,
        };
        let index = self.inner.add_edge(from, to, edge);
        self.pair_to_edge.insert(pair, index);
        true
    }

    /// Merge a partial state update into a node. Returns `false` if absent.
    pub fn set_node_state(&mut self, id: &NodeId, update: NodeStateUpdate) -> bool {
        let Some(node) = self.node_mut(id) else {
            return false;
        };
        node.state = node.state.apply(update);
        true
    }

    /// Move a node (user drag). The engine never repositions existing nodes.
    pub fn set_node_position(&mut self, id: &NodeId, position: Point2D<f32>) -> bool {
        let Some(node) = self.node_mut(id) else {
            return false;
        };
        node.position = position;
        true
    }

    /// Remove a node and its incident edges. Returns the removed node.
    pub fn remove_node(&mut self, id: &NodeId) -> Option<WordNode> {
        let index = self.id_to_node.remove(id)?;
        let inner = &self.inner;
        self.pair_to_edge.retain(|_, edge| {
            inner
                .edge_endpoints(*edge)
                .is_some_and(|(a, b)| a != index && b != index)
        });
        self.inner.remove_node(index)
    }

    /// Remove every node and edge.
    pub fn clear(&mut self) {
        self.inner.clear();
        self.id_to_node.clear();
        self.pair_to_edge.clear();
    }

    /// Iterate over all nodes in insertion order
    pub fn nodes(&self) -> impl Iterator<Item = &WordNode> {
        self.inner
            .node_indices()
            .filter_map(move |idx| self.inner.node_weight(idx))
    }

    /// Iterate over all edges in insertion order
    pub fn edges(&self) -> impl Iterator<Item = &WordEdge> {
        self.inner
            .edge_indices()
            .filter_map(move |idx| self.inner.edge_weight(idx))
    }

    /// Edges touching `id`, in either direction.
    pub fn edges_of<'a>(&'a self, id: &'a NodeId) -> impl Iterator<Item = &'a WordEdge> + 'a {
        self.edges()
            .filter(move |edge| &edge.source == id || &edge.target == id)
    }

    /// Count of nodes in the graph
    pub fn node_count(&self) -> usize {
        self.inner.node_count()
    }

    /// Count of edges in the graph
    pub fn edge_count(&self) -> usize {
        self.inner.edge_count()
    }

    fn node_mut(&mut self, id: &NodeId) -> Option<&mut WordNode> {
        let index = *self.id_to_node.get(id)?;
        self.inner.node_weight_mut(index)
    }

    /// Serialize the graph to the canvas document schema
    pub fn to_document(&self, viewport: Viewport) -> CanvasDocument {
        let nodes = self
            .nodes()
            .map(|node| PersistedNode {
                id: node.id.to_string(),
                position: PersistedPosition {
                    x: node.position.x,
                    y: node.position.y,
                },
                data: PersistedWordData {
                    word: node.display_word.clone(),
                    definition: node.definition().map(str::to_string),
                    similarity: node.similarity_note().map(str::to_string),
                    expanded: node.is_expanded(),
                    loading: node.is_busy(),
                },
            })
            .collect();

        let edges = self
            .edges()
            .map(|edge| PersistedEdge {
                id: edge.id.clone(),
                source: edge.source.to_string(),
                target: edge.target.to_string(),
                kind: Some(edge.kind),
            })
            .collect();

        CanvasDocument {
            nodes,
            edges,
            viewport,
        }
    }

    /// Rebuild a graph from a canvas document.
    ///
    /// Entries with empty keys, unknown edge kinds or dangling endpoints are
    /// skipped. Nodes saved mid-expansion come back idle.
    pub fn from_document(document: &CanvasDocument) -> Self {
        let mut graph = WordGraph::new();

        for pnode in &document.nodes {
            let annotation = match (&pnode.data.definition, &pnode.data.similarity) {
                (Some(definition), _) => Some(Annotation::Definition(definition.clone())),
                (None, Some(note)) => Some(Annotation::SimilarityNote(note.clone())),
                (None, None) => None,
            };
            let node = WordNode {
                id: resolve(&pnode.id),
                display_word: pnode.data.word.clone(),
                annotation,
                position: Point2D::new(pnode.position.x, pnode.position.y),
                state: if pnode.data.expanded {
                    ExpansionState::Expanded
                } else {
                    ExpansionState::Idle
                },
            };
            if !graph.upsert_node(node) {
                debug!("Skipping persisted node '{}'", pnode.id);
            }
        }

        for pedge in &document.edges {
            let Some(kind) = pedge.resolved_kind() else {
                debug!("Skipping persisted edge '{}': unknown kind", pedge.id);
                continue;
            };
            graph.add_edge(&resolve(&pedge.source), &resolve(&pedge.target), kind);
        }

        graph
    }
}
