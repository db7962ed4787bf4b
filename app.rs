/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Application state management for the word explorer.
//!
//! `LexiGraphApp` owns the graph and viewport and is the only writer of
//! either once constructed. Seed and Expand suspend only while the
//! suggestion source is awaited; every graph mutation happens inside one
//! short critical section, so concurrent expansions of different nodes
//! interleave safely and a node's own `Expanding` state blocks re-entry.

use std::collections::HashSet;
use std::sync::Arc;

use euclid::default::Point2D;
use log::{debug, info, warn};
use parking_lot::Mutex;

use crate::graph::{
    Annotation, EdgeKind, NodeId, NodeStateUpdate, Viewport, WordGraph, WordNode,
    is_plausible_word, resolve,
};
use crate::layout::RadialLayout;
use crate::persistence::PersistenceBridge;
use crate::persistence::types::CanvasDocument;
use crate::services::suggest::{RelatedWords, SuggestError, SuggestionSource};

/// Result of a Seed request.
#[derive(Debug, Clone, PartialEq)]
pub enum SeedOutcome {
    /// Input was blank or not word-shaped. Nothing changed.
    Rejected,
    /// The word is already on the canvas; `focus` is where to center the view.
    AlreadyPresent { key: NodeId, focus: Point2D<f32> },
    Seeded { key: NodeId, report: ExpansionReport },
    /// The fetch failed. The center node is withdrawn again.
    Failed { key: NodeId, error: SuggestError },
}

/// Result of an Expand request.
#[derive(Debug, Clone, PartialEq)]
pub enum ExpandOutcome {
    /// Unknown node, already expanded, or expansion in flight.
    Ignored,
    Failed(SuggestError),
    Expanded(ExpansionReport),
}

/// Summary of one merged suggestion round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpansionReport {
    /// Display word of the expanded node.
    pub word: String,
    /// Relations received, duplicates included.
    pub related_count: usize,
    pub nodes_added: usize,
    pub edges_added: usize,
}

/// One related word, tagged with the relation that produced it.
struct Discovery {
    word: String,
    annotation: Annotation,
    kind: EdgeKind,
}

/// Semantic items first, then visual ones.
fn discoveries(related: RelatedWords) -> Vec<Discovery> {
    let semantic = related.semantic_words.into_iter().map(|item| Discovery {
        word: item.word,
        annotation: Annotation::Definition(item.definition),
        kind: EdgeKind::Semantic,
    });
    let visual = related.similar_words.into_iter().map(|item| Discovery {
        word: item.word,
        annotation: Annotation::SimilarityNote(item.similarity),
        kind: EdgeKind::Visual,
    });
    semantic.chain(visual).collect()
}

/// Merge a suggestion round into `graph` around `parent`.
///
/// Known words gain an edge only. New words are placed radially, indexed
/// among the words this round creates. Items resolving to an empty key or
/// to the parent itself are skipped.
fn merge_related(
    graph: &mut WordGraph,
    layout: &RadialLayout,
    parent: &NodeId,
    related: RelatedWords,
) -> ExpansionReport {
    let word = graph
        .node(parent)
        .map(|node| node.display_word.clone())
        .unwrap_or_else(|| parent.to_string());
    let origin = graph
        .node(parent)
        .map(|node| node.position)
        .unwrap_or_else(Point2D::origin);
    let related_count = related.len();
    let items = discoveries(related);

    let total = items
        .iter()
        .map(|item| resolve(&item.word))
        .filter(|key| !key.is_empty() && key != parent && !graph.has_node(key))
        .collect::<HashSet<_>>()
        .len();

    let mut report = ExpansionReport {
        word,
        related_count,
        nodes_added: 0,
        edges_added: 0,
    };

    for item in items {
        let key = resolve(&item.word);
        if key.is_empty() || &key == parent {
            continue;
        }
        if !graph.has_node(&key) {
            let position = layout.place(origin, report.nodes_added, total);
            let node = WordNode::new(item.word.trim(), position).with_annotation(item.annotation);
            if graph.upsert_node(node) {
                report.nodes_added += 1;
            }
        }
        if graph.add_edge(parent, &key, item.kind) {
            report.edges_added += 1;
        }
    }

    report
}

/// What a failed round does to the node it was expanding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rollback {
    /// Back to `Idle` for a retry.
    KeepIdle,
    /// Remove the node unless another node has linked to it meanwhile.
    Discard,
}

struct CanvasState {
    graph: WordGraph,
    viewport: Viewport,
}

/// Main application state
pub struct LexiGraphApp<S: SuggestionSource> {
    source: S,
    layout: RadialLayout,
    state: Mutex<CanvasState>,
    persistence: Option<Arc<PersistenceBridge>>,
}

impl<S: SuggestionSource> LexiGraphApp<S> {
    pub fn new(
        source: S,
        layout: RadialLayout,
        persistence: Option<Arc<PersistenceBridge>>,
    ) -> Self {
        Self {
            source,
            layout,
            state: Mutex::new(CanvasState {
                graph: WordGraph::new(),
                viewport: Viewport::default(),
            }),
            persistence,
        }
    }

    /// Rehydrate from the persisted document, or start empty.
    pub fn restore(source: S, layout: RadialLayout, persistence: Arc<PersistenceBridge>) -> Self {
        let (graph, viewport) = match persistence.load() {
            Some(document) => (WordGraph::from_document(&document), document.viewport),
            None => (WordGraph::new(), Viewport::default()),
        };
        if graph.node_count() > 0 {
            info!(
                "Restored canvas: {} nodes, {} edges",
                graph.node_count(),
                graph.edge_count()
            );
        }
        Self {
            source,
            layout,
            state: Mutex::new(CanvasState { graph, viewport }),
            persistence: Some(persistence),
        }
    }

    /// No persistence, default layout.
    pub fn new_for_testing(source: S) -> Self {
        Self::new(source, RadialLayout::default(), None)
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Start a graph from a typed word.
    pub async fn seed(&self, input: &str) -> SeedOutcome {
        let word = input.trim();
        if !is_plausible_word(word) {
            debug!("Rejecting seed input '{input}'");
            return SeedOutcome::Rejected;
        }
        let key = resolve(word);

        {
            let mut state = self.state.lock();
            if let Some(existing) = state.graph.node(&key) {
                return SeedOutcome::AlreadyPresent {
                    focus: existing.position,
                    key,
                };
            }
            state
                .graph
                .upsert_node(WordNode::new(word, Point2D::origin()));
            state.graph.set_node_state(&key, NodeStateUpdate::busy(true));
        }

        match self.run_expansion(&key, word, Rollback::Discard).await {
            Ok(report) => SeedOutcome::Seeded { key, report },
            Err(error) => SeedOutcome::Failed { key, error },
        }
    }

    /// Fetch and merge related words for an idle node.
    pub async fn expand(&self, key: &NodeId) -> ExpandOutcome {
        let word = {
            let mut state = self.state.lock();
            let Some(node) = state.graph.node(key) else {
                return ExpandOutcome::Ignored;
            };
            if node.is_busy() || node.is_expanded() {
                return ExpandOutcome::Ignored;
            }
            let word = node.display_word.clone();
            state.graph.set_node_state(key, NodeStateUpdate::busy(true));
            self.persist(&state);
            word
        };

        match self.run_expansion(key, &word, Rollback::KeepIdle).await {
            Ok(report) => ExpandOutcome::Expanded(report),
            Err(error) => ExpandOutcome::Failed(error),
        }
    }

    /// Await the source for a node already marked `Expanding`, then merge.
    ///
    /// A node removed while the request was in flight (by `clear`) gets no
    /// merge; the round is reported with nothing added.
    async fn run_expansion(
        &self,
        key: &NodeId,
        word: &str,
        rollback: Rollback,
    ) -> Result<ExpansionReport, SuggestError> {
        let fetched = self.source.fetch_related(word).await;

        let mut state = self.state.lock();
        if !state.graph.has_node(key) {
            debug!("'{word}' left the canvas during expansion; dropping the result");
            return fetched.map(|related| ExpansionReport {
                word: word.to_string(),
                related_count: related.len(),
                nodes_added: 0,
                edges_added: 0,
            });
        }
        match fetched {
            Ok(related) => {
                let report = merge_related(&mut state.graph, &self.layout, key, related);
                state.graph.set_node_state(key, NodeStateUpdate::completed());
                self.persist(&state);
                info!(
                    "Expanded '{}': {} related, {} new nodes, {} new edges",
                    report.word, report.related_count, report.nodes_added, report.edges_added
                );
                Ok(report)
            },
            Err(error) => {
                warn!("Failed to expand '{word}': {error}");
                // A seed center that nothing else links to is withdrawn.
                let orphan = state.graph.edges_of(key).next().is_none();
                if rollback == Rollback::Discard && orphan {
                    state.graph.remove_node(key);
                    if state.graph.node_count() == 0 && state.viewport == Viewport::default() {
                        if let Some(persistence) = &self.persistence {
                            persistence.clear();
                        }
                        return Err(error);
                    }
                } else {
                    state.graph.set_node_state(key, NodeStateUpdate::busy(false));
                }
                self.persist(&state);
                Err(error)
            },
        }
    }

    /// User drag.
    pub fn move_node(&self, key: &NodeId, position: Point2D<f32>) -> bool {
        let mut state = self.state.lock();
        let moved = state.graph.set_node_position(key, position);
        if moved {
            self.persist(&state);
        }
        moved
    }

    pub fn set_viewport(&self, viewport: Viewport) {
        let mut state = self.state.lock();
        state.viewport = viewport;
        self.persist(&state);
    }

    pub fn viewport(&self) -> Viewport {
        self.state.lock().viewport
    }

    /// Empty the canvas and remove the persisted document.
    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.graph.clear();
        state.viewport = Viewport::default();
        if let Some(persistence) = &self.persistence {
            persistence.clear();
        }
    }

    /// Current graph and viewport as a document.
    pub fn snapshot(&self) -> CanvasDocument {
        let state = self.state.lock();
        state.graph.to_document(state.viewport)
    }

    pub fn node(&self, key: &NodeId) -> Option<WordNode> {
        self.state.lock().graph.node(key).cloned()
    }

    /// Run `f` against the graph under the state lock.
    pub fn with_graph<R>(&self, f: impl FnOnce(&WordGraph) -> R) -> R {
        f(&self.state.lock().graph)
    }

    pub fn node_count(&self) -> usize {
        self.state.lock().graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.state.lock().graph.edge_count()
    }

    /// Write any pending document now.
    pub fn flush(&self) {
        if let Some(persistence) = &self.persistence {
            persistence.flush();
        }
    }

    fn persist(&self, state: &CanvasState) {
        if let Some(persistence) = &self.persistence {
            persistence.schedule(state.graph.to_document(state.viewport));
        }
    }
}
