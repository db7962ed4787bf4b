/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use lexigraph::LexiGraphApp;
use lexigraph::graph::{NodeId, resolve};
use lexigraph::layout::RadialLayout;
use lexigraph::persistence::{KeyValueStore, MemoryStore, PersistenceBridge};
use lexigraph::services::suggest::{
    RelatedWords, SemanticWord, SimilarWord, SuggestError, SuggestionSource,
};

/// Scripted suggestion source. Words without a script fail with a network error.
#[derive(Default)]
pub(crate) struct ScriptedSource {
    scripts: HashMap<String, RelatedWords>,
    calls: AtomicUsize,
}

impl ScriptedSource {
    pub(crate) fn script(
        mut self,
        word: &str,
        semantic: &[(&str, &str)],
        visual: &[(&str, &str)],
    ) -> Self {
        self.scripts.insert(
            word.to_string(),
            RelatedWords {
                semantic_words: semantic
                    .iter()
                    .map(|(w, d)| SemanticWord::new(*w, *d))
                    .collect(),
                similar_words: visual
                    .iter()
                    .map(|(w, s)| SimilarWord::new(*w, *s))
                    .collect(),
            },
        );
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SuggestionSource for ScriptedSource {
    async fn fetch_related(&self, word: &str) -> Result<RelatedWords, SuggestError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.scripts
            .get(word)
            .cloned()
            .ok_or_else(|| SuggestError::Network(format!("connection refused for {word}")))
    }
}

/// The greeting family used by most scenarios.
pub(crate) fn greetings() -> ScriptedSource {
    ScriptedSource::default()
        .script("Hello", &[("Hi", "问候语")], &[("Hallo", "一个字母不同")])
        .script("Hi", &[("Hello", "你好")], &[])
}

pub(crate) struct TestHarness {
    pub(crate) app: LexiGraphApp<ScriptedSource>,
    pub(crate) store: Arc<MemoryStore>,
}

impl TestHarness {
    pub(crate) fn new(source: ScriptedSource) -> Self {
        Self::with_store(source, Arc::new(MemoryStore::new()))
    }

    /// Restore from `store` with write-through persistence.
    pub(crate) fn with_store(source: ScriptedSource, store: Arc<MemoryStore>) -> Self {
        let bridge = Arc::new(PersistenceBridge::new(
            store.clone() as Arc<dyn KeyValueStore>,
            Duration::ZERO,
        ));
        Self {
            app: LexiGraphApp::restore(source, RadialLayout::default(), bridge),
            store,
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.app.source().calls()
    }

    pub(crate) fn edge_ids(&self) -> Vec<String> {
        self.app
            .with_graph(|graph| graph.edges().map(|edge| edge.id.clone()).collect())
    }
}

pub(crate) fn key(word: &str) -> NodeId {
    resolve(word)
}
