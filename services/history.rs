/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! One-off lookups outside the graph, remembered newest-first under
//! `searchHistory`.

use std::sync::Arc;

use log::warn;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::suggest::{RelatedWords, SemanticWord, SimilarWord, SuggestError, SuggestionSource};
use crate::persistence::KeyValueStore;

pub const HISTORY_KEY: &str = "searchHistory";

/// A completed lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRecord {
    pub word: String,
    #[serde(default)]
    pub semantic_words: Vec<SemanticWord>,
    #[serde(default)]
    pub similar_words: Vec<SimilarWord>,
    /// Milliseconds since the Unix epoch.
    #[serde(default)]
    pub timestamp: i64,
}

impl SearchRecord {
    pub fn new(word: impl Into<String>, related: RelatedWords, timestamp: i64) -> Self {
        Self {
            word: word.into(),
            semantic_words: related.semantic_words,
            similar_words: related.similar_words,
            timestamp,
        }
    }
}

fn now_millis() -> i64 {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}

pub struct SearchHistory {
    store: Arc<dyn KeyValueStore>,
}

impl SearchHistory {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// All records, newest first. Unreadable history reads as empty.
    pub fn entries(&self) -> Vec<SearchRecord> {
        let Some(raw) = self.store.get(HISTORY_KEY) else {
            return Vec::new();
        };
        serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!("Ignoring unreadable search history: {e}");
            Vec::new()
        })
    }

    /// Put `record` at the front, dropping older records for the same word.
    pub fn record(&self, record: SearchRecord) {
        let mut entries = self.entries();
        entries.retain(|existing| existing.word != record.word);
        entries.insert(0, record);

        let raw = match serde_json::to_string(&entries) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Failed to encode search history: {e}");
                return;
            },
        };
        if let Err(e) = self.store.set(HISTORY_KEY, &raw) {
            warn!("Failed to save search history: {e}");
        }
    }

    pub fn clear(&self) {
        if let Err(e) = self.store.remove(HISTORY_KEY) {
            warn!("Failed to clear search history: {e}");
        }
    }

    /// Fetch related words for `word` without touching the graph.
    ///
    /// Blank input is ignored (`Ok(None)`). A successful lookup is recorded.
    pub async fn lookup(
        &self,
        source: &dyn SuggestionSource,
        word: &str,
    ) -> Result<Option<SearchRecord>, SuggestError> {
        let word = word.trim();
        if word.is_empty() {
            return Ok(None);
        }
        let related = source.fetch_related(word).await?;
        let record = SearchRecord::new(word, related, now_millis());
        self.record(record.clone());
        Ok(Some(record))
    }
}
