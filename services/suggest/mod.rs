/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Related-word suggestions.
//!
//! The expansion path only sees the `SuggestionSource` trait. The HTTP adapter
//! for OpenAI-compatible chat endpoints lives in `openai`.

pub mod openai;

use async_trait::async_trait;
use log::warn;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

pub use openai::OpenAiCompatibleSource;

/// A word with a similar meaning.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SemanticWord {
    #[serde(default)]
    pub word: String,
    #[serde(default)]
    pub definition: String,
}

impl SemanticWord {
    pub fn new(word: impl Into<String>, definition: impl Into<String>) -> Self {
        Self {
            word: word.into(),
            definition: definition.into(),
        }
    }
}

/// A word with a similar spelling.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SimilarWord {
    #[serde(default)]
    pub word: String,
    #[serde(default)]
    pub similarity: String,
}

impl SimilarWord {
    pub fn new(word: impl Into<String>, similarity: impl Into<String>) -> Self {
        Self {
            word: word.into(),
            similarity: similarity.into(),
        }
    }
}

/// One suggestion round: both relation lists for a single word.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelatedWords {
    #[serde(default)]
    pub semantic_words: Vec<SemanticWord>,
    #[serde(default)]
    pub similar_words: Vec<SimilarWord>,
}

impl RelatedWords {
    /// Every relation received, duplicates included.
    pub fn len(&self) -> usize {
        self.semantic_words.len() + self.similar_words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SuggestError {
    /// No API key configured.
    NotConfigured,
    Network(String),
    HttpStatus(u16),
    /// The response envelope could not be decoded.
    Body(String),
}

impl std::fmt::Display for SuggestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SuggestError::NotConfigured => write!(f, "No API key configured"),
            SuggestError::Network(e) => write!(f, "Network error: {e}"),
            SuggestError::HttpStatus(status) => write!(f, "HTTP status {status}"),
            SuggestError::Body(e) => write!(f, "Malformed response: {e}"),
        }
    }
}

impl std::error::Error for SuggestError {}

/// Source of related words for a given word.
#[async_trait]
pub trait SuggestionSource: Send + Sync {
    async fn fetch_related(&self, word: &str) -> Result<RelatedWords, SuggestError>;
}

pub(crate) fn semantic_fallback() -> Vec<SemanticWord> {
    vec![
        SemanticWord::new("glad", "高兴的"),
        SemanticWord::new("joyful", "充满喜悦的"),
        SemanticWord::new("cheerful", "愉快的"),
    ]
}

pub(crate) fn visual_fallback() -> Vec<SimilarWord> {
    vec![
        SimilarWord::new("hobby", "前两个字母相同"),
        SimilarWord::new("hippy", "首尾字母相同"),
        SimilarWord::new("harpy", "首尾相同，中间相似"),
    ]
}

/// Text from the first `[` to the last `]` after it, if any.
fn bracketed_span(text: &str) -> Option<&str> {
    let start = text.find('[')?;
    let end = text.rfind(']')?;
    (end > start).then(|| &text[start..=end])
}

/// Best-effort extraction of a JSON list from free-form model output.
///
/// No bracketed span yields an empty list. A span that does not decode as a
/// list of `T` yields `fallback()`.
pub(crate) fn parse_list<T: DeserializeOwned>(text: &str, fallback: fn() -> Vec<T>) -> Vec<T> {
    let Some(span) = bracketed_span(text.trim()) else {
        return Vec::new();
    };
    match serde_json::from_str(span) {
        Ok(items) => items,
        Err(e) => {
            warn!("Unparsable suggestion payload, using fallback list: {e}");
            fallback()
        },
    }
}

pub(crate) fn parse_semantic(text: &str) -> Vec<SemanticWord> {
    parse_list(text, semantic_fallback)
}

pub(crate) fn parse_visual(text: &str) -> Vec<SimilarWord> {
    parse_list(text, visual_fallback)
}
