/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Suggestion source backed by an OpenAI-compatible chat completions API.

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use serde::Deserialize;

use super::{RelatedWords, SuggestError, SuggestionSource, parse_semantic, parse_visual};
use crate::services::settings::ApiSettings;

fn semantic_prompt(word: &str) -> String {
    format!(
        r#"Given the English word "{word}", provide 5 semantically similar words (synonyms or words with similar meanings).

For each word, provide:
1. The word itself
2. A brief definition in Chinese

Format your response as a JSON array like this:
[
  {{"word": "joyful", "definition": "充满喜悦的，快乐的"}},
  {{"word": "cheerful", "definition": "愉快的，高兴的"}}
]

Only return the JSON array, no other text."#
    )
}

fn visual_prompt(word: &str) -> String {
    format!(
        r#"Given the English word "{word}", provide 5 words that look visually similar in spelling (similar letters, patterns, or structure).

For each word, provide:
1. The word itself
2. An explanation of the similarity in Chinese

Format your response as a JSON array like this:
[
  {{"word": "hoppy", "similarity": "只有一个字母不同，p 变成了 pp"}},
  {{"word": "harpy", "similarity": "首尾相同，中间字母相似"}}
]

Only return the JSON array, no other text."#
    )
}

#[derive(Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ModelEntry {
    id: String,
}

#[derive(Deserialize)]
struct ModelList {
    #[serde(default)]
    data: Vec<ModelEntry>,
}

/// Two chat completion calls per word: one for meaning, one for spelling.
#[derive(Clone)]
pub struct OpenAiCompatibleSource {
    client: reqwest::Client,
    settings: ApiSettings,
}

impl OpenAiCompatibleSource {
    pub fn new(settings: ApiSettings, timeout: Duration) -> Result<Self, SuggestError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SuggestError::Network(e.to_string()))?;
        Ok(Self { client, settings })
    }

    pub fn settings(&self) -> &ApiSettings {
        &self.settings
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.settings.base_url())
    }

    fn api_key(&self) -> Result<&str, SuggestError> {
        if self.settings.has_api_key() {
            Ok(self.settings.api_key.trim())
        } else {
            Err(SuggestError::NotConfigured)
        }
    }

    /// Send one user prompt and return the first choice's content (`"[]"` if absent).
    async fn complete(&self, prompt: &str) -> Result<String, SuggestError> {
        let api_key = self.api_key()?;
        let body = serde_json::json!({
            "model": self.settings.model(),
            "messages": [{"role": "user", "content": prompt}],
        });

        let response = self
            .client
            .post(self.endpoint("chat/completions"))
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| SuggestError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SuggestError::HttpStatus(status.as_u16()));
        }

        let envelope: ChatResponse = response
            .json()
            .await
            .map_err(|e| SuggestError::Body(e.to_string()))?;

        Ok(envelope
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_else(|| "[]".to_string()))
    }

    /// Model ids offered by the endpoint, sorted case-insensitively.
    pub async fn list_models(&self) -> Result<Vec<String>, SuggestError> {
        let api_key = self.api_key()?;
        let response = self
            .client
            .get(self.endpoint("models"))
            .bearer_auth(api_key)
            .send()
            .await
            .map_err(|e| SuggestError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SuggestError::HttpStatus(status.as_u16()));
        }

        let list: ModelList = response
            .json()
            .await
            .map_err(|e| SuggestError::Body(e.to_string()))?;
        let mut ids: Vec<String> = list.data.into_iter().map(|entry| entry.id).collect();
        ids.sort_by_key(|id| id.to_lowercase());
        Ok(ids)
    }
}

#[async_trait]
impl SuggestionSource for OpenAiCompatibleSource {
    async fn fetch_related(&self, word: &str) -> Result<RelatedWords, SuggestError> {
        debug!("Requesting related words for '{word}' from {}", self.settings.base_url());
        let semantic_text = self.complete(&semantic_prompt(word)).await?;
        let visual_text = self.complete(&visual_prompt(word)).await?;

        Ok(RelatedWords {
            semantic_words: parse_semantic(&semantic_text),
            similar_words: parse_visual(&visual_text),
        })
    }
}
