/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! API settings for the suggestion endpoint, stored under `apiSettings`.

use log::warn;
use serde::{Deserialize, Deserializer, Serialize};
use url::Url;

use crate::persistence::{KeyValueStore, StorageError};

pub const SETTINGS_KEY: &str = "apiSettings";
pub const DEFAULT_API_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApiSettings {
    pub api_url: String,
    pub api_key: String,
    /// Also read from a `selectedModels` list, keeping its first entry.
    #[serde(alias = "selectedModels", deserialize_with = "first_model")]
    pub selected_model: String,
}

fn first_model<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum ModelField {
        One(String),
        Many(Vec<String>),
    }

    Ok(match ModelField::deserialize(deserializer)? {
        ModelField::One(model) => model,
        ModelField::Many(models) => models.into_iter().next().unwrap_or_default(),
    })
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_key: String::new(),
            selected_model: DEFAULT_MODEL.to_string(),
        }
    }
}

impl ApiSettings {
    pub fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    /// Configured model, or the default when blank.
    pub fn model(&self) -> &str {
        let model = self.selected_model.trim();
        if model.is_empty() { DEFAULT_MODEL } else { model }
    }

    /// `api_url` without trailing slashes, ready for path joins.
    pub fn base_url(&self) -> &str {
        self.api_url.trim().trim_end_matches('/')
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        let parsed = Url::parse(self.base_url())
            .map_err(|e| SettingsError::InvalidUrl(format!("{}: {e}", self.api_url)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(SettingsError::InvalidUrl(format!(
                "unsupported scheme '{}'",
                parsed.scheme()
            )));
        }
        Ok(())
    }

    /// Stored settings, or defaults when absent or unreadable.
    pub fn load(store: &dyn KeyValueStore) -> Self {
        let Some(raw) = store.get(SETTINGS_KEY) else {
            return Self::default();
        };
        match serde_json::from_str(&raw) {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Ignoring unreadable API settings: {e}");
                Self::default()
            },
        }
    }

    pub fn save(&self, store: &dyn KeyValueStore) -> Result<(), SettingsError> {
        self.validate()?;
        let raw =
            serde_json::to_string(self).map_err(|e| SettingsError::Encode(e.to_string()))?;
        store.set(SETTINGS_KEY, &raw)?;
        Ok(())
    }
}

#[derive(Debug)]
pub enum SettingsError {
    InvalidUrl(String),
    Encode(String),
    Storage(StorageError),
}

impl std::fmt::Display for SettingsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SettingsError::InvalidUrl(e) => write!(f, "Invalid API URL: {e}"),
            SettingsError::Encode(e) => write!(f, "Encode error: {e}"),
            SettingsError::Storage(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for SettingsError {}

impl From<StorageError> for SettingsError {
    fn from(e: StorageError) -> Self {
        SettingsError::Storage(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;
    use rstest::rstest;

    #[test]
    fn defaults_when_absent() {
        let store = MemoryStore::default();
        let settings = ApiSettings::load(&store);
        assert_eq!(settings, ApiSettings::default());
        assert_eq!(settings.api_url, "https://api.openai.com/v1");
        assert_eq!(settings.model(), "gpt-4o-mini");
        assert!(!settings.has_api_key());
    }

    #[test]
    fn defaults_when_corrupt() {
        let store = MemoryStore::default();
        store.set(SETTINGS_KEY, "{not json").unwrap();
        assert_eq!(ApiSettings::load(&store), ApiSettings::default());
    }

    #[test]
    fn save_and_load() {
        let store = MemoryStore::default();
        let settings = ApiSettings {
            api_url: "https://llm.example.com/v1/".to_string(),
            api_key: "sk-test".to_string(),
            selected_model: "qwen-plus".to_string(),
        };
        settings.save(&store).unwrap();

        let raw = store.get(SETTINGS_KEY).unwrap();
        assert!(raw.contains("\"apiUrl\""));
        assert!(raw.contains("\"selectedModel\""));

        let loaded = ApiSettings::load(&store);
        assert_eq!(loaded, settings);
        assert_eq!(loaded.base_url(), "https://llm.example.com/v1");
    }

    #[test]
    fn partial_document_fills_defaults() {
        let store = MemoryStore::default();
        store.set(SETTINGS_KEY, r#"{"apiKey": "sk-1"}"#).unwrap();
        let loaded = ApiSettings::load(&store);
        assert_eq!(loaded.api_key, "sk-1");
        assert_eq!(loaded.api_url, DEFAULT_API_URL);
    }

    #[rstest]
    #[case(r#"{"selectedModels": ["qwen-max", "qwen-plus"]}"#, "qwen-max")]
    #[case(r#"{"selectedModels": []}"#, DEFAULT_MODEL)]
    #[case(r#"{"selectedModel": "local"}"#, "local")]
    fn reads_model_list_documents(#[case] raw: &str, #[case] expected: &str) {
        let store = MemoryStore::default();
        store.set(SETTINGS_KEY, raw).unwrap();
        let loaded = ApiSettings::load(&store);
        assert_eq!(loaded.model(), expected);
        assert_eq!(loaded.api_url, DEFAULT_API_URL);
    }

    #[rstest]
    #[case("not a url")]
    #[case("ftp://example.com")]
    #[case("")]
    fn rejects_invalid_urls(#[case] api_url: &str) {
        let store = MemoryStore::default();
        let settings = ApiSettings {
            api_url: api_url.to_string(),
            ..ApiSettings::default()
        };
        assert!(matches!(
            settings.save(&store),
            Err(SettingsError::InvalidUrl(_))
        ));
        assert!(store.get(SETTINGS_KEY).is_none());
    }

    #[test]
    fn blank_model_uses_default() {
        let settings = ApiSettings {
            selected_model: "  ".to_string(),
            ..ApiSettings::default()
        };
        assert_eq!(settings.model(), DEFAULT_MODEL);
    }
}
