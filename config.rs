/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Engine configuration, read from `config.toml`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::layout::DEFAULT_RADIUS;
use crate::persistence::DEFAULT_DEBOUNCE_MS;

pub const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Distance from a parent to its new children.
    pub layout_radius: f32,
    /// Quiet period before a canvas write.
    pub persist_debounce_ms: u64,
    pub autosave_tick_ms: u64,
    /// Overrides `<config dir>/lexigraph` for stored state.
    pub data_dir: Option<PathBuf>,
    pub request_timeout_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            layout_radius: DEFAULT_RADIUS,
            persist_debounce_ms: DEFAULT_DEBOUNCE_MS,
            autosave_tick_ms: 100,
            data_dir: None,
            request_timeout_secs: 30,
        }
    }
}

impl EngineConfig {
    /// `<config dir>/lexigraph/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("lexigraph").join(CONFIG_FILE_NAME))
    }

    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validated()
    }

    /// Load `path`, or the default location when `None`. A missing file yields defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path.map(Path::to_path_buf).or_else(Self::default_path) else {
            warn!("No config directory available; using default configuration");
            return Ok(Self::default());
        };
        match std::fs::read_to_string(&path) {
            Ok(raw) => {
                debug!("Loading configuration from {}", path.display());
                Self::from_toml(&raw)
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(ConfigError::Io(format!(
                "Failed to read {}: {e}",
                path.display()
            ))),
        }
    }

    fn validated(mut self) -> Result<Self, ConfigError> {
        if !self.layout_radius.is_finite() || self.layout_radius <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "layout_radius must be positive, got {}",
                self.layout_radius
            )));
        }
        self.autosave_tick_ms = self.autosave_tick_ms.max(1);
        self.request_timeout_secs = self.request_timeout_secs.max(1);
        Ok(self)
    }

    pub fn persist_debounce(&self) -> Duration {
        Duration::from_millis(self.persist_debounce_ms)
    }

    pub fn autosave_tick(&self) -> Duration {
        Duration::from_millis(self.autosave_tick_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io(String),
    Parse(String),
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {e}"),
            ConfigError::Parse(e) => write!(f, "Parse error: {e}"),
            ConfigError::Invalid(e) => write!(f, "Invalid configuration: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}
