use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::constants::models::DEFAULT_MODEL_ID;
use crate::error::ChatError;
use crate::llm::GeminiClient;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_model")]
    pub selected_model: String,
    /// Last fetched catalog, shown in model selection without a network call.
    #[serde(default)]
    pub available_models: Vec<String>,
    #[serde(default)]
    pub api: ApiSettings,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ApiSettings {
    pub base_url: Option<String>,
    /// Environment variable consulted when no key is stored. Empty disables the lookup.
    #[serde(default)]
    pub api_key_env: String,
}

fn default_model() -> String {
    DEFAULT_MODEL_ID.to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            selected_model: default_model(),
            available_models: Vec::new(),
            api: ApiSettings::default(),
        }
    }
}

impl Settings {
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("gemini-chat")
            .join("config.toml")
    }

    /// Missing or unreadable files yield defaults.
    pub fn load_from(path: &Path) -> Self {
        let mut settings = std::fs::read_to_string(path)
            .ok()
            .and_then(|content| match toml::from_str::<Settings>(&content) {
                Ok(s) => Some(s),
                Err(e) => {
                    tracing::warn!("Ignoring unreadable config {}: {e}", path.display());
                    None
                }
            })
            .unwrap_or_default();
        settings.normalize();
        settings
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ChatError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| ChatError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    fn normalize(&mut self) {
        if self.selected_model.trim().is_empty() {
            self.selected_model = default_model();
        }
    }

    /// Stored key first, then the configured environment variable.
    pub fn api_key(&self) -> Option<String> {
        let stored = self.api_key.trim();
        if !stored.is_empty() {
            return Some(stored.to_string());
        }
        if self.api.api_key_env.is_empty() {
            return None;
        }
        std::env::var(&self.api.api_key_env)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    pub fn selected_model(&self) -> &str {
        let model = self.selected_model.trim();
        if model.is_empty() {
            DEFAULT_MODEL_ID
        } else {
            model
        }
    }

    /// Build the Gemini client from the current settings.
    pub fn build_client(&self) -> Result<GeminiClient, ChatError> {
        let client = GeminiClient::new()?;
        Ok(match self.api.base_url {
            Some(ref url) if !url.trim().is_empty() => client.with_base_url(url.trim()),
            _ => client,
        })
    }
}

/// Credential, model selection and cached catalog, shared between chat
/// sessions and whatever edits the configuration.
pub trait SettingsStore: Send + Sync {
    fn credential(&self) -> Option<String>;
    fn set_credential(&self, api_key: &str);
    /// Never blank: falls back to the default model id.
    fn selected_model(&self) -> String;
    fn set_selected_model(&self, model_id: &str);
    fn cached_model_ids(&self) -> Vec<String>;
    /// Replaces the cached list; no merging.
    fn set_cached_model_ids(&self, model_ids: Vec<String>);
}

/// `Settings` behind a lock, optionally backed by a TOML file.
pub struct SettingsService {
    state: RwLock<Settings>,
    path: Option<PathBuf>,
}

impl SettingsService {
    /// Not backed by any file; `persist` is a no-op.
    pub fn in_memory(settings: Settings) -> Self {
        Self {
            state: RwLock::new(settings),
            path: None,
        }
    }

    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            state: RwLock::new(Settings::load_from(&path)),
            path: Some(path),
        }
    }

    pub fn open_default() -> Self {
        Self::open(Settings::config_path())
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn snapshot(&self) -> Settings {
        self.read().clone()
    }

    pub fn persist(&self) -> Result<(), ChatError> {
        match self.path {
            Some(ref path) => self.read().save_to(path),
            None => Ok(()),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Settings> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Settings> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl SettingsStore for SettingsService {
    fn credential(&self) -> Option<String> {
        self.read().api_key()
    }

    fn set_credential(&self, api_key: &str) {
        self.write().api_key = api_key.trim().to_string();
    }

    fn selected_model(&self) -> String {
        self.read().selected_model().to_string()
    }

    fn set_selected_model(&self, model_id: &str) {
        let model_id = model_id.trim();
        self.write().selected_model = if model_id.is_empty() {
            default_model()
        } else {
            model_id.to_string()
        };
    }

    fn cached_model_ids(&self) -> Vec<String> {
        self.read().available_models.clone()
    }

    fn set_cached_model_ids(&self, model_ids: Vec<String>) {
        self.write().available_models = model_ids;
    }
}
