use std::sync::{Arc, RwLock};

use gemini_chat_core::{SettingsService, SettingsStore};

/// Settings store with per-run overrides from command-line flags.
///
/// Reads prefer the override; writes go to the persisted settings and drop
/// the matching override, so a flag never ends up saved to disk.
pub struct OverlayStore {
    base: Arc<SettingsService>,
    api_key: RwLock<Option<String>>,
    model: RwLock<Option<String>>,
}

impl OverlayStore {
    pub fn new(base: Arc<SettingsService>) -> Self {
        Self {
            base,
            api_key: RwLock::new(None),
            model: RwLock::new(None),
        }
    }

    pub fn with_api_key(self, api_key: Option<String>) -> Self {
        *self.api_key.write().unwrap_or_else(|e| e.into_inner()) =
            api_key.map(|k| k.trim().to_string()).filter(|k| !k.is_empty());
        self
    }

    pub fn with_model(self, model: Option<String>) -> Self {
        *self.model.write().unwrap_or_else(|e| e.into_inner()) =
            model.map(|m| m.trim().to_string()).filter(|m| !m.is_empty());
        self
    }

    pub fn base(&self) -> &SettingsService {
        &self.base
    }

    fn override_of(slot: &RwLock<Option<String>>) -> Option<String> {
        slot.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn drop_override(slot: &RwLock<Option<String>>) {
        *slot.write().unwrap_or_else(|e| e.into_inner()) = None;
    }
}

impl SettingsStore for OverlayStore {
    fn credential(&self) -> Option<String> {
        Self::override_of(&self.api_key).or_else(|| self.base.credential())
    }

    fn set_credential(&self, api_key: &str) {
        Self::drop_override(&self.api_key);
        self.base.set_credential(api_key);
    }

    fn selected_model(&self) -> String {
        Self::override_of(&self.model).unwrap_or_else(|| self.base.selected_model())
    }

    fn set_selected_model(&self, model_id: &str) {
        Self::drop_override(&self.model);
        self.base.set_selected_model(model_id);
    }

    fn cached_model_ids(&self) -> Vec<String> {
        self.base.cached_model_ids()
    }

    fn set_cached_model_ids(&self, model_ids: Vec<String>) {
        self.base.set_cached_model_ids(model_ids);
    }
}
