use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::info;

use crate::config::SettingsStore;
use crate::error::{ChatError, Result};
use crate::llm::ChatTransport;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogUpdate {
    pub model_ids: Vec<String>,
    /// Whether the currently selected model is part of the fresh catalog.
    pub selection_available: bool,
}

/// Refreshes the cached model list in the settings store. One refresh at a
/// time; a concurrent call is rejected with `Busy`.
pub struct CatalogRefresher {
    transport: Arc<dyn ChatTransport>,
    settings: Arc<dyn SettingsStore>,
    in_flight: AtomicBool,
}

struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl CatalogRefresher {
    pub fn new(transport: Arc<dyn ChatTransport>, settings: Arc<dyn SettingsStore>) -> Self {
        Self {
            transport,
            settings,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn is_refreshing(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub async fn refresh(&self) -> Result<CatalogUpdate> {
        let api_key = self
            .settings
            .credential()
            .filter(|k| !k.trim().is_empty())
            .ok_or(ChatError::MissingCredential)?;

        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(ChatError::Busy);
        }
        let _in_flight = InFlight(&self.in_flight);

        let model_ids = self.transport.list_models(&api_key).await?;
        self.settings.set_cached_model_ids(model_ids.clone());
        info!("Models refreshed ({} found)", model_ids.len());

        let selected = self.settings.selected_model();
        Ok(CatalogUpdate {
            selection_available: model_ids.iter().any(|id| *id == selected),
            model_ids,
        })
    }
}
