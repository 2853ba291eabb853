use std::sync::Arc;

use anyhow::Result;
use gemini_chat_core::constants::ui;
use gemini_chat_core::{
    CatalogRefresher, ChatDocument, ChatError, ChatSession, ChatTransport, ExchangeHandle,
    ExchangeOutcome, Sender, SettingsStore,
};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::commands::{self, CommandResult};
use crate::overlay::OverlayStore;

// ── One-shot modes ──────────────────────────────────────────────────────

pub async fn run_single_prompt(
    store: Arc<OverlayStore>,
    transport: Arc<dyn ChatTransport>,
    prompt: &str,
) -> Result<()> {
    let mut session = ChatSession::new(transport, store);
    match session.send(prompt).await {
        Ok(Some(reply)) => {
            println!("{}", reply.text());
            Ok(())
        }
        Ok(None) => Ok(()),
        Err(e) => Err(anyhow::anyhow!(e.describe())),
    }
}

pub async fn run_models(
    store: Arc<OverlayStore>,
    transport: Arc<dyn ChatTransport>,
    refresh: bool,
) -> Result<()> {
    if refresh {
        let refresher = CatalogRefresher::new(transport, store.clone());
        let update = refresher
            .refresh()
            .await
            .map_err(|e| anyhow::anyhow!(e.describe()))?;
        store.base().persist()?;
        eprintln!("Models refreshed ({} found).", update.model_ids.len());
    }
    print_models(&store.cached_model_ids(), &store.selected_model());
    Ok(())
}

fn print_models(model_ids: &[String], selected: &str) {
    if model_ids.is_empty() {
        println!("No cached models. Run with --refresh or use /models refresh.");
        return;
    }
    for id in model_ids {
        let marker = if id == selected { "*" } else { " " };
        println!("{marker} {id}");
    }
}

// ── Interactive chat ────────────────────────────────────────────────────

enum Flow {
    Continue,
    Quit,
}

/// Line-oriented chat view: reads stdin, prints the conversation and keeps
/// an HTML copy for `/export`.
pub struct ChatApp {
    store: Arc<OverlayStore>,
    session: ChatSession,
    refresher: CatalogRefresher,
    document: ChatDocument,
    pending: Option<ExchangeHandle>,
}

impl ChatApp {
    pub fn new(store: Arc<OverlayStore>, transport: Arc<dyn ChatTransport>) -> Self {
        Self {
            session: ChatSession::new(transport.clone(), store.clone()),
            refresher: CatalogRefresher::new(transport, store.clone()),
            store,
            document: ChatDocument::new(),
            pending: None,
        }
    }

    pub async fn run(mut self) -> Result<()> {
        self.system(&format!(
            "Welcome! Using model: {}\n{}",
            self.session.model_in_use(),
            ui::WELCOME_TIP
        ));

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            tokio::select! {
                outcome = wait_for(&mut self.pending) => {
                    self.pending = None;
                    self.handle_outcome(outcome);
                }
                line = lines.next_line() => {
                    let Some(line) = line? else { break };
                    if let Flow::Quit = self.handle_input(&line).await {
                        break;
                    }
                }
            }
        }

        // Let an in-flight answer land before leaving.
        if let Some(handle) = self.pending.take() {
            let outcome = handle.await;
            self.handle_outcome(outcome);
        }
        Ok(())
    }

    async fn handle_input(&mut self, line: &str) -> Flow {
        match commands::handle_command(line) {
            CommandResult::NotACommand => self.send(line),
            CommandResult::Quit => return Flow::Quit,
            CommandResult::Message(msg) => self.system(&msg),
            CommandResult::Clear => self.clear(),
            CommandResult::ModelChanged(model) => self.select_model(&model),
            CommandResult::KeyChanged(key) => {
                self.store.set_credential(&key);
                self.persist();
                self.system("API key saved.");
            }
            CommandResult::ListModels => {
                print_models(&self.store.cached_model_ids(), &self.store.selected_model())
            }
            CommandResult::RefreshModels => self.refresh_models().await,
            CommandResult::Export(path) => match std::fs::write(&path, self.document.to_html()) {
                Ok(()) => self.system(&format!("Transcript written to {path}")),
                Err(e) => self.error_text(&format!("Could not write {path}: {e}")),
            },
            CommandResult::ShowStatus => self.status(),
        }
        Flow::Continue
    }

    fn send(&mut self, line: &str) {
        match self.session.submit(line) {
            Ok(Some(handle)) => {
                self.document.push(Sender::User, line.trim());
                println!("Processing...");
                self.pending = Some(handle);
            }
            Ok(None) => {}
            Err(e) => self.error(&e),
        }
    }

    fn handle_outcome(&mut self, outcome: ExchangeOutcome) {
        match self.session.ingest(outcome) {
            Ok(Some(reply)) => {
                println!("{}: {}", Sender::Model.display_name(), reply.text());
                self.document.push_turn(&reply);
            }
            Ok(None) => {}
            Err(e) => self.error(&e),
        }
    }

    fn clear(&mut self) {
        self.session.clear();
        self.document.reset();
        self.system(ui::CHAT_CLEARED);
    }

    fn select_model(&mut self, model: &str) {
        let cached = self.store.cached_model_ids();
        if !cached.is_empty() && !cached.iter().any(|id| id == model) {
            self.system(&format!(
                "Note: {model} is not in the cached model list."
            ));
        }
        self.store.set_selected_model(model);
        self.persist();
        self.system(&format!("Using model: {}", self.store.selected_model()));
    }

    async fn refresh_models(&mut self) {
        match self.refresher.refresh().await {
            Ok(update) => {
                self.persist();
                self.system(&format!("Models refreshed ({} found).", update.model_ids.len()));
                if !update.selection_available && !update.model_ids.is_empty() {
                    self.system(&format!(
                        "Selected model {} is not in the list; use /model to pick another.",
                        self.store.selected_model()
                    ));
                }
                print_models(&update.model_ids, &self.store.selected_model());
            }
            Err(e) => self.error(&e),
        }
    }

    fn status(&mut self) {
        let model = self.store.selected_model();
        let key = self
            .store
            .credential()
            .map(|k| commands::mask_key(&k))
            .unwrap_or_else(|| "(not set)".to_string());
        self.system(&format!(
            "Model: {}\nAPI key: {key}\nTurns: {}{}",
            commands::model_label(&model, ui::MODEL_LABEL_MAX),
            self.session.len(),
            if self.session.is_busy() { "\nWaiting for a reply..." } else { "" }
        ));
    }

    fn persist(&mut self) {
        if let Err(e) = self.store.base().persist() {
            self.error(&e);
        }
    }

    fn system(&mut self, text: &str) {
        println!("{}: {text}", Sender::System.display_name());
        self.document.push(Sender::System, text);
    }

    fn error(&mut self, err: &ChatError) {
        tracing::debug!("chat error: {err:?}");
        self.error_text(&err.describe());
    }

    fn error_text(&mut self, text: &str) {
        eprintln!("{}: {text}", Sender::Error.display_name());
        self.document.push(Sender::Error, text);
    }
}

async fn wait_for(pending: &mut Option<ExchangeHandle>) -> ExchangeOutcome {
    match pending {
        Some(handle) => handle.await,
        None => std::future::pending().await,
    }
}
