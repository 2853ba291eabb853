pub mod error;
pub mod constants;
pub mod llm;
pub mod context;
pub mod config;
pub mod session;
pub mod render;

// Re-export key types
pub use error::ChatError;
pub use llm::{ChatTransport, GeminiClient, Part, Reply, Role, Turn};
pub use context::Transcript;
pub use config::{Settings, SettingsService, SettingsStore};
pub use session::{CatalogRefresher, CatalogUpdate, ChatSession, ExchangeHandle, ExchangeOutcome};
pub use render::{render_text, render_turn, ChatDocument, Sender};
