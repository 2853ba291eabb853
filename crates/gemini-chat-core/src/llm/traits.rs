use crate::error::ChatError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Part {
    pub text: String,
}

/// One message unit in a conversation. Serializes to the wire shape
/// `{"role": "...", "parts": [{"text": "..."}]}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Turn {
    pub role: Role,
    pub parts: Vec<Part>,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            parts: vec![Part { text: text.into() }],
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            parts: vec![Part { text: text.into() }],
        }
    }

    /// All parts joined with newlines.
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Text of the first part of the first candidate.
    pub text: String,
    pub turn: Turn,
}

/// The remote side of a conversation. `GeminiClient` talks HTTP; tests
/// substitute scripted implementations.
#[async_trait::async_trait]
pub trait ChatTransport: Send + Sync {
    /// Model ids usable for content generation, sorted and without prefix.
    async fn list_models(&self, api_key: &str) -> Result<Vec<String>, ChatError>;

    /// Send `history` followed by a new user turn and return the model's reply.
    async fn generate_content(
        &self,
        api_key: &str,
        model_id: &str,
        user_text: &str,
        history: &[Turn],
    ) -> Result<Reply, ChatError>;
}
