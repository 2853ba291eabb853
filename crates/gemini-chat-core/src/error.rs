use thiserror::Error;

use crate::constants::messages;

#[derive(Error, Debug)]
pub enum ChatError {
    #[error("Gemini API Key is not set. Please configure it in Settings.")]
    MissingCredential,

    #[error("Network error: {0}")]
    Network(String),

    #[error("{message} (HTTP {status})")]
    Remote {
        status: u16,
        message: String,
        raw_body: Option<String>,
    },

    #[error("Error parsing response: {0}")]
    Parse(String),

    #[error("API Error: {reason}")]
    MalformedReply { reason: String, raw_body: String },

    #[error("Request Blocked by API: {reason}")]
    Blocked { reason: String },

    #[error("API Error: No candidates in response.")]
    EmptyReply,

    #[error("A request is already in progress")]
    Busy,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ChatError {
    pub fn remote(status: u16, message: impl Into<String>, raw_body: Option<String>) -> Self {
        Self::Remote {
            status,
            message: message.into(),
            raw_body,
        }
    }

    pub fn malformed(reason: impl Into<String>, raw_body: impl Into<String>) -> Self {
        Self::MalformedReply {
            reason: reason.into(),
            raw_body: raw_body.into(),
        }
    }

    /// Secondary detail worth showing next to the primary message, if any.
    pub fn details(&self) -> Option<&str> {
        match self {
            // Only the coarse messages leave the body unexplained.
            Self::Remote {
                message, raw_body, ..
            } if messages::is_generic(message) => raw_body.as_deref(),
            Self::MalformedReply { raw_body, .. } => Some(raw_body.as_str()),
            _ => None,
        }
    }

    /// Message plus detail, the way a chat view shows an error entry.
    pub fn describe(&self) -> String {
        let message = self.to_string();
        match self.details() {
            Some(detail) if !detail.is_empty() && detail != message => {
                format!("{message} Details: {detail}")
            }
            _ => message,
        }
    }
}

impl From<reqwest::Error> for ChatError {
    fn from(err: reqwest::Error) -> Self {
        // The request URL carries the API key as a query parameter.
        Self::Network(err.without_url().to_string())
    }
}

impl From<serde_json::Error> for ChatError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ChatError>;
