/// Gemini Chat: centralized constants.
/// Model ids, endpoints, timeouts and user-facing fallback messages live here.

// ─── Models ───────────────────────────────────────────────────────────────────

pub mod models {
    /// Used whenever no model is selected or the selection is blank.
    pub const DEFAULT_MODEL_ID: &str = "gemini-1.5-flash-latest";

    /// Prefix the catalog endpoint puts in front of every model name.
    pub const MODEL_NAME_PREFIX: &str = "models/";

    /// Generation method a model must advertise to be usable for chat.
    pub const GENERATE_CONTENT_METHOD: &str = "generateContent";
}

// ─── API Endpoints ────────────────────────────────────────────────────────────

pub mod endpoints {
    pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
    pub const API_KEY_PARAM: &str = "key";
    pub const PAGE_TOKEN_PARAM: &str = "pageToken";
}

// ─── Transport ───────────────────────────────────────────────────────────────

pub mod transport {
    use std::time::Duration;

    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
    pub const WRITE_TIMEOUT: Duration = Duration::from_secs(30);
    /// Generation can be slow for long answers.
    pub const READ_TIMEOUT: Duration = Duration::from_secs(90);
    /// Upper bound on catalog pages followed through `nextPageToken`.
    pub const MAX_CATALOG_PAGES: usize = 20;
}

// ─── Messages ─────────────────────────────────────────────────────────────────

pub mod messages {
    pub const GENERATE_FAILED: &str = "Error generating content";
    pub const LIST_FAILED: &str = "Error fetching models";
    pub const NO_TEXT_PART: &str = "No text part in response content.";
    pub const NO_CONTENT: &str = "No content or parts in candidate.";
    pub const UNKNOWN_BLOCK_REASON: &str = "Unknown reason";

    /// True for the coarse fallbacks used when an error body carries no message.
    pub fn is_generic(message: &str) -> bool {
        message == GENERATE_FAILED || message == LIST_FAILED
    }
}

// ─── UI ──────────────────────────────────────────────────────────────────────

pub mod ui {
    pub const WELCOME_TIP: &str = "Tip: type /help for commands";
    pub const CHAT_CLEARED: &str = "Chat cleared.";
    pub const MODEL_LABEL_MAX: usize = 25;
}
