// Library interface for gemini-chat-cli
// This allows integration tests to access internal modules

// NOTE: Since commands.rs and overlay.rs are also declared in main.rs,
// we need to use a path attribute to reference the same source file
// to avoid "file loaded multiple times" errors.

#[path = "commands.rs"]
pub mod commands;

#[path = "overlay.rs"]
pub mod overlay;

// Re-export commonly used items for easier testing
pub use commands::{handle_command, CommandResult};
pub use overlay::OverlayStore;
