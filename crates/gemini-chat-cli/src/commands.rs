/// Result of processing a slash command.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandResult {
    /// Display a message to the user.
    Message(String),
    /// Clear the chat.
    Clear,
    /// Quit the application.
    Quit,
    /// Change the selected model.
    ModelChanged(String),
    /// Store a new API key.
    KeyChanged(String),
    /// Show the cached model catalog.
    ListModels,
    /// Refresh the model catalog from the API.
    RefreshModels,
    /// Write the transcript as HTML to a file.
    Export(String),
    /// Show status (model, key, turn count).
    ShowStatus,
    /// Not a command - treat as regular input.
    NotACommand,
}

pub fn handle_command(input: &str) -> CommandResult {
    let input = input.trim();
    if !input.starts_with('/') {
        return CommandResult::NotACommand;
    }

    let parts: Vec<&str> = input.splitn(2, ' ').collect();
    let cmd = parts[0];
    let arg = parts.get(1).map(|s| s.trim()).unwrap_or("");

    match cmd {
        "/help" | "/h" => show_help(),
        "/exit" | "/quit" | "/q" => CommandResult::Quit,
        "/clear" => CommandResult::Clear,
        "/status" => CommandResult::ShowStatus,

        "/model" => {
            if arg.is_empty() {
                CommandResult::Message("Usage: /model <model-id>  (see /models)".into())
            } else {
                CommandResult::ModelChanged(arg.to_string())
            }
        }
        "/models" => match arg {
            "" => CommandResult::ListModels,
            "refresh" | "--refresh" => CommandResult::RefreshModels,
            other => CommandResult::Message(format!(
                "Unknown option '{other}'. Usage: /models [refresh]"
            )),
        },
        "/key" => {
            if arg.is_empty() {
                CommandResult::Message("Usage: /key <api-key>".into())
            } else {
                CommandResult::KeyChanged(arg.to_string())
            }
        }
        "/export" => {
            if arg.is_empty() {
                CommandResult::Message("Usage: /export <file.html>".into())
            } else {
                CommandResult::Export(arg.to_string())
            }
        }

        _ => CommandResult::Message(format!(
            "Unknown command: {cmd}. Type /help for available commands."
        )),
    }
}

fn show_help() -> CommandResult {
    CommandResult::Message(
        "Gemini Chat Commands:\n\
         \x20 /help, /h           Show this help\n\
         \x20 /clear              Clear the conversation\n\
         \x20 /model <id>         Select the model for the next message\n\
         \x20 /models [refresh]   Show cached models, or fetch them again\n\
         \x20 /key <api-key>      Store the Gemini API key\n\
         \x20 /export <file>      Save the transcript as HTML\n\
         \x20 /status             Show model, key and turn count\n\
         \x20 /quit, /q           Exit"
            .into(),
    )
}

/// Model id shortened for the status line: at most `max` characters,
/// ending in `...` when cut.
pub fn model_label(model_id: &str, max: usize) -> String {
    if model_id.chars().count() <= max {
        return model_id.to_string();
    }
    let keep = max.saturating_sub(3);
    let mut label: String = model_id.chars().take(keep).collect();
    label.push_str("...");
    label
}

/// API key with everything but the last four characters hidden.
pub fn mask_key(api_key: &str) -> String {
    let chars: Vec<char> = api_key.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{}", "*".repeat(chars.len() - 4), tail)
}
