//! Turns chat text into HTML fragments. Only model output is parsed as
//! markdown; everything else is shown literally.

use pulldown_cmark::{html, Options, Parser};

use crate::llm::{Role, Turn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Model,
    System,
    Error,
}

impl Sender {
    pub fn display_name(&self) -> &'static str {
        match self {
            Sender::User => "You",
            Sender::Model => "Gemini",
            Sender::System => "System",
            Sender::Error => "Error",
        }
    }

    fn css_class(&self) -> &'static str {
        match self {
            Sender::User => "user",
            Sender::Model => "model",
            Sender::System => "system",
            Sender::Error => "error",
        }
    }
}

impl From<Role> for Sender {
    fn from(role: Role) -> Self {
        match role {
            Role::User => Sender::User,
            Role::Model => Sender::Model,
        }
    }
}

/// HTML fragment for `text` as written by `sender`.
pub fn render_text(text: &str, sender: Sender) -> String {
    match sender {
        Sender::Model => markdown_to_html(text),
        Sender::User | Sender::System | Sender::Error => literal_to_html(text),
    }
}

pub fn render_turn(turn: &Turn, sender: Sender) -> String {
    render_text(&turn.text(), sender)
}

pub fn markdown_to_html(text: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);

    let parser = Parser::new_ext(text, options);
    let mut out = String::with_capacity(text.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

/// Escapes `&`, `<` and `>` and turns newlines into `<br>`.
pub fn literal_to_html(text: &str) -> String {
    let normalized = text.replace("\r\n", "\n");
    let escaped = html_escape::encode_text(&normalized);
    format!("<p>{}</p>", escaped.replace('\n', "<br>"))
}

/// One labelled transcript entry.
pub fn render_entry(sender: Sender, text: &str) -> String {
    wrap_entry(sender, &render_text(text, sender))
}

fn wrap_entry(sender: Sender, fragment: &str) -> String {
    format!(
        "<div class=\"entry entry-{}\"><span class=\"sender\">{}:</span> {}</div>",
        sender.css_class(),
        sender.display_name(),
        fragment
    )
}

const DOCUMENT_OPEN: &str = "<html><body style='word-wrap: break-word;'>";
const DOCUMENT_CLOSE: &str = "</body></html>";

/// Accumulated transcript markup, as a chat view would display it.
#[derive(Debug, Clone, Default)]
pub struct ChatDocument {
    entries: Vec<String>,
}

impl ChatDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, sender: Sender, text: &str) {
        self.entries.push(render_entry(sender, text));
    }

    pub fn push_turn(&mut self, turn: &Turn) {
        let sender = Sender::from(turn.role);
        self.entries.push(wrap_entry(sender, &render_turn(turn, sender)));
    }

    pub fn reset(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_html(&self) -> String {
        let mut html = String::from(DOCUMENT_OPEN);
        for entry in &self.entries {
            html.push_str(entry);
        }
        html.push_str(DOCUMENT_CLOSE);
        html
    }
}
