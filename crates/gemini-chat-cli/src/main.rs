use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use gemini_chat_core::{ChatTransport, SettingsService, SettingsStore};

mod app;
mod commands;
mod overlay;

use overlay::OverlayStore;

#[derive(Parser)]
#[command(name = "gemini-chat")]
#[command(about = "Gemini Chat - talk to Google Gemini models from the terminal")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Model to use for this run (not saved)
    #[arg(short, long, global = true)]
    model: Option<String>,

    /// API key for this run (not saved)
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true, global = true)]
    api_key: Option<String>,

    /// Path to the config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Interactive chat (default)
    Chat,
    /// Send a single prompt and print the reply
    Ask {
        #[arg(required = true)]
        prompt: Vec<String>,
    },
    /// Show the model catalog
    Models {
        /// Fetch the catalog from the API first
        #[arg(long)]
        refresh: bool,
    },
    /// Read or change saved settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Save the API key
    SetKey { key: String },
    /// Save the selected model
    SetModel { model: String },
    /// Print the current settings
    Show,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let settings = Arc::new(match cli.config {
        Some(ref path) => SettingsService::open(path),
        None => SettingsService::open_default(),
    });

    let command = match cli.command.unwrap_or(Command::Chat) {
        Command::Config { action } => return run_config(&settings, action),
        other => other,
    };

    let store = Arc::new(
        OverlayStore::new(settings.clone())
            .with_api_key(cli.api_key)
            .with_model(cli.model),
    );
    let transport: Arc<dyn ChatTransport> = Arc::new(settings.snapshot().build_client()?);

    match command {
        Command::Ask { prompt } => {
            app::run_single_prompt(store, transport, &prompt.join(" ")).await
        }
        Command::Models { refresh } => app::run_models(store, transport, refresh).await,
        Command::Chat | Command::Config { .. } => app::ChatApp::new(store, transport).run().await,
    }
}

fn run_config(settings: &SettingsService, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::SetKey { key } => {
            settings.set_credential(&key);
            settings.persist()?;
            println!("API key saved.");
        }
        ConfigAction::SetModel { model } => {
            settings.set_selected_model(&model);
            settings.persist()?;
            println!("Selected model: {}", settings.selected_model());
        }
        ConfigAction::Show => {
            let snapshot = settings.snapshot();
            if let Some(path) = settings.path() {
                println!("Config file:  {}", path.display());
            }
            println!("Model:        {}", snapshot.selected_model());
            println!(
                "API key:      {}",
                snapshot
                    .api_key()
                    .map(|k| commands::mask_key(&k))
                    .unwrap_or_else(|| "(not set)".to_string())
            );
            println!("Cached models: {}", snapshot.available_models.len());
            if let Some(ref url) = snapshot.api.base_url {
                println!("Base URL:     {url}");
            }
        }
    }
    Ok(())
}
