use std::path::PathBuf;
use anyhow::Result;
use chatbot_core::{ChatClient, Config};
use clap::Parser;
use tracing::{info, warn};

mod app;
mod handler;
mod logging;
mod tui;
mod ui;

use app::App;
use tui::{EventHandler, Tui};

#[derive(Parser)]
#[command(name = "ai-chatbot", version)]
#[command(about = "Chat with a remote AI endpoint from the terminal")]
struct Cli {
    /// Inference endpoint URL (overrides the config file)
    #[arg(long, env = "AI_CHATBOT_ENDPOINT")]
    endpoint: Option<String>,

    /// Write diagnostics here instead of the cache directory
    #[arg(long)]
    log_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let _log_guard = logging::init(cli.log_file.as_deref())?;

    let config = Config::load().unwrap_or_else(|err| {
        warn!(error = %err, "Ignoring unreadable config file");
        Config::new()
    });
    let endpoint = config.resolve_endpoint(cli.endpoint.as_deref())?;
    info!(%endpoint, "Starting chat");

    tui::install_panic_hook();
    let mut terminal = tui::init()?;

    let result = run(&mut terminal, ChatClient::new(endpoint)).await;

    tui::restore()?;
    result
}

async fn run(terminal: &mut Tui, client: ChatClient) -> Result<()> {
    let mut events = EventHandler::new();
    let mut app = App::new(client, events.sender());

    while !app.should_quit {
        terminal.draw(|frame| ui::render(&mut app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(&mut app, event).await?,
            None => break,
        }
    }

    info!(messages = app.session.messages().len(), "Chat closed");
    Ok(())
}
