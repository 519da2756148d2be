//! MORagents - terminal client for the crypto agent backend.
//!
//!   ┌─┐┌─┐┌─┐┌┐┌┌┬┐┌─┐
//!   ├─┤│ ┬├┤ │││ │ └─┐
//!   ┴ ┴└─┘└─┘┘└┘ ┴ └─┘

use anyhow::Result;
use clap::Parser;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::sync::Mutex;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

mod agents;
mod app;
mod bridge;
mod chat;
mod client;
mod config;
mod message;
mod render;
mod screens;
mod store;
mod swap;
mod tweet;
mod wallets;

use app::{App, AppMessage};
use config::AppConfig;
use store::LocalStore;

#[derive(Parser, Debug)]
#[command(name = "moragents")]
#[command(about = "MORagents - terminal client for the crypto agent backend")]
#[command(version)]
struct Cli {
    /// Backend URL (overrides the config file)
    #[arg(short, long)]
    server: Option<String>,

    /// Chain id sent with prompts and swap requests
    #[arg(short, long)]
    chain_id: Option<u64>,

    /// Address of the wallet that signs transactions
    #[arg(short, long)]
    wallet_address: Option<String>,
}

/// Log to a file; the terminal belongs to the UI.
fn init_logging() -> Result<()> {
    let dir = AppConfig::dir();
    std::fs::create_dir_all(&dir)?;
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join("moragents.log"))?;

    tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialize logging: {}", e))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging()?;

    // Load config; flags given on the command line are remembered
    let mut config = AppConfig::load().unwrap_or_default();
    let overridden = cli.server.is_some() || cli.chain_id.is_some() || cli.wallet_address.is_some();
    if let Some(server) = cli.server {
        config.server_url = server;
    }
    if let Some(chain_id) = cli.chain_id {
        config.chain_id = chain_id;
    }
    if let Some(address) = cli.wallet_address {
        config.wallet_address = Some(address);
    }
    if overridden {
        if let Err(e) = config.save() {
            tracing::warn!(error = %e, "could not save config");
        }
    }
    let store = LocalStore::open(LocalStore::default_path())?;
    tracing::info!(server = %config.server_url, chain_id = config.chain_id, "starting");

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(config, store);

    // Create message channel for async operations
    let (tx, mut rx) = mpsc::channel::<AppMessage>(32);

    // Fetch history, agents and wallets
    app.init_session(tx.clone());

    // Run app
    let result = run_app(&mut terminal, &mut app, tx, &mut rx).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        tracing::error!(error = %e, "exited with error");
        eprintln!("Error: {}", e);
    }

    Ok(())
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    tx: mpsc::Sender<AppMessage>,
    rx: &mut mpsc::Receiver<AppMessage>,
) -> Result<()> {
    loop {
        // Draw UI
        terminal.draw(|f| app.render(f))?;

        // Handle async messages
        while let Ok(msg) = rx.try_recv() {
            app.handle_message(msg, tx.clone()).await?;
        }

        // Poll for events with timeout
        if event::poll(std::time::Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    // Global quit
                    if key.code == KeyCode::Char('q') && app.can_quit() {
                        return Ok(());
                    }

                    // Let app handle key
                    app.handle_key(key.code, tx.clone()).await?;
                }
            }
        }

        // Check if app wants to quit
        if app.should_quit() {
            return Ok(());
        }
    }
}
