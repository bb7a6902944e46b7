//! Mailbot - conversational broadcast mailings
//!
//! CLI entry point for running the bot and inspecting its conversations.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use colored::*;
use eyre::{Context as _, Result};
use tracing::info;

use mailbot::cli::{Cli, Command};
use mailbot::config::Config;
use mailbot::dispatch::Dispatcher;
use mailbot::engine::Engine;
use mailbot::flow::Conversation;
use mailbot::gateway::TelegramGateway;
use mailbot::repl;
use mailbot::sender::HttpMessagingClient;
use mailbot::state::StateManager;

fn setup_logging(verbose: bool) -> Result<()> {
    // Create log directory
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("mailbot")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    // Setup tracing subscriber - write to log file, not stdout/stderr
    let level = if verbose { tracing::Level::DEBUG } else { tracing::Level::INFO };
    let log_file = fs::File::create(log_dir.join("mailbot.log")).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (verbose: {})", verbose);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    match cli.command {
        Some(Command::Run) => cmd_run(&config).await,
        Some(Command::Chat) => repl::run(&config).await,
        Some(Command::Sessions) => cmd_sessions(&config),
        None => {
            let mut cmd = <Cli as clap::CommandFactory>::command();
            cmd.print_help()?;
            Ok(())
        }
    }
}

/// Run the bot against Telegram until the process is stopped
async fn cmd_run(config: &Config) -> Result<()> {
    config.validate()?;

    let gateway = TelegramGateway::from_config(&config.telegram).context("Failed to create Telegram gateway")?;
    let client = HttpMessagingClient::from_config(&config.sender).context("Failed to create messaging client")?;

    let state = StateManager::spawn(&config.storage.snapshot_path).context("Failed to open session store")?;
    let dispatcher = Dispatcher::new(Arc::new(client), config.sender.pacing());

    info!(
        snapshot = %config.storage.snapshot_path.display(),
        relay = %config.sender.base_url,
        "Mailbot starting"
    );
    println!("Mailbot running; logs go to the data directory. Ctrl-C to stop.");

    Engine::new(state, dispatcher).run(gateway).await
}

/// Print a typed summary of the stored conversations
fn cmd_sessions(config: &Config) -> Result<()> {
    let path = &config.storage.snapshot_path;
    if !path.exists() {
        println!("No sessions found ({})", path.display());
        return Ok(());
    }

    // Read-only view of the snapshot; works while the bot is running
    let content = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let records: BTreeMap<String, Conversation> =
        serde_json::from_str(&content).with_context(|| format!("Snapshot is not valid JSON: {}", path.display()))?;

    if records.is_empty() {
        println!("No sessions found");
        return Ok(());
    }

    for (key, record) in records {
        let recipients = record
            .recipients()
            .map(|list| format!("{} recipient(s)", list.len()))
            .unwrap_or_else(|| "no list".to_string());
        let message = if record.message_body().is_some() {
            "message collected"
        } else {
            "no message"
        };

        println!(
            "{}  {}  {}  {}",
            key.cyan(),
            record.state.to_string().yellow(),
            recipients,
            message.dimmed()
        );
    }

    Ok(())
}
