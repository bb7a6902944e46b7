use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::info;
use std::collections::BTreeMap;
use std::path::PathBuf;

use sessionstore::cli::{Cli, Command};
use sessionstore::config::Config;

fn setup_logging() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Warn)
        .init();
    Ok(())
}

/// Read the snapshot without taking the writer lock.
///
/// Inspection is read-only and must work while the daemon holds the store
/// open, so this parses the raw JSON rather than going through SessionStore.
fn read_snapshot(path: &PathBuf) -> Result<BTreeMap<String, serde_json::Value>> {
    if !path.exists() {
        return Ok(BTreeMap::new());
    }
    let content = std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Snapshot is not valid JSON: {}", path.display()))
}

fn main() -> Result<()> {
    setup_logging().context("Failed to setup logging")?;

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    let snapshot_path = cli.snapshot.unwrap_or(config.snapshot_path);

    info!("inspecting snapshot at {}", snapshot_path.display());

    match cli.command {
        Command::List => {
            let records = read_snapshot(&snapshot_path)?;
            if records.is_empty() {
                println!("No sessions found");
            } else {
                for key in records.keys() {
                    println!("{}", key);
                }
            }
        }
        Command::Show { key } => {
            let records = read_snapshot(&snapshot_path)?;
            match records.get(&key) {
                Some(record) => println!("{}", serde_json::to_string_pretty(record)?),
                None => println!("{} No record for key: {}", "✗".red(), key.cyan()),
            }
        }
        Command::Dump => {
            let records = read_snapshot(&snapshot_path)?;
            println!("{}", serde_json::to_string_pretty(&records)?);
        }
        Command::Path => {
            println!("{}", snapshot_path.display());
        }
    }

    Ok(())
}
