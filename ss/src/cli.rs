//! CLI argument parsing for sessionstore

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "ss")]
#[command(author, version, about = "Inspect the mailbot session snapshot", long_about = None)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Snapshot file to inspect (overrides config)
    #[arg(short, long)]
    pub snapshot: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List stored session keys
    List,

    /// Show the record stored under a key
    Show {
        /// Session key
        #[arg(required = true)]
        key: String,
    },

    /// Dump the whole snapshot as pretty JSON
    Dump,

    /// Print the snapshot file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_list() {
        let cli = Cli::parse_from(["ss", "list"]);
        assert!(matches!(cli.command, Command::List));
    }

    #[test]
    fn test_parse_show() {
        let cli = Cli::parse_from(["ss", "show", "chat-42"]);
        match cli.command {
            Command::Show { key } => assert_eq!(key, "chat-42"),
            _ => panic!("Expected Show command"),
        }
    }

    #[test]
    fn test_parse_snapshot_override() {
        let cli = Cli::parse_from(["ss", "--snapshot", "/tmp/s.json", "dump"]);
        assert_eq!(cli.snapshot, Some(PathBuf::from("/tmp/s.json")));
    }
}
