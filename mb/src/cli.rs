//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Mailbot - conversational broadcast mailings
#[derive(Parser)]
#[command(
    name = "mailbot",
    version,
    about = "Conversational broadcast-mailing bot",
    after_help = "Logs are written to: ~/.local/share/mailbot/logs/mailbot.log"
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// CLI subcommands
#[derive(Subcommand)]
pub enum Command {
    /// Run the bot against the Telegram gateway (foreground)
    Run,

    /// Chat with the bot locally; mailings are dry-run
    Chat,

    /// Show stored conversations
    Sessions,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_no_command() {
        let cli = Cli::parse_from(["mailbot"]);
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_cli_parse_run() {
        let cli = Cli::parse_from(["mailbot", "run"]);
        assert!(matches!(cli.command, Some(Command::Run)));
    }

    #[test]
    fn test_cli_parse_chat() {
        let cli = Cli::parse_from(["mailbot", "chat"]);
        assert!(matches!(cli.command, Some(Command::Chat)));
    }

    #[test]
    fn test_cli_parse_sessions() {
        let cli = Cli::parse_from(["mailbot", "sessions"]);
        assert!(matches!(cli.command, Some(Command::Sessions)));
    }

    #[test]
    fn test_cli_with_config() {
        let cli = Cli::parse_from(["mailbot", "-c", "/path/to/config.yml", "run"]);
        assert_eq!(cli.config, Some(PathBuf::from("/path/to/config.yml")));
    }

    #[test]
    fn test_cli_verbose_flag() {
        let cli = Cli::parse_from(["mailbot", "--verbose", "run"]);
        assert!(cli.verbose);
    }
}
