//! Mailbot configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main mailbot configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Transport gateway configuration
    pub telegram: TelegramConfig,

    /// Recipient-messaging relay configuration
    pub sender: SenderConfig,

    /// Storage configuration
    pub storage: StorageConfig,
}

impl Config {
    /// Validate configuration before running the bot
    ///
    /// Call this early in startup to fail fast with clear error messages.
    pub fn validate(&self) -> Result<()> {
        if std::env::var(&self.telegram.token_env).is_err() {
            return Err(eyre::eyre!(
                "Bot token not found. Set the {} environment variable.",
                self.telegram.token_env
            ));
        }
        Ok(())
    }

    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .mailbot.yml
        let local_config = PathBuf::from(".mailbot.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/mailbot/mailbot.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("mailbot").join("mailbot.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        // No config file found, use defaults
        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// Transport gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    /// Environment variable containing the bot token
    #[serde(rename = "token-env")]
    pub token_env: String,

    /// Bot API base URL
    #[serde(rename = "api-base")]
    pub api_base: String,

    /// Long-poll window in seconds
    #[serde(rename = "poll-timeout-secs")]
    pub poll_timeout_secs: u64,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            token_env: "TELEGRAM_BOT_TOKEN".to_string(),
            api_base: "https://api.telegram.org".to_string(),
            poll_timeout_secs: 30,
        }
    }
}

/// Recipient-messaging relay configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SenderConfig {
    /// Relay base URL
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,

    /// Delay between consecutive deliveries in milliseconds
    #[serde(rename = "pacing-ms")]
    pub pacing_ms: u64,
}

impl SenderConfig {
    /// Pacing delay between consecutive deliveries
    pub fn pacing(&self) -> Duration {
        Duration::from_millis(self.pacing_ms)
    }
}

impl Default for SenderConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8300".to_string(),
            timeout_ms: 30_000,
            pacing_ms: 50,
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the session snapshot file
    #[serde(rename = "snapshot-path")]
    pub snapshot_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        let snapshot_path = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("mailbot")
            .join("sessions.json");

        Self { snapshot_path }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.telegram.token_env, "TELEGRAM_BOT_TOKEN");
        assert_eq!(config.telegram.poll_timeout_secs, 30);
        assert_eq!(config.sender.pacing_ms, 50);
        assert!(config.storage.snapshot_path.ends_with("mailbot/sessions.json"));
    }

    #[test]
    fn test_deserialize_config() {
        let yaml = r#"
telegram:
  token-env: MY_BOT_TOKEN
  api-base: https://tg.example.com
  poll-timeout-secs: 10

sender:
  base-url: https://relay.example.com
  timeout-ms: 5000
  pacing-ms: 100

storage:
  snapshot-path: /var/lib/mailbot/sessions.json
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.telegram.token_env, "MY_BOT_TOKEN");
        assert_eq!(config.telegram.api_base, "https://tg.example.com");
        assert_eq!(config.sender.base_url, "https://relay.example.com");
        assert_eq!(config.sender.pacing(), Duration::from_millis(100));
        assert_eq!(
            config.storage.snapshot_path,
            PathBuf::from("/var/lib/mailbot/sessions.json")
        );
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let yaml = r#"
sender:
  pacing-ms: 200
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();

        // Specified value
        assert_eq!(config.sender.pacing_ms, 200);

        // Defaults for unspecified
        assert_eq!(config.telegram.token_env, "TELEGRAM_BOT_TOKEN");
        assert_eq!(config.sender.timeout_ms, 30_000);
    }

    #[test]
    fn test_validation_missing_token() {
        let mut config = Config::default();
        config.telegram.token_env = "NONEXISTENT_TEST_TOKEN_12345".to_string();

        let result = config.validate();

        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("NONEXISTENT_TEST_TOKEN_12345"));
    }
}
