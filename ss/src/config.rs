//! Configuration for sessionstore

use eyre::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the snapshot file
    #[serde(default = "default_snapshot_path", rename = "snapshot-path")]
    pub snapshot_path: PathBuf,
}

fn default_snapshot_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("mailbot")
        .join("sessions.json")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            snapshot_path: default_snapshot_path(),
        }
    }
}

impl Config {
    /// Load config from file, or use defaults
    pub fn load(path: Option<&PathBuf>) -> Result<Self> {
        if let Some(config_path) = path {
            let content = std::fs::read_to_string(config_path)?;
            let config: Config = serde_yaml::from_str(&content)?;
            return Ok(config);
        }

        // Try default locations
        let default_paths = [
            dirs::config_dir().map(|p| p.join("mailbot").join("sessionstore.yml")),
            Some(PathBuf::from("sessionstore.yml")),
        ];

        for path in default_paths.iter().flatten() {
            if path.exists() {
                let content = std::fs::read_to_string(path)?;
                let config: Config = serde_yaml::from_str(&content)?;
                return Ok(config);
            }
        }

        Ok(Config::default())
    }

    /// Save config to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_points_into_data_dir() {
        let config = Config::default();
        assert!(config.snapshot_path.ends_with("mailbot/sessions.json"));
    }

    #[test]
    fn test_deserialize_custom_path() {
        let config: Config = serde_yaml::from_str("snapshot-path: /tmp/custom/sessions.json").unwrap();
        assert_eq!(config.snapshot_path, PathBuf::from("/tmp/custom/sessions.json"));
    }
}
