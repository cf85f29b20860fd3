//! Configuration for forecast-ledger

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default data directory
pub fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("forecast-ledger")
}

fn default_list_limit() -> i64 {
    20
}

/// Configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Data directory for the ledger database
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Administrator allow-list (external account ids), seeded at startup
    #[serde(default)]
    pub admin_ids: Vec<i64>,

    /// Default page size for catalog listings
    #[serde(default = "default_list_limit")]
    pub list_limit: i64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            admin_ids: Vec::new(),
            list_limit: default_list_limit(),
        }
    }
}

impl Config {
    /// Load config from file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }

    /// Save config to file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), std::io::Error> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }

    /// Get ledger database path
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("ledger.db")
    }

    /// Get config file path
    pub fn config_path(&self) -> PathBuf {
        self.data_dir.join("config.toml")
    }
}
