//! Local configuration management for the MORagents client.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Backend address used when neither the CLI nor the config file set one.
pub const DEFAULT_SERVER_URL: &str = "http://localhost:8080";

/// Application configuration stored locally.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Backend base URL
    #[serde(default = "default_server_url")]
    pub server_url: String,

    /// Chain the connected wallet operates on
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,

    /// Address of the user's external wallet, sent with chat and swap requests
    #[serde(default)]
    pub wallet_address: Option<String>,

    /// Directory exported wallets are written to. Defaults to the user's downloads.
    #[serde(default)]
    pub download_dir: Option<String>,
}

fn default_server_url() -> String {
    DEFAULT_SERVER_URL.to_string()
}

fn default_chain_id() -> u64 {
    1
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            chain_id: default_chain_id(),
            wallet_address: None,
            download_dir: None,
        }
    }
}

impl AppConfig {
    /// Directory holding config, store and log files.
    pub fn dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("moragents")
    }

    /// Get the config file path.
    pub fn path() -> PathBuf {
        Self::dir().join("config.json")
    }

    /// Load config from disk.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            Ok(serde_json::from_str(&contents)?)
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to disk.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Wallet address, or empty when none is configured.
    pub fn wallet_address_or_empty(&self) -> &str {
        self.wallet_address.as_deref().unwrap_or("")
    }

    /// Where exported wallet files go.
    pub fn download_dir(&self) -> PathBuf {
        match &self.download_dir {
            Some(dir) => PathBuf::from(dir),
            None => dirs::download_dir().unwrap_or_else(|| PathBuf::from(".")),
        }
    }
}
