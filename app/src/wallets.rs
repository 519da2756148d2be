//! CDP wallet management.
//!
//! Every mutation is followed by a fresh list fetch; the panel shows exactly
//! what the server returned last.

use crate::client::{ApiClient, ApiError, Wallet};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Networks a CDP wallet can be created on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Network {
    BaseMainnet,
    BaseSepolia,
    BaseGoerli,
    EthereumMainnet,
    EthereumGoerli,
    EthereumSepolia,
}

impl Network {
    pub const ALL: [Network; 6] = [
        Network::BaseMainnet,
        Network::BaseSepolia,
        Network::BaseGoerli,
        Network::EthereumMainnet,
        Network::EthereumGoerli,
        Network::EthereumSepolia,
    ];

    pub fn id(self) -> &'static str {
        match self {
            Network::BaseMainnet => "base-mainnet",
            Network::BaseSepolia => "base-sepolia",
            Network::BaseGoerli => "base-goerli",
            Network::EthereumMainnet => "ethereum-mainnet",
            Network::EthereumGoerli => "ethereum-goerli",
            Network::EthereumSepolia => "ethereum-sepolia",
        }
    }

    /// Next network in the list, wrapping around.
    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|n| *n == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }
}

/// Wallet panel state.
#[derive(Debug, Default)]
pub struct WalletPanel {
    pub wallets: Vec<Wallet>,
    /// Wallet awaiting typed confirmation before deletion.
    pub pending_delete: Option<String>,
}

impl WalletPanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show exactly what the server listed.
    pub fn apply_list(&mut self, wallets: Vec<Wallet>) {
        self.wallets = wallets;
    }

    pub fn request_delete(&mut self, wallet_id: &str) {
        self.pending_delete = Some(wallet_id.to_string());
    }

    pub fn cancel_delete(&mut self) {
        self.pending_delete = None;
    }

    /// Check the typed confirmation against the pending wallet.
    ///
    /// Returns the wallet id to delete. A mismatch keeps the request pending.
    pub fn confirm_delete(&mut self, typed: &str) -> Result<String, ApiError> {
        let target = self
            .pending_delete
            .as_deref()
            .ok_or_else(|| ApiError::InvalidInput("No wallet selected for deletion".to_string()))?;
        confirm_wallet_id(target, typed)?;
        Ok(self.pending_delete.take().unwrap_or_default())
    }
}

/// Exact, case-sensitive match of the typed id against the target.
pub fn confirm_wallet_id(target: &str, typed: &str) -> Result<(), ApiError> {
    if typed == target {
        Ok(())
    } else {
        tracing::warn!(wallet_id = target, "delete confirmation did not match");
        Err(ApiError::InvalidInput("Wallet ID does not match".to_string()))
    }
}

/// Create a wallet, then list.
pub async fn create_wallet(
    client: &ApiClient,
    name: &str,
    network: Network,
) -> Result<Vec<Wallet>, ApiError> {
    if name.trim().is_empty() {
        return Err(ApiError::InvalidInput("Please enter a wallet name".to_string()));
    }
    client.create_wallet(name, network.id()).await?;
    tracing::info!(wallet_id = name, network = network.id(), "wallet created");
    client.list_wallets().await
}

/// Parse an exported wallet file into `(wallet_id, document)`.
pub fn read_wallet_file(path: &Path) -> Result<(String, Value), ApiError> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        ApiError::InvalidInput(format!("Cannot read {}: {}", path.display(), e))
    })?;
    let data: Value = serde_json::from_str(&contents)
        .map_err(|e| ApiError::InvalidInput(format!("Invalid wallet file: {}", e)))?;
    let wallet_id = data
        .get("wallet_id")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::InvalidInput("Wallet file has no wallet_id".to_string()))?
        .to_string();
    Ok((wallet_id, data))
}

/// Restore a wallet from an exported file, then list.
pub async fn restore_wallet(client: &ApiClient, path: &Path) -> Result<Vec<Wallet>, ApiError> {
    let (wallet_id, data) = read_wallet_file(path)?;
    client.restore_wallet(&wallet_id, &data).await?;
    tracing::info!(%wallet_id, "wallet restored");
    client.list_wallets().await
}

/// File name for an exported wallet. Separators and leading dots are
/// neutralised so the file always lands directly inside the target directory.
fn export_file_name(wallet_id: &str) -> String {
    let cleaned: String = wallet_id
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "wallet.json".to_string()
    } else {
        format!("{}.json", cleaned)
    }
}

/// Export a wallet to `<dir>/<wallet_id>.json`.
pub async fn export_wallet(
    client: &ApiClient,
    wallet_id: &str,
    dir: &Path,
) -> Result<PathBuf, ApiError> {
    let data = client.export_wallet(wallet_id).await?;
    let path = dir.join(export_file_name(wallet_id));
    if path.parent() != Some(dir) {
        return Err(ApiError::InvalidInput(format!(
            "Cannot export wallet '{}' to {}",
            wallet_id,
            dir.display()
        )));
    }
    let pretty = serde_json::to_string_pretty(&data)
        .map_err(|e| ApiError::InvalidInput(format!("Cannot encode wallet: {}", e)))?;

    let write = async {
        tokio::fs::create_dir_all(dir).await?;
        tokio::fs::write(&path, pretty).await
    };
    write
        .await
        .map_err(|e| ApiError::InvalidInput(format!("Cannot write {}: {}", path.display(), e)))?;

    tracing::info!(wallet_id, path = %path.display(), "wallet exported");
    Ok(path)
}

/// Delete a wallet after the typed confirmation matched, then list.
pub async fn delete_wallet(
    client: &ApiClient,
    wallet_id: &str,
    typed: &str,
) -> Result<Vec<Wallet>, ApiError> {
    confirm_wallet_id(wallet_id, typed)?;
    client.delete_wallet(wallet_id).await?;
    tracing::info!(wallet_id, "wallet deleted");
    client.list_wallets().await
}
