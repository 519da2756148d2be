//! Local key-value storage for credentials and cached chat titles.

use crate::client::ApiError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const API_KEY: &str = "apiKey";
pub const API_SECRET: &str = "apiSecret";
pub const ACCESS_TOKEN: &str = "accessToken";
pub const ACCESS_TOKEN_SECRET: &str = "accessTokenSecret";
pub const BEARER_TOKEN: &str = "bearerToken";
pub const CDP_API_KEY: &str = "cdpApiKey";
pub const CDP_API_SECRET: &str = "cdpApiSecret";
pub const CHATS: &str = "chats";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("store file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Flat string map persisted as a JSON object.
#[derive(Debug, Clone)]
pub struct LocalStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

/// Entry of the cached chat list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatsListItem {
    pub index: u32,
    pub title: String,
}

impl LocalStore {
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("moragents")
            .join("store.json")
    }

    /// Open the store at `path`. A missing file is an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let entries = if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            serde_json::from_str(&contents)?
        } else {
            BTreeMap::new()
        };
        Ok(Self { path, entries })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Set a value and write the store back to disk.
    pub fn set(&mut self, key: &str, value: impl Into<String>) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value.into());
        self.save()
    }

    pub fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        if self.entries.remove(key).is_some() {
            self.save()?;
        }
        Ok(())
    }

    /// Set `key`, or drop it when `value` is empty.
    fn put(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        if value.is_empty() {
            self.remove(key)
        } else {
            self.set(key, value)
        }
    }

    fn save(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(&self.entries)?)?;
        Ok(())
    }

    /// Cached chat list. Missing or unreadable entries yield an empty list.
    pub fn chats(&self) -> Vec<ChatsListItem> {
        let Some(raw) = self.get(CHATS) else {
            return Vec::new();
        };
        match serde_json::from_str(raw) {
            Ok(chats) => chats,
            Err(e) => {
                tracing::warn!(error = %e, "ignoring malformed chats entry");
                Vec::new()
            }
        }
    }

    /// Stored value, treating empty strings as absent.
    fn require(&self, key: &'static str) -> Result<String, ApiError> {
        match self.get(key) {
            Some(v) if !v.is_empty() => Ok(v.to_string()),
            _ => Err(ApiError::MissingCredential(key)),
        }
    }
}

/// X (Twitter) API credentials needed to publish a tweet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct XCredentials {
    pub api_key: String,
    pub api_secret: String,
    pub access_token: String,
    pub access_token_secret: String,
    pub bearer_token: String,
}

impl XCredentials {
    /// Read all five credentials, failing on the first one missing.
    pub fn from_store(store: &LocalStore) -> Result<Self, ApiError> {
        Ok(Self {
            api_key: store.require(API_KEY)?,
            api_secret: store.require(API_SECRET)?,
            access_token: store.require(ACCESS_TOKEN)?,
            access_token_secret: store.require(ACCESS_TOKEN_SECRET)?,
            bearer_token: store.require(BEARER_TOKEN)?,
        })
    }

    pub fn save_to(&self, store: &mut LocalStore) -> Result<(), StoreError> {
        store.put(API_KEY, &self.api_key)?;
        store.put(API_SECRET, &self.api_secret)?;
        store.put(ACCESS_TOKEN, &self.access_token)?;
        store.put(ACCESS_TOKEN_SECRET, &self.access_token_secret)?;
        store.put(BEARER_TOKEN, &self.bearer_token)
    }
}

/// Coinbase Developer Platform keys used by the backend for CDP wallets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoinbaseKeys {
    pub cdp_api_key: String,
    pub cdp_api_secret: String,
}

impl CoinbaseKeys {
    pub fn from_store(store: &LocalStore) -> Result<Self, ApiError> {
        Ok(Self {
            cdp_api_key: store.require(CDP_API_KEY)?,
            cdp_api_secret: store.require(CDP_API_SECRET)?,
        })
    }

    pub fn save_to(&self, store: &mut LocalStore) -> Result<(), StoreError> {
        store.put(CDP_API_KEY, &self.cdp_api_key)?;
        store.put(CDP_API_SECRET, &self.cdp_api_secret)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> (tempfile::TempDir, LocalStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::open(dir.path().join("moragents").join("store.json")).unwrap();
        (dir, store)
    }

    fn full_credentials() -> XCredentials {
        XCredentials {
            api_key: "key".into(),
            api_secret: "secret".into(),
            access_token: "token".into(),
            access_token_secret: "token-secret".into(),
            bearer_token: "bearer".into(),
        }
    }

    #[test]
    fn values_survive_reopen() {
        let (_dir, mut store) = temp_store();
        store.set(API_KEY, "abc").unwrap();
        store.set(BEARER_TOKEN, "xyz").unwrap();
        store.remove(BEARER_TOKEN).unwrap();

        let reopened = LocalStore::open(store.path()).unwrap();
        assert_eq!(reopened.get(API_KEY), Some("abc"));
        assert_eq!(reopened.get(BEARER_TOKEN), None);
    }

    #[test]
    fn cleared_keys_are_dropped() {
        let (_dir, mut store) = temp_store();
        CoinbaseKeys {
            cdp_api_key: "key".into(),
            cdp_api_secret: "secret".into(),
        }
        .save_to(&mut store)
        .unwrap();
        CoinbaseKeys {
            cdp_api_key: "key".into(),
            cdp_api_secret: String::new(),
        }
        .save_to(&mut store)
        .unwrap();

        assert_eq!(store.get(CDP_API_KEY), Some("key"));
        assert_eq!(store.get(CDP_API_SECRET), None);
    }

    #[test]
    fn x_credentials_round_trip_through_store() {
        let (_dir, mut store) = temp_store();
        full_credentials().save_to(&mut store).unwrap();
        assert_eq!(XCredentials::from_store(&store).unwrap(), full_credentials());
    }

    #[test]
    fn missing_or_empty_credential_is_reported_by_name() {
        let (_dir, mut store) = temp_store();
        full_credentials().save_to(&mut store).unwrap();
        store.set(ACCESS_TOKEN_SECRET, "").unwrap();

        match XCredentials::from_store(&store) {
            Err(ApiError::MissingCredential(name)) => assert_eq!(name, ACCESS_TOKEN_SECRET),
            other => panic!("expected missing credential, got {:?}", other),
        }

        store.remove(API_KEY).unwrap();
        match XCredentials::from_store(&store) {
            Err(ApiError::MissingCredential(name)) => assert_eq!(name, API_KEY),
            other => panic!("expected missing credential, got {:?}", other),
        }
    }

    #[test]
    fn chats_default_to_empty() {
        let (_dir, mut store) = temp_store();
        assert!(store.chats().is_empty());

        store.set(CHATS, "not json").unwrap();
        assert!(store.chats().is_empty());

        store
            .set(CHATS, r#"[{"index":0,"title":"Swap ETH"},{"index":1,"title":"Gas"}]"#)
            .unwrap();
        let chats = store.chats();
        assert_eq!(chats.len(), 2);
        assert_eq!(chats[1].title, "Gas");
    }
}
