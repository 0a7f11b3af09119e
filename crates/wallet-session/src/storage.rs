//! Key-value flags the wallet keeps between page loads.
//!
//! Two namespaces: a session-scoped one for in-flight OAuth markers and a
//! durable one for the auth token, login type and last known addresses.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use thiserror::Error;
use tracing::debug;
use zeroize::Zeroize;

use crate::error::WalletError;
use crate::types::ChainId;

/// Storage key names. Kept identical to what the web wallet wrote so
/// existing stores stay readable.
pub mod keys {
    /// DID token from the last successful login (durable).
    pub const TOKEN: &str = "token";
    /// JSON object mapping chain name to its last resolved address (durable).
    pub const USER: &str = "user";
    /// `EMAIL` or `SOCIAL` (durable).
    pub const LOGIN_TYPE: &str = "loginType";
    /// Set before leaving for an OAuth redirect (session).
    pub const OAUTH_ATTEMPT: &str = "magicOAuthAttempt";
    /// Provider of the pending OAuth redirect (session).
    pub const OAUTH_PROVIDER: &str = "magicOAuthProvider";
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt store {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl From<StorageError> for WalletError {
    fn from(e: StorageError) -> Self {
        WalletError::Storage(e.to_string())
    }
}

pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;

    /// Read and delete in one step, so a flag is observed at most once.
    fn take(&self, key: &str) -> Result<Option<String>, StorageError> {
        let value = self.get(key)?;
        if value.is_some() {
            self.remove(key)?;
        }
        Ok(value)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(lock(&self.entries).get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        lock(&self.entries).insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        if let Some(mut old) = lock(&self.entries).remove(key) {
            old.zeroize();
        }
        Ok(())
    }

    fn take(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(lock(&self.entries).remove(key))
    }
}

/// A flat JSON object on disk, rewritten on every change.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    /// Open (or lazily create) the store at `path`.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(text) if text.trim().is_empty() => BTreeMap::new(),
            Ok(text) => serde_json::from_str(&text).map_err(|source| StorageError::Corrupt {
                path: path.clone(),
                source,
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(source) => return Err(StorageError::Io { path, source }),
        };
        debug!(path = %path.display(), keys = entries.len(), "opened file store");
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        let io_err = |source| StorageError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let body = serde_json::to_vec_pretty(entries)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, body).map_err(io_err)?;
        fs::rename(&tmp, &self.path).map_err(io_err)
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(lock(&self.entries).get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = lock(&self.entries);
        entries.insert(key.to_string(), value.to_string());
        self.flush(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = lock(&self.entries);
        match entries.remove(key) {
            Some(mut old) => {
                old.zeroize();
                self.flush(&entries)
            }
            None => Ok(()),
        }
    }
}

/// The two namespaces the wallet uses.
#[derive(Clone)]
pub struct WalletStorage {
    session: Arc<dyn KeyValueStore>,
    durable: Arc<dyn KeyValueStore>,
}

impl WalletStorage {
    pub fn new(session: Arc<dyn KeyValueStore>, durable: Arc<dyn KeyValueStore>) -> Self {
        Self { session, durable }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()), Arc::new(MemoryStore::new()))
    }

    /// `session.json` and `durable.json` under `dir`.
    pub fn open(dir: &Path) -> Result<Self, StorageError> {
        Ok(Self::new(
            Arc::new(FileStore::open(dir.join("session.json"))?),
            Arc::new(FileStore::open(dir.join("durable.json"))?),
        ))
    }

    pub fn session(&self) -> &dyn KeyValueStore {
        self.session.as_ref()
    }

    pub fn durable(&self) -> &dyn KeyValueStore {
        self.durable.as_ref()
    }

    /// Last resolved address per chain. Unparseable content reads as empty.
    pub fn persisted_addresses(&self) -> Result<BTreeMap<ChainId, String>, StorageError> {
        let Some(raw) = self.durable.get(keys::USER)? else {
            return Ok(BTreeMap::new());
        };
        match serde_json::from_str(&raw) {
            Ok(map) => Ok(map),
            Err(e) => {
                debug!(error = %e, "ignoring unreadable persisted addresses");
                Ok(BTreeMap::new())
            }
        }
    }

    pub fn persist_address(&self, chain: ChainId, address: &str) -> Result<(), StorageError> {
        let mut addresses = self.persisted_addresses()?;
        addresses.insert(chain, address.to_string());
        self.durable.set(keys::USER, &serde_json::to_string(&addresses)?)
    }

    /// Remove every auth-related key from both namespaces.
    pub fn forget_addresses(&self) -> Result<(), StorageError> {
        self.durable.remove(keys::USER)
    }

    pub fn clear_auth(&self) -> Result<(), StorageError> {
        for key in [keys::TOKEN, keys::USER, keys::LOGIN_TYPE] {
            self.durable.remove(key)?;
        }
        for key in [keys::OAUTH_ATTEMPT, keys::OAUTH_PROVIDER] {
            self.session.remove(key)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn take_reads_once() {
        let store = MemoryStore::new();
        store.set(keys::OAUTH_ATTEMPT, "true").unwrap();
        assert_eq!(store.take(keys::OAUTH_ATTEMPT).unwrap().as_deref(), Some("true"));
        assert_eq!(store.take(keys::OAUTH_ATTEMPT).unwrap(), None);
        assert_eq!(store.get(keys::OAUTH_ATTEMPT).unwrap(), None);
    }

    #[test]
    fn file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("durable.json");
        {
            let store = FileStore::open(&path).unwrap();
            store.set(keys::TOKEN, "did-token").unwrap();
            store.set(keys::LOGIN_TYPE, "EMAIL").unwrap();
            store.remove(keys::LOGIN_TYPE).unwrap();
        }
        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.get(keys::TOKEN).unwrap().as_deref(), Some("did-token"));
        assert_eq!(reopened.get(keys::LOGIN_TYPE).unwrap(), None);
    }

    #[test]
    fn file_store_take_is_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let store = FileStore::open(&path).unwrap();
        store.set(keys::OAUTH_ATTEMPT, "true").unwrap();
        assert!(store.take(keys::OAUTH_ATTEMPT).unwrap().is_some());
        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.get(keys::OAUTH_ATTEMPT).unwrap(), None);
    }

    #[test]
    fn corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("durable.json");
        fs::write(&path, "{not json").unwrap();
        assert!(matches!(FileStore::open(&path), Err(StorageError::Corrupt { .. })));
    }

    #[test]
    fn addresses_are_merged_per_chain() {
        let storage = WalletStorage::in_memory();
        storage.persist_address(ChainId::Solana, "So1anaAddress").unwrap();
        storage.persist_address(ChainId::Ethereum, "0xabc").unwrap();
        let addresses = storage.persisted_addresses().unwrap();
        assert_eq!(addresses.len(), 2);
        assert_eq!(addresses[&ChainId::Solana], "So1anaAddress");
    }

    #[test]
    fn legacy_plain_user_value_reads_as_empty() {
        let storage = WalletStorage::in_memory();
        storage.durable().set(keys::USER, "0xabc").unwrap();
        assert!(storage.persisted_addresses().unwrap().is_empty());
    }

    #[test]
    fn clear_auth_is_idempotent() {
        let storage = WalletStorage::in_memory();
        storage.durable().set(keys::TOKEN, "t").unwrap();
        storage.persist_address(ChainId::Bitcoin, "bc1q").unwrap();
        storage.durable().set(keys::LOGIN_TYPE, "SOCIAL").unwrap();
        storage.session().set(keys::OAUTH_PROVIDER, "google").unwrap();

        storage.clear_auth().unwrap();
        storage.clear_auth().unwrap();

        for key in [keys::TOKEN, keys::USER, keys::LOGIN_TYPE] {
            assert_eq!(storage.durable().get(key).unwrap(), None, "{key}");
        }
        assert_eq!(storage.session().get(keys::OAUTH_PROVIDER).unwrap(), None);
    }

    #[test]
    fn open_creates_both_namespaces() {
        let dir = tempfile::tempdir().unwrap();
        let storage = WalletStorage::open(dir.path()).unwrap();
        storage.durable().set(keys::TOKEN, "t").unwrap();
        storage.session().set(keys::OAUTH_ATTEMPT, "true").unwrap();
        assert!(dir.path().join("durable.json").exists());
        assert!(dir.path().join("session.json").exists());
    }
}
