// Persistent store adapter
// Key-value storage of JSON blobs, wrapped in a versioned envelope

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;
use tracing::warn;

/// Current version of every persisted blob
pub const STORE_VERSION: u32 = 1;

/// Error types for persistence operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PersistenceError {
    /// File I/O error
    #[error("IO Error: {0}")]
    IoError(String),
    /// JSON serialization/deserialization error
    #[error("JSON Error: {0}")]
    JsonError(String),
    /// Invalid data format
    #[error("Invalid Data: {0}")]
    InvalidData(String),
}

/// Named keys the application persists under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreKey {
    /// User settings
    Settings,
    /// Contact directory
    Contacts,
    /// Visibility set of the chat list
    ActiveChats,
    /// Transcript of all conversations
    Messages,
    /// World-book entries
    WorldEntries,
    /// Sticker shelf
    Stickers,
}

impl StoreKey {
    /// Every key, in load order
    pub const ALL: [StoreKey; 6] = [
        StoreKey::Settings,
        StoreKey::Contacts,
        StoreKey::ActiveChats,
        StoreKey::Messages,
        StoreKey::WorldEntries,
        StoreKey::Stickers,
    ];

    /// Storage name of the key
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreKey::Settings => "settings",
            StoreKey::Contacts => "contacts",
            StoreKey::ActiveChats => "active_chats",
            StoreKey::Messages => "messages",
            StoreKey::WorldEntries => "world_entries",
            StoreKey::Stickers => "stickers",
        }
    }
}

/// Raw key-value storage of JSON values; last write wins
pub trait KeyValueStore: Send + Sync {
    /// Read a value; `Ok(None)` when the key was never written
    fn get(&self, key: &str) -> Result<Option<Value>, PersistenceError>;

    /// Write a value, replacing any previous one
    fn set(&self, key: &str, value: Value) -> Result<(), PersistenceError>;
}

/// Serializable envelope around every blob
/// `version` leaves room for migrations
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Envelope<T> {
    version: u32,
    data: T,
}

/// Wrap a typed value in the current envelope
pub fn encode<T: Serialize>(value: &T) -> Result<Value, PersistenceError> {
    let envelope = Envelope {
        version: STORE_VERSION,
        data: value,
    };
    serde_json::to_value(&envelope).map_err(|e| PersistenceError::JsonError(e.to_string()))
}

/// Serialize and store a typed value under a key
pub fn save<T: Serialize>(
    store: &dyn KeyValueStore,
    key: StoreKey,
    value: &T,
) -> Result<(), PersistenceError> {
    store.set(key.as_str(), encode(value)?)
}

/// Load a typed value; `Ok(None)` when the key is missing
pub fn load<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: StoreKey,
) -> Result<Option<T>, PersistenceError> {
    let Some(json) = store.get(key.as_str())? else {
        return Ok(None);
    };

    let envelope: Envelope<T> =
        serde_json::from_value(json).map_err(|e| PersistenceError::JsonError(e.to_string()))?;

    // Validate version (for future migration support)
    if envelope.version != STORE_VERSION {
        return Err(PersistenceError::InvalidData(format!(
            "Unsupported {} version: {}",
            key.as_str(),
            envelope.version
        )));
    }

    Ok(Some(envelope.data))
}

/// Load a typed value, falling back to `default` when the key is missing or
/// its contents are unusable
pub fn load_or_else<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: StoreKey,
    default: impl FnOnce() -> T,
) -> T {
    match load(store, key) {
        Ok(Some(value)) => value,
        Ok(None) => default(),
        Err(e) => {
            warn!(key = key.as_str(), error = %e, "Discarding unreadable stored state");
            default()
        }
    }
}

/// One JSON file per key inside a directory
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    /// Create a store rooted at `dir`; the directory is created on first write
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Path of the file backing a key
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<Value>, PersistenceError> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }

        let json =
            fs::read_to_string(&path).map_err(|e| PersistenceError::IoError(e.to_string()))?;
        let value =
            serde_json::from_str(&json).map_err(|e| PersistenceError::JsonError(e.to_string()))?;
        Ok(Some(value))
    }

    fn set(&self, key: &str, value: Value) -> Result<(), PersistenceError> {
        fs::create_dir_all(&self.dir).map_err(|e| PersistenceError::IoError(e.to_string()))?;

        let json = serde_json::to_string_pretty(&value)
            .map_err(|e| PersistenceError::JsonError(e.to_string()))?;
        fs::write(self.path_for(key), json).map_err(|e| PersistenceError::IoError(e.to_string()))
    }
}

/// Volatile store for tests and ephemeral runs
#[derive(Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, Value>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Value>, PersistenceError> {
        let values = self
            .values
            .lock()
            .map_err(|e| PersistenceError::IoError(e.to_string()))?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: Value) -> Result<(), PersistenceError> {
        let mut values = self
            .values
            .lock()
            .map_err(|e| PersistenceError::IoError(e.to_string()))?;
        values.insert(key.to_string(), value);
        Ok(())
    }
}
