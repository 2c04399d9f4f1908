use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use thiserror::Error;

use crate::value::PrefValue;

mod configuration;
mod memory;
mod sqlite;

pub use configuration::StoreConfiguration;
pub use memory::{MemoryBackend, MemoryStore};
pub use sqlite::SqliteBackend;

/// An error reported by a storage backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store name cannot be used as a file name.
    #[error("Invalid preferences file name: {0:?}")]
    InvalidName(String),

    /// The backend cannot provide storage right now.
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// The backend refused to persist a batch.
    #[error("Write rejected for preferences file {0:?}")]
    WriteRejected(String),

    /// Filesystem failure while preparing storage.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored value could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// An internal database error.
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
}

/// A single staged change to one key.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    /// Store the value under the key, replacing whatever was there.
    Put(PrefValue),
    /// Delete the key.
    Remove,
}

/// A set of changes flushed to a store as one unit.
///
/// Holds at most one operation per key; staging a second operation for a key replaces the first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteBatch {
    ops: BTreeMap<String, WriteOp>,
}

impl WriteBatch {
    /// An empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage `op` for `key`.
    pub fn insert(&mut self, key: String, op: WriteOp) {
        self.ops.insert(key, op);
    }

    /// Whether no key has an operation staged.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Number of keys with a staged operation.
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Look up the staged operation for `key`.
    pub fn get(&self, key: &str) -> Option<&WriteOp> {
        self.ops.get(key)
    }

    /// Iterate over the staged operations in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &WriteOp)> {
        self.ops.iter().map(|(key, op)| (key.as_str(), op))
    }

    /// Apply the batch to an in-memory map of values.
    pub fn apply_to(&self, values: &mut HashMap<String, PrefValue>) {
        for (key, op) in &self.ops {
            match op {
                WriteOp::Put(value) => {
                    values.insert(key.clone(), value.clone());
                }
                WriteOp::Remove => {
                    values.remove(key);
                }
            }
        }
    }
}

/// A single named preferences file, as provided by the platform.
///
/// Implementations only need to offer bulk load and atomic batch writes. Caching, typed access
/// and asynchronous flushing live in [`PreferencesManager`](crate::PreferencesManager).
pub trait NativeStore: Send + Sync {
    /// The preferences file name this store was opened under.
    fn name(&self) -> &str;

    /// Read every stored key.
    fn load(&self) -> Result<HashMap<String, PrefValue>, StoreError>;

    /// Persist the batch. The write is durable once this returns `Ok`.
    fn write(&self, batch: &WriteBatch) -> Result<(), StoreError>;
}

/// Opens [`NativeStore`]s by preferences file name.
pub trait StoreBackend: Send + Sync {
    /// Open (creating if needed) the store for the given file name.
    fn open(&self, name: &str) -> Result<Arc<dyn NativeStore>, StoreError>;
}

/// Check that a preferences file name is usable as a file name on every backend.
pub fn validate_store_name(name: &str) -> Result<(), StoreError> {
    let invalid = name.is_empty()
        || name == "."
        || name == ".."
        || name.chars().any(|c| matches!(c, '/' | '\\' | '\0'));

    if invalid {
        return Err(StoreError::InvalidName(name.to_owned()));
    }
    Ok(())
}
