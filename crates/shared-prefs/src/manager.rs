use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, RwLock,
    },
};

use thiserror::Error;

use crate::{
    preference::Preference,
    record::{decode_record, encode_record, Record},
    store::{NativeStore, StoreError, WriteBatch, WriteOp},
    value::{PrefType, PrefValue},
    worker::FlushWorker,
};

/// Errors returned by [`PreferencesManager`] operations.
#[derive(Debug, Error)]
pub enum ManagerError {
    /// Keys must contain at least one character.
    #[error("Preference keys must not be empty")]
    EmptyKey,

    /// The manager was recycled and can no longer be used.
    #[error("The manager for {0:?} is already recycled. Obtain a new one from the registry.")]
    Recycled(String),

    /// A record field could not be encoded.
    #[error("Failed to encode record: {0}")]
    Record(#[from] serde_json::Error),
}

/// Typed access to a single preferences file.
///
/// Writes are staged in a pending set and only become visible to reads once flushed, either with
/// [`commit`](Self::commit), which blocks until the store reports the write durable, or with
/// [`apply`](Self::apply), which makes the values readable immediately and persists them in the
/// background.
///
/// Managers are obtained from a [`PreferencesRegistry`](crate::PreferencesRegistry), which
/// guarantees a single manager per file name.
pub struct PreferencesManager {
    store: Arc<dyn NativeStore>,
    worker: FlushWorker,
    snapshot: RwLock<HashMap<String, PrefValue>>,
    pending: Mutex<WriteBatch>,
    recycled: AtomicBool,
}

impl std::fmt::Debug for PreferencesManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreferencesManager")
            .field("name", &self.store.name())
            .field("recycled", &self.is_recycled())
            .finish()
    }
}

impl PreferencesManager {
    pub(crate) fn open(
        store: Arc<dyn NativeStore>,
        worker: FlushWorker,
    ) -> Result<Self, StoreError> {
        let snapshot = store.load()?;
        log::debug!(
            "Loaded {} preferences from {:?}",
            snapshot.len(),
            store.name()
        );

        Ok(Self {
            store,
            worker,
            snapshot: RwLock::new(snapshot),
            pending: Mutex::new(WriteBatch::new()),
            recycled: AtomicBool::new(false),
        })
    }

    /// The preferences file this manager operates on.
    pub fn name(&self) -> &str {
        self.store.name()
    }

    /// Stage `value` under `key`, replacing any value staged earlier for the same key.
    ///
    /// Nothing is persisted until [`commit`](Self::commit) or [`apply`](Self::apply) is called.
    pub fn put(
        &self,
        key: impl Into<String>,
        value: impl Into<PrefValue>,
    ) -> Result<&Self, ManagerError> {
        self.stage(vec![(key.into(), WriteOp::Put(value.into()))])
    }

    /// [`put`](Self::put) followed by [`commit`](Self::commit).
    pub fn put_and_commit(
        &self,
        key: impl Into<String>,
        value: impl Into<PrefValue>,
    ) -> Result<bool, ManagerError> {
        self.put(key, value)?.commit()
    }

    /// [`put`](Self::put) followed by [`apply`](Self::apply).
    pub fn put_and_apply(
        &self,
        key: impl Into<String>,
        value: impl Into<PrefValue>,
    ) -> Result<(), ManagerError> {
        self.put(key, value)?.apply()
    }

    /// Stage every field of `record`.
    pub fn put_record<R: Record>(&self, record: &R) -> Result<&Self, ManagerError> {
        self.check_state()?;
        let batch = encode_record(record)?;
        self.stage(
            batch
                .iter()
                .map(|(key, op)| (key.to_owned(), op.clone()))
                .collect(),
        )
    }

    /// [`put_record`](Self::put_record) followed by [`commit`](Self::commit).
    pub fn put_record_and_commit<R: Record>(&self, record: &R) -> Result<bool, ManagerError> {
        self.put_record(record)?.commit()
    }

    /// [`put_record`](Self::put_record) followed by [`apply`](Self::apply).
    pub fn put_record_and_apply<R: Record>(&self, record: &R) -> Result<(), ManagerError> {
        self.put_record(record)?.apply()
    }

    /// Stage several preferences at once. Nothing is staged if any key is invalid.
    pub fn put_all<I>(&self, items: I) -> Result<&Self, ManagerError>
    where
        I: IntoIterator<Item = Preference>,
    {
        self.stage(items.into_iter().flat_map(Preference::into_ops).collect())
    }

    /// [`put_all`](Self::put_all) followed by [`commit`](Self::commit).
    pub fn put_all_and_commit<I>(&self, items: I) -> Result<bool, ManagerError>
    where
        I: IntoIterator<Item = Preference>,
    {
        self.put_all(items)?.commit()
    }

    /// [`put_all`](Self::put_all) followed by [`apply`](Self::apply).
    pub fn put_all_and_apply<I>(&self, items: I) -> Result<(), ManagerError>
    where
        I: IntoIterator<Item = Preference>,
    {
        self.put_all(items)?.apply()
    }

    /// Stage the removal of `key`.
    pub fn remove(&self, key: impl Into<String>) -> Result<&Self, ManagerError> {
        self.stage(vec![(key.into(), WriteOp::Remove)])
    }

    /// [`remove`](Self::remove) followed by [`commit`](Self::commit).
    pub fn remove_and_commit(&self, key: impl Into<String>) -> Result<bool, ManagerError> {
        self.remove(key)?.commit()
    }

    /// [`remove`](Self::remove) followed by [`apply`](Self::apply).
    pub fn remove_and_apply(&self, key: impl Into<String>) -> Result<(), ManagerError> {
        self.remove(key)?.apply()
    }

    /// Read the value stored under `key`.
    ///
    /// Returns `default` when the key is missing or holds a different type. Staged but unflushed
    /// writes are not visible.
    pub fn get<T: PrefType>(&self, key: &str, default: T) -> Result<T, ManagerError> {
        self.check_state()?;
        check_key(key)?;

        let snapshot = self.snapshot.read().expect("RwLock should not be poisoned");
        Ok(snapshot.get(key).and_then(T::from_value).unwrap_or(default))
    }

    /// Whether a value is stored under `key`, whatever its type.
    pub fn contains(&self, key: &str) -> Result<bool, ManagerError> {
        self.check_state()?;
        check_key(key)?;

        Ok(self
            .snapshot
            .read()
            .expect("RwLock should not be poisoned")
            .contains_key(key))
    }

    /// Rebuild a record from its stored fields.
    ///
    /// Returns `None` unless every required field is stored with the expected type.
    pub fn get_record<R: Record>(&self) -> Result<Option<R>, ManagerError> {
        self.check_state()?;

        let snapshot = self.snapshot.read().expect("RwLock should not be poisoned");
        Ok(decode_record(&snapshot))
    }

    /// Synchronously write the pending set to the store.
    ///
    /// Blocks until the store has persisted the writes. Returns `false` if the store failed, in
    /// which case the pending writes are kept so the commit can be retried. With nothing pending
    /// this returns `true` without touching the store.
    ///
    /// Must not be called from inside an async runtime.
    pub fn commit(&self) -> Result<bool, ManagerError> {
        self.check_state()?;
        Ok(self.commit_pending())
    }

    /// Make the pending writes readable immediately and persist them in the background.
    ///
    /// The outcome of the background write is not reported; failures are only logged.
    pub fn apply(&self) -> Result<(), ManagerError> {
        self.check_state()?;

        let mut pending = self.pending.lock().expect("Mutex should not be poisoned");
        if pending.is_empty() {
            return Ok(());
        }

        let batch = std::mem::take(&mut *pending);
        batch.apply_to(&mut self.snapshot.write().expect("RwLock should not be poisoned"));
        self.worker.write_detached(self.store.clone(), batch);

        Ok(())
    }

    /// Commit whatever is still pending and retire the manager. Every later call fails with
    /// [`ManagerError::Recycled`]. Calling it again has no effect.
    ///
    /// Returns once earlier background writes have reached the store as well, so a manager opened
    /// afterwards loads everything this one exposed.
    pub fn recycle(&self) {
        if self.recycled.swap(true, Ordering::SeqCst) {
            return;
        }

        if !self.commit_pending() {
            log::warn!(
                "Pending preferences for {:?} were lost while recycling",
                self.name()
            );
        }
        self.worker.sync();
    }

    /// Whether [`recycle`](Self::recycle) has been called.
    pub fn is_recycled(&self) -> bool {
        self.recycled.load(Ordering::SeqCst)
    }

    fn commit_pending(&self) -> bool {
        let mut pending = self.pending.lock().expect("Mutex should not be poisoned");
        if pending.is_empty() {
            return true;
        }

        match self
            .worker
            .write_blocking(self.store.clone(), pending.clone())
        {
            Ok(()) => {
                let mut snapshot = self.snapshot.write().expect("RwLock should not be poisoned");
                pending.apply_to(&mut snapshot);
                *pending = WriteBatch::new();
                true
            }
            Err(e) => {
                log::warn!("Commit to {:?} failed: {e}", self.name());
                false
            }
        }
    }

    fn stage(&self, ops: Vec<(String, WriteOp)>) -> Result<&Self, ManagerError> {
        self.check_state()?;
        for (key, _) in &ops {
            check_key(key)?;
        }

        let mut pending = self.pending.lock().expect("Mutex should not be poisoned");
        for (key, op) in ops {
            pending.insert(key, op);
        }

        Ok(self)
    }

    fn check_state(&self) -> Result<(), ManagerError> {
        if self.is_recycled() {
            return Err(ManagerError::Recycled(self.name().to_owned()));
        }
        Ok(())
    }
}

fn check_key(key: &str) -> Result<(), ManagerError> {
    if key.is_empty() {
        return Err(ManagerError::EmptyKey);
    }
    Ok(())
}
