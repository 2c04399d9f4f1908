use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering},
        Arc, Mutex, RwLock,
    },
    time::Duration,
};

use super::{validate_store_name, NativeStore, StoreBackend, StoreError, WriteBatch};
use crate::value::PrefValue;

/// A backend that keeps every store in process memory.
///
/// Opening the same name twice returns the same store, so data written through one registry is
/// visible to a registry created later over the same backend.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    stores: Mutex<HashMap<String, Arc<MemoryStore>>>,
    unavailable: AtomicBool,
}

impl MemoryBackend {
    /// Creates a backend without any stores.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `open` fail with [`StoreError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// The store opened under `name`, if any.
    pub fn store(&self, name: &str) -> Option<Arc<MemoryStore>> {
        self.stores
            .lock()
            .expect("Mutex should not be poisoned")
            .get(name)
            .cloned()
    }
}

impl StoreBackend for MemoryBackend {
    fn open(&self, name: &str) -> Result<Arc<dyn NativeStore>, StoreError> {
        validate_store_name(name)?;

        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory backend disabled".to_owned()));
        }

        let store: Arc<dyn NativeStore> = self
            .stores
            .lock()
            .expect("Mutex should not be poisoned")
            .entry(name.to_owned())
            .or_insert_with(|| Arc::new(MemoryStore::new(name)))
            .clone();

        Ok(store)
    }
}

/// A single in-memory preferences file.
#[derive(Debug)]
pub struct MemoryStore {
    name: String,
    values: RwLock<HashMap<String, PrefValue>>,
    reject_writes: AtomicBool,
    write_delay_ms: AtomicU64,
    write_count: AtomicUsize,
}

impl MemoryStore {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            values: RwLock::new(HashMap::new()),
            reject_writes: AtomicBool::new(false),
            write_delay_ms: AtomicU64::new(0),
            write_count: AtomicUsize::new(0),
        }
    }

    /// Make subsequent writes fail with [`StoreError::WriteRejected`].
    pub fn set_reject_writes(&self, reject: bool) {
        self.reject_writes.store(reject, Ordering::SeqCst);
    }

    /// Make every subsequent write take at least `delay`, as a slow disk would.
    pub fn set_write_delay(&self, delay: Duration) {
        let millis = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self.write_delay_ms.store(millis, Ordering::SeqCst);
    }

    /// Number of batches successfully written.
    pub fn write_count(&self) -> usize {
        self.write_count.load(Ordering::SeqCst)
    }

    /// The currently persisted value for `key`.
    pub fn value(&self, key: &str) -> Option<PrefValue> {
        self.values
            .read()
            .expect("RwLock should not be poisoned")
            .get(key)
            .cloned()
    }
}

impl NativeStore for MemoryStore {
    fn name(&self) -> &str {
        &self.name
    }

    fn load(&self) -> Result<HashMap<String, PrefValue>, StoreError> {
        Ok(self
            .values
            .read()
            .expect("RwLock should not be poisoned")
            .clone())
    }

    fn write(&self, batch: &WriteBatch) -> Result<(), StoreError> {
        let delay = self.write_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            std::thread::sleep(Duration::from_millis(delay));
        }

        if self.reject_writes.load(Ordering::SeqCst) {
            return Err(StoreError::WriteRejected(self.name.clone()));
        }

        batch.apply_to(&mut self.values.write().expect("RwLock should not be poisoned"));
        self.write_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
