use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use thiserror::Error;

use crate::{
    manager::PreferencesManager,
    store::{StoreBackend, StoreConfiguration, StoreError},
    worker::FlushWorker,
};

/// Hands out one [`PreferencesManager`] per preferences file name.
///
/// Managers are created lazily on first request and cached until [`recycle`](Self::recycle).
/// All managers of a registry share a single background flush worker.
pub struct PreferencesRegistry {
    backend: Arc<dyn StoreBackend>,
    worker: FlushWorker,
    managers: Mutex<HashMap<String, Arc<PreferencesManager>>>,
}

impl std::fmt::Debug for PreferencesRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreferencesRegistry").finish()
    }
}

/// Errors returned when looking up a [`PreferencesManager`].
#[derive(Debug, Error)]
pub enum RegistryError {
    /// File names must contain at least one character.
    #[error("Preferences file name must not be empty")]
    EmptyName,

    /// The backend could not open or load the preferences file.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl PreferencesRegistry {
    /// Creates an empty registry over `backend`.
    pub fn new(backend: Arc<dyn StoreBackend>) -> Self {
        PreferencesRegistry {
            backend,
            worker: FlushWorker::spawn(),
            managers: Mutex::new(HashMap::new()),
        }
    }

    /// Creates an empty registry over the backend described by `configuration`.
    pub fn from_configuration(configuration: StoreConfiguration) -> Self {
        Self::new(configuration.into_backend())
    }

    /// Returns the manager for `name`, opening the underlying store on first use.
    ///
    /// Concurrent first requests for the same name all receive the same instance.
    pub fn get(&self, name: &str) -> Result<Arc<PreferencesManager>, RegistryError> {
        if name.is_empty() {
            return Err(RegistryError::EmptyName);
        }

        let mut managers = self.managers.lock().expect("Mutex should not be poisoned");
        if let Some(manager) = managers.get(name) {
            // A manager recycled on its own is replaced like a missing one
            if !manager.is_recycled() {
                return Ok(Arc::clone(manager));
            }
            log::debug!("Replacing recycled manager for {name:?}");
        }

        let store = self.backend.open(name)?;
        let manager = Arc::new(PreferencesManager::open(store, self.worker.clone())?);
        managers.insert(name.to_owned(), Arc::clone(&manager));

        Ok(manager)
    }

    /// Recycles every cached manager and empties the cache.
    ///
    /// Pending writes are committed and queued background writes are awaited first, so managers
    /// created by later calls to [`get`](Self::get) load every value the old ones exposed.
    /// Handles obtained earlier fail from now on.
    pub fn recycle(&self) {
        let managers: Vec<_> = self
            .managers
            .lock()
            .expect("Mutex should not be poisoned")
            .drain()
            .map(|(_, manager)| manager)
            .collect();

        for manager in managers {
            manager.recycle();
        }
        self.worker.sync();
    }

    /// Blocks until every background write queued so far has reached its store.
    pub fn wait_for_pending_writes(&self) {
        self.worker.sync();
    }
}

/// Something that can provide preferences managers, typically an application-wide context
/// object owning a [`PreferencesRegistry`].
pub trait PreferencesContext {
    /// The registry managers are looked up in.
    fn preferences_registry(&self) -> &PreferencesRegistry;

    /// Retrieves the existing or creates a new manager for the given preferences file.
    fn shared_preferences_manager(
        &self,
        name: &str,
    ) -> Result<Arc<PreferencesManager>, RegistryError> {
        self.preferences_registry().get(name)
    }
}

impl PreferencesContext for PreferencesRegistry {
    fn preferences_registry(&self) -> &PreferencesRegistry {
        self
    }
}
