use std::{path::PathBuf, sync::Arc};

use super::{MemoryBackend, SqliteBackend, StoreBackend};

#[derive(Debug, Clone)]
/// Configuration for the storage backing preferences files.
pub enum StoreConfiguration {
    /// SQLite configuration, used on native platforms
    Sqlite {
        /// Directory holding one `<name>.sqlite` database per preferences file. Created on first
        /// use.
        folder_path: PathBuf,
    },

    /// Keep everything in memory. Nothing survives the process.
    InMemory,
}

impl StoreConfiguration {
    /// Build the backend described by this configuration.
    pub fn into_backend(self) -> Arc<dyn StoreBackend> {
        match self {
            StoreConfiguration::Sqlite { folder_path } => Arc::new(SqliteBackend::new(folder_path)),
            StoreConfiguration::InMemory => Arc::new(MemoryBackend::new()),
        }
    }
}
