use std::{
    collections::HashMap,
    path::PathBuf,
    sync::{Arc, Mutex},
};

use super::{validate_store_name, NativeStore, StoreBackend, StoreError, WriteBatch, WriteOp};
use crate::value::PrefValue;

/// A backend that keeps each preferences file in its own SQLite database.
#[derive(Debug, Clone)]
pub struct SqliteBackend {
    folder_path: PathBuf,
}

impl SqliteBackend {
    /// Databases are created inside `folder_path`, which is created on first use.
    pub fn new(folder_path: impl Into<PathBuf>) -> Self {
        Self {
            folder_path: folder_path.into(),
        }
    }

    /// Location of the database backing the preferences file `name`.
    pub fn database_path(&self, name: &str) -> PathBuf {
        self.folder_path.join(format!("{name}.sqlite"))
    }
}

impl StoreBackend for SqliteBackend {
    fn open(&self, name: &str) -> Result<Arc<dyn NativeStore>, StoreError> {
        validate_store_name(name)?;
        std::fs::create_dir_all(&self.folder_path)?;

        let path = self.database_path(name);
        log::debug!("Opening preferences file {name:?} at {}", path.display());

        let conn = rusqlite::Connection::open(&path)?;

        // A commit reports success only once the batch is on disk
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
            row.get::<_, String>(0)
        })?;
        conn.pragma_update(None, "synchronous", "FULL")?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS preferences (key TEXT PRIMARY KEY, value TEXT NOT NULL)",
            [],
        )?;

        let store: Arc<dyn NativeStore> = Arc::new(SqliteStore {
            name: name.to_owned(),
            conn: Mutex::new(conn),
        });
        Ok(store)
    }
}

struct SqliteStore {
    name: String,
    conn: Mutex<rusqlite::Connection>,
}

impl NativeStore for SqliteStore {
    fn name(&self) -> &str {
        &self.name
    }

    fn load(&self) -> Result<HashMap<String, PrefValue>, StoreError> {
        let conn = self.conn.lock().expect("Mutex should not be poisoned");
        let mut stmt = conn.prepare("SELECT key, value FROM preferences")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut values = HashMap::new();
        for row in rows {
            let (key, value) = row?;
            match serde_json::from_str::<PrefValue>(&value) {
                Ok(value) => {
                    values.insert(key, value);
                }
                // An undecodable row is treated like a missing key
                Err(e) => {
                    log::warn!("Skipping unreadable key {key:?} in {:?}: {e}", self.name);
                }
            }
        }

        Ok(values)
    }

    fn write(&self, batch: &WriteBatch) -> Result<(), StoreError> {
        let mut conn = self.conn.lock().expect("Mutex should not be poisoned");
        let transaction = conn.transaction()?;

        for (key, op) in batch.iter() {
            match op {
                WriteOp::Put(value) => {
                    let value = serde_json::to_string(value)?;
                    transaction.execute(
                        "INSERT OR REPLACE INTO preferences (key, value) VALUES (?1, ?2)",
                        rusqlite::params![key, value],
                    )?;
                }
                WriteOp::Remove => {
                    transaction
                        .execute("DELETE FROM preferences WHERE key = ?1", rusqlite::params![key])?;
                }
            }
        }

        transaction.commit()?;
        Ok(())
    }
}
