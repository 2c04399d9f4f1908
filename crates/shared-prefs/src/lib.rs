#![doc = include_str!("../README.md")]

/// Primitive value types a preferences file can store.
pub mod value;

/// Storage backends holding the persisted preferences files.
pub mod store;

/// Structured values mapped onto groups of primitive keys.
pub mod record;

mod manager;
mod preference;
mod registry;
mod worker;

pub use manager::{ManagerError, PreferencesManager};
pub use preference::Preference;
pub use record::{Json, Record, RecordField, RecordReader, RecordWriter};
pub use registry::{PreferencesContext, PreferencesRegistry, RegistryError};
pub use store::{StoreConfiguration, StoreError};
pub use value::{PrefType, PrefValue};

#[doc(hidden)]
pub use serde_json as __serde_json;
