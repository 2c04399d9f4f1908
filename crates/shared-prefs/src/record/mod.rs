//! Structured values stored as a group of primitive keys.
//!
//! A record named `AppSettings` with a property `mainId` is stored under the key
//! `AppSettings.mainId`. Reading a record back succeeds only when every required field is present
//! with the expected type; anything less yields no record rather than a partially filled one.
//!
//! # Usage
//!
//! ```rust
//! use shared_prefs::register_record;
//!
//! #[derive(Debug, PartialEq)]
//! struct AppSettings {
//!     main_id: i32,
//!     sound_enabled: bool,
//! }
//!
//! register_record!(AppSettings, "AppSettings" {
//!     main_id => "mainId",
//!     sound_enabled => "isSoundEnabled",
//! });
//! ```

use std::{cell::Cell, collections::HashMap};

mod field;

pub use field::{Json, RecordField};

use crate::{
    store::{WriteBatch, WriteOp},
    value::PrefValue,
};

/// A structured value persisted as one key per field.
///
/// Implement it with [`register_record!`](crate::register_record) rather than by hand.
pub trait Record: Sized {
    /// Prefix shared by every backing key of this record. Must remain stable once data is
    /// stored.
    const NAME: &'static str;

    /// Emit every field into the writer.
    fn write_fields(&self, writer: &mut RecordWriter) -> Result<(), serde_json::Error>;

    /// Rebuild the record, `None` if any required field is missing or mistyped.
    fn read_fields(reader: &RecordReader<'_>) -> Option<Self>;
}

/// Compose the storage key of a record property.
pub fn record_key(record_name: &str, property: &str) -> String {
    format!("{record_name}.{property}")
}

/// Collects the staged writes for one record.
#[derive(Debug)]
pub struct RecordWriter {
    name: &'static str,
    batch: WriteBatch,
}

impl RecordWriter {
    pub(crate) fn new(name: &'static str) -> Self {
        Self {
            name,
            batch: WriteBatch::new(),
        }
    }

    /// Stage a single field under `<record name>.<property>`.
    pub fn field<T: RecordField>(
        &mut self,
        property: &str,
        value: &T,
    ) -> Result<(), serde_json::Error> {
        let op = match value.encode()? {
            Some(value) => WriteOp::Put(value),
            None => WriteOp::Remove,
        };
        self.batch.insert(record_key(self.name, property), op);
        Ok(())
    }

    pub(crate) fn into_batch(self) -> WriteBatch {
        self.batch
    }
}

/// Resolves record fields against a map of stored values.
pub struct RecordReader<'a> {
    name: &'static str,
    values: &'a HashMap<String, PrefValue>,
    seen: Cell<bool>,
}

impl<'a> RecordReader<'a> {
    pub(crate) fn new(name: &'static str, values: &'a HashMap<String, PrefValue>) -> Self {
        Self {
            name,
            values,
            seen: Cell::new(false),
        }
    }

    /// Read a single field stored under `<record name>.<property>`.
    pub fn field<T: RecordField>(&self, property: &str) -> Option<T> {
        let value = self.values.get(&record_key(self.name, property));
        if value.is_some() {
            self.seen.set(true);
        }
        T::decode(value)
    }

    /// Whether any backing key of the record was found.
    pub(crate) fn any_present(&self) -> bool {
        self.seen.get()
    }
}

/// Encode a record into a batch of writes.
pub(crate) fn encode_record<R: Record>(record: &R) -> Result<WriteBatch, serde_json::Error> {
    let mut writer = RecordWriter::new(R::NAME);
    record.write_fields(&mut writer)?;
    Ok(writer.into_batch())
}

/// Decode a record from stored values. A record with no backing keys at all is absent even if
/// every field is optional.
pub(crate) fn decode_record<R: Record>(values: &HashMap<String, PrefValue>) -> Option<R> {
    let reader = RecordReader::new(R::NAME, values);
    let record = R::read_fields(&reader)?;
    reader.any_present().then_some(record)
}

/// Validate at compile time that a record name is a plain identifier: ASCII letters, digits and
/// underscores, not starting with a digit.
pub const fn validate_record_name(name: &str) -> bool {
    let bytes = name.as_bytes();
    if bytes.is_empty() || bytes[0].is_ascii_digit() {
        return false;
    }
    let mut i = 0;
    while i < bytes.len() {
        let byte = bytes[i];
        if !(byte.is_ascii_alphanumeric() || byte == b'_') {
            return false;
        }
        i += 1;
    }
    true
}

/// Implement [`Record`](crate::Record) for a struct by listing each field with its property
/// name. Every field of the struct must be listed.
#[macro_export]
macro_rules! register_record {
    ($ty:ty, $name:literal { $($field:ident => $property:literal),+ $(,)? }) => {
        const _: () = {
            impl $crate::Record for $ty {
                const NAME: &'static str = $name;

                fn write_fields(
                    &self,
                    writer: &mut $crate::RecordWriter,
                ) -> ::std::result::Result<(), $crate::__serde_json::Error> {
                    $( writer.field($property, &self.$field)?; )+
                    Ok(())
                }

                fn read_fields(reader: &$crate::RecordReader<'_>) -> ::std::option::Option<Self> {
                    Some(Self {
                        $( $field: reader.field($property)?, )+
                    })
                }
            }
            assert!(
                $crate::record::validate_record_name($name),
                concat!(
                    "Record name '",
                    $name,
                    "' must contain only ASCII letters, digits and underscores"
                )
            )
        };
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Profile {
        id: i64,
        nickname: Option<String>,
    }

    crate::register_record!(Profile, "Profile" {
        id => "id",
        nickname => "nickname",
    });

    #[derive(Debug, PartialEq)]
    struct OnlyOptional {
        note: Option<String>,
    }

    crate::register_record!(OnlyOptional, "OnlyOptional" { note => "note" });

    #[test]
    fn test_validate_name() {
        assert!(validate_record_name("AppSettings"));
        assert!(validate_record_name("settings_v2"));
        assert!(!validate_record_name(""));
        assert!(!validate_record_name("2fast"));
        assert!(!validate_record_name("App.Settings"));
        assert!(!validate_record_name("App Settings"));
    }

    #[test]
    fn test_encode_uses_prefixed_keys() {
        let batch = encode_record(&Profile {
            id: 9,
            nickname: None,
        })
        .unwrap();

        assert_eq!(batch.get("Profile.id"), Some(&WriteOp::Put(PrefValue::Long(9))));
        assert_eq!(batch.get("Profile.nickname"), Some(&WriteOp::Remove));
    }

    #[test]
    fn test_decode_rejects_partial_records() {
        let values = HashMap::from([("Profile.nickname".to_string(), PrefValue::from("neo"))]);
        assert_eq!(decode_record::<Profile>(&values), None);

        let values = HashMap::from([("Profile.id".to_string(), PrefValue::Int(9))]);
        assert_eq!(decode_record::<Profile>(&values), None);
    }

    #[test]
    fn test_decode_with_optional_missing() {
        let values = HashMap::from([("Profile.id".to_string(), PrefValue::Long(9))]);
        assert_eq!(
            decode_record::<Profile>(&values),
            Some(Profile {
                id: 9,
                nickname: None
            })
        );
    }

    #[test]
    fn test_no_backing_keys_means_absent() {
        assert_eq!(decode_record::<OnlyOptional>(&HashMap::new()), None);

        let values = HashMap::from([("OnlyOptional.note".to_string(), PrefValue::from("hi"))]);
        assert_eq!(
            decode_record::<OnlyOptional>(&values),
            Some(OnlyOptional {
                note: Some("hi".to_string())
            })
        );
    }
}
