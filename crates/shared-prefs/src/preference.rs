use crate::{
    record::{encode_record, Record},
    store::{WriteBatch, WriteOp},
    value::PrefValue,
};

/// One item of a bulk write: a single primitive or a whole record.
///
/// ```rust
/// use shared_prefs::{Preference, PrefValue};
///
/// let items: Vec<Preference> = vec![
///     ("mainId", 13).into(),
///     ("homeMessage", "Hello!").into(),
///     Preference::value("isSoundEnabled", PrefValue::Bool(true)),
/// ];
/// assert_eq!(items.len(), 3);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Preference {
    /// A single key holding a primitive value.
    Value {
        /// Key the value is stored under.
        key: String,
        /// The value to store.
        value: PrefValue,
    },
    /// The already encoded fields of a record.
    Record(WriteBatch),
}

impl Preference {
    /// A single primitive preference.
    pub fn value(key: impl Into<String>, value: impl Into<PrefValue>) -> Self {
        Preference::Value {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Encode a record so it can be staged together with other preferences.
    pub fn record<R: Record>(record: &R) -> Result<Self, serde_json::Error> {
        Ok(Preference::Record(encode_record(record)?))
    }

    /// Every key touched by this item, with its write.
    pub(crate) fn into_ops(self) -> Vec<(String, WriteOp)> {
        match self {
            Preference::Value { key, value } => vec![(key, WriteOp::Put(value))],
            Preference::Record(batch) => batch
                .iter()
                .map(|(key, op)| (key.to_owned(), op.clone()))
                .collect(),
        }
    }
}

impl<K: Into<String>, V: Into<PrefValue>> From<(K, V)> for Preference {
    fn from((key, value): (K, V)) -> Self {
        Preference::value(key, value)
    }
}
