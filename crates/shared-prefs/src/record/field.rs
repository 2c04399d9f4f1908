use std::collections::BTreeSet;

use serde::{de::DeserializeOwned, Serialize};

use crate::value::{PrefType, PrefValue};

/// A type that can be used as a field of a [`Record`](crate::Record).
pub trait RecordField: Sized {
    /// Encode the field. `None` means the backing key should be removed.
    fn encode(&self) -> Result<Option<PrefValue>, serde_json::Error>;

    /// Decode the field from its backing key, `None` if the key is missing and the field is
    /// required, or the stored value has the wrong type.
    fn decode(value: Option<&PrefValue>) -> Option<Self>;
}

macro_rules! impl_record_field {
    ($($ty:ty),+) => {
        $(
            impl RecordField for $ty {
                fn encode(&self) -> Result<Option<PrefValue>, serde_json::Error> {
                    Ok(Some(self.clone().into_value()))
                }

                fn decode(value: Option<&PrefValue>) -> Option<Self> {
                    value.and_then(<$ty as PrefType>::from_value)
                }
            }
        )+
    };
}

impl_record_field!(bool, i32, i64, f32, String, BTreeSet<String>);

/// Optional fields may be absent. A stored value of the wrong type still rejects the record.
impl<T: RecordField> RecordField for Option<T> {
    fn encode(&self) -> Result<Option<PrefValue>, serde_json::Error> {
        match self {
            Some(inner) => inner.encode(),
            None => Ok(None),
        }
    }

    fn decode(value: Option<&PrefValue>) -> Option<Self> {
        match value {
            None => Some(None),
            Some(value) => T::decode(Some(value)).map(Some),
        }
    }
}

/// Stores any serde type as a JSON string under a single key.
///
/// Useful for nested structures that would otherwise need their own record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Json<T>(pub T);

impl<T: Serialize + DeserializeOwned> RecordField for Json<T> {
    fn encode(&self) -> Result<Option<PrefValue>, serde_json::Error> {
        Ok(Some(PrefValue::String(serde_json::to_string(&self.0)?)))
    }

    fn decode(value: Option<&PrefValue>) -> Option<Self> {
        match value? {
            PrefValue::String(json) => serde_json::from_str(json).ok().map(Json),
            _ => None,
        }
    }
}
