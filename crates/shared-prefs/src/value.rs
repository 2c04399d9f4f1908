//! Primitive values a preferences file can hold.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// A single stored preference value.
///
/// This is the complete set of value types a preferences file supports. Structured values are
/// broken down into these through [`Record`](crate::Record).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum PrefValue {
    /// A boolean flag.
    Bool(bool),
    /// A 32-bit signed integer.
    Int(i32),
    /// A 64-bit signed integer.
    Long(i64),
    /// A single precision float. NaN and the infinities are stored as strings.
    Float(#[serde(with = "float_repr")] f32),
    /// A UTF-8 string.
    String(String),
    /// An unordered set of strings.
    StringSet(BTreeSet<String>),
}

impl PrefValue {
    /// Name of the variant, used in log messages and by the CLI.
    pub fn kind(&self) -> &'static str {
        match self {
            PrefValue::Bool(_) => "bool",
            PrefValue::Int(_) => "int",
            PrefValue::Long(_) => "long",
            PrefValue::Float(_) => "float",
            PrefValue::String(_) => "string",
            PrefValue::StringSet(_) => "set",
        }
    }
}

/// JSON numbers cannot hold non-finite floats.
mod float_repr {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    const NAN: &str = "NaN";
    const INFINITY: &str = "Infinity";
    const NEG_INFINITY: &str = "-Infinity";

    pub(super) fn serialize<S: Serializer>(value: &f32, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_nan() {
            serializer.serialize_str(NAN)
        } else if *value == f32::INFINITY {
            serializer.serialize_str(INFINITY)
        } else if *value == f32::NEG_INFINITY {
            serializer.serialize_str(NEG_INFINITY)
        } else {
            serializer.serialize_f32(*value)
        }
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Number(f32),
        Text(String),
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f32, D::Error> {
        match Repr::deserialize(deserializer)? {
            Repr::Number(value) => Ok(value),
            Repr::Text(text) => match text.as_str() {
                NAN => Ok(f32::NAN),
                INFINITY => Ok(f32::INFINITY),
                NEG_INFINITY => Ok(f32::NEG_INFINITY),
                other => Err(D::Error::custom(format!("invalid float {other:?}"))),
            },
        }
    }
}

/// A Rust type that maps one-to-one onto a [`PrefValue`] variant.
///
/// Reads never convert between variants: an `Int` read back as `i64` is a mismatch and yields
/// `None`.
pub trait PrefType: Sized {
    /// Wrap the value in its variant.
    fn into_value(self) -> PrefValue;

    /// Extract the value if `value` holds this type.
    fn from_value(value: &PrefValue) -> Option<Self>;
}

macro_rules! impl_pref_type {
    ($ty:ty, $variant:ident) => {
        impl PrefType for $ty {
            fn into_value(self) -> PrefValue {
                PrefValue::$variant(self)
            }

            fn from_value(value: &PrefValue) -> Option<Self> {
                match value {
                    PrefValue::$variant(inner) => Some(inner.clone()),
                    _ => None,
                }
            }
        }

        impl From<$ty> for PrefValue {
            fn from(value: $ty) -> Self {
                PrefValue::$variant(value)
            }
        }
    };
}

impl_pref_type!(bool, Bool);
impl_pref_type!(i32, Int);
impl_pref_type!(i64, Long);
impl_pref_type!(f32, Float);
impl_pref_type!(String, String);
impl_pref_type!(BTreeSet<String>, StringSet);

impl From<&str> for PrefValue {
    fn from(value: &str) -> Self {
        PrefValue::String(value.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_value_rejects_other_variants() {
        assert_eq!(i32::from_value(&PrefValue::Int(7)), Some(7));
        assert_eq!(i64::from_value(&PrefValue::Int(7)), None);
        assert_eq!(bool::from_value(&PrefValue::String("true".into())), None);
        assert_eq!(
            String::from_value(&PrefValue::from("hello")),
            Some("hello".to_string())
        );
    }

    #[test]
    fn test_serialized_form_is_tagged() {
        let json = serde_json::to_string(&PrefValue::Long(42)).unwrap();
        assert_eq!(json, r#"{"type":"long","value":42}"#);

        let set: BTreeSet<String> = ["b", "a"].into_iter().map(String::from).collect();
        let json = serde_json::to_string(&PrefValue::StringSet(set.clone())).unwrap();
        assert_eq!(json, r#"{"type":"string_set","value":["a","b"]}"#);
        assert_eq!(
            serde_json::from_str::<PrefValue>(&json).unwrap(),
            PrefValue::StringSet(set)
        );
    }

    #[test]
    fn test_kind() {
        assert_eq!(PrefValue::Float(1.5).kind(), "float");
        assert_eq!(PrefValue::StringSet(BTreeSet::new()).kind(), "set");
    }

    #[test]
    fn test_non_finite_floats_survive_json() {
        let json = serde_json::to_string(&PrefValue::Float(f32::INFINITY)).unwrap();
        assert_eq!(json, r#"{"type":"float","value":"Infinity"}"#);

        for value in [f32::INFINITY, f32::NEG_INFINITY, -0.0, 0.1, f32::MAX] {
            let json = serde_json::to_string(&PrefValue::Float(value)).unwrap();
            let decoded = serde_json::from_str::<PrefValue>(&json).unwrap();
            assert_eq!(decoded, PrefValue::Float(value), "{json}");
        }

        let json = serde_json::to_string(&PrefValue::Float(f32::NAN)).unwrap();
        let Ok(PrefValue::Float(decoded)) = serde_json::from_str::<PrefValue>(&json) else {
            panic!("NaN did not decode: {json}");
        };
        assert!(decoded.is_nan());

        assert!(serde_json::from_str::<PrefValue>(r#"{"type":"float","value":"big"}"#).is_err());
    }
}
