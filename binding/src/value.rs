//! Typed values produced by decoding and consumed by encoding.

use bytes::Bytes;
use std::{collections::BTreeMap, fmt};

/// A decoded (or to-be-encoded) value.
///
/// Integer width is carried by the [crate::attribute::Attribute] describing the value, not by the
/// value itself: narrow integers are range checked when parsed and widened to `i64`/`u64`. In the
/// same way, 32-bit floats are stored as the `f64` holding the exact `f32` value.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// Explicit null, only produced for untyped ("any") body values.
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    String(String),
    Bytes(Bytes),
    Array(Vec<Value>),
    /// Entries in wire order.
    Map(Vec<(Value, Value)>),
    Object(BTreeMap<String, Value>),
}

impl Value {
    /// Builds an object from `(field, value)` pairs.
    pub fn object<K, V>(fields: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        Value::Object(
            fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Builds a map from `(key, value)` pairs, preserving order.
    pub fn map<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<Value>,
        V: Into<Value>,
    {
        Value::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Returns the field `name` if `self` is an object holding it.
    pub fn get(&self, name: &str) -> Option<&Value> {
        match self {
            Value::Object(fields) => fields.get(name),
            _ => None,
        }
    }

    /// Returns the string content of a [Value::String].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the value as a float, if it is numeric.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Value::Int(v) => Some(v as f64),
            Value::UInt(v) => Some(v as f64),
            Value::Float(v) => Some(v),
            _ => None,
        }
    }

    /// Returns true for [Value::Null].
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns the length used by length rules: characters for strings, bytes for byte
    /// sequences, and entries for arrays, maps and objects.
    pub fn length(&self) -> Option<usize> {
        match self {
            Value::String(s) => Some(s.chars().count()),
            Value::Bytes(b) => Some(b.len()),
            Value::Array(items) => Some(items.len()),
            Value::Map(entries) => Some(entries.len()),
            Value::Object(fields) => Some(fields.len()),
            _ => None,
        }
    }

    /// Formats the value as a literal: strings are quoted, containers show their items.
    ///
    /// Used in error messages so that `"1"` and `1` remain distinguishable.
    pub fn literal(&self) -> Literal<'_> {
        Literal(self)
    }
}

/// Generic stringification: strings and bytes are written as their text, containers as lists of
/// their (literal) items.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => f.write_str(s),
            Value::Bytes(b) => f.write_str(&String::from_utf8_lossy(b)),
            other => write!(f, "{}", Literal(other)),
        }
    }
}

/// See [Value::literal].
pub struct Literal<'a>(&'a Value);

impl fmt::Display for Literal<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Value::Null => f.write_str("null"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::UInt(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::String(s) => write!(f, "{s:?}"),
            Value::Bytes(b) => write!(f, "{:?}", String::from_utf8_lossy(b)),
            Value::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item.literal())?;
                }
                f.write_str("]")
            }
            Value::Map(entries) => {
                f.write_str("{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", k.literal(), v.literal())?;
                }
                f.write_str("}")
            }
            Value::Object(fields) => {
                f.write_str("{")?;
                for (i, (k, v)) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{k:?}: {}", v.literal())?;
                }
                f.write_str("}")
            }
        }
    }
}

/// Formats a list of values as comma-separated literals.
pub(crate) fn literals(values: &[Value]) -> String {
    values
        .iter()
        .map(|v| v.literal().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

macro_rules! impl_from {
    ($type:ty, $variant:ident) => {
        impl From<$type> for Value {
            fn from(v: $type) -> Self {
                Value::$variant(v.into())
            }
        }
    };
}

impl_from!(bool, Bool);
impl_from!(i8, Int);
impl_from!(i16, Int);
impl_from!(i32, Int);
impl_from!(i64, Int);
impl_from!(u8, UInt);
impl_from!(u16, UInt);
impl_from!(u32, UInt);
impl_from!(u64, UInt);
impl_from!(f32, Float);
impl_from!(f64, Float);
impl_from!(String, String);
impl_from!(&str, String);
impl_from!(Bytes, Bytes);

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::Array(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}
