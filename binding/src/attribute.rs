//! Immutable descriptions of one value's type and validation rules.
//!
//! An [Attribute] is built once (typically at startup, from the output of a design evaluator) and
//! shared by every request decoded against it. Literals supplied to the builder (enumeration
//! values, defaults) are coerced to the attribute's type so that they compare equal to values
//! parsed from the wire: `Attribute::uint32().enumeration([1, 2])` holds `UInt` literals even
//! though `1` and `2` are written as `i32`.

use crate::{config::RangeCfg, error::SpecError, format::Format, value::Value};
use regex::Regex;
use std::fmt;

/// Width of an integer type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Width {
    /// The platform word size (`isize`/`usize`).
    Native,
    W32,
    W64,
}

/// Width of a floating point type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FloatWidth {
    W32,
    W64,
}

/// The shape of an attribute.
#[derive(Clone, Debug)]
pub enum Type {
    Boolean,
    Int { width: Width, signed: bool },
    Float(FloatWidth),
    String,
    Bytes,
    /// Untyped: raw text on the wire, any structure in a body.
    Any,
    Array(Box<Attribute>),
    Map(Box<Attribute>, Box<Attribute>),
    /// Fields in declaration order.
    Object(Vec<(String, Attribute)>),
}

impl Type {
    /// Human readable name of the type, as used in type errors.
    pub fn name(&self) -> &'static str {
        match self {
            Type::Boolean => "boolean",
            Type::Int { signed: true, .. } => "integer",
            Type::Int { signed: false, .. } => "unsigned integer",
            Type::Float(_) => "float",
            Type::String => "string",
            Type::Bytes => "bytes",
            Type::Any => "any",
            Type::Array(_) => "array",
            Type::Map(_, _) => "map",
            Type::Object(_) => "object",
        }
    }

    /// Returns true for types that can be read from a single piece of wire text.
    pub fn is_primitive(&self) -> bool {
        !matches!(self, Type::Array(_) | Type::Map(_, _) | Type::Object(_))
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Array(elem) => write!(f, "array of {}s", elem.ty.name()),
            Type::Map(key, elem) => write!(f, "map of {} to {}", key.ty.name(), elem.ty.name()),
            other => f.write_str(other.name()),
        }
    }
}

/// A regular expression a string value must match.
#[derive(Clone, Debug)]
pub struct Pattern {
    source: String,
    regex: Regex,
}

impl Pattern {
    /// Compiles `source`.
    pub fn new(source: &str) -> Result<Self, SpecError> {
        let regex = Regex::new(source).map_err(|source_err| SpecError::InvalidPattern {
            pattern: source.to_string(),
            source: source_err,
        })?;
        Ok(Self {
            source: source.to_string(),
            regex,
        })
    }

    /// The pattern as written in the design.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Returns true if `value` matches.
    pub fn is_match(&self, value: &str) -> bool {
        self.regex.is_match(value)
    }
}

/// Validation rules attached to an attribute.
#[derive(Clone, Debug, Default)]
pub struct Validation {
    /// The value must be present on the wire (or, for object fields, in the decoded body).
    pub required: bool,

    /// Enumeration of the allowed values.
    pub values: Option<Vec<Value>>,

    /// Regular expression string values must match.
    pub pattern: Option<Pattern>,

    /// Format string values must conform to.
    pub format: Option<Format>,

    /// `Minimum`/`Maximum`: a numeric bound on numbers, a length bound on arrays and bytes.
    pub range: RangeCfg<f64>,

    /// `MinLength`/`MaxLength`.
    pub length: RangeCfg<usize>,
}

/// One named-by-its-binding, typed value with optional validation rules and default.
#[derive(Clone, Debug)]
pub struct Attribute {
    pub ty: Type,
    pub validation: Validation,
    pub default: Option<Value>,
}

impl Attribute {
    /// Creates an attribute of type `ty` with no rules.
    pub fn new(ty: Type) -> Self {
        Self {
            ty,
            validation: Validation::default(),
            default: None,
        }
    }

    pub fn boolean() -> Self {
        Self::new(Type::Boolean)
    }

    /// A signed integer of the platform word size.
    pub fn int() -> Self {
        Self::integer(Width::Native, true)
    }

    pub fn int32() -> Self {
        Self::integer(Width::W32, true)
    }

    pub fn int64() -> Self {
        Self::integer(Width::W64, true)
    }

    /// An unsigned integer of the platform word size.
    pub fn uint() -> Self {
        Self::integer(Width::Native, false)
    }

    pub fn uint32() -> Self {
        Self::integer(Width::W32, false)
    }

    pub fn uint64() -> Self {
        Self::integer(Width::W64, false)
    }

    pub fn integer(width: Width, signed: bool) -> Self {
        Self::new(Type::Int { width, signed })
    }

    pub fn float32() -> Self {
        Self::new(Type::Float(FloatWidth::W32))
    }

    pub fn float64() -> Self {
        Self::new(Type::Float(FloatWidth::W64))
    }

    pub fn string() -> Self {
        Self::new(Type::String)
    }

    pub fn bytes() -> Self {
        Self::new(Type::Bytes)
    }

    pub fn any() -> Self {
        Self::new(Type::Any)
    }

    pub fn array(elem: Attribute) -> Self {
        Self::new(Type::Array(Box::new(elem)))
    }

    pub fn map(key: Attribute, elem: Attribute) -> Self {
        Self::new(Type::Map(Box::new(key), Box::new(elem)))
    }

    pub fn object<N: Into<String>>(fields: impl IntoIterator<Item = (N, Attribute)>) -> Self {
        Self::new(Type::Object(
            fields.into_iter().map(|(n, a)| (n.into(), a)).collect(),
        ))
    }

    /// Marks the attribute as required.
    pub fn required(mut self) -> Self {
        self.validation.required = true;
        self
    }

    /// Restricts the attribute to `values`.
    pub fn enumeration<V: Into<Value>>(mut self, values: impl IntoIterator<Item = V>) -> Self {
        let values = values
            .into_iter()
            .map(|v| coerce(&self.ty, v.into()))
            .collect();
        self.validation.values = Some(values);
        self
    }

    /// Requires string values to match `pattern`.
    pub fn pattern(mut self, pattern: &str) -> Result<Self, SpecError> {
        self.validation.pattern = Some(Pattern::new(pattern)?);
        Ok(self)
    }

    /// Requires string values to conform to `format`.
    pub fn format(mut self, format: Format) -> Self {
        self.validation.format = Some(format);
        self
    }

    pub fn minimum(mut self, min: f64) -> Self {
        self.validation.range = self.validation.range.with_min(min);
        self
    }

    pub fn maximum(mut self, max: f64) -> Self {
        self.validation.range = self.validation.range.with_max(max);
        self
    }

    pub fn min_length(mut self, min: usize) -> Self {
        self.validation.length = self.validation.length.with_min(min);
        self
    }

    pub fn max_length(mut self, max: usize) -> Self {
        self.validation.length = self.validation.length.with_max(max);
        self
    }

    /// Sets the value substituted when the attribute is absent.
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(coerce(&self.ty, value.into()));
        self
    }

    /// Returns the field `name` of an object attribute.
    pub fn field(&self, name: &str) -> Option<&Attribute> {
        match &self.ty {
            Type::Object(fields) => fields.iter().find(|(n, _)| n == name).map(|(_, a)| a),
            _ => None,
        }
    }

    /// Returns true if an absent value must be reported as missing.
    pub fn is_required(&self) -> bool {
        self.validation.required && self.default.is_none()
    }
}

/// Converts a literal to the representation values of type `ty` are decoded into.
///
/// Literals that cannot be represented are returned unchanged; they simply never compare equal to
/// a decoded value.
pub(crate) fn coerce(ty: &Type, value: Value) -> Value {
    match (ty, value) {
        (Type::Int { signed: false, .. }, Value::Int(v)) if v >= 0 => Value::UInt(v as u64),
        (Type::Int { signed: true, .. }, Value::UInt(v)) if v <= i64::MAX as u64 => {
            Value::Int(v as i64)
        }
        (Type::Float(width), value @ (Value::Int(_) | Value::UInt(_) | Value::Float(_))) => {
            let v = value.as_f64().unwrap_or_default();
            match width {
                FloatWidth::W32 => Value::Float(f64::from(v as f32)),
                FloatWidth::W64 => Value::Float(v),
            }
        }
        (Type::Bytes, Value::String(s)) => Value::Bytes(s.into()),
        (Type::Array(elem), Value::Array(items)) => {
            Value::Array(items.into_iter().map(|v| coerce(&elem.ty, v)).collect())
        }
        (Type::Map(key, elem), Value::Map(entries)) => Value::Map(
            entries
                .into_iter()
                .map(|(k, v)| (coerce(&key.ty, k), coerce(&elem.ty, v)))
                .collect(),
        ),
        (Type::Object(fields), Value::Object(mut values)) => {
            for (name, field) in fields {
                if let Some(v) = values.remove(name) {
                    values.insert(name.clone(), coerce(&field.ty, v));
                }
            }
            Value::Object(values)
        }
        (_, value) => value,
    }
}
