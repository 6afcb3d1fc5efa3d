//! Conversions between wire text and primitive values.
//!
//! # Parsing
//!
//! Integers are parsed in base 10 at their declared width (a value that does not fit is a type
//! error, not a range error), floats at their declared width, and booleans accept the same
//! spellings as most HTTP stacks (`1`, `t`, `T`, `TRUE`, `true`, `True` and their false
//! counterparts). Strings and "any" values are passed through and bytes are the raw UTF-8 text.
//!
//! # Rendering
//!
//! Rendering is the inverse: integers in base 10, floats as the shortest fixed-point decimal that
//! round-trips at the declared width (never scientific notation), and arrays as their rendered
//! elements joined with `", "`.

use crate::{
    attribute::{FloatWidth, Type, Width},
    value::Value,
};

macro_rules! impl_parse_int {
    ($name:ident, $type:ty, $variant:ident, $wide:ty) => {
        #[inline]
        fn $name(raw: &str) -> Option<Value> {
            let v = raw.parse::<$type>().ok()?;
            <$wide>::try_from(v).ok().map(Value::$variant)
        }
    };
}

impl_parse_int!(parse_isize, isize, Int, i64);
impl_parse_int!(parse_i32, i32, Int, i64);
impl_parse_int!(parse_i64, i64, Int, i64);
impl_parse_int!(parse_usize, usize, UInt, u64);
impl_parse_int!(parse_u32, u32, UInt, u64);
impl_parse_int!(parse_u64, u64, UInt, u64);

macro_rules! impl_render_int {
    ($name:ident, $type:ty) => {
        #[inline]
        fn $name(value: &Value) -> Option<String> {
            let v = match value {
                Value::Int(v) => <$type>::try_from(*v).ok()?,
                Value::UInt(v) => <$type>::try_from(*v).ok()?,
                _ => return None,
            };
            Some(v.to_string())
        }
    };
}

impl_render_int!(render_isize, isize);
impl_render_int!(render_i32, i32);
impl_render_int!(render_i64, i64);
impl_render_int!(render_usize, usize);
impl_render_int!(render_u32, u32);
impl_render_int!(render_u64, u64);

fn parse_bool(raw: &str) -> Option<Value> {
    match raw {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(Value::Bool(true)),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(Value::Bool(false)),
        _ => None,
    }
}

/// Parses `raw` as a value of the primitive type `ty`.
///
/// Returns `None` if the text is not a valid `ty`, or if `ty` is not primitive.
pub fn parse(raw: &str, ty: &Type) -> Option<Value> {
    match ty {
        Type::Boolean => parse_bool(raw),
        Type::Int { width, signed: true } => match width {
            Width::Native => parse_isize(raw),
            Width::W32 => parse_i32(raw),
            Width::W64 => parse_i64(raw),
        },
        Type::Int {
            width,
            signed: false,
        } => match width {
            Width::Native => parse_usize(raw),
            Width::W32 => parse_u32(raw),
            Width::W64 => parse_u64(raw),
        },
        Type::Float(FloatWidth::W32) => raw.parse::<f32>().ok().map(|v| Value::Float(v.into())),
        Type::Float(FloatWidth::W64) => raw.parse::<f64>().ok().map(Value::Float),
        Type::String | Type::Any => Some(Value::String(raw.to_string())),
        Type::Bytes => Some(Value::Bytes(raw.to_string().into())),
        Type::Array(_) | Type::Map(_, _) | Type::Object(_) => None,
    }
}

/// Renders `value` as wire text for an attribute of type `ty`.
///
/// Returns `None` if `value` does not hold a `ty`: an integer outside the declared width or sign,
/// a float that is not finite at the declared width, or bytes that are not valid UTF-8.
pub fn render(value: &Value, ty: &Type) -> Option<String> {
    match (ty, value) {
        (Type::Boolean, Value::Bool(v)) => Some(v.to_string()),
        (Type::Int { width, signed }, v) => match (width, signed) {
            (Width::Native, true) => render_isize(v),
            (Width::W32, true) => render_i32(v),
            (Width::W64, true) => render_i64(v),
            (Width::Native, false) => render_usize(v),
            (Width::W32, false) => render_u32(v),
            (Width::W64, false) => render_u64(v),
        },
        (Type::Float(FloatWidth::W32), v) => {
            let v = v.as_f64()? as f32;
            v.is_finite().then(|| v.to_string())
        }
        (Type::Float(FloatWidth::W64), v) => {
            let v = v.as_f64()?;
            v.is_finite().then(|| v.to_string())
        }
        (Type::String, Value::String(s)) => Some(s.clone()),
        (Type::Bytes, Value::Bytes(b)) => String::from_utf8(b.to_vec()).ok(),
        (Type::Any, v) => Some(v.to_string()),
        (Type::Array(elem), Value::Array(items)) => {
            let rendered = items
                .iter()
                .map(|item| render(item, &elem.ty))
                .collect::<Option<Vec<_>>>()?;
            Some(rendered.join(", "))
        }
        _ => None,
    }
}
