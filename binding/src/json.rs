//! JSON bodies.
//!
//! Decoding is directed by the expected shape: the JSON document is parsed, then converted to a
//! [Value] following the [Attribute] tree. Integers are checked against their declared width,
//! byte values are standard base64 strings, map keys are parsed as the declared key type and
//! object fields not declared by the shape are ignored. A `null` object field is treated as
//! absent.
//!
//! Content negotiation is permissive: any request is decoded as JSON and any `Accept` header
//! gets a JSON response (a request for another media type is logged).

use crate::{
    attribute::{Attribute, FloatWidth, Type, Width},
    codec::{self, Codec, Decoder, Encoder},
    primitive,
    value::Value,
    wire::{media_type, Request},
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::BytesMut;
use serde_json::{Map, Number};
use std::collections::BTreeMap;
use tracing::debug;

/// The media type of JSON bodies.
pub const CONTENT_TYPE: &str = "application/json";

/// Configuration for [JsonCodec].
#[derive(Clone, Debug)]
pub struct Config {
    /// The maximum size of a request body, in bytes.
    ///
    /// Larger bodies are rejected before parsing.
    pub max_body_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_body_size: 4 * 1024 * 1024,
        }
    }
}

/// A [Codec] reading and writing JSON.
#[derive(Clone, Debug, Default)]
pub struct JsonCodec {
    cfg: Config,
}

impl JsonCodec {
    pub fn new(cfg: Config) -> Self {
        Self { cfg }
    }
}

impl Codec for JsonCodec {
    fn decoder<'a>(&self, request: &'a Request) -> Box<dyn Decoder + 'a> {
        if let Some(content_type) = request.content_type() {
            if !is_json(&content_type) {
                debug!(%content_type, "decoding unknown content type as json");
            }
        }
        Box::new(JsonDecoder {
            body: &request.body,
            max_body_size: self.cfg.max_body_size,
        })
    }

    fn encoder(&self, request: &Request) -> (Box<dyn Encoder>, String) {
        if let Some(accept) = request.accept() {
            let acceptable = accept.split(',').map(|t| media_type(t.to_string())).any(|t| {
                is_json(&t) || t == "*/*" || t == "application/*"
            });
            if !acceptable {
                debug!(%accept, "no acceptable media type, responding with json");
            }
        }
        (Box::new(JsonEncoder), CONTENT_TYPE.to_string())
    }
}

fn is_json(media_type: &str) -> bool {
    media_type == CONTENT_TYPE || media_type.ends_with("+json")
}

struct JsonDecoder<'a> {
    body: &'a [u8],
    max_body_size: usize,
}

impl Decoder for JsonDecoder<'_> {
    fn decode(&mut self, shape: &Attribute) -> Result<Value, codec::Error> {
        if self.body.iter().all(u8::is_ascii_whitespace) {
            return Err(codec::Error::EndOfStream);
        }
        if self.body.len() > self.max_body_size {
            return Err(codec::Error::TooLarge(self.body.len(), self.max_body_size));
        }
        let json: serde_json::Value = serde_json::from_slice(self.body)
            .map_err(|e| codec::Error::Invalid(e.to_string()))?;
        match (&shape.ty, json) {
            // A null document decodes to an object with no fields
            (Type::Object(_), serde_json::Value::Null) => Ok(Value::Object(BTreeMap::new())),
            (_, json) => from_json("body", shape, json),
        }
    }
}

fn mismatch(path: &str, ty: &Type, json: &serde_json::Value) -> codec::Error {
    codec::Error::Invalid(format!("{path}: expected {ty}, got {json}"))
}

/// Converts `json` to a value of the shape `attribute`.
fn from_json(
    path: &str,
    attribute: &Attribute,
    json: serde_json::Value,
) -> Result<Value, codec::Error> {
    use serde_json::Value as Json;

    let ty = &attribute.ty;
    let value = match (ty, json) {
        (Type::Any, json) => any_from_json(json),
        (Type::Boolean, Json::Bool(v)) => Value::Bool(v),
        (Type::Int { width, signed }, Json::Number(n)) => {
            int_from_json(*width, *signed, &n).ok_or_else(|| mismatch(path, ty, &Json::Number(n)))?
        }
        (Type::Float(width), Json::Number(n)) => {
            let v = n.as_f64().ok_or_else(|| mismatch(path, ty, &Json::Number(n.clone())))?;
            match width {
                FloatWidth::W32 => Value::Float(f64::from(v as f32)),
                FloatWidth::W64 => Value::Float(v),
            }
        }
        (Type::String, Json::String(s)) => Value::String(s),
        (Type::Bytes, Json::String(s)) => STANDARD
            .decode(s.as_bytes())
            .map(|b| Value::Bytes(b.into()))
            .map_err(|e| codec::Error::Invalid(format!("{path}: {e}")))?,
        (Type::Array(elem), Json::Array(items)) => Value::Array(
            items
                .into_iter()
                .enumerate()
                .map(|(i, item)| from_json(&format!("{path}[{i}]"), elem, item))
                .collect::<Result<_, _>>()?,
        ),
        (Type::Map(key, elem), Json::Object(entries)) => {
            let mut map = Vec::with_capacity(entries.len());
            for (k, v) in entries {
                let parsed = primitive::parse(&k, &key.ty).ok_or_else(|| {
                    codec::Error::Invalid(format!("{path}: invalid key {k:?}, must be a {}", key.ty))
                })?;
                let v = from_json(&format!("{path}[{k}]"), elem, v)?;
                map.push((parsed, v));
            }
            Value::Map(map)
        }
        (Type::Object(fields), Json::Object(mut entries)) => {
            let mut object = BTreeMap::new();
            for (name, field) in fields {
                match entries.remove(name) {
                    None | Some(Json::Null) => {}
                    Some(v) => {
                        object.insert(name.clone(), from_json(&format!("{path}.{name}"), field, v)?);
                    }
                }
            }
            Value::Object(object)
        }
        (_, json) => return Err(mismatch(path, ty, &json)),
    };
    Ok(value)
}

fn int_from_json(width: Width, signed: bool, n: &Number) -> Option<Value> {
    if signed {
        let v = n.as_i64()?;
        let fits = match width {
            Width::W32 => i32::try_from(v).is_ok(),
            Width::Native => isize::try_from(v).is_ok(),
            Width::W64 => true,
        };
        fits.then_some(Value::Int(v))
    } else {
        let v = n.as_u64()?;
        let fits = match width {
            Width::W32 => u32::try_from(v).is_ok(),
            Width::Native => usize::try_from(v).is_ok(),
            Width::W64 => true,
        };
        fits.then_some(Value::UInt(v))
    }
}

fn any_from_json(json: serde_json::Value) -> Value {
    use serde_json::Value as Json;

    match json {
        Json::Null => Value::Null,
        Json::Bool(v) => Value::Bool(v),
        Json::Number(n) => {
            if let Some(v) = n.as_i64() {
                Value::Int(v)
            } else if let Some(v) = n.as_u64() {
                Value::UInt(v)
            } else {
                Value::Float(n.as_f64().unwrap_or_default())
            }
        }
        Json::String(s) => Value::String(s),
        Json::Array(items) => Value::Array(items.into_iter().map(any_from_json).collect()),
        Json::Object(entries) => Value::Object(
            entries
                .into_iter()
                .map(|(k, v)| (k, any_from_json(v)))
                .collect(),
        ),
    }
}

struct JsonEncoder;

impl Encoder for JsonEncoder {
    fn encode(&mut self, value: &Value, buf: &mut BytesMut) -> Result<(), codec::Error> {
        let json = to_json(value)?;
        let encoded = serde_json::to_vec(&json).map_err(|e| codec::Error::Invalid(e.to_string()))?;
        buf.extend_from_slice(&encoded);
        Ok(())
    }
}

/// Converts a value to JSON. Map keys are written as their text.
fn to_json(value: &Value) -> Result<serde_json::Value, codec::Error> {
    use serde_json::Value as Json;

    let json = match value {
        Value::Null => Json::Null,
        Value::Bool(v) => Json::Bool(*v),
        Value::Int(v) => Json::Number((*v).into()),
        Value::UInt(v) => Json::Number((*v).into()),
        Value::Float(v) => Json::Number(
            Number::from_f64(*v).ok_or_else(|| codec::Error::Unsupported(v.to_string()))?,
        ),
        Value::String(s) => Json::String(s.clone()),
        Value::Bytes(b) => Json::String(STANDARD.encode(b)),
        Value::Array(items) => Json::Array(items.iter().map(to_json).collect::<Result<_, _>>()?),
        Value::Map(entries) => {
            let mut object = Map::new();
            for (k, v) in entries {
                object.insert(k.to_string(), to_json(v)?);
            }
            Json::Object(object)
        }
        Value::Object(fields) => {
            let mut object = Map::new();
            for (k, v) in fields {
                object.insert(k.clone(), to_json(v)?);
            }
            Json::Object(object)
        }
    };
    Ok(json)
}
