//! Decode requests into validated payloads.
//!
//! The body (if the method declares one) is decoded first, then every binding in declaration
//! order. A fatal failure (a missing field, text that does not parse, a missing or undecodable
//! body) stops decoding and is returned alone. Otherwise the value of each binding is validated
//! and every rule violation is accumulated, so a request violating three rules is rejected with
//! three failures. Only a request with no failure at all is assembled into a payload.

use crate::{
    attribute::{Attribute, Type},
    binding::{Binding, BodyBinding, Location, Method, Multiplicity},
    codec::{self, Codec},
    error::{Error, Errors},
    primitive,
    validate::{fill_defaults, validate},
    value::Value,
    wire::Request,
};
use tracing::{debug, warn};

impl Method {
    /// Decodes `request` into the payload of the method.
    ///
    /// Returns [Value::Null] for methods without payload.
    pub fn decode_request(&self, request: &Request, codec: &dyn Codec) -> Result<Value, Errors> {
        let mut errors = Errors::new();
        let body = match &self.body {
            Some(body) => Some(
                self.decode_body(body, request, codec, &mut errors)
                    .map_err(|err| self.fatal(err))?,
            ),
            None => None,
        };

        let mut fields = Vec::with_capacity(self.bindings.len());
        for binding in &self.bindings {
            let value = decode_field(binding, request, &mut errors).map_err(|err| self.fatal(err))?;
            fields.push((binding.name().to_string(), value));
        }

        if !errors.is_empty() {
            debug!(method = self.name.as_str(), %errors, "request failed validation");
            return Err(errors);
        }
        Ok(self.new_payload(body, fields))
    }

    fn fatal(&self, err: Error) -> Errors {
        debug!(method = self.name.as_str(), %err, "failed to decode request");
        Errors::from(err)
    }

    fn decode_body(
        &self,
        body: &BodyBinding,
        request: &Request,
        codec: &dyn Codec,
        errors: &mut Errors,
    ) -> Result<Value, Error> {
        let mut decoder = codec.decoder(request);
        let mut value = match decoder.decode(body.attribute()) {
            Ok(value) => value,
            Err(codec::Error::EndOfStream) => return Err(Error::MissingPayload),
            Err(err) => {
                warn!(method = self.name.as_str(), ?err, "failed to decode body");
                return Err(Error::DecodePayload(err.to_string()));
            }
        };
        fill_defaults(body.attribute(), &mut value);
        validate("body", body.attribute(), &value, errors);
        Ok(value)
    }
}

/// Decodes the value of one binding.
///
/// Returns `Ok(None)` if the value is absent and has neither a default nor a requirement.
fn decode_field(
    binding: &Binding,
    request: &Request,
    errors: &mut Errors,
) -> Result<Option<Value>, Error> {
    let attribute = binding.attribute();
    let value = match binding.multiplicity() {
        Multiplicity::Single => {
            let raw = match binding.location() {
                // The router only matches requests carrying every path parameter
                Location::Path => request.params.get(binding.wire()).cloned().unwrap_or_default(),
                Location::Query => request.query.get(binding.wire()).unwrap_or_default().to_string(),
                Location::Header | Location::Body => {
                    request.header(binding.wire()).unwrap_or_default()
                }
            };
            if raw.is_empty() && binding.location() != Location::Path {
                return absent(binding);
            }
            parse(binding, &raw, &attribute.ty)?
        }
        Multiplicity::Repeated => {
            let raws = match binding.location() {
                Location::Query => request.query.get_all(binding.wire()).to_vec(),
                _ => request.header_all(binding.wire()),
            };
            if raws.is_empty() {
                return absent(binding);
            }
            parse_array(binding, raws.iter().map(String::as_str))?
        }
        Multiplicity::Joined => {
            let raw = request.params.get(binding.wire()).cloned().unwrap_or_default();
            parse_array(binding, raw.split(','))?
        }
        Multiplicity::Multimap => {
            if request.query.is_empty() {
                return absent(binding);
            }
            parse_map(binding, request)?
        }
    };
    validate(binding.name(), attribute, &value, errors);
    Ok(Some(value))
}

/// Resolves a value absent from the wire.
fn absent(binding: &Binding) -> Result<Option<Value>, Error> {
    let attribute = binding.attribute();
    if let Some(default) = &attribute.default {
        return Ok(Some(default.clone()));
    }
    if attribute.is_required() {
        return Err(Error::MissingField {
            name: binding.wire().to_string(),
            location: binding.location(),
        });
    }
    Ok(None)
}

/// Parses `raw` as a `ty`, reporting failures against the whole binding.
fn parse(binding: &Binding, raw: &str, ty: &Type) -> Result<Value, Error> {
    primitive::parse(raw, ty).ok_or_else(|| Error::InvalidFieldType {
        name: binding.name().to_string(),
        value: raw.to_string(),
        expected: binding.attribute().ty.to_string(),
    })
}

fn elem_type(attribute: &Attribute) -> &Type {
    match &attribute.ty {
        Type::Array(elem) => &elem.ty,
        ty => ty,
    }
}

fn parse_array<'a>(
    binding: &Binding,
    raws: impl Iterator<Item = &'a str>,
) -> Result<Value, Error> {
    let elem = elem_type(binding.attribute());
    raws.map(|raw| parse(binding, raw, elem))
        .collect::<Result<Vec<_>, _>>()
        .map(Value::Array)
}

fn parse_map(binding: &Binding, request: &Request) -> Result<Value, Error> {
    let Type::Map(key, elem) = &binding.attribute().ty else {
        return Err(Error::InvalidFieldType {
            name: binding.name().to_string(),
            value: String::new(),
            expected: binding.attribute().ty.to_string(),
        });
    };
    let mut entries = Vec::with_capacity(request.query.len());
    for (raw_key, raws) in request.query.iter() {
        let k = parse(binding, raw_key, &key.ty)?;
        let v = match &elem.ty {
            Type::Array(inner) => Value::Array(
                raws.iter()
                    .map(|raw| parse(binding, raw, &inner.ty))
                    .collect::<Result<_, _>>()?,
            ),
            ty => parse(binding, raws.first().map(String::as_str).unwrap_or_default(), ty)?,
        };
        entries.push((k, v));
    }
    Ok(Value::Map(entries))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        binding::{BodyBinding, PayloadShape},
        json::JsonCodec,
    };

    fn method(binding: Binding) -> Method {
        Method::new("test").payload(PayloadShape::Attribute).bind(binding)
    }

    fn decode(method: &Method, request: &Request) -> Result<Value, Vec<Error>> {
        method
            .decode_request(request, &JsonCodec::default())
            .map_err(|errors| errors.into_iter().collect())
    }

    #[test]
    fn test_scalar_query() {
        let m = method(Binding::query("n", Attribute::int32().minimum(1.0)).unwrap());
        assert_eq!(
            decode(&m, &Request::default().with_query("n", "5")),
            Ok(Value::Int(5))
        );
        assert_eq!(decode(&m, &Request::default()), Ok(Value::Null));
        assert_eq!(decode(&m, &Request::default().with_query("n", "")), Ok(Value::Null));
        assert_eq!(
            decode(&m, &Request::default().with_query("n", "x")),
            Err(vec![Error::InvalidFieldType {
                name: "n".into(),
                value: "x".into(),
                expected: "integer".into(),
            }])
        );
        assert!(matches!(
            decode(&m, &Request::default().with_query("n", "0")).unwrap_err().as_slice(),
            [Error::InvalidRange { .. }]
        ));
    }

    #[test]
    fn test_missing_header_uses_wire_name() {
        let m = method(
            Binding::header("token", Attribute::string().required())
                .unwrap()
                .wire_name("Authorization"),
        );
        let errors = decode(&m, &Request::default()).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].to_string(), r#""Authorization" is missing from header"#);

        let request = Request::default()
            .with_header("authorization", "Bearer x")
            .unwrap();
        assert_eq!(decode(&m, &request), Ok(Value::from("Bearer x")));
    }

    #[test]
    fn test_empty_path_segment_is_parsed() {
        let m = method(Binding::path("id", Attribute::uint()).unwrap());
        assert!(matches!(
            decode(&m, &Request::default()).unwrap_err().as_slice(),
            [Error::InvalidFieldType { .. }]
        ));
        let m = method(Binding::path("id", Attribute::string()).unwrap());
        assert_eq!(decode(&m, &Request::default()), Ok(Value::from("")));
    }

    #[test]
    fn test_repeated_header_lines() {
        let m = method(Binding::header("X-Id", Attribute::array(Attribute::uint32())).unwrap());
        let request = Request::default()
            .with_header("X-Id", "1")
            .unwrap()
            .with_header("X-Id", "2")
            .unwrap();
        assert_eq!(decode(&m, &request), Ok(Value::from(vec![1u32, 2])));

        let request = Request::default().with_header("X-Id", "-1").unwrap();
        assert_eq!(
            decode(&m, &request).unwrap_err()[0].to_string(),
            r#"invalid value "-1" for "X-Id", must be a array of unsigned integers"#
        );
    }

    #[test]
    fn test_required_array_present_but_empty_value() {
        let m = method(
            Binding::query("tag", Attribute::array(Attribute::string()).required()).unwrap(),
        );
        assert_eq!(
            decode(&m, &Request::default().with_query("tag", "")),
            Ok(Value::from(vec![""]))
        );
        assert!(matches!(
            decode(&m, &Request::default()).unwrap_err().as_slice(),
            [Error::MissingField { .. }]
        ));
    }

    #[test]
    fn test_typed_map() {
        let m = method(
            Binding::query(
                "m",
                Attribute::map(Attribute::int(), Attribute::array(Attribute::boolean())),
            )
            .unwrap(),
        );
        let request = Request::default()
            .with_query("1", "true")
            .with_query("1", "F")
            .with_query("2", "1");
        assert_eq!(
            decode(&m, &request),
            Ok(Value::map([
                (Value::Int(1), Value::from(vec![true, false])),
                (Value::Int(2), Value::from(vec![true])),
            ]))
        );
        let request = Request::default().with_query("k", "true");
        assert!(matches!(
            decode(&m, &request).unwrap_err().as_slice(),
            [Error::InvalidFieldType { .. }]
        ));
    }

    #[test]
    fn test_fatal_discards_accumulated() {
        let m = Method::new("test")
            .payload(PayloadShape::Object)
            .bind(Binding::query("a", Attribute::string().min_length(3)).unwrap())
            .bind(Binding::query("b", Attribute::boolean()).unwrap());
        let request = Request::default().with_query("a", "x").with_query("b", "maybe");
        let errors = decode(&m, &request).unwrap_err();
        assert!(matches!(errors.as_slice(), [Error::InvalidFieldType { .. }]));
    }

    #[test]
    fn test_body_failures() {
        let m = Method::new("test")
            .payload(PayloadShape::Object)
            .body(BodyBinding::inline(Attribute::object([("a", Attribute::int())])).unwrap());
        assert_eq!(
            decode(&m, &Request::default()),
            Err(vec![Error::MissingPayload])
        );
        assert!(matches!(
            decode(&m, &Request::default().with_body(r#"{"a": "x"}"#)).unwrap_err().as_slice(),
            [Error::DecodePayload(_)]
        ));
    }
}
