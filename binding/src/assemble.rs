//! Build payloads from decoded values.

use crate::{
    binding::{BodyTarget, Method, PayloadShape},
    value::Value,
};
use std::collections::BTreeMap;

impl Method {
    /// Builds the payload of the method from the decoded body and the decoded value of each
    /// binding (by attribute name, `None` when absent).
    ///
    /// Performs no validation. Absent values are omitted from object payloads.
    pub fn new_payload(&self, body: Option<Value>, fields: Vec<(String, Option<Value>)>) -> Value {
        match self.payload {
            PayloadShape::Empty => Value::Null,
            PayloadShape::Attribute => body
                .or_else(|| fields.into_iter().find_map(|(_, value)| value))
                .unwrap_or(Value::Null),
            PayloadShape::Object => {
                let mut payload = BTreeMap::new();
                if let (Some(body), Some(binding)) = (body, &self.body) {
                    match (binding.target(), body) {
                        (BodyTarget::Inline, Value::Object(values)) => payload.extend(values),
                        (BodyTarget::Field(name), body) => {
                            payload.insert(name.clone(), body);
                        }
                        (BodyTarget::Inline, _) => {}
                    }
                }
                for (name, value) in fields {
                    if let Some(value) = value {
                        payload.insert(name, value);
                    }
                }
                Value::Object(payload)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        attribute::Attribute,
        binding::{BodyBinding, Method, PayloadShape},
        value::Value,
    };

    #[test]
    fn test_empty_payload() {
        let method = Method::new("ping");
        assert_eq!(
            method.new_payload(None, vec![("a".into(), Some(Value::Int(1)))]),
            Value::Null
        );
    }

    #[test]
    fn test_attribute_payload() {
        let method = Method::new("get").payload(PayloadShape::Attribute);
        assert_eq!(
            method.new_payload(None, vec![("id".into(), Some(Value::UInt(7)))]),
            Value::UInt(7)
        );
        assert_eq!(method.new_payload(None, vec![("id".into(), None)]), Value::Null);
        assert_eq!(
            method.new_payload(Some(Value::from("body")), Vec::new()),
            Value::from("body")
        );
    }

    #[test]
    fn test_object_payload_inline_body() {
        let method = Method::new("create")
            .payload(PayloadShape::Object)
            .body(BodyBinding::inline(Attribute::object([("name", Attribute::string())])).unwrap());
        let payload = method.new_payload(
            Some(Value::object([("name", "n")])),
            vec![
                ("account".into(), Some(Value::UInt(1))),
                ("token".into(), None),
            ],
        );
        assert_eq!(
            payload,
            Value::object([("account", Value::UInt(1)), ("name", Value::from("n"))])
        );
    }

    #[test]
    fn test_object_payload_body_field() {
        let method = Method::new("upload")
            .payload(PayloadShape::Object)
            .body(BodyBinding::field("data", Attribute::bytes()));
        let payload = method.new_payload(
            Some(Value::Bytes("raw".into())),
            vec![("kind".into(), Some(Value::from("png")))],
        );
        assert_eq!(payload.get("data"), Some(&Value::Bytes("raw".into())));
        assert_eq!(payload.get("kind"), Some(&Value::from("png")));
    }
}
