//! Validation rules applied to decoded values.
//!
//! Rules run in a fixed order (enumeration, format, pattern, numeric bounds, length bounds) and
//! every violation is merged into the caller's [Errors]; nothing here is fatal. Containers are
//! validated as a whole first, then element by element:
//!
//! - array elements under `name[*]`,
//! - map keys under `name.key` and map values under `name[key]`,
//! - object fields under `name.field`, after every required field has been checked for presence.

use crate::{
    attribute::{Attribute, Type},
    config::Violation,
    error::{Error, Errors},
    value::Value,
};

/// Validates `value` against the rules of `attribute` (recursively), merging every violation
/// into `errors`. `name` is the context used in error messages.
///
/// [Value::Null] is treated as absent and never validated.
pub fn validate(name: &str, attribute: &Attribute, value: &Value, errors: &mut Errors) {
    if value.is_null() {
        return;
    }
    check_rules(name, attribute, value, errors);

    match (&attribute.ty, value) {
        (Type::Array(elem), Value::Array(items)) => {
            let context = format!("{name}[*]");
            for item in items {
                validate(&context, elem, item, errors);
            }
        }
        (Type::Map(key, elem), Value::Map(entries)) => {
            let key_context = format!("{name}.key");
            let elem_context = format!("{name}[key]");
            for (k, v) in entries {
                validate(&key_context, key, k, errors);
                validate(&elem_context, elem, v, errors);
            }
        }
        (Type::Object(fields), Value::Object(values)) => {
            for (field, att) in fields {
                let present = values.get(field).is_some_and(|v| !v.is_null());
                if att.validation.required && !present {
                    errors.merge(Error::MissingAttribute {
                        context: name.to_string(),
                        name: field.clone(),
                    });
                }
            }
            for (field, att) in fields {
                if let Some(v) = values.get(field) {
                    validate(&format!("{name}.{field}"), att, v, errors);
                }
            }
        }
        _ => {}
    }
}

/// Applies the rules of `attribute` to `value` itself (not to its elements).
fn check_rules(name: &str, attribute: &Attribute, value: &Value, errors: &mut Errors) {
    let rules = &attribute.validation;

    // Enumerations compare the whole value, even for arrays
    if let Some(allowed) = &rules.values {
        if !allowed.contains(value) {
            errors.merge(Error::InvalidEnumValue {
                name: name.to_string(),
                value: value.clone(),
                allowed: allowed.clone(),
            });
        }
    }

    if let Some(text) = value.as_str() {
        if let Some(format) = rules.format {
            if let Err(reason) = format.validate(text) {
                errors.merge(Error::InvalidFormat {
                    name: name.to_string(),
                    value: text.to_string(),
                    format,
                    reason,
                });
            }
        }
        if let Some(pattern) = &rules.pattern {
            if !pattern.is_match(text) {
                errors.merge(Error::InvalidPattern {
                    name: name.to_string(),
                    value: text.to_string(),
                    pattern: pattern.as_str().to_string(),
                });
            }
        }
    }

    if !rules.range.is_unbounded() {
        match value {
            Value::Array(_) | Value::Bytes(_) => {
                if let Some(len) = value.length() {
                    if let Some(violation) = rules.range.check(&(len as f64)) {
                        let (bound, min) = match violation {
                            Violation::Below(b) => (b.ceil(), true),
                            Violation::Above(b) => (b.floor(), false),
                        };
                        errors.merge(Error::InvalidLength {
                            name: name.to_string(),
                            value: value.clone(),
                            len,
                            bound: bound.max(0.0) as usize,
                            min,
                        });
                    }
                }
            }
            _ => {
                if let Some(v) = value.as_f64() {
                    if let Some(violation) = rules.range.check(&v) {
                        let (bound, min) = match violation {
                            Violation::Below(b) => (b, true),
                            Violation::Above(b) => (b, false),
                        };
                        errors.merge(Error::InvalidRange {
                            name: name.to_string(),
                            value: value.clone(),
                            bound,
                            min,
                        });
                    }
                }
            }
        }
    }

    if !rules.length.is_unbounded() {
        if let Some(len) = value.length() {
            if let Some(violation) = rules.length.check(&len) {
                let (bound, min) = match violation {
                    Violation::Below(b) => (b, true),
                    Violation::Above(b) => (b, false),
                };
                errors.merge(Error::InvalidLength {
                    name: name.to_string(),
                    value: value.clone(),
                    len,
                    bound,
                    min,
                });
            }
        }
    }
}

/// Substitutes the defaults of absent (or null) object fields, recursively.
pub fn fill_defaults(attribute: &Attribute, value: &mut Value) {
    match (&attribute.ty, value) {
        (Type::Object(fields), Value::Object(values)) => {
            for (field, att) in fields {
                let present = values.get(field).is_some_and(|v| !v.is_null());
                if present {
                    if let Some(v) = values.get_mut(field) {
                        fill_defaults(att, v);
                    }
                } else if let Some(default) = &att.default {
                    values.insert(field.clone(), default.clone());
                }
            }
        }
        (Type::Array(elem), Value::Array(items)) => {
            for item in items {
                fill_defaults(elem, item);
            }
        }
        (Type::Map(_, elem), Value::Map(entries)) => {
            for (_, v) in entries {
                fill_defaults(elem, v);
            }
        }
        _ => {}
    }
}
