//! Error types for binding operations.
//!
//! Decoding failures fall in two classes:
//! - **Fatal** ([Error::MissingField], [Error::InvalidFieldType], [Error::MissingPayload],
//!   [Error::DecodePayload]): no value exists to validate further, decoding stops and the failure
//!   is returned alone.
//! - **Accumulated** (everything else): recorded in [Errors] while the remaining rules and
//!   attributes are still examined, so a caller sees every violation from one request.

use crate::{
    binding::Location,
    codec,
    format::Format,
    value::{literals, Value},
};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

fn comparison(min: &bool) -> &'static str {
    if *min {
        "greater or equal"
    } else {
        "lesser or equal"
    }
}

/// A single decoding failure.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("{name:?} is missing from {location}")]
    MissingField { name: String, location: Location },
    #[error("invalid value {value:?} for {name:?}, must be a {expected}")]
    InvalidFieldType {
        name: String,
        value: String,
        expected: String,
    },
    #[error("missing required payload")]
    MissingPayload,
    #[error("invalid payload: {0}")]
    DecodePayload(String),
    #[error("value of {name} must be one of {} but got value {}", literals(.allowed), .value.literal())]
    InvalidEnumValue {
        name: String,
        value: Value,
        allowed: Vec<Value>,
    },
    #[error("{name} must be {} than {bound} but got value {}", comparison(.min), .value.literal())]
    InvalidRange {
        name: String,
        value: Value,
        bound: f64,
        min: bool,
    },
    #[error("length of {name} must be {} than {bound} but got value {} (len={len})", comparison(.min), .value.literal())]
    InvalidLength {
        name: String,
        value: Value,
        len: usize,
        bound: usize,
        min: bool,
    },
    #[error("{name} must match the regexp {pattern:?} but got value {value:?}")]
    InvalidPattern {
        name: String,
        value: String,
        pattern: String,
    },
    #[error("{name} must be formatted as a {format} but got value {value:?}, {reason}")]
    InvalidFormat {
        name: String,
        value: String,
        format: Format,
        reason: String,
    },
    #[error("{name:?} is missing from {context}")]
    MissingAttribute { context: String, name: String },
}

impl Error {
    /// Returns true if the failure stops decoding.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::MissingField { .. }
                | Error::InvalidFieldType { .. }
                | Error::MissingPayload
                | Error::DecodePayload(_)
        )
    }
}

/// The ordered failures of one decode call.
///
/// Holds either a single fatal [Error] or every accumulated failure, in the order the rules ran.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Errors(Vec<Error>);

impl Errors {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Appends a failure.
    pub fn merge(&mut self, error: Error) {
        self.0.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Error> {
        self.0.iter()
    }

    /// Builds the structured error returned to clients.
    pub fn service_error(&self) -> ServiceError {
        ServiceError::new(self.to_string())
    }
}

impl From<Error> for Errors {
    fn from(error: Error) -> Self {
        Self(vec![error])
    }
}

impl IntoIterator for Errors {
    type Item = Error;
    type IntoIter = std::vec::IntoIter<Error>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Errors {
    type Item = &'a Error;
    type IntoIter = std::slice::Iter<'a, Error>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for Errors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for Errors {}

/// The structured error body sent to clients.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ServiceError {
    /// Unique for each occurrence, used to correlate responses with logs.
    pub id: String,
    pub message: String,
    pub temporary: bool,
    pub timeout: bool,
}

impl ServiceError {
    /// Creates a permanent (neither temporary nor timeout) error.
    pub fn new(message: String) -> Self {
        let id: [u8; 6] = rand::random();
        Self {
            id: hex::encode(id),
            message,
            temporary: false,
            timeout: false,
        }
    }
}

impl From<ServiceError> for Value {
    fn from(err: ServiceError) -> Self {
        Value::object([
            ("id", Value::from(err.id)),
            ("message", Value::from(err.message)),
            ("temporary", Value::from(err.temporary)),
            ("timeout", Value::from(err.timeout)),
        ])
    }
}

/// Failure to encode a result.
///
/// Results are produced by trusted service code, so every variant but [EncodeError::Codec]
/// indicates a programming error.
#[derive(Error, Debug)]
pub enum EncodeError {
    #[error("no response matches the result and no default response is declared")]
    NoResponse,
    #[error("invalid result: {0}")]
    InvalidResult(String),
    #[error("codec: {0}")]
    Codec(#[from] codec::Error),
}

/// Failure to build a method description.
#[derive(Error, Debug)]
pub enum SpecError {
    #[error("invalid pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("{name:?} cannot bind a {kind} to the {location}")]
    UnsupportedBinding {
        name: String,
        location: Location,
        kind: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = Error::MissingField {
            name: "q".into(),
            location: Location::Query,
        };
        assert_eq!(err.to_string(), r#""q" is missing from query string"#);

        let err = Error::InvalidEnumValue {
            name: "q".into(),
            value: Value::Bool(false),
            allowed: vec![Value::Bool(true)],
        };
        assert_eq!(
            err.to_string(),
            "value of q must be one of true but got value false"
        );

        let err = Error::InvalidRange {
            name: "q".into(),
            value: Value::Int(0),
            bound: 1.0,
            min: true,
        };
        assert_eq!(
            err.to_string(),
            "q must be greater or equal than 1 but got value 0"
        );

        let err = Error::InvalidLength {
            name: "q".into(),
            value: Value::from("abc"),
            len: 3,
            bound: 2,
            min: false,
        };
        assert_eq!(
            err.to_string(),
            r#"length of q must be lesser or equal than 2 but got value "abc" (len=3)"#
        );
    }

    #[test]
    fn test_fatal_classes() {
        assert!(Error::MissingPayload.is_fatal());
        assert!(Error::DecodePayload("eof".into()).is_fatal());
        assert!(!Error::MissingAttribute {
            context: "body".into(),
            name: "a".into()
        }
        .is_fatal());
    }

    #[test]
    fn test_merge_joins_messages() {
        let mut errors = Errors::new();
        assert!(errors.is_empty());
        errors.merge(Error::InvalidPattern {
            name: "a".into(),
            value: "x".into(),
            pattern: "^y$".into(),
        });
        errors.merge(Error::MissingAttribute {
            context: "body".into(),
            name: "b".into(),
        });
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().all(|e| !e.is_fatal()));
        assert_eq!(
            errors.to_string(),
            r#"a must match the regexp "^y$" but got value "x"; "b" is missing from body"#
        );
    }

    #[test]
    fn test_service_error() {
        let errors = Errors::from(Error::MissingPayload);
        let body = errors.service_error();
        assert_eq!(body.message, "missing required payload");
        assert_eq!(body.id.len(), 12);
        assert!(!body.temporary && !body.timeout);
        assert_eq!(
            Value::from(body.clone()).get("message"),
            Some(&Value::from("missing required payload"))
        );
    }
}
