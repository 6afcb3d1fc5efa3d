//! Bind declared method attributes to HTTP requests and responses.
//!
//! # Overview
//!
//! Given a [Method] that declares, for each of its attributes, a type, validation rules, an
//! optional default and a wire location (path segment, query parameter, header or body), this
//! crate:
//! - Decodes an incoming [Request] into a fully validated payload ([Method::decode_request])
//! - Encodes a method result into a [Response], selecting among several responses when the
//!   result is tagged ([Method::encode_response])
//! - Encodes decoding failures into a structured error response ([Method::encode_error])
//!
//! Methods are plain values built once (typically at startup) and interpreted at run time.
//! Bodies are read and written through a pluggable [Codec]; [JsonCodec] is provided.
//!
//! # Failures
//!
//! Decoding distinguishes failures that leave nothing to validate (a required value is missing,
//! text does not parse as the declared type, the body is missing or malformed) from rule
//! violations. The former stop decoding immediately and are reported alone, the latter are all
//! collected into [Errors] so that a client sees every problem with a request at once.
//!
//! # Example
//!
//! ```
//! use commonware_binding::{
//!     Attribute, Binding, HeaderBinding, JsonCodec, Method, PayloadShape, Request,
//!     ResponseBody, ResponseSpec, Value,
//! };
//! use http::StatusCode;
//!
//! let method = Method::new("list")
//!     .payload(PayloadShape::Object)
//!     .bind(Binding::path("account", Attribute::uint64()).unwrap())
//!     .bind(Binding::query("limit", Attribute::uint32().maximum(100.0).default_value(10)).unwrap())
//!     .response(
//!         ResponseSpec::new(StatusCode::OK)
//!             .header(HeaderBinding::new("total", Attribute::uint64()).wire_name("X-Total"))
//!             .body(ResponseBody::Fields(vec!["items".to_string()])),
//!     );
//! let codec = JsonCodec::default();
//!
//! // Decode a request
//! let request = Request::default().with_param("account", "42");
//! let payload = method.decode_request(&request, &codec).unwrap();
//! assert_eq!(payload.get("account"), Some(&Value::UInt(42)));
//! assert_eq!(payload.get("limit"), Some(&Value::UInt(10)));
//!
//! // Rule violations are reported together
//! let request = Request::default().with_param("account", "42").with_query("limit", "500");
//! let errors = method.decode_request(&request, &codec).unwrap_err();
//! assert_eq!(errors.to_string(), "limit must be lesser or equal than 100 but got value 500");
//!
//! // Encode a result
//! let result = Value::object([
//!     ("total", Value::UInt(1)),
//!     ("items", Value::from(vec!["a"])),
//! ]);
//! let response = method.encode_response(&request, &result, &codec).unwrap();
//! assert_eq!(response.header("X-Total"), Some("1"));
//! assert_eq!(&response.body[..], br#"{"items":["a"]}"#);
//! ```

pub mod assemble;
pub mod attribute;
pub mod binding;
pub mod codec;
pub mod config;
pub mod decode;
pub mod encode;
pub mod error;
pub mod format;
pub mod json;
pub mod primitive;
pub mod validate;
pub mod value;
pub mod wire;

// Re-export main types and traits
pub use attribute::{Attribute, FloatWidth, Type, Validation, Width};
pub use binding::{
    Binding, BodyBinding, BodyTarget, HeaderBinding, Location, Method, Multiplicity, PayloadShape,
    ResponseBody, ResponseSpec, Service, Tag,
};
pub use codec::Codec;
pub use config::RangeCfg;
pub use error::{EncodeError, Error, Errors, ServiceError, SpecError};
pub use format::Format;
pub use json::JsonCodec;
pub use value::Value;
pub use wire::{Query, Request, Response};
