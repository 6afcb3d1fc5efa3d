//! Declarative mapping of a method's attributes to wire locations.
//!
//! A [Method] lists, for the request, which attribute is read from which [Location] (and under
//! which wire name) and, for the result, the [ResponseSpec]s it may be encoded into. Methods are
//! grouped by [Service] so that methods sharing a payload shape never share an entry point.
//!
//! # Example
//!
//! ```
//! use commonware_binding::{
//!     Attribute, Binding, BodyBinding, Method, PayloadShape, ResponseBody, ResponseSpec,
//! };
//! use http::StatusCode;
//!
//! let method = Method::new("create")
//!     .payload(PayloadShape::Object)
//!     .body(BodyBinding::inline(Attribute::object([("name", Attribute::string().required())])).unwrap())
//!     .bind(Binding::path("account", Attribute::uint64()).unwrap())
//!     .bind(Binding::header("token", Attribute::string().required()).unwrap().wire_name("Authorization"))
//!     .response(ResponseSpec::new(StatusCode::CREATED).body(ResponseBody::Result));
//! assert_eq!(method.bindings().len(), 2);
//! ```

use crate::{
    attribute::{Attribute, Type},
    error::SpecError,
};
use http::StatusCode;
use std::{collections::BTreeMap, fmt};

/// Where a request attribute is read from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Location {
    Path,
    Query,
    Header,
    Body,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Location::Path => "path",
            Location::Query => "query string",
            Location::Header => "header",
            Location::Body => "body",
        })
    }
}

/// How many wire values a binding reads.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Multiplicity {
    /// One raw value.
    Single,
    /// Every value of a repeated query key or header line.
    Repeated,
    /// One comma-joined value (arrays in a path segment).
    Joined,
    /// The whole query multimap.
    Multimap,
}

/// One request attribute bound to a path segment, query parameter or header.
#[derive(Clone, Debug)]
pub struct Binding {
    name: String,
    attribute: Attribute,
    location: Location,
    wire_name: String,
    multiplicity: Multiplicity,
}

impl Binding {
    /// Binds `attribute` (stored in the payload under `name`) to `location`, read from the wire
    /// under `name` as well. Use [Binding::wire_name] to read it under another name.
    ///
    /// Fails if the attribute's type cannot be carried by `location`: objects only travel in
    /// bodies, maps only in the query string, and arrays must hold primitives.
    pub fn new(name: &str, attribute: Attribute, location: Location) -> Result<Self, SpecError> {
        let unsupported = || SpecError::UnsupportedBinding {
            name: name.to_string(),
            location,
            kind: attribute.ty.to_string(),
        };
        let multiplicity = match (&attribute.ty, location) {
            (_, Location::Body) => return Err(unsupported()),
            (ty, _) if ty.is_primitive() => Multiplicity::Single,
            (Type::Array(elem), Location::Path) if elem.ty.is_primitive() => Multiplicity::Joined,
            (Type::Array(elem), Location::Query | Location::Header) if elem.ty.is_primitive() => {
                Multiplicity::Repeated
            }
            (Type::Map(key, elem), Location::Query) if key.ty.is_primitive() => match &elem.ty {
                Type::Array(inner) if inner.ty.is_primitive() => Multiplicity::Multimap,
                ty if ty.is_primitive() => Multiplicity::Multimap,
                _ => return Err(unsupported()),
            },
            _ => return Err(unsupported()),
        };
        Ok(Self {
            name: name.to_string(),
            attribute,
            location,
            wire_name: name.to_string(),
            multiplicity,
        })
    }

    /// Binds `attribute` to the path segment `name`.
    pub fn path(name: &str, attribute: Attribute) -> Result<Self, SpecError> {
        Self::new(name, attribute, Location::Path)
    }

    /// Binds `attribute` to the query parameter `name`.
    pub fn query(name: &str, attribute: Attribute) -> Result<Self, SpecError> {
        Self::new(name, attribute, Location::Query)
    }

    /// Binds `attribute` to the header `name`.
    pub fn header(name: &str, attribute: Attribute) -> Result<Self, SpecError> {
        Self::new(name, attribute, Location::Header)
    }

    /// Reads the attribute from the wire under `wire_name`.
    pub fn wire_name(mut self, wire_name: &str) -> Self {
        self.wire_name = wire_name.to_string();
        self
    }

    /// The payload field (or attribute) name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attribute(&self) -> &Attribute {
        &self.attribute
    }

    pub fn location(&self) -> Location {
        self.location
    }

    /// The name of the path parameter, query key or header.
    pub fn wire(&self) -> &str {
        &self.wire_name
    }

    pub fn multiplicity(&self) -> Multiplicity {
        self.multiplicity
    }
}

/// Where the decoded body goes in the payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BodyTarget {
    /// The body is an object whose fields are copied into the payload.
    Inline,
    /// The body is stored under the given payload field.
    Field(String),
}

/// The request body and the shape the codec decodes it into.
#[derive(Clone, Debug)]
pub struct BodyBinding {
    attribute: Attribute,
    target: BodyTarget,
}

impl BodyBinding {
    /// A body whose fields are copied into the payload. `attribute` must be an object.
    pub fn inline(attribute: Attribute) -> Result<Self, SpecError> {
        if !matches!(attribute.ty, Type::Object(_)) {
            return Err(SpecError::UnsupportedBinding {
                name: "body".to_string(),
                location: Location::Body,
                kind: attribute.ty.to_string(),
            });
        }
        Ok(Self {
            attribute,
            target: BodyTarget::Inline,
        })
    }

    /// A body stored under the payload field `name` (or forming the payload itself when the
    /// payload is [PayloadShape::Attribute]).
    pub fn field(name: &str, attribute: Attribute) -> Self {
        Self {
            attribute,
            target: BodyTarget::Field(name.to_string()),
        }
    }

    pub fn attribute(&self) -> &Attribute {
        &self.attribute
    }

    pub fn target(&self) -> &BodyTarget {
        &self.target
    }
}

/// The shape of a method payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum PayloadShape {
    /// The method takes no payload.
    #[default]
    Empty,
    /// The payload is one attribute: the body, or else the first binding.
    Attribute,
    /// The payload is an object assembled from every binding and the body.
    Object,
}

/// The result field and literal value selecting a response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tag {
    pub field: String,
    pub value: String,
}

/// A result field rendered as a response header.
#[derive(Clone, Debug)]
pub struct HeaderBinding {
    pub field: String,
    pub wire_name: String,
    pub attribute: Attribute,
}

impl HeaderBinding {
    /// Renders the result field `field` as the header `field`.
    pub fn new(field: &str, attribute: Attribute) -> Self {
        Self {
            field: field.to_string(),
            wire_name: field.to_string(),
            attribute,
        }
    }

    /// Writes the header under `wire_name`.
    pub fn wire_name(mut self, wire_name: &str) -> Self {
        self.wire_name = wire_name.to_string();
        self
    }
}

/// What a response carries in its body.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum ResponseBody {
    #[default]
    Empty,
    /// The whole result.
    Result,
    /// An object made of the named result fields.
    Fields(Vec<String>),
}

/// One of the responses a result can be encoded into.
#[derive(Clone, Debug)]
pub struct ResponseSpec {
    pub status: StatusCode,
    pub tag: Option<Tag>,
    pub headers: Vec<HeaderBinding>,
    pub body: ResponseBody,
}

impl ResponseSpec {
    /// An untagged response with no headers and no body.
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            tag: None,
            headers: Vec::new(),
            body: ResponseBody::Empty,
        }
    }

    /// Selects this response when the result field `field` equals `value`.
    pub fn tagged(mut self, field: &str, value: &str) -> Self {
        self.tag = Some(Tag {
            field: field.to_string(),
            value: value.to_string(),
        });
        self
    }

    pub fn header(mut self, header: HeaderBinding) -> Self {
        self.headers.push(header);
        self
    }

    pub fn body(mut self, body: ResponseBody) -> Self {
        self.body = body;
        self
    }
}

/// The binding of one service method.
#[derive(Clone, Debug)]
pub struct Method {
    pub(crate) name: String,
    pub(crate) payload: PayloadShape,
    pub(crate) bindings: Vec<Binding>,
    pub(crate) body: Option<BodyBinding>,
    pub(crate) responses: Vec<ResponseSpec>,
}

impl Method {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            payload: PayloadShape::Empty,
            bindings: Vec::new(),
            body: None,
            responses: Vec::new(),
        }
    }

    pub fn payload(mut self, payload: PayloadShape) -> Self {
        self.payload = payload;
        self
    }

    /// Adds a request binding. Bindings are decoded in the order they are added.
    pub fn bind(mut self, binding: Binding) -> Self {
        self.bindings.push(binding);
        self
    }

    pub fn body(mut self, body: BodyBinding) -> Self {
        self.body = Some(body);
        self
    }

    /// Adds a response. Tagged responses are evaluated in the order they are added.
    pub fn response(mut self, response: ResponseSpec) -> Self {
        self.responses.push(response);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    pub fn responses(&self) -> &[ResponseSpec] {
        &self.responses
    }
}

/// The methods of one service, by name.
#[derive(Clone, Debug, Default)]
pub struct Service {
    name: String,
    methods: BTreeMap<String, Method>,
}

impl Service {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            methods: BTreeMap::new(),
        }
    }

    /// Adds `method`, replacing any method of the same name.
    pub fn method(mut self, method: Method) -> Self {
        self.methods.insert(method.name.clone(), method);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get(&self, method: &str) -> Option<&Method> {
        self.methods.get(method)
    }

    pub fn methods(&self) -> impl Iterator<Item = &Method> {
        self.methods.values()
    }
}
