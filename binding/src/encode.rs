//! Encode results (and decoding failures) into responses.
//!
//! Encoding a result happens in three steps:
//! 1. Select the [ResponseSpec]: the only one if there is one, else the first tagged response
//!    whose tag field holds the tag value, else the untagged default.
//! 2. Render the headers of the selected response from the result fields (or their defaults).
//! 3. Write the status code and hand the body to the codec.

use crate::{
    binding::{HeaderBinding, Method, ResponseBody, ResponseSpec},
    codec::Codec,
    error::{EncodeError, Errors},
    primitive,
    value::Value,
    wire::{Request, Response},
};
use http::{header::CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue, StatusCode};
use std::{borrow::Cow, collections::BTreeMap};
use tracing::debug;

impl Method {
    /// Returns the response `result` is encoded into, if any.
    pub fn select_response(&self, result: &Value) -> Option<&ResponseSpec> {
        if let [only] = self.responses.as_slice() {
            return Some(only);
        }
        let tagged = self.responses.iter().find(|response| {
            response.tag.as_ref().is_some_and(|tag| {
                result.get(&tag.field).and_then(Value::as_str) == Some(tag.value.as_str())
            })
        });
        tagged.or_else(|| self.responses.iter().find(|response| response.tag.is_none()))
    }

    /// Encodes `result` into a response to `request`.
    pub fn encode_response(
        &self,
        request: &Request,
        result: &Value,
        codec: &dyn Codec,
    ) -> Result<Response, EncodeError> {
        let selected = self.select_response(result).ok_or(EncodeError::NoResponse)?;
        debug!(method = self.name.as_str(), status = %selected.status, "selected response");

        let mut headers = HeaderMap::new();
        for header in &selected.headers {
            if let Some(value) = render_header(header, result)? {
                headers.insert(header_name(&header.wire_name)?, value);
            }
        }

        let body = match &selected.body {
            ResponseBody::Empty => None,
            ResponseBody::Result => Some(Cow::Borrowed(result)),
            ResponseBody::Fields(names) => {
                let Value::Object(fields) = result else {
                    return Err(EncodeError::InvalidResult(format!(
                        "{} must be an object to select body fields",
                        result.literal()
                    )));
                };
                let selected: BTreeMap<String, Value> = names
                    .iter()
                    .filter_map(|name| fields.get(name).map(|v| (name.clone(), v.clone())))
                    .collect();
                Some(Cow::Owned(Value::Object(selected)))
            }
        };
        write(request, selected.status, headers, body.as_deref(), codec)
    }

    /// Encodes the failures of a decode call into a `400 Bad Request` carrying a
    /// [crate::ServiceError].
    pub fn encode_error(
        &self,
        request: &Request,
        errors: &Errors,
        codec: &dyn Codec,
    ) -> Result<Response, EncodeError> {
        let body = errors.service_error();
        debug!(method = self.name.as_str(), id = body.id.as_str(), %errors, "encoding error");
        let body = Value::from(body);
        write(
            request,
            StatusCode::BAD_REQUEST,
            HeaderMap::new(),
            Some(&body),
            codec,
        )
    }
}

/// Sets the content type and status, then encodes the body (if any).
fn write(
    request: &Request,
    status: StatusCode,
    mut headers: HeaderMap,
    body: Option<&Value>,
    codec: &dyn Codec,
) -> Result<Response, EncodeError> {
    let Some(body) = body else {
        let mut response = Response::new(status);
        response.headers = headers;
        return Ok(response);
    };
    let (mut encoder, content_type) = codec.encoder(request);
    let content_type = HeaderValue::from_str(&content_type)
        .map_err(|e| EncodeError::InvalidResult(format!("content type {content_type:?}: {e}")))?;
    headers.insert(CONTENT_TYPE, content_type);

    let mut response = Response::new(status);
    response.headers = headers;
    encoder.encode(body, &mut response.body)?;
    Ok(response)
}

/// Renders the value of one header binding, substituting its default when the result does not
/// hold the field. Returns `None` if neither exists.
fn render_header(
    header: &HeaderBinding,
    result: &Value,
) -> Result<Option<HeaderValue>, EncodeError> {
    let field = match result {
        Value::Object(fields) => fields.get(&header.field).filter(|v| !v.is_null()),
        _ => {
            return Err(EncodeError::InvalidResult(format!(
                "{} must be an object to render header {}",
                result.literal(),
                header.wire_name
            )))
        }
    };
    let Some(value) = field.or(header.attribute.default.as_ref()) else {
        return Ok(None);
    };
    let text = primitive::render(value, &header.attribute.ty).ok_or_else(|| {
        EncodeError::InvalidResult(format!(
            "cannot render {} as header {} ({})",
            value.literal(),
            header.wire_name,
            header.attribute.ty
        ))
    })?;
    HeaderValue::from_str(&text)
        .map(Some)
        .map_err(|e| EncodeError::InvalidResult(format!("header {}: {e}", header.wire_name)))
}

fn header_name(name: &str) -> Result<HeaderName, EncodeError> {
    HeaderName::from_bytes(name.as_bytes())
        .map_err(|e| EncodeError::InvalidResult(format!("header name {name:?}: {e}")))
}
