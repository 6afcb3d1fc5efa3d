//! The body codec seam.
//!
//! Bodies are the only part of a request whose wire format is pluggable. A [Codec] inspects the
//! request to pick a [Decoder] (usually from `Content-Type`) and an [Encoder] (usually from
//! `Accept`). The decoder is told the shape of the expected body so that it can produce a
//! [Value] of the right types; the encoder writes any [Value] to a buffer.
//!
//! See [crate::json::JsonCodec] for the default implementation.

use crate::{attribute::Attribute, value::Value, wire::Request};
use bytes::BytesMut;
use thiserror::Error;

/// Error type for codec operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// The body is empty.
    #[error("end of stream")]
    EndOfStream,
    #[error("body too large: {0} > {1}")]
    TooLarge(usize, usize),
    #[error("invalid body: {0}")]
    Invalid(String),
    #[error("unsupported value: {0}")]
    Unsupported(String),
}

/// Reads a request body.
pub trait Decoder {
    /// Decodes the body into a value shaped by `shape`.
    ///
    /// Returns [Error::EndOfStream] if there is no body at all.
    fn decode(&mut self, shape: &Attribute) -> Result<Value, Error>;
}

/// Writes a response body.
pub trait Encoder {
    fn encode(&mut self, value: &Value, buf: &mut BytesMut) -> Result<(), Error>;
}

/// Chooses body decoders and encoders for requests.
pub trait Codec: Send + Sync {
    /// Returns a decoder reading the body of `request`.
    fn decoder<'a>(&self, request: &'a Request) -> Box<dyn Decoder + 'a>;

    /// Returns an encoder for the response to `request` and the content type it produces.
    fn encoder(&self, request: &Request) -> (Box<dyn Encoder>, String);
}
