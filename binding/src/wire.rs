//! The request and response as seen by the binding layer.
//!
//! A [Request] holds what the router and transport extracted from an incoming HTTP request: the
//! path parameters matched by the router, the parsed query string, the headers and the (fully
//! read) body. A [Response] is what encoding produces; [Response::into_http] hands it back to
//! the transport.

use bytes::{Bytes, BytesMut};
use http::{
    header::{ACCEPT, CONTENT_TYPE},
    HeaderMap, HeaderName, HeaderValue, StatusCode,
};
use std::collections::BTreeMap;
use tracing::debug;

/// A query string as an ordered multimap.
///
/// Keys keep the order of their first occurrence and values the order they appear in.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Query(Vec<(String, Vec<String>)>);

impl Query {
    /// Parses a raw (still percent-encoded) query string.
    ///
    /// `+` decodes to a space. Pairs that do not percent-decode to UTF-8 are skipped and a key
    /// without `=` is recorded with an empty value.
    pub fn parse(raw: &str) -> Self {
        let mut query = Self::default();
        for pair in raw.split('&').filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            let (Some(key), Some(value)) = (unescape(key), unescape(value)) else {
                debug!(pair, "skipping malformed query parameter");
                continue;
            };
            query.insert(key, value);
        }
        query
    }

    /// Returns the first value of `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values(key)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// Returns every value of `key`, or an empty slice if the key is absent.
    pub fn get_all(&self, key: &str) -> &[String] {
        self.values(key).unwrap_or_default()
    }

    fn values(&self, key: &str) -> Option<&[String]> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, values)| values.as_slice())
    }

    /// Appends `value` to the values of `key`.
    pub fn insert(&mut self, key: String, value: String) {
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some((_, values)) => values.push(value),
            None => self.0.push((key, vec![value])),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Query {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut query = Self::default();
        for (key, value) in iter {
            query.insert(key.into(), value.into());
        }
        query
    }
}

fn unescape(raw: &str) -> Option<String> {
    let raw = raw.replace('+', " ");
    urlencoding::decode(&raw).ok().map(|s| s.into_owned())
}

/// An incoming request.
#[derive(Clone, Debug, Default)]
pub struct Request {
    /// Path parameters captured by the router, by name.
    pub params: BTreeMap<String, String>,
    pub query: Query,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl Request {
    /// Creates a request from an [http::Request] and the path parameters captured by the router.
    pub fn from_http(request: http::Request<Bytes>, params: BTreeMap<String, String>) -> Self {
        let (parts, body) = request.into_parts();
        let query = parts.uri.query().map(Query::parse).unwrap_or_default();
        Self {
            params,
            query,
            headers: parts.headers,
            body,
        }
    }

    pub fn with_param(mut self, name: &str, value: &str) -> Self {
        self.params.insert(name.to_string(), value.to_string());
        self
    }

    /// Appends one query parameter (already decoded).
    pub fn with_query(mut self, key: &str, value: &str) -> Self {
        self.query.insert(key.to_string(), value.to_string());
        self
    }

    /// Appends one header line.
    pub fn with_header(mut self, name: &str, value: &str) -> Result<Self, http::Error> {
        let name = HeaderName::from_bytes(name.as_bytes())?;
        let value = HeaderValue::from_str(value)?;
        self.headers.append(name, value);
        Ok(self)
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Returns the first line of header `name`.
    pub fn header(&self, name: &str) -> Option<String> {
        self.headers.get(name).map(header_text)
    }

    /// Returns every line of header `name`, in order.
    pub fn header_all(&self, name: &str) -> Vec<String> {
        self.headers.get_all(name).iter().map(header_text).collect()
    }

    /// The media type of the body, without parameters.
    pub fn content_type(&self) -> Option<String> {
        self.header(CONTENT_TYPE.as_str()).map(media_type)
    }

    /// The `Accept` header, if any.
    pub fn accept(&self) -> Option<String> {
        self.header(ACCEPT.as_str())
    }
}

fn header_text(value: &HeaderValue) -> String {
    String::from_utf8_lossy(value.as_bytes()).into_owned()
}

/// Strips parameters (`; charset=utf-8`) and lowercases a media type.
pub(crate) fn media_type(raw: String) -> String {
    raw.split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// An encoded response.
#[derive(Clone, Debug)]
pub struct Response {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: BytesMut,
}

impl Response {
    /// An empty response with status `status`.
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: BytesMut::new(),
        }
    }

    /// Returns the first line of header `name` as text.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn into_http(self) -> http::Response<Bytes> {
        let mut response = http::Response::new(self.body.freeze());
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_parse() {
        let query = Query::parse("a=1&b=x+y&a=2&c&d=%E2%9C%93&&e=%FF");
        assert_eq!(query.get("a"), Some("1"));
        assert_eq!(query.get_all("a"), ["1", "2"]);
        assert_eq!(query.get("b"), Some("x y"));
        assert_eq!(query.get("c"), Some(""));
        assert_eq!(query.get("d"), Some("✓"));
        assert_eq!(query.get("e"), None);
        assert!(query.get_all("missing").is_empty());
        assert_eq!(query.len(), 4);
        let keys: Vec<_> = query.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, ["a", "b", "c", "d"]);
    }

    #[test]
    fn test_query_empty() {
        assert!(Query::parse("").is_empty());
        assert!(Query::parse("&&").is_empty());
    }

    #[test]
    fn test_request_from_http() {
        let request = http::Request::builder()
            .uri("/accounts/1?tag=a&tag=b")
            .header("X-Trace", "1")
            .header("X-Trace", "2")
            .header("Content-Type", "Application/JSON; charset=utf-8")
            .body(Bytes::from_static(b"{}"))
            .unwrap();
        let params = BTreeMap::from([("id".to_string(), "1".to_string())]);
        let request = Request::from_http(request, params);
        assert_eq!(request.params.get("id").map(String::as_str), Some("1"));
        assert_eq!(request.query.get_all("tag"), ["a", "b"]);
        assert_eq!(request.header_all("x-trace"), ["1", "2"]);
        assert_eq!(request.content_type().as_deref(), Some("application/json"));
        assert_eq!(request.accept(), None);
        assert_eq!(&request.body[..], b"{}");
    }

    #[test]
    fn test_request_builder() {
        let request = Request::default()
            .with_param("id", "7")
            .with_query("q", "a b")
            .with_header("Accept", "application/json")
            .unwrap()
            .with_body("x");
        assert_eq!(request.params["id"], "7");
        assert_eq!(request.query.get("q"), Some("a b"));
        assert_eq!(request.accept().as_deref(), Some("application/json"));
        assert!(Request::default().with_header("bad name", "x").is_err());
    }

    #[test]
    fn test_response_into_http() {
        let mut response = Response::new(StatusCode::CREATED);
        response
            .headers
            .insert("location", HeaderValue::from_static("/a"));
        response.body.extend_from_slice(b"ok");
        assert_eq!(response.header("Location"), Some("/a"));

        let response = response.into_http();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()["location"], "/a");
        assert_eq!(&response.body()[..], b"ok");
    }
}
