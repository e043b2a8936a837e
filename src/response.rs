//! Outgoing HTTP response type and the [`IntoResponse`] conversion trait.
//!
//! The helpers build a [`Response`] instead of writing to a socket. Hand it to
//! hyper with [`Response::into_inner`].

use std::{fmt, io};

use bytes::Bytes;
use http::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use http::StatusCode;
use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Full};

use crate::error::{JsonError, UploadError};
use crate::json::error_json;

// ── ContentType ───────────────────────────────────────────────────────────────

/// Content-type values used by the helpers.
pub enum ContentType {
    Json,         // application/json
    OctetStream,  // application/octet-stream
    Text,         // text/plain; charset=utf-8
}

impl ContentType {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Json        => "application/json",
            Self::OctetStream => "application/octet-stream",
            Self::Text        => "text/plain; charset=utf-8",
        }
    }
}

// ── Response ─────────────────────────────────────────────────────────────────

/// An outgoing HTTP response.
///
/// ```rust
/// use carryall::{ContentType, Response};
/// use http::StatusCode;
///
/// Response::text("hello");
/// Response::status(StatusCode::NO_CONTENT);
///
/// Response::builder()
///     .status(StatusCode::CREATED)
///     .header("location", "/files/42")
///     .bytes(ContentType::OctetStream, vec![0u8; 4]);
/// ```
#[derive(Debug)]
pub struct Response {
    pub(crate) body: Payload,
    pub(crate) headers: HeaderMap,
    pub(crate) status: StatusCode,
}

/// Boxed body hyper serves for every [`Response`].
pub type ResponseBody = BoxBody<Bytes, io::Error>;

pub(crate) enum Payload {
    Full(Bytes),
    Stream(ResponseBody),
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Full(bytes) => f.debug_tuple("Full").field(bytes).finish(),
            Self::Stream(_) => f.write_str("Stream"),
        }
    }
}

impl Response {
    /// `200 OK` with `application/json`. The bytes are sent untouched.
    pub fn json(body: impl Into<Bytes>) -> Self {
        Self::builder().finish(ContentType::Json.as_str(), body.into())
    }

    /// `200 OK` with `text/plain; charset=utf-8`.
    pub fn text(body: impl Into<String>) -> Self {
        Self::builder().finish(ContentType::Text.as_str(), Bytes::from(body.into()))
    }

    /// Response with no body.
    pub fn status(code: StatusCode) -> Self {
        Self { body: Payload::Full(Bytes::new()), headers: HeaderMap::new(), status: code }
    }

    /// Builder for responses that need a custom status or extra headers.
    pub fn builder() -> ResponseBuilder {
        ResponseBuilder { headers: HeaderMap::new(), status: StatusCode::OK }
    }

    pub fn status_code(&self) -> StatusCode { self.status }
    pub fn headers(&self) -> &HeaderMap { &self.headers }

    /// The buffered body; `None` when the body is streamed.
    pub fn body(&self) -> Option<&Bytes> {
        match &self.body {
            Payload::Full(bytes) => Some(bytes),
            Payload::Stream(_) => None,
        }
    }

    /// Case-insensitive header lookup; `None` for missing or non-ASCII values.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Converts into the `http` response hyper serves.
    pub fn into_inner(self) -> http::Response<ResponseBody> {
        let body = match self.body {
            Payload::Full(bytes) => Full::new(bytes).map_err(|never| match never {}).boxed(),
            Payload::Stream(body) => body,
        };
        let mut res = http::Response::new(body);
        *res.status_mut() = self.status;
        *res.headers_mut() = self.headers;
        res
    }
}

// ── ResponseBuilder ───────────────────────────────────────────────────────────

/// Fluent builder for [`Response`].
///
/// Obtain via [`Response::builder()`]. Defaults to `200 OK`. Terminated by a
/// typed body method.
pub struct ResponseBuilder {
    headers: HeaderMap,
    status: StatusCode,
}

impl ResponseBuilder {
    pub fn status(mut self, code: StatusCode) -> Self {
        self.status = code;
        self
    }

    /// Appends a header. Names or values that are not valid HTTP are dropped
    /// with a warning.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        match (HeaderName::try_from(name), HeaderValue::try_from(value)) {
            (Ok(name), Ok(value)) => {
                self.headers.append(name, value);
            }
            _ => tracing::warn!(header = name, "dropping invalid response header"),
        }
        self
    }

    /// Copies every entry of `headers`, replacing any value already set
    /// under the same name.
    pub fn headers(mut self, headers: &HeaderMap) -> Self {
        for name in headers.keys() {
            self.headers.remove(name);
            for value in headers.get_all(name) {
                self.headers.append(name.clone(), value.clone());
            }
        }
        self
    }

    /// Sets a header from an already-validated value.
    pub(crate) fn typed_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Terminate with a JSON body (`application/json`).
    pub fn json(self, body: impl Into<Bytes>) -> Response {
        self.finish(ContentType::Json.as_str(), body.into())
    }

    /// Terminate with a plain-text body.
    pub fn text(self, body: impl Into<String>) -> Response {
        self.finish(ContentType::Text.as_str(), Bytes::from(body.into()))
    }

    pub fn bytes(self, content_type: ContentType, body: impl Into<Bytes>) -> Response {
        self.finish(content_type.as_str(), body.into())
    }

    /// Terminate with a body whose headers the caller has already set.
    pub(crate) fn raw(self, body: impl Into<Bytes>) -> Response {
        Response { body: Payload::Full(body.into()), headers: self.headers, status: self.status }
    }

    /// Terminate with a streamed body whose headers the caller has already set.
    pub(crate) fn stream(self, body: ResponseBody) -> Response {
        Response { body: Payload::Stream(body), headers: self.headers, status: self.status }
    }

    /// Terminate with no body.
    pub fn no_body(self) -> Response {
        self.raw(Bytes::new())
    }

    // content-type is forced last so callers cannot override it by accident
    fn finish(mut self, content_type: &'static str, body: Bytes) -> Response {
        self.headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
        Response { body: Payload::Full(body), headers: self.headers, status: self.status }
    }
}

// ── IntoResponse ──────────────────────────────────────────────────────────────

/// Conversion into an HTTP [`Response`].
///
/// The error types render themselves as a JSON error envelope, so a handler
/// can do `match tools.read_json(req).await { Err(e) => return e.into_response(), .. }`.
pub trait IntoResponse {
    fn into_response(self) -> Response;
}

impl IntoResponse for Response {
    fn into_response(self) -> Response { self }
}

impl IntoResponse for &'static str {
    fn into_response(self) -> Response { Response::text(self) }
}

impl IntoResponse for String {
    fn into_response(self) -> Response { Response::text(self) }
}

impl IntoResponse for StatusCode {
    fn into_response(self) -> Response { Response::status(self) }
}

impl<T: IntoResponse, E: IntoResponse> IntoResponse for Result<T, E> {
    fn into_response(self) -> Response {
        match self {
            Ok(v) => v.into_response(),
            Err(e) => e.into_response(),
        }
    }
}

impl IntoResponse for JsonError {
    fn into_response(self) -> Response {
        envelope(&self, self.status())
    }
}

impl IntoResponse for UploadError {
    fn into_response(self) -> Response {
        envelope(&self, self.status())
    }
}

fn envelope(err: &dyn std::error::Error, status: StatusCode) -> Response {
    error_json(err, Some(status))
        .unwrap_or_else(|_| Response::status(StatusCode::INTERNAL_SERVER_ERROR))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults_to_ok() {
        let res = Response::builder().text("hi");
        assert_eq!(res.status_code(), StatusCode::OK);
        assert_eq!(res.header("content-type"), Some("text/plain; charset=utf-8"));
        assert_eq!(res.body().map(|b| &b[..]), Some(&b"hi"[..]));
    }

    #[test]
    fn caller_headers_cannot_override_content_type() {
        let mut extra = HeaderMap::new();
        extra.insert(CONTENT_TYPE, HeaderValue::from_static("text/html"));
        extra.insert("x-foo", HeaderValue::from_static("bar"));

        let res = Response::builder().headers(&extra).json("{}");
        assert_eq!(res.header("content-type"), Some("application/json"));
        assert_eq!(res.header("X-Foo"), Some("bar"));
    }

    #[test]
    fn invalid_header_is_dropped() {
        let res = Response::builder().header("bad header", "x").no_body();
        assert!(res.headers().is_empty());
    }

    #[test]
    fn into_inner_keeps_status_and_headers() {
        let res = Response::builder()
            .status(StatusCode::CREATED)
            .header("location", "/x")
            .no_body()
            .into_inner();
        assert_eq!(res.status(), StatusCode::CREATED);
        assert_eq!(res.headers()["location"], "/x");
    }

    #[test]
    fn errors_render_as_envelopes() {
        let res = JsonError::TooLarge { limit: 5 }.into_response();
        assert_eq!(res.status_code(), StatusCode::PAYLOAD_TOO_LARGE);
        let v: serde_json::Value = serde_json::from_slice(res.body().unwrap()).unwrap();
        assert_eq!(v["error"], true);
        assert_eq!(v["message"], "body must not be larger than 5 bytes");
    }
}
