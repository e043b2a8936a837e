//! JSON request decoding and response encoding.

use std::fmt;

use http::header::HeaderMap;
use http::{Request, StatusCode};
use http_body::Body;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::error::Category;
use tracing::debug;

use crate::config::Tools;
use crate::error::JsonError;
use crate::request::{BodyError, collect_limited};
use crate::response::Response;

/// The uniform `{error, message, data}` envelope.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct JsonResponse<T = serde_json::Value> {
    pub error: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> JsonResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self { error: false, message: message.into(), data: Some(data) }
    }
}

impl Tools {
    /// Decodes exactly one JSON value from the request body into `T`.
    ///
    /// The body is capped at [`Tools::max_json_size`] (1 MiB when zero). Keys
    /// that `T` does not consume are rejected unless
    /// [`Tools::allow_unknown_fields`] is set.
    pub async fn read_json<T, B>(&self, req: Request<B>) -> Result<T, JsonError>
    where
        T: DeserializeOwned,
        B: Body,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let limit = self.json_limit();
        let body = collect_limited(req.into_body(), limit).await.map_err(|e| match e {
            BodyError::TooLarge => JsonError::TooLarge { limit },
            BodyError::Other(msg) => JsonError::Body(msg),
        })?;

        self.decode_json(&body)
    }

    pub(crate) fn decode_json<T: DeserializeOwned>(&self, body: &[u8]) -> Result<T, JsonError> {
        if body.iter().all(|&b| matches!(b, b' ' | b'\t' | b'\n' | b'\r')) {
            return Err(JsonError::Empty);
        }

        let mut de = serde_json::Deserializer::from_slice(body);
        let mut unknown: Option<String> = None;
        let mut on_ignored = |path: serde_ignored::Path<'_>| {
            if unknown.is_none() {
                unknown = Some(path.to_string());
            }
        };

        let value: T = serde_path_to_error::deserialize(serde_ignored::Deserializer::new(
            &mut de,
            &mut on_ignored,
        ))
        .map_err(|e| {
            let path = e.path().to_string();
            let field = (path != ".").then_some(path);
            classify(e.into_inner(), field, body)
        })?;

        if let Some(name) = unknown.filter(|_| !self.allow_unknown_fields) {
            debug!(field = %name, "rejecting JSON body with unknown key");
            return Err(JsonError::UnknownField(name));
        }

        de.end().map_err(|_| JsonError::MultipleValues)?;
        Ok(value)
    }
}

fn classify(err: serde_json::Error, field: Option<String>, body: &[u8]) -> JsonError {
    let offset = offset_of(body, err.line(), err.column());
    match err.classify() {
        Category::Syntax => JsonError::Syntax { offset },
        Category::Eof => JsonError::Truncated,
        Category::Data => {
            let msg = err.to_string();
            if let Some(name) = unknown_field_name(&msg) {
                JsonError::UnknownField(name.to_owned())
            } else if msg.starts_with("invalid type") || msg.starts_with("invalid value") {
                match field {
                    Some(field) => JsonError::IncorrectFieldType(field),
                    None => JsonError::IncorrectType { offset },
                }
            } else {
                JsonError::Decode(msg)
            }
        }
        Category::Io => JsonError::Decode(err.to_string()),
    }
}

// serde reports `#[serde(deny_unknown_fields)]` rejections as
// "unknown field `name`, expected ...".
fn unknown_field_name(msg: &str) -> Option<&str> {
    let rest = msg.strip_prefix("unknown field `")?;
    rest.split('`').next()
}

/// Byte offset of a 1-based line / column position.
fn offset_of(body: &[u8], line: usize, column: usize) -> usize {
    body.split(|b| *b == b'\n')
        .take(line.saturating_sub(1))
        .map(|l| l.len() + 1)
        .sum::<usize>()
        + column
}

/// Serializes `data` as the body of a JSON response.
///
/// `headers` are merged first; `Content-Type: application/json` always wins.
pub fn write_json<T>(
    status: StatusCode,
    data: &T,
    headers: Option<&HeaderMap>,
) -> Result<Response, serde_json::Error>
where
    T: Serialize + ?Sized,
{
    let body = serde_json::to_vec(data)?;
    let mut builder = Response::builder().status(status);
    if let Some(headers) = headers {
        builder = builder.headers(headers);
    }
    Ok(builder.json(body))
}

/// Writes `err` as an error envelope. `status` defaults to `400 Bad Request`.
pub fn error_json<E>(err: &E, status: Option<StatusCode>) -> Result<Response, serde_json::Error>
where
    E: fmt::Display + ?Sized,
{
    let payload: JsonResponse = JsonResponse {
        error: true,
        message: err.to_string(),
        data: None,
    };
    write_json(status.unwrap_or(StatusCode::BAD_REQUEST), &payload, None)
}
