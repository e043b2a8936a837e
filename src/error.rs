//! Error types.
//!
//! Each helper family has its own enum. The `Display` text of every variant is
//! meant to be shown to the client as-is, usually through
//! [`error_json`](crate::error_json).

use http::StatusCode;
use thiserror::Error;

/// Failure decoding a JSON request body.
#[derive(Debug, Error)]
pub enum JsonError {
    #[error("body contains badly-formed JSON (at character {offset})")]
    Syntax { offset: usize },

    #[error("body contains badly-formed JSON")]
    Truncated,

    #[error("body contains incorrect JSON type for field \"{0}\"")]
    IncorrectFieldType(String),

    #[error("body contains incorrect JSON type (at character {offset})")]
    IncorrectType { offset: usize },

    #[error("body must not be empty")]
    Empty,

    #[error("body contains unknown key \"{0}\"")]
    UnknownField(String),

    #[error("body must not be larger than {limit} bytes")]
    TooLarge { limit: usize },

    #[error("body must contain only one JSON value")]
    MultipleValues,

    #[error("error unmarshalling JSON: {0}")]
    Decode(String),

    #[error("failed to read request body: {0}")]
    Body(String),
}

impl JsonError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

/// Failure handling a multipart upload.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("the uploaded file is too big (limit {limit} bytes)")]
    TooLarge { limit: u64 },

    #[error("request is not multipart/form-data: {0}")]
    NotMultipart(#[source] multer::Error),

    #[error("malformed multipart body: {0}")]
    Multipart(#[from] multer::Error),

    #[error("uploaded file type {detected} is not permitted")]
    TypeNotPermitted { detected: String },

    #[error("uploaded file name {0:?} is not usable")]
    InvalidFileName(String),

    #[error("no file provided")]
    NoFile,

    #[error("failed to read request body: {0}")]
    Body(String),

    #[error("i/o: {0}")]
    Io(#[from] std::io::Error),
}

impl UploadError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::TypeNotPermitted { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

/// Failure building a slug.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SlugError {
    #[error("empty string not permitted")]
    Empty,

    #[error("after removing characters, slug is zero length")]
    ZeroLength,
}

/// Failure posting JSON to a remote endpoint.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("failed to encode payload: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("failed to build request: {0}")]
    Request(#[source] reqwest::Error),

    #[error("failed to call remote: {0}")]
    Transport(#[source] reqwest::Error),
}
