//! # carryall
//!
//! The small helpers every hyper service ends up writing: read a JSON body
//! safely, answer with a JSON envelope, accept file uploads, force a file
//! download, post JSON somewhere else, and stop on Ctrl-C.
//!
//! ## The ingestor
//!
//! [`Tools`] carries the limits. Request bodies are buffered through a size
//! cap before anything else happens:
//!
//! - JSON bodies: 1 MiB unless configured; exactly one value; unknown keys
//!   rejected unless allowed; every failure is a [`JsonError`] whose message
//!   can go straight back to the client.
//! - Uploads: 1 GiB unless configured; each file part is sniffed from its
//!   first 512 bytes and checked against an optional allow-list; a failing
//!   part rolls back the files stored by the same call.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use carryall::{IntoResponse, JsonResponse, Response, Tools, write_json};
//! use http::StatusCode;
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct NewUser { name: String }
//!
//! async fn create_user(req: http::Request<hyper::body::Incoming>) -> Response {
//!     let tools = Tools::default();
//!     let user: NewUser = match tools.read_json(req).await {
//!         Ok(user) => user,
//!         Err(e) => return e.into_response(),
//!     };
//!     let payload = JsonResponse::ok("created", user.name);
//!     write_json(StatusCode::CREATED, &payload, None)
//!         .unwrap_or_else(|_| Response::status(StatusCode::INTERNAL_SERVER_ERROR))
//! }
//! ```

mod config;
mod download;
mod error;
mod fs;
mod json;
mod random;
mod remote;
mod request;
mod response;
mod shutdown;
mod slug;
mod sniff;
mod upload;

pub use config::{Config, GIGABYTE, MEGABYTE, MimeList, Tools};
pub use download::download_static_file;
pub use error::{JsonError, RemoteError, SlugError, UploadError};
pub use fs::create_directory_if_not_exist;
pub use json::{JsonResponse, error_json, write_json};
pub use random::random_string;
pub use remote::post_json_to_remote;
pub use response::{ContentType, IntoResponse, Response, ResponseBody, ResponseBuilder};
pub use shutdown::{close_listener, exit_on_interrupt, listen_for};
pub use slug::create_slug;
pub use sniff::{SNIFF_LEN, detect_content_type};
pub use upload::{RANDOM_NAME_LEN, UploadedFile};
