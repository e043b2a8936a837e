//! Posting JSON to other services.

use http::StatusCode;
use reqwest::header::{CONTENT_TYPE, HeaderValue};
use reqwest::{Client, Url};
use serde::Serialize;
use tracing::debug;

use crate::error::RemoteError;

/// POSTs `data` as JSON to `url` and returns the response with its status.
///
/// Uses `client` when given, otherwise a default [`Client`]. Nothing is sent
/// if `data` fails to serialize. The caller owns the response body.
pub async fn post_json_to_remote<T>(
    url: &Url,
    data: &T,
    client: Option<&Client>,
) -> Result<(reqwest::Response, StatusCode), RemoteError>
where
    T: Serialize + ?Sized,
{
    let body = serde_json::to_vec(data)?;

    let default_client;
    let client = match client {
        Some(client) => client,
        None => {
            default_client = Client::new();
            &default_client
        }
    };

    let request = client
        .post(url.clone())
        .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
        .body(body)
        .build()
        .map_err(RemoteError::Request)?;

    let response = client.execute(request).await.map_err(RemoteError::Transport)?;
    let status = response.status();
    debug!(%url, %status, "posted JSON to remote");

    Ok((response, status))
}
