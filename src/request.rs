//! Size-limited request body collection.

use bytes::Bytes;
use http_body::Body;
use http_body_util::{BodyExt, LengthLimitError, Limited};

/// Why a body could not be collected.
#[derive(Debug)]
pub(crate) enum BodyError {
    TooLarge,
    Other(String),
}

/// Buffers the whole body, failing as soon as it grows past `limit` bytes.
pub(crate) async fn collect_limited<B>(body: B, limit: usize) -> Result<Bytes, BodyError>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    match Limited::new(body, limit).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(e) if e.is::<LengthLimitError>() => Err(BodyError::TooLarge),
        Err(e) => Err(BodyError::Other(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use http_body_util::Full;

    use super::*;

    #[tokio::test]
    async fn body_within_limit_is_returned() {
        let body = Full::new(Bytes::from_static(b"hello"));
        let bytes = collect_limited(body, 5).await.unwrap();
        assert_eq!(&bytes[..], b"hello");
    }

    #[tokio::test]
    async fn body_over_limit_is_rejected() {
        let body = Full::new(Bytes::from_static(b"hello!"));
        assert!(matches!(collect_limited(body, 5).await, Err(BodyError::TooLarge)));
    }
}
