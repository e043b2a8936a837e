//! Forced-download static files.

use std::io::{self, SeekFrom};
use std::path::{Component, Path};

use futures::TryStreamExt;
use http::header::{CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE, HeaderValue};
use http::Method;
use http::request::Parts;
use http_body::Frame;
use http_body_util::{BodyExt, StreamBody};
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio_util::io::ReaderStream;

use crate::response::Response;
use crate::sniff::{SNIFF_LEN, detect_content_type};

/// Serves `<dir>/<file>` as an attachment named `display_name`.
///
/// Only the request head is needed; split a request with
/// [`http::Request::into_parts`].
///
/// Sets `Content-Disposition: attachment; filename="<display_name>"`, the
/// file's `Content-Length` and a `Content-Type` sniffed from its first bytes.
/// The body is streamed from disk. `HEAD` requests get the headers only.
///
/// `file` may not climb out of `dir`; such names fail with
/// [`io::ErrorKind::InvalidInput`], as do display names that are not valid
/// header text. A missing file fails with [`io::ErrorKind::NotFound`].
pub async fn download_static_file(
    req: &Parts,
    dir: impl AsRef<Path>,
    file: &str,
    display_name: &str,
) -> io::Result<Response> {
    if Path::new(file).components().any(|c| !matches!(c, Component::Normal(_) | Component::CurDir)) {
        return Err(io::Error::new(io::ErrorKind::InvalidInput, "file must stay inside the directory"));
    }

    let disposition = HeaderValue::try_from(format!("attachment; filename=\"{display_name}\""))
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

    let mut handle = File::open(dir.as_ref().join(file)).await?;
    let len = handle.metadata().await?.len();

    let mut head = Vec::with_capacity(SNIFF_LEN);
    (&mut handle).take(SNIFF_LEN as u64).read_to_end(&mut head).await?;
    let content_type = detect_content_type(&head);

    let builder = Response::builder()
        .typed_header(CONTENT_DISPOSITION, disposition)
        .typed_header(CONTENT_LENGTH, HeaderValue::from(len))
        .typed_header(CONTENT_TYPE, HeaderValue::from_static(content_type));

    if req.method == Method::HEAD {
        return Ok(builder.no_body());
    }

    handle.seek(SeekFrom::Start(0)).await?;
    let body = StreamBody::new(ReaderStream::new(handle).map_ok(Frame::data)).boxed();
    Ok(builder.stream(body))
}

#[cfg(test)]
mod tests {
    use http::Request;

    use super::*;

    fn get() -> Parts {
        Request::new(()).into_parts().0
    }

    async fn served(res: Response) -> Vec<u8> {
        res.into_inner().into_body().collect().await.unwrap().to_bytes().to_vec()
    }

    #[tokio::test]
    async fn sets_disposition_and_length() {
        let dir = tempfile::tempdir().unwrap();
        let data = b"\xFF\xD8\xFF\xE0 not really a jpeg";
        std::fs::write(dir.path().join("img.jpg"), data).unwrap();

        let res = download_static_file(&get(), dir.path(), "img.jpg", "camping.jpg").await.unwrap();

        assert_eq!(res.header("content-disposition"), Some("attachment; filename=\"camping.jpg\""));
        assert_eq!(res.header("content-length"), Some(data.len().to_string().as_str()));
        assert_eq!(res.header("content-type"), Some("image/jpeg"));
        assert_eq!(served(res).await, data);
    }

    #[tokio::test]
    async fn large_file_is_streamed_with_its_full_length() {
        let dir = tempfile::tempdir().unwrap();
        let mut data = b"%PDF-1.7\n".to_vec();
        data.extend((0..200_000u32).map(|i| (i % 251) as u8));
        std::fs::write(dir.path().join("report.pdf"), &data).unwrap();

        let res = download_static_file(&get(), dir.path(), "report.pdf", "report.pdf").await.unwrap();

        assert!(res.body().is_none());
        assert_eq!(res.header("content-length"), Some(data.len().to_string().as_str()));
        assert_eq!(res.header("content-type"), Some("application/pdf"));
        assert_eq!(served(res).await, data);
    }

    #[tokio::test]
    async fn head_has_headers_only() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), b"hello").unwrap();
        let (req, _) = Request::builder().method(Method::HEAD).body(()).unwrap().into_parts();

        let res = download_static_file(&req, dir.path(), "a.txt", "a.txt").await.unwrap();
        assert_eq!(res.header("content-length"), Some("5"));
        assert_eq!(res.header("content-type"), Some("text/plain; charset=utf-8"));
        assert!(res.body().is_some_and(|b| b.is_empty()));
    }

    #[tokio::test]
    async fn missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = download_static_file(&get(), dir.path(), "nope", "x").await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn traversal_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let err = download_static_file(&get(), dir.path(), "../etc/passwd", "x").await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }
}
