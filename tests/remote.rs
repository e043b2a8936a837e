use std::convert::Infallible;
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use carryall::post_json_to_remote;
use http::StatusCode;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use reqwest::Url;
use serde::Serialize;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

#[derive(Serialize)]
struct Foo {
    bar: &'static str,
}

/// Accepts one connection; reports the request's content type and body.
async fn one_shot_server() -> (Url, oneshot::Receiver<(String, Bytes)>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel();

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let tx = Arc::new(Mutex::new(Some(tx)));
        let svc = service_fn(move |req: http::Request<Incoming>| {
            let tx = tx.lock().unwrap().take();
            async move {
                let content_type = req
                    .headers()
                    .get("content-type")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_owned();
                let body = req.into_body().collect().await.unwrap().to_bytes();
                if let Some(tx) = tx {
                    let _ = tx.send((content_type, body));
                }
                let mut res = http::Response::new(Full::new(Bytes::from_static(b"ok")));
                *res.status_mut() = StatusCode::CREATED;
                Ok::<_, Infallible>(res)
            }
        });
        let _ = http1::Builder::new().serve_connection(TokioIo::new(stream), svc).await;
    });

    (Url::parse(&format!("http://{addr}/some/path")).unwrap(), rx)
}

#[tokio::test]
async fn posts_json_and_returns_status() {
    let (url, seen) = one_shot_server().await;
    let client = reqwest::Client::builder().no_proxy().build().unwrap();

    let (response, status) = post_json_to_remote(&url, &Foo { bar: "bar" }, Some(&client))
        .await
        .unwrap();

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(response.text().await.unwrap(), "ok");

    let (content_type, body) = seen.await.unwrap();
    assert_eq!(content_type, "application/json");
    assert_eq!(&body[..], br#"{"bar":"bar"}"#);
}
