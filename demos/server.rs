//! Demo server wiring every carryall helper into a route.
//!
//! Run with:
//!   RUST_LOG=debug cargo run --example server
//!
//! Try:
//!   curl -X POST localhost:3000/json -d '{"name":"alice"}'
//!   curl -F file=@photo.jpg localhost:3000/upload
//!   curl -F file=@photo.jpg localhost:3000/upload/one
//!   curl -OJ localhost:3000/download/<stored-name>
//!   curl -X POST localhost:3000/slug -d '{"text":"Now is the time"}'
//!   curl localhost:3000/random/16

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use carryall::{
    IntoResponse, JsonResponse, Response, Tools, create_slug, download_static_file, error_json,
    exit_on_interrupt, random_string, write_json,
};
use http::{Method, StatusCode};
use hyper::body::Incoming;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tracing::{error, info};

const UPLOAD_DIR: &str = "./uploads";

#[derive(Debug, Deserialize, Serialize)]
struct Greeting {
    name: String,
}

#[derive(Debug, Deserialize)]
struct SlugInput {
    text: String,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();
    exit_on_interrupt();

    let tools = Arc::new(
        Tools::new()
            .with_max_file_size(10 * 1024 * 1024)
            .with_allowed_file_types(["image/jpeg", "image/png", "image/gif"]),
    );

    let addr: SocketAddr = ([127, 0, 0, 1], 3000).into();
    let listener = match TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            error!("bind {addr}: {e}");
            return;
        }
    };
    info!(%addr, "carryall demo listening");

    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(v) => v,
            Err(e) => {
                error!("accept error: {e}");
                continue;
            }
        };

        let tools = Arc::clone(&tools);
        tokio::spawn(async move {
            let svc = service_fn(move |req| {
                let tools = Arc::clone(&tools);
                async move { Ok::<_, Infallible>(route(&tools, req).await.into_inner()) }
            });

            if let Err(e) = ConnBuilder::new(TokioExecutor::new())
                .serve_connection(TokioIo::new(stream), svc)
                .await
            {
                error!(%peer, "connection error: {e}");
            }
        });
    }
}

async fn route(tools: &Tools, req: http::Request<Incoming>) -> Response {
    let path = req.uri().path().to_owned();
    let segments: Vec<&str> = path.trim_matches('/').split('/').collect();

    match (req.method().clone(), segments.as_slice()) {
        (Method::POST, ["json"]) => greet(tools, req).await,
        (Method::POST, ["upload"]) => tools
            .upload_files(req, UPLOAD_DIR, true)
            .await
            .map(|files| json(StatusCode::CREATED, &JsonResponse::ok("uploaded", files)))
            .into_response(),
        (Method::POST, ["upload", "one"]) => tools
            .upload_one_file(req, UPLOAD_DIR, true)
            .await
            .map(|file| json(StatusCode::CREATED, &JsonResponse::ok("uploaded", file)))
            .into_response(),
        (Method::GET | Method::HEAD, ["download", file]) => {
            let (parts, _) = req.into_parts();
            match download_static_file(&parts, UPLOAD_DIR, file, file).await {
                Ok(res) => res,
                Err(e) => fail(&e, StatusCode::NOT_FOUND),
            }
        }
        (Method::POST, ["slug"]) => slug(tools, req).await,
        (Method::GET, ["random", n]) => match n.parse::<usize>() {
            Ok(n) if n <= 4096 => Response::text(random_string(n)),
            _ => fail(&"length must be a number up to 4096", StatusCode::BAD_REQUEST),
        },
        _ => Response::status(StatusCode::NOT_FOUND),
    }
}

async fn greet(tools: &Tools, req: http::Request<Incoming>) -> Response {
    match tools.read_json::<Greeting, _>(req).await {
        Ok(greeting) => json(StatusCode::OK, &JsonResponse::ok(format!("hello, {}", greeting.name), greeting)),
        Err(e) => e.into_response(),
    }
}

async fn slug(tools: &Tools, req: http::Request<Incoming>) -> Response {
    let input: SlugInput = match tools.read_json(req).await {
        Ok(input) => input,
        Err(e) => return e.into_response(),
    };
    match create_slug(&input.text) {
        Ok(slug) => json(StatusCode::OK, &JsonResponse::ok("slug", slug)),
        Err(e) => fail(&e, StatusCode::BAD_REQUEST),
    }
}

fn json<T: Serialize>(status: StatusCode, data: &T) -> Response {
    write_json(status, data, None).unwrap_or_else(|_| Response::status(StatusCode::INTERNAL_SERVER_ERROR))
}

fn fail<E: std::fmt::Display + ?Sized>(err: &E, status: StatusCode) -> Response {
    error_json(err, Some(status)).unwrap_or_else(|_| Response::status(StatusCode::INTERNAL_SERVER_ERROR))
}
