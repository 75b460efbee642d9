//! Router-level tests for the maskpaint service.
//!
//! Requests are driven through the router with `tower::ServiceExt::oneshot`;
//! webhook delivery goes to a throwaway listener on 127.0.0.1.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::routing::post;
use tower::ServiceExt;

use crate::server::{AppState, router};
use crate::session::MemorySessionStore;
use crate::storage::MemoryBlobStore;
use crate::webhook::WebhookRelay;

mod save_mask_tests;

pub(super) const ORIGIN: &str = "http://masks.test";

/// State with in-memory stores, a fixed public origin and no webhook.
pub(super) fn test_state() -> AppState {
    AppState {
        sessions: Arc::new(MemorySessionStore::new()),
        blobs: Arc::new(MemoryBlobStore::new()),
        webhook: WebhookRelay::disabled(),
        public_origin: Some(ORIGIN.to_string()),
        session_ttl: Duration::from_secs(3600),
    }
}

pub(super) fn app(state: AppState) -> Router {
    router(state, 25 * 1024 * 1024)
}

pub(super) struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl TestResponse {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).expect("response body is JSON")
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

pub(super) async fn send(app: &Router, request: Request<Body>) -> TestResponse {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec();
    TestResponse {
        status,
        headers,
        body,
    }
}

pub(super) fn post_json(uri: &str, body: &serde_json::Value) -> Request<Body> {
    Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap()
}

pub(super) fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

/// A PNG comfortably above the minimum upload size.
pub(super) fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let image = image::RgbaImage::from_fn(width, height, |x, y| {
        image::Rgba([(x * 7) as u8, (y * 13) as u8, (x ^ y) as u8, 255])
    });
    let mut out = std::io::Cursor::new(Vec::new());
    image::DynamicImage::ImageRgba8(image)
        .write_to(&mut out, image::ImageFormat::Png)
        .unwrap();
    out.into_inner()
}

/// Start a session through the API and return its id.
pub(super) async fn start_session(app: &Router, body: serde_json::Value) -> String {
    let response = send(app, post_json("/api/start-session", &body)).await;
    assert_eq!(response.status, StatusCode::OK, "{}", response.text());
    response.json()["sessionId"].as_str().unwrap().to_string()
}

pub(super) type Received = Arc<Mutex<Vec<serde_json::Value>>>;

/// Listen on an ephemeral port, record JSON bodies POSTed to `/hook` and
/// answer with `status`.
pub(super) async fn spawn_webhook_receiver(status: StatusCode) -> (String, Received) {
    let received: Received = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&received);
    let hook = Router::new().route(
        "/hook",
        post(move |axum::Json(body): axum::Json<serde_json::Value>| {
            let sink = Arc::clone(&sink);
            async move {
                sink.lock().unwrap().push(body);
                status
            }
        }),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, hook).await.unwrap();
    });
    (format!("http://{addr}/hook"), received)
}
