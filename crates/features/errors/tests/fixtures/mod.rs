#![allow(dead_code)]

use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Method, Request, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use forum_errors::{ErrorHandling, RouteError};
use http_body_util::BodyExt;
use parking_lot::Mutex;
use std::io;
use std::sync::Arc;
use tower::ServiceExt;
use tracing::Level;
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::fmt::MakeWriter;

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    #[must_use]
    pub fn content_type(&self) -> &str {
        self.header(header::CONTENT_TYPE.as_str()).unwrap_or_default()
    }

    /// # Panics
    /// If the body is not JSON.
    #[must_use]
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).expect("json body")
    }
}

async fn partial() -> Response {
    RouteError::new("late failure").attach((StatusCode::OK, "partial body"))
}

async fn partial_csrf() -> Response {
    RouteError::csrf().attach((StatusCode::OK, "partial body"))
}

async fn partial_uri() -> Response {
    RouteError::uri("URI malformed").attach((StatusCode::OK, "partial body"))
}

/// Forum routes raising one error family each, mounted under `relative_path`.
pub fn forum_routes() -> Router {
    Router::new()
        .route("/ok", get(|| async { "fine" }))
        .route("/topic/{tid}/{slug}", get(|| async { "topic" }))
        .route("/boom", get(|| async { Err::<(), _>(RouteError::new("Something <bad> happened")) }))
        .route("/csrf", get(|| async { Err::<(), _>(RouteError::csrf()) }))
        .route("/banned", get(|| async { Err::<(), _>(RouteError::blacklisted_ip("Your IP is banned")) }))
        .route("/plugin", get(|| async { Err::<(), _>(RouteError::new("no tea").with_code("ENOTEA")) }))
        .route("/login-required", get(|| async { Err::<(), _>(RouteError::redirect("/login")) }))
        .route(
            "/moved",
            get(|| async {
                Err::<(), _>(RouteError::redirect("/new").with_status(StatusCode::PERMANENT_REDIRECT))
            }),
        )
        .route("/api/v3/users/{uid}", get(|| async { Err::<(), _>(RouteError::new("[[error:no-user]]")) }))
        .route("/api/v3/crash", get(|| async { Err::<(), _>(RouteError::new("database offline")) }))
        .route(
            "/api/topic/{tid}",
            get(|| async { Err::<(), _>(RouteError::new("[[error:no-topic]]").with_status(StatusCode::NOT_FOUND)) }),
        )
        .route("/partial", get(partial))
        .route("/partial/csrf", get(partial_csrf))
        .route("/partial/uri", get(partial_uri))
        .route("/teapot", get(|| async { StatusCode::IM_A_TEAPOT.into_response() }))
}

/// Outer router with the error middleware, as the server builds it.
pub fn app(errors: &ErrorHandling) -> Router {
    let routes = forum_routes();
    let router = if errors.relative_path().is_empty() {
        Router::new().merge(routes)
    } else {
        Router::new().nest(errors.relative_path(), routes)
    };
    errors.apply(router)
}

/// # Panics
/// If the configuration is invalid.
#[must_use]
pub fn errors(relative_path: &str) -> ErrorHandling {
    ErrorHandling::builder().relative_path(relative_path).build().expect("error handling")
}

#[must_use]
pub fn request(method: Method, uri: &str) -> Request<Body> {
    Request::builder().method(method).uri(uri).body(Body::empty()).expect("request")
}

/// # Panics
/// If the router fails or the body cannot be read.
pub async fn send(app: Router, request: Request<Body>) -> TestResponse {
    let response = app.oneshot(request).await.expect("infallible router");
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response.into_body().collect().await.expect("body").to_bytes();
    TestResponse { status, headers, body: String::from_utf8_lossy(&bytes).into_owned() }
}

pub async fn get_path(errors: &ErrorHandling, uri: &str) -> TestResponse {
    send(app(errors), request(Method::GET, uri)).await
}

/// In-memory log sink for asserting the lines the handlers emit.
#[derive(Clone, Debug, Default)]
pub struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
    /// Routes this thread's `tracing` events into the capture until the guard drops.
    #[must_use]
    pub fn install(&self) -> DefaultGuard {
        let subscriber = tracing_subscriber::fmt()
            .with_writer(self.clone())
            .with_ansi(false)
            .without_time()
            .with_target(false)
            .with_max_level(Level::TRACE)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    #[must_use]
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }
}

impl io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogCapture {
    type Writer = Self;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}
