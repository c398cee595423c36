#![allow(clippy::unused_async)]

use axum::extract::Path;
use axum::http::{HeaderMap, StatusCode};
use axum::response::Html;
use axum::routing::{get, post};
use axum::{Json, Router};
use forum_errors::{ErrorHandling, RouteError};
use forum_kernel::security::escape_html;
use forum_kernel::server::router::system_router;
use serde_json::{Value, json};
use tower_http::trace::TraceLayer;

const CSRF_HEADER: &str = "x-csrf-token";

/// Full application: `/health` at the root, forum routes under the relative path,
/// all behind the error middleware.
pub fn app(errors: &ErrorHandling) -> Router {
    let relative_path = errors.relative_path();
    let router = Router::new().merge(system_router());
    let router = if relative_path.is_empty() {
        router.merge(forum_routes())
    } else {
        router.nest(relative_path, forum_routes())
    };

    errors.apply(router).layer(TraceLayer::new_for_http())
}

fn forum_routes() -> Router {
    Router::new()
        .route("/", get(home))
        .route("/topic/{tid}/{slug}", get(topic))
        .route("/compose", post(compose))
        .route("/blacklisted", get(blacklisted))
        .route("/me", get(me))
        .route("/crash", get(crash))
        .route("/api/v3/users/{uid}", get(api_user))
}

async fn home() -> Html<&'static str> {
    Html("<!DOCTYPE html>\n<html lang=\"en\">\n<body class=\"page-home\">\n<h1>Forum</h1>\n</body>\n</html>\n")
}

async fn topic(Path((tid, slug)): Path<(String, String)>) -> Result<Html<String>, RouteError> {
    let tid: u64 = tid
        .parse()
        .map_err(|e| RouteError::from_error(&e).with_status(StatusCode::NOT_FOUND))?;
    if tid == 0 {
        return Err(RouteError::new("[[error:no-topic]]").with_status(StatusCode::NOT_FOUND));
    }
    Ok(Html(format!("<h1>Topic {tid}</h1>\n<p>{}</p>\n", escape_html(&slug))))
}

async fn compose(headers: HeaderMap) -> Result<StatusCode, RouteError> {
    if headers.get(CSRF_HEADER).is_none() {
        return Err(RouteError::csrf());
    }
    Ok(StatusCode::CREATED)
}

async fn blacklisted() -> Result<(), RouteError> {
    Err(RouteError::blacklisted_ip("Your IP address has been banned"))
}

async fn me() -> Result<(), RouteError> {
    Err(RouteError::redirect("/login"))
}

async fn crash() -> Result<(), RouteError> {
    let err = std::io::Error::other("database offline");
    Err(RouteError::from_error(&err))
}

async fn api_user(Path(uid): Path<String>) -> Result<Json<Value>, RouteError> {
    match uid.parse::<u64>() {
        Ok(1) => Ok(Json(json!({ "uid": 1, "username": "admin" }))),
        Ok(_) => Err(RouteError::new("[[error:no-user]]")),
        Err(_) => Err(RouteError::new("[[error:invalid-data]]")),
    }
}
