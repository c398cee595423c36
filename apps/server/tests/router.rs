use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use forum_server::Server;
use http_body_util::BodyExt;
use tower::ServiceExt;

fn router(relative_path: &str) -> Router {
    Server::builder().relative_path(relative_path).build().expect("server").router()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Option<String>, String) {
    let response = app.oneshot(request).await.expect("infallible router");
    let status = response.status();
    let location = response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    let bytes = response.into_body().collect().await.expect("body").to_bytes();
    (status, location, String::from_utf8_lossy(&bytes).into_owned())
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).expect("request")
}

#[tokio::test]
async fn health_is_served_at_the_root() {
    let (status, _, body) = send(router("/forum"), get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body).expect("json");
    assert_eq!(json["status"], "up");
}

#[tokio::test]
async fn topics_render_under_the_relative_path() {
    let (status, _, body) = send(router("forum/"), get("/forum/topic/4/hello-%3Cworld%3E")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("<h1>Topic 4</h1>"));
    assert!(body.contains("hello-&lt;world&gt;"));
}

#[tokio::test]
async fn malformed_topic_urls_redirect() {
    let (status, location, _) = send(router("/forum"), get("/forum/topic/4/%E0%A4%A")).await;
    assert_eq!(status, StatusCode::FOUND);
    assert_eq!(location.as_deref(), Some("/forum/topic/4/"));
}

#[tokio::test]
async fn unknown_topics_render_the_error_page() {
    let (status, _, body) = send(router(""), get("/topic/0/gone")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("[[error:no-topic]]"));
    assert!(body.contains("page-topic page-topic-0 page-topic-gone user-guest"));
}

#[tokio::test]
async fn compose_without_token_is_forbidden() {
    let request = Request::post("/compose").body(Body::empty()).expect("request");
    let (status, _, body) = send(router(""), request).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, "Forbidden");

    let request =
        Request::post("/compose").header("x-csrf-token", "token").body(Body::empty()).expect("request");
    let (status, _, _) = send(router(""), request).await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn blacklisted_and_redirect_routes() {
    let (status, _, body) = send(router("/forum"), get("/forum/blacklisted")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, "Your IP address has been banned");

    let (status, location, _) = send(router("/forum"), get("/forum/me")).await;
    assert_eq!(status, StatusCode::FOUND);
    assert_eq!(location.as_deref(), Some("/forum/login"));
}

#[tokio::test]
async fn versioned_api_errors_use_the_envelope() {
    let (status, _, body) = send(router("/forum"), get("/forum/api/v3/users/2")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let json: serde_json::Value = serde_json::from_str(&body).expect("json");
    assert_eq!(json["status"]["code"], "bad-request");
    assert_eq!(json["status"]["message"], "User does not exist");

    let (status, _, body) = send(router("/forum"), get("/forum/api/v3/users/1")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("admin"));
}

#[tokio::test]
async fn crashes_render_the_500_page() {
    let (status, _, body) = send(router("/forum"), get("/forum/crash")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.contains("<h1>Internal Error.</h1>"));
    assert!(body.contains("database offline"));
}
