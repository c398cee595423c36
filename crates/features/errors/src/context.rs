use axum::extract::OriginalUri;
use axum::http::{Method, Request};
use forum_domain::constants::API_PREFIX;

/// Request extension carrying the signed-in user id (absent or `0` for guests).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewerId(pub u64);

/// Request extension that overrides API-client detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApiClient(pub bool);

/// What the error handlers know about the failing request.
#[derive(Debug, Clone)]
pub struct ErrorContext {
    method: Method,
    path: String,
    original_url: String,
    is_api: bool,
    uid: u64,
    headers_sent: bool,
}

impl ErrorContext {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            method,
            original_url: path.clone(),
            path,
            is_api: false,
            uid: 0,
            headers_sent: false,
        }
    }

    /// Captures the request facts before the request is handed to the router.
    ///
    /// A request is an API client when an [`ApiClient`] extension says so, otherwise
    /// when its path is `{relative_path}/api` or below.
    pub fn from_request<B>(request: &Request<B>, relative_path: &str) -> Self {
        let uri = request
            .extensions()
            .get::<OriginalUri>()
            .map_or_else(|| request.uri().clone(), |original| original.0.clone());
        let original_url =
            uri.path_and_query().map_or_else(|| uri.path().to_owned(), ToString::to_string);
        let path = request.uri().path().to_owned();
        let is_api = request
            .extensions()
            .get::<ApiClient>()
            .map_or_else(|| is_api_path(&path, relative_path), |client| client.0);
        let uid = request.extensions().get::<ViewerId>().map_or(0, |viewer| viewer.0);

        Self { method: request.method().clone(), path, original_url, is_api, uid, headers_sent: false }
    }

    #[must_use]
    pub fn with_original_url(mut self, url: impl Into<String>) -> Self {
        self.original_url = url.into();
        self
    }

    #[must_use]
    pub const fn with_api(mut self, is_api: bool) -> Self {
        self.is_api = is_api;
        self
    }

    #[must_use]
    pub const fn with_uid(mut self, uid: u64) -> Self {
        self.uid = uid;
        self
    }

    #[must_use]
    pub const fn with_headers_sent(mut self, sent: bool) -> Self {
        self.headers_sent = sent;
        self
    }

    #[must_use]
    pub const fn method(&self) -> &Method {
        &self.method
    }

    /// Request path, including the relative path prefix.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Path and query as the client sent them.
    #[must_use]
    pub fn original_url(&self) -> &str {
        &self.original_url
    }

    #[must_use]
    pub const fn is_api(&self) -> bool {
        self.is_api
    }

    #[must_use]
    pub const fn uid(&self) -> u64 {
        self.uid
    }

    #[must_use]
    pub const fn headers_sent(&self) -> bool {
        self.headers_sent
    }
}

fn is_api_path(path: &str, relative_path: &str) -> bool {
    path.strip_prefix(relative_path)
        .and_then(|rest| rest.strip_prefix(API_PREFIX))
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}
