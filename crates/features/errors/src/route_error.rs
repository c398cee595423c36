use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use forum_domain::constants::{CODE_BAD_CSRF_TOKEN, CODE_BLACKLISTED_IP};
use forum_kernel::text::TextError;
use std::fmt;

/// Message of errors raised for undecodable request paths.
pub const URI_MALFORMED: &str = "URI malformed";

/// How an error entered the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteErrorKind {
    /// The request URI could not be decoded.
    Uri,
    /// Anything raised by route handlers or other middleware.
    Application,
}

/// An error raised while serving a request, waiting to be turned into a response.
///
/// Returning it from a handler (it implements [`IntoResponse`]) hands it to
/// [`crate::error_middleware`]. `code` selects an entry of [`crate::ErrorCases`];
/// `status` and `path` drive the default handler.
#[derive(Debug, Clone)]
pub struct RouteError {
    kind: RouteErrorKind,
    message: String,
    code: Option<String>,
    status: Option<StatusCode>,
    path: Option<String>,
    detail: Option<String>,
}

/// Marks a response that was already produced when the error was attached.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ResponseCommitted;

impl RouteError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            kind: RouteErrorKind::Application,
            message: message.into(),
            code: None,
            status: None,
            path: None,
            detail: None,
        }
    }

    pub fn uri(message: impl Into<String>) -> Self {
        Self { kind: RouteErrorKind::Uri, ..Self::new(message) }
    }

    /// Missing or stale CSRF token.
    pub fn csrf() -> Self {
        Self::new("invalid csrf token").with_code(CODE_BAD_CSRF_TOKEN).with_status(StatusCode::FORBIDDEN)
    }

    /// The client address is blacklisted; `message` is shown to the client verbatim.
    pub fn blacklisted_ip(message: impl Into<String>) -> Self {
        Self::new(message).with_code(CODE_BLACKLISTED_IP).with_status(StatusCode::FORBIDDEN)
    }

    /// Asks the default handler to send the client to `path` (relative to the forum root).
    pub fn redirect(path: impl Into<String>) -> Self {
        Self::new("Redirecting").with_status(StatusCode::FOUND).with_path(path)
    }

    /// Wraps any error, keeping its source chain for the logs.
    pub fn from_error(err: &(dyn std::error::Error + 'static)) -> Self {
        let mut detail = err.to_string();
        let mut source = err.source();
        while let Some(cause) = source {
            detail.push_str("\n    caused by: ");
            detail.push_str(&cause.to_string());
            source = cause.source();
        }
        Self::new(err.to_string()).with_detail(detail)
    }

    #[must_use]
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    #[must_use]
    pub const fn with_status(mut self, status: StatusCode) -> Self {
        self.status = Some(status);
        self
    }

    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Diagnostic text written to the log instead of the message (stack, source chain).
    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    #[must_use]
    pub const fn kind(&self) -> RouteErrorKind {
        self.kind
    }

    #[must_use]
    pub const fn is_uri(&self) -> bool {
        matches!(self.kind, RouteErrorKind::Uri)
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    #[must_use]
    pub const fn status(&self) -> Option<StatusCode> {
        self.status
    }

    #[must_use]
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    #[must_use]
    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }

    pub(crate) fn log_detail(&self) -> &str {
        self.detail.as_deref().unwrap_or(&self.message)
    }

    pub(crate) fn set_message(&mut self, message: String) {
        self.message = message;
    }

    /// Reports this error for a response that is already built.
    ///
    /// The error still goes through the handlers (logging, plugin cases), but the
    /// default handler treats the response as sent and leaves it untouched.
    pub fn attach(self, response: impl IntoResponse) -> Response {
        let mut response = response.into_response();
        response.extensions_mut().insert(self);
        response.extensions_mut().insert(ResponseCommitted);
        response
    }
}

impl fmt::Display for RouteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for RouteError {}

impl From<TextError> for RouteError {
    fn from(err: TextError) -> Self {
        Self::uri(URI_MALFORMED).with_detail(err.to_string())
    }
}

impl IntoResponse for RouteError {
    /// Placeholder `500`; [`crate::error_middleware`] replaces it.
    fn into_response(self) -> Response {
        let mut response = StatusCode::INTERNAL_SERVER_ERROR.into_response();
        response.extensions_mut().insert(self);
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Outer(std::io::Error);

    impl fmt::Display for Outer {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("could not load topic")
        }
    }

    impl std::error::Error for Outer {
        fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
            Some(&self.0)
        }
    }

    #[test]
    fn well_known_constructors_carry_codes() {
        let csrf = RouteError::csrf();
        assert_eq!(csrf.code(), Some("EBADCSRFTOKEN"));
        assert_eq!(csrf.kind(), RouteErrorKind::Application);

        let banned = RouteError::blacklisted_ip("Your IP is banned");
        assert_eq!(banned.code(), Some("blacklisted-ip"));
        assert_eq!(banned.message(), "Your IP is banned");

        let redirect = RouteError::redirect("/login");
        assert_eq!(redirect.status(), Some(StatusCode::FOUND));
        assert_eq!(redirect.path(), Some("/login"));
    }

    #[test]
    fn from_error_keeps_source_chain() {
        let err = Outer(std::io::Error::other("disk offline"));
        let route = RouteError::from_error(&err);
        assert_eq!(route.message(), "could not load topic");
        assert_eq!(route.log_detail(), "could not load topic\n    caused by: disk offline");
    }

    #[test]
    fn text_errors_become_uri_errors() {
        let text = forum_kernel::text::decode_uri_component("/topic/%E0").expect_err("malformed");
        let route = RouteError::from(text);
        assert!(route.is_uri());
        assert_eq!(route.message(), URI_MALFORMED);
        assert!(route.detail().is_some());
    }

    #[test]
    fn into_response_stashes_the_error() {
        let response = RouteError::new("boom").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.extensions().get::<RouteError>().is_some());
        assert!(response.extensions().get::<ResponseCommitted>().is_none());

        let attached = RouteError::new("late").attach((StatusCode::OK, "partial"));
        assert_eq!(attached.status(), StatusCode::OK);
        assert!(attached.extensions().get::<ResponseCommitted>().is_some());
    }
}
