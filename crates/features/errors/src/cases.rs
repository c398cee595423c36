use crate::context::ErrorContext;
use crate::error::ErrorHandlingError;
use crate::handler::DefaultHandler;
use crate::route_error::RouteError;
use async_trait::async_trait;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use forum_domain::constants::{CODE_BAD_CSRF_TOKEN, CODE_BLACKLISTED_IP};
use fxhash::FxHashMap;
use std::fmt;
use std::sync::Arc;
use tracing::error;

/// Handler for one error code.
#[async_trait]
pub trait ErrorCase: Send + Sync {
    /// Produces the response for `err`.
    ///
    /// `fallback` is the default handler, for cases that only handle some
    /// variants of their code. `None` leaves the original response in place.
    async fn handle(
        &self,
        err: RouteError,
        ctx: &ErrorContext,
        fallback: &DefaultHandler<'_>,
    ) -> Result<Option<Response>, ErrorHandlingError>;
}

/// Error code → handler table, rebuilt for every handled error.
#[derive(Clone, Default)]
pub struct ErrorCases {
    cases: FxHashMap<String, Arc<dyn ErrorCase>>,
}

impl fmt::Debug for ErrorCases {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.codes()).finish()
    }
}

impl ErrorCases {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Built-in table: bad CSRF token and blacklisted IP.
    #[must_use]
    pub fn defaults() -> Self {
        let mut cases = Self::new();
        cases.insert(CODE_BAD_CSRF_TOKEN, BadCsrfToken);
        cases.insert(CODE_BLACKLISTED_IP, BlacklistedIp);
        cases
    }

    /// Adds or replaces the handler for `code`.
    pub fn insert(&mut self, code: impl Into<String>, case: impl ErrorCase + 'static) {
        self.cases.insert(code.into(), Arc::new(case));
    }

    pub fn remove(&mut self, code: &str) -> bool {
        self.cases.remove(code).is_some()
    }

    #[must_use]
    pub fn get(&self, code: &str) -> Option<Arc<dyn ErrorCase>> {
        self.cases.get(code).cloned()
    }

    #[must_use]
    pub fn contains(&self, code: &str) -> bool {
        self.cases.contains_key(code)
    }

    /// Registered codes, sorted.
    #[must_use]
    pub fn codes(&self) -> Vec<&str> {
        let mut codes: Vec<&str> = self.cases.keys().map(String::as_str).collect();
        codes.sort_unstable();
        codes
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cases.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }
}

/// `EBADCSRFTOKEN`: logged, then a bare `403 Forbidden`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BadCsrfToken;

#[async_trait]
impl ErrorCase for BadCsrfToken {
    async fn handle(
        &self,
        err: RouteError,
        ctx: &ErrorContext,
        _fallback: &DefaultHandler<'_>,
    ) -> Result<Option<Response>, ErrorHandlingError> {
        error!("{} {}\n{}", ctx.method(), ctx.original_url(), err.message());
        let reason = StatusCode::FORBIDDEN.canonical_reason().unwrap_or_default();
        Ok(Some(plain_text(StatusCode::FORBIDDEN, reason.to_owned())))
    }
}

/// `blacklisted-ip`: `403` with the error message as plain text.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlacklistedIp;

#[async_trait]
impl ErrorCase for BlacklistedIp {
    async fn handle(
        &self,
        err: RouteError,
        _ctx: &ErrorContext,
        _fallback: &DefaultHandler<'_>,
    ) -> Result<Option<Response>, ErrorHandlingError> {
        Ok(Some(plain_text(StatusCode::FORBIDDEN, err.message().to_owned())))
    }
}

pub(crate) fn plain_text(status: StatusCode, body: String) -> Response {
    (status, [(header::CONTENT_TYPE, "text/plain; charset=utf-8")], body).into_response()
}

/// Synchronous case built from a closure; see [`case_fn`].
#[derive(Clone)]
pub struct FnCase<F>(F);

impl<F> fmt::Debug for FnCase<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnCase")
    }
}

/// Wraps a closure that always answers.
///
/// ```rust,ignore
/// cases.insert("ENOTFOUND", case_fn(|err, _ctx| (StatusCode::NOT_FOUND, err.to_string()).into_response()));
/// ```
pub const fn case_fn<F>(f: F) -> FnCase<F>
where
    F: Fn(&RouteError, &ErrorContext) -> Response + Send + Sync,
{
    FnCase(f)
}

#[async_trait]
impl<F> ErrorCase for FnCase<F>
where
    F: Fn(&RouteError, &ErrorContext) -> Response + Send + Sync,
{
    async fn handle(
        &self,
        err: RouteError,
        ctx: &ErrorContext,
        _fallback: &DefaultHandler<'_>,
    ) -> Result<Option<Response>, ErrorHandlingError> {
        Ok(Some((self.0)(&err, ctx)))
    }
}
