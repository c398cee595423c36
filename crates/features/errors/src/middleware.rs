use crate::handler::ErrorHandling;
use crate::route_error::{ResponseCommitted, RouteError};
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use forum_kernel::text::decode_uri_component;
use std::borrow::Cow;

/// Percent-decodes a request path; a bad escape or invalid UTF-8 is a `Uri` error.
///
/// # Errors
/// [`RouteError`] of kind [`crate::RouteErrorKind::Uri`].
pub fn decode_path(path: &str) -> Result<Cow<'_, str>, RouteError> {
    Ok(decode_uri_component(path)?)
}

/// Axum middleware running every [`RouteError`] through [`ErrorHandling::dispatch`].
///
/// Install it with [`ErrorHandling::apply`] or
/// `axum::middleware::from_fn_with_state(errors, error_middleware)`.
pub async fn error_middleware(State(errors): State<ErrorHandling>, request: Request, next: Next) -> Response {
    let ctx = errors.context_for(&request);

    let malformed = decode_path(request.uri().path()).err();
    if let Some(err) = malformed {
        return errors
            .dispatch(err, &ctx)
            .await
            .unwrap_or_else(|| StatusCode::INTERNAL_SERVER_ERROR.into_response());
    }

    let mut response = next.run(request).await;
    let Some(err) = response.extensions_mut().remove::<RouteError>() else {
        return response;
    };
    let committed = response.extensions_mut().remove::<ResponseCommitted>().is_some();

    let ctx = ctx.with_headers_sent(committed);
    match errors.dispatch(err, &ctx).await {
        Some(handled) => handled,
        None => response,
    }
}
