use crate::context::ErrorContext;
use crate::error::ErrorHandlingError;
use crate::translate::Translator;
use axum::Json;
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::{Map, Value};

/// Body of a versioned API error.
#[derive(Debug, Clone, Serialize)]
pub struct ApiEnvelope {
    pub status: ApiStatus,
    pub response: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApiStatus {
    pub code: &'static str,
    pub message: String,
}

/// Machine-readable name of an error status, as used in [`ApiStatus::code`].
#[must_use]
pub const fn status_code_name(status: StatusCode) -> &'static str {
    match status.as_u16() {
        400 => "bad-request",
        401 => "not-authorised",
        403 => "forbidden",
        404 => "not-found",
        426 => "upgrade-required",
        429 => "too-many-requests",
        501 => "not-implemented",
        503 => "service-unavailable",
        _ => "internal-server-error",
    }
}

const fn default_message_key(status: StatusCode) -> u16 {
    match status.as_u16() {
        code @ (400 | 401 | 403 | 404 | 426 | 429 | 500 | 501 | 503) => code,
        _ => 500,
    }
}

/// Formats an API error response.
///
/// `HEAD` requests only get the status. An empty `message` falls back to the
/// translated `[[error:api.<status>]]` text.
pub async fn format_api_error(
    status: StatusCode,
    ctx: &ErrorContext,
    message: &str,
    translator: &dyn Translator,
) -> Result<Response, ErrorHandlingError> {
    if ctx.method() == Method::HEAD {
        return Ok(status.into_response());
    }

    let message = if message.is_empty() {
        translator.translate(&format!("[[error:api.{}]]", default_message_key(status))).await?
    } else {
        message.to_owned()
    };

    let body = ApiEnvelope {
        status: ApiStatus { code: status_code_name(status), message },
        response: Map::new(),
    };
    Ok((status, Json(body)).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translate::Catalog;
    use http_body_util::BodyExt;

    #[test]
    fn status_names() {
        assert_eq!(status_code_name(StatusCode::BAD_REQUEST), "bad-request");
        assert_eq!(status_code_name(StatusCode::TOO_MANY_REQUESTS), "too-many-requests");
        assert_eq!(status_code_name(StatusCode::INTERNAL_SERVER_ERROR), "internal-server-error");
        assert_eq!(status_code_name(StatusCode::IM_A_TEAPOT), "internal-server-error");
    }

    #[tokio::test]
    async fn empty_message_uses_translated_default() {
        let ctx = ErrorContext::new(Method::GET, "/api/v3/users/1");
        let response =
            format_api_error(StatusCode::NOT_FOUND, &ctx, "", &Catalog::with_defaults()).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"]["code"], "not-found");
        assert_eq!(json["status"]["message"], "Invalid API call");
        assert_eq!(json["response"], serde_json::json!({}));
    }

    #[tokio::test]
    async fn unlisted_status_falls_back_to_server_error_text() {
        let ctx = ErrorContext::new(Method::GET, "/api/v3/users/1");
        let response =
            format_api_error(StatusCode::CONFLICT, &ctx, "", &Catalog::with_defaults()).await.unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"]["code"], "internal-server-error");
        assert_eq!(
            json["status"]["message"],
            "An unexpected error was encountered while attempting to service your request."
        );
    }

    #[tokio::test]
    async fn head_requests_get_status_only() {
        let ctx = ErrorContext::new(Method::HEAD, "/api/v3/users/1");
        let response = format_api_error(StatusCode::BAD_REQUEST, &ctx, "nope", &Catalog::new())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert!(body.is_empty());
    }
}
