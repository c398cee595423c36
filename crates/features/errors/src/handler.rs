use crate::api::format_api_error;
use crate::body_class::build_body_class;
use crate::cases::{ErrorCases, plain_text};
use crate::context::ErrorContext;
use crate::error::ErrorHandlingError;
use crate::hooks::HookRegistry;
use crate::middleware::error_middleware;
use crate::render::{BasicPageRenderer, PageRenderer};
use crate::route_error::RouteError;
use crate::translate::{Catalog, Translator};
use axum::Json;
use axum::Router;
use axum::http::{HeaderName, Request, StatusCode, header};
use axum::middleware;
use axum::response::{Html, IntoResponse, Response};
use forum_domain::config::{ForumConfig, normalize_relative_path};
use forum_domain::constants::{
    API_PREFIX, API_V3_PREFIX, HEADER_X_REDIRECT, TEMPLATE_BAD_REQUEST, TEMPLATE_SERVER_ERROR,
};
use forum_kernel::security::escape_html;
use serde_json::json;
use std::fmt;
use std::ops::ControlFlow;
use std::sync::Arc;
use tracing::{error, warn};

const DEFAULT_SITE_TITLE: &str = "Forum";

/// Shared error-handling services. Cheap to clone.
#[derive(Clone)]
pub struct ErrorHandling {
    inner: Arc<Inner>,
}

struct Inner {
    relative_path: String,
    translator: Arc<dyn Translator>,
    renderer: Arc<dyn PageRenderer>,
    hooks: HookRegistry,
}

impl fmt::Debug for ErrorHandling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorHandling")
            .field("relative_path", &self.inner.relative_path)
            .field("hooks", &self.inner.hooks)
            .finish_non_exhaustive()
    }
}

#[derive(Default)]
pub struct ErrorHandlingBuilder {
    relative_path: String,
    site_title: Option<String>,
    translator: Option<Arc<dyn Translator>>,
    renderer: Option<Arc<dyn PageRenderer>>,
    hooks: Option<HookRegistry>,
}

impl fmt::Debug for ErrorHandlingBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorHandlingBuilder")
            .field("relative_path", &self.relative_path)
            .field("site_title", &self.site_title)
            .field("custom_translator", &self.translator.is_some())
            .field("custom_renderer", &self.renderer.is_some())
            .finish_non_exhaustive()
    }
}

impl ErrorHandlingBuilder {
    /// Mount prefix, already normalized (`""` or `/forum`).
    #[must_use]
    pub fn relative_path(mut self, path: impl Into<String>) -> Self {
        self.relative_path = path.into();
        self
    }

    /// Site title for the built-in renderer. Ignored with a custom renderer.
    #[must_use]
    pub fn site_title(mut self, title: impl Into<String>) -> Self {
        self.site_title = Some(title.into());
        self
    }

    #[must_use]
    pub fn translator(mut self, translator: Arc<dyn Translator>) -> Self {
        self.translator = Some(translator);
        self
    }

    #[must_use]
    pub fn renderer(mut self, renderer: Arc<dyn PageRenderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    #[must_use]
    pub fn hooks(mut self, hooks: HookRegistry) -> Self {
        self.hooks = Some(hooks);
        self
    }

    /// # Errors
    /// [`ErrorHandlingError::Configuration`] when the relative path is not normalized.
    pub fn build(self) -> Result<ErrorHandling, ErrorHandlingError> {
        let relative_path = self.relative_path;
        if normalize_relative_path(&relative_path) != relative_path {
            return Err(ErrorHandlingError::Configuration {
                message: format!("relative path '{relative_path}' must start with '/' and not end with it")
                    .into(),
                context: None,
            });
        }

        let translator =
            self.translator.unwrap_or_else(|| Arc::new(Catalog::with_defaults()) as Arc<dyn Translator>);
        let renderer = self.renderer.unwrap_or_else(|| {
            let title = self.site_title.unwrap_or_else(|| DEFAULT_SITE_TITLE.to_owned());
            Arc::new(BasicPageRenderer::new(title, relative_path.clone(), Arc::clone(&translator)))
                as Arc<dyn PageRenderer>
        });

        Ok(ErrorHandling {
            inner: Arc::new(Inner {
                relative_path,
                translator,
                renderer,
                hooks: self.hooks.unwrap_or_default(),
            }),
        })
    }
}

impl ErrorHandling {
    #[must_use]
    pub fn builder() -> ErrorHandlingBuilder {
        ErrorHandlingBuilder::default()
    }

    /// Built-in translator and renderer, configured from the `site` section.
    ///
    /// # Errors
    /// See [`ErrorHandlingBuilder::build`].
    pub fn from_config(config: &ForumConfig) -> Result<Self, ErrorHandlingError> {
        Self::builder()
            .relative_path(config.site.relative_path.as_str())
            .site_title(config.site.title.as_str())
            .build()
    }

    #[must_use]
    pub fn relative_path(&self) -> &str {
        &self.inner.relative_path
    }

    #[must_use]
    pub fn translator(&self) -> &dyn Translator {
        self.inner.translator.as_ref()
    }

    #[must_use]
    pub fn renderer(&self) -> &dyn PageRenderer {
        self.inner.renderer.as_ref()
    }

    #[must_use]
    pub fn hooks(&self) -> &HookRegistry {
        &self.inner.hooks
    }

    #[must_use]
    pub const fn default_handler(&self) -> DefaultHandler<'_> {
        DefaultHandler { handling: self }
    }

    pub fn context_for<B>(&self, request: &Request<B>) -> ErrorContext {
        ErrorContext::from_request(request, self.relative_path())
    }

    /// Wraps `router` with [`error_middleware`]. Apply it to the outermost router,
    /// so request paths still carry the relative path.
    pub fn apply<S>(&self, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        router.layer(middleware::from_fn_with_state(self.clone(), error_middleware))
    }

    /// Runs `err` through the URI handler, then the general handler.
    ///
    /// Failures of either stage are logged and answered with a plain-text `500`.
    /// `None` means the response already sent stays as it is. Once headers are sent
    /// the handlers still run for their logging and listener side effects, but their
    /// response is dropped.
    pub async fn dispatch(&self, err: RouteError, ctx: &ErrorContext) -> Option<Response> {
        let response = self.run_handlers(err, ctx).await;
        if ctx.headers_sent() {
            return None;
        }
        response
    }

    async fn run_handlers(&self, err: RouteError, ctx: &ErrorContext) -> Option<Response> {
        let err = match self.handle_uri_errors(err, ctx).await {
            Ok(ControlFlow::Break(response)) => return Some(response),
            Ok(ControlFlow::Continue(err)) => err,
            Err(failure) => return Self::recover(ctx, &failure),
        };

        match self.handle_errors(err, ctx).await {
            Ok(response) => response,
            Err(failure) => Self::recover(ctx, &failure),
        }
    }

    /// Malformed URI errors: redirect recognizable topic/category paths, else `400`.
    /// Every other error continues unchanged.
    ///
    /// # Errors
    /// Page render failures.
    pub async fn handle_uri_errors(
        &self,
        err: RouteError,
        ctx: &ErrorContext,
    ) -> Result<ControlFlow<Response, RouteError>, ErrorHandlingError> {
        if !err.is_uri() {
            return Ok(ControlFlow::Continue(err));
        }

        let relative_path = self.relative_path();
        let clean = ctx.path().strip_prefix(relative_path).unwrap_or_else(|| ctx.path());
        if let Some(target) = id_path_prefix(clean, "/topic/").or_else(|| id_path_prefix(clean, "/category/")) {
            return Ok(ControlFlow::Break(redirect_to(&format!("{relative_path}{target}"))));
        }

        warn!("[controller] Bad request: {}", ctx.path());

        if ctx.path().starts_with(&format!("{relative_path}{API_PREFIX}")) {
            let body = json!({ "error": "[[global:400.title]]" });
            return Ok(ControlFlow::Break((StatusCode::BAD_REQUEST, Json(body)).into_response()));
        }

        let data = json!({ "error": escape_html(err.message()) });
        let html = self.renderer().render_page(ctx, TEMPLATE_BAD_REQUEST, &data).await?;
        Ok(ControlFlow::Break((StatusCode::BAD_REQUEST, Html(html)).into_response()))
    }

    /// Looks the error code up in the case table, else uses the default handler.
    ///
    /// # Errors
    /// Whatever the selected case or the default handler fails with.
    pub async fn handle_errors(
        &self,
        err: RouteError,
        ctx: &ErrorContext,
    ) -> Result<Option<Response>, ErrorHandlingError> {
        let cases = self.error_cases().await;
        let case = err.code().and_then(|code| cases.get(code));
        let fallback = self.default_handler();

        match case {
            Some(case) => case.handle(err, ctx, &fallback).await,
            None => fallback.handle(err, ctx).await,
        }
    }

    /// Built-in cases passed through the `filter:error.handle` listeners.
    pub async fn error_cases(&self) -> ErrorCases {
        match self.hooks().fire_error_handle(ErrorCases::defaults()).await {
            Ok(cases) => cases,
            Err(err) => {
                warn!(
                    kind = err.variant_name(),
                    "[errors/handle] Unable to retrieve plugin handlers for errors: {err}"
                );
                ErrorCases::defaults()
            },
        }
    }

    fn recover(ctx: &ErrorContext, failure: &ErrorHandlingError) -> Option<Response> {
        error!(kind = failure.variant_name(), "{} {}\n{failure}", ctx.method(), ctx.original_url());
        if ctx.headers_sent() {
            return None;
        }
        Some(plain_text(StatusCode::INTERNAL_SERVER_ERROR, failure.to_string()))
    }
}

/// Fallback for errors without a matching case.
#[derive(Clone, Copy)]
pub struct DefaultHandler<'a> {
    handling: &'a ErrorHandling,
}

impl fmt::Debug for DefaultHandler<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefaultHandler").finish_non_exhaustive()
    }
}

impl DefaultHandler<'_> {
    /// Redirects, versioned API errors, then the `500` page or its JSON data.
    ///
    /// Returns `None` when the response was already sent.
    ///
    /// # Errors
    /// Translation and page render failures.
    pub async fn handle(
        &self,
        mut err: RouteError,
        ctx: &ErrorContext,
    ) -> Result<Option<Response>, ErrorHandlingError> {
        if ctx.headers_sent() {
            return Ok(None);
        }

        let handling = self.handling;
        let relative_path = handling.relative_path();

        let redirect = err
            .status()
            .is_some_and(|status| status == StatusCode::FOUND || status == StatusCode::PERMANENT_REDIRECT);
        if let Some(path) = err.path().filter(|_| redirect) {
            let response = if ctx.is_api() {
                let name = HeaderName::from_static(HEADER_X_REDIRECT);
                ([(name, path.to_owned())], Json(path)).into_response()
            } else {
                redirect_to(&format!("{relative_path}{path}"))
            };
            return Ok(Some(response));
        }

        if ctx.path().starts_with(&format!("{relative_path}{API_V3_PREFIX}")) {
            let status = if err.message().starts_with("[[") {
                let translated = handling.translator().translate(err.message()).await?;
                err.set_message(translated);
                StatusCode::BAD_REQUEST
            } else {
                StatusCode::INTERNAL_SERVER_ERROR
            };
            return format_api_error(status, ctx, err.message(), handling.translator()).await.map(Some);
        }

        error!("{} {}\n{}", ctx.method(), ctx.original_url(), err.log_detail());

        let status = err.status().unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let data = json!({
            "path": escape_html(ctx.path()),
            "error": escape_html(err.message()),
            "bodyClass": build_body_class(ctx, relative_path),
        });

        if ctx.is_api() {
            return Ok(Some((status, Json(data)).into_response()));
        }

        let html = handling.renderer().render_page(ctx, TEMPLATE_SERVER_ERROR, &data).await?;
        Ok(Some((status, Html(html)).into_response()))
    }
}

/// `302 Found` to `location`.
fn redirect_to(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_owned())]).into_response()
}

/// `/section/<digits>/` at the start of `path`, trailing slash included.
fn id_path_prefix<'a>(path: &'a str, section: &str) -> Option<&'a str> {
    let rest = path.strip_prefix(section)?;
    let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
    let end = section.len() + digits + 1;
    (digits > 0 && rest.as_bytes().get(digits) == Some(&b'/')).then(|| &path[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_prefixes_need_digits_and_a_slash() {
        assert_eq!(id_path_prefix("/topic/12/bad%E0", "/topic/"), Some("/topic/12/"));
        assert_eq!(id_path_prefix("/topic/12", "/topic/"), None);
        assert_eq!(id_path_prefix("/topic//x", "/topic/"), None);
        assert_eq!(id_path_prefix("/topic/1a/", "/topic/"), None);
        assert_eq!(id_path_prefix("/category/7/news/%zz", "/category/"), Some("/category/7/"));
        assert_eq!(id_path_prefix("/x/topic/1/", "/topic/"), None);
    }

    #[test]
    fn builder_rejects_unnormalized_paths() {
        let err = ErrorHandling::builder().relative_path("forum/").build().unwrap_err();
        assert_eq!(err.variant_name(), "configuration");

        let handling = ErrorHandling::builder().relative_path("/forum").build().unwrap();
        assert_eq!(handling.relative_path(), "/forum");
        assert!(handling.hooks().is_empty());
    }

    #[test]
    fn from_config_uses_the_site_section() {
        let mut config = ForumConfig::default();
        config.site = config.site.clone().with_relative_path("community/");

        let handling = ErrorHandling::from_config(&config).unwrap();
        assert_eq!(handling.relative_path(), "/community");
    }
}
