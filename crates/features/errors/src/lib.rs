//! # Error handling
//!
//! Centralized error handling for forum requests. Route handlers return
//! `Result<_, RouteError>`; [`error_middleware`] picks the error up and runs it
//! through two stages:
//!
//! 1. [`ErrorHandling::handle_uri_errors`] recovers malformed topic/category URLs
//!    by redirecting, or answers `400`. Other errors continue.
//! 2. [`ErrorHandling::handle_errors`] looks the error code up in the per-request
//!    [`ErrorCases`] table (built-ins plus whatever `filter:error.handle` listeners
//!    add) and falls back to the [`DefaultHandler`].
//!
//! A failure while handling an error degrades to a plain-text `500`.
//!
//! ## Example
//! ```rust,ignore
//! use axum::{Router, routing::get};
//! use forum_errors::{ErrorHandling, RouteError};
//!
//! async fn topic() -> Result<&'static str, RouteError> {
//!     Err(RouteError::new("[[error:no-topic]]"))
//! }
//!
//! let errors = ErrorHandling::builder().relative_path("/forum").build()?;
//! let app = errors.apply(Router::new().route("/forum/topic/{tid}", get(topic)));
//! ```

mod api;
mod body_class;
mod cases;
mod context;
mod error;
mod handler;
mod hooks;
mod middleware;
mod render;
mod route_error;
mod translate;

pub use api::{ApiEnvelope, ApiStatus, format_api_error, status_code_name};
pub use body_class::build_body_class;
pub use cases::{BadCsrfToken, BlacklistedIp, ErrorCase, ErrorCases, FnCase, case_fn};
pub use context::{ApiClient, ErrorContext, ViewerId};
pub use error::{ErrorHandlingError, ErrorHandlingErrorExt};
pub use handler::{DefaultHandler, ErrorHandling, ErrorHandlingBuilder};
pub use hooks::{ErrorCasesFilter, HookRegistry};
pub use middleware::{decode_path, error_middleware};
pub use render::{BasicPageRenderer, PageRenderer, TemplateData};
pub use route_error::{RouteError, RouteErrorKind, URI_MALFORMED};
pub use translate::{Catalog, Translator};
