use std::borrow::Cow;

/// Failures raised while an error is being handled.
///
/// These never escape the middleware: they are logged and turned into a
/// plain-text `500` (see [`crate::ErrorHandling::dispatch`]).
#[forum_derive::forum_error]
pub enum ErrorHandlingError {
    #[error("Translation failed{}: {message}", format_context(.context))]
    Translation { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Page render failed{}: {message}", format_context(.context))]
    Render { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// A `filter:error.handle` listener failed.
    #[error("Hook listener failed{}: {message}", format_context(.context))]
    Hook { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("JSON error{}: {source}", format_context(.context))]
    Json { source: serde_json::Error, context: Option<Cow<'static, str>> },

    #[error("Invalid error handling configuration{}: {message}", format_context(.context))]
    Configuration { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Internal error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}
