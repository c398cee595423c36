use forum_derive::forum_error;
use std::borrow::Cow;

#[forum_error]
pub enum DemoError {
    #[error("IO error{}: {source}", format_context(.context))]
    Io {
        #[source]
        source: std::io::Error,
        context: Option<Cow<'static, str>>,
    },

    #[error("Template missing{}: {message}", format_context(.context))]
    TemplateMissing { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Internal error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

fn read() -> Result<(), DemoError> {
    let res: Result<(), std::io::Error> = Err(std::io::Error::other("disk"));
    res.context("Reading template")?;
    Ok(())
}

fn main() {
    let err = read().unwrap_err();
    assert_eq!(err.variant_name(), "io");
    assert_eq!(err.to_string(), "IO error (Reading template): disk");

    let err: DemoError = "boom".into();
    assert_eq!(err.variant_name(), "internal");

    let err = DemoError::TemplateMissing { message: "500".into(), context: None };
    assert_eq!(err.variant_name(), "template_missing");
}
