use crate::context::ErrorContext;
use crate::error::ErrorHandlingError;
use crate::translate::Translator;
use async_trait::async_trait;
use forum_kernel::security::escape_html;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

/// Template variables.
pub type TemplateData = Map<String, Value>;

/// Page rendering seam: header build plus template render.
#[async_trait]
pub trait PageRenderer: Send + Sync {
    /// Per-request header locals (site title, navigation, viewer).
    async fn build_header(&self, ctx: &ErrorContext) -> Result<TemplateData, ErrorHandlingError>;

    /// Renders `template` with `data`; `header` comes from [`Self::build_header`].
    async fn render(
        &self,
        template: &str,
        header: &TemplateData,
        data: &Value,
    ) -> Result<String, ErrorHandlingError>;

    async fn render_page(
        &self,
        ctx: &ErrorContext,
        template: &str,
        data: &Value,
    ) -> Result<String, ErrorHandlingError> {
        let header = self.build_header(ctx).await?;
        self.render(template, &header, data).await
    }
}

/// Minimal HTML renderer used when no template engine is plugged in.
///
/// Values in `data` are written as given: callers escape untrusted text.
#[derive(Clone)]
pub struct BasicPageRenderer {
    site_title: String,
    relative_path: String,
    translator: Arc<dyn Translator>,
}

impl fmt::Debug for BasicPageRenderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicPageRenderer")
            .field("site_title", &self.site_title)
            .field("relative_path", &self.relative_path)
            .finish_non_exhaustive()
    }
}

impl BasicPageRenderer {
    pub fn new(
        site_title: impl Into<String>,
        relative_path: impl Into<String>,
        translator: Arc<dyn Translator>,
    ) -> Self {
        Self { site_title: site_title.into(), relative_path: relative_path.into(), translator }
    }
}

fn text<'a>(data: &'a Value, key: &str) -> &'a str {
    data.get(key).and_then(Value::as_str).unwrap_or_default()
}

#[async_trait]
impl PageRenderer for BasicPageRenderer {
    async fn build_header(&self, ctx: &ErrorContext) -> Result<TemplateData, ErrorHandlingError> {
        let mut header = TemplateData::new();
        header.insert("title".to_owned(), Value::from(self.site_title.as_str()));
        header.insert("relative_path".to_owned(), Value::from(self.relative_path.as_str()));
        header.insert("loggedIn".to_owned(), Value::from(ctx.uid() > 0));
        Ok(header)
    }

    async fn render(
        &self,
        template: &str,
        header: &TemplateData,
        data: &Value,
    ) -> Result<String, ErrorHandlingError> {
        if !data.is_object() {
            return Err(ErrorHandlingError::Render {
                message: format!("data for template '{template}' must be an object").into(),
                context: None,
            });
        }

        let token = format!("[[global:{template}.title]]");
        let translated = self.translator.translate(&token).await?;
        let heading = if translated == token { template.to_owned() } else { translated };
        let heading = escape_html(&heading);

        let site = header.get("title").and_then(Value::as_str).unwrap_or(&self.site_title);
        let home = header.get("relative_path").and_then(Value::as_str).unwrap_or(&self.relative_path);

        let site = escape_html(site);
        let body_class = text(data, "bodyClass");
        let template = escape_html(template);
        let error = match text(data, "error") {
            "" => String::new(),
            error => format!("<p class=\"error\">{error}</p>\n"),
        };
        let path = match text(data, "path") {
            "" => String::new(),
            path => format!("<p class=\"path\"><code>{path}</code></p>\n"),
        };

        let html = format!(
            "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
             <title>{heading} | {site}</title>\n</head>\n<body class=\"{body_class}\">\n\
             <main id=\"content\" data-template=\"{template}\">\n<h1>{heading}</h1>\n\
             {error}{path}<a href=\"{home}/\">Home</a>\n</main>\n</body>\n</html>\n"
        );

        Ok(html)
    }
}
