use crate::context::ErrorContext;
use forum_domain::constants::API_PREFIX;
use forum_kernel::security::escape_html;
use forum_kernel::text::{decode_uri_component, slugify};
use tracing::warn;

const MAX_PATH_PARTS: usize = 3;

/// CSS classes for the `<body>` of a rendered page, derived from the request path.
///
/// `/forum/topic/12/hello` under `/forum` becomes
/// `page-topic page-topic-12 page-topic-hello user-guest`.
#[must_use]
pub fn build_body_class(ctx: &ErrorContext, relative_path: &str) -> String {
    let path = ctx.path();
    let path = path.strip_prefix(relative_path).unwrap_or(path);
    let path = path.strip_prefix(API_PREFIX).unwrap_or(path);
    let path = path.strip_prefix('/').unwrap_or(path);
    let path = path.strip_suffix('/').unwrap_or(path);

    let mut classes: Vec<String> = Vec::with_capacity(MAX_PATH_PARTS + 1);
    for (index, part) in path.split('/').take(MAX_PATH_PARTS).enumerate() {
        let slug = match decode_uri_component(part) {
            Ok(decoded) => escape_html(&slugify(&decoded)),
            Err(err) => {
                warn!("Error decoding URI: {part} ({err})");
                String::new()
            },
        };
        let class = match classes.first() {
            Some(first) if index > 0 => format!("{first}-{slug}"),
            _ if slug.is_empty() => "page-home".to_owned(),
            _ => format!("page-{slug}"),
        };
        classes.push(class);
    }

    classes.push(if ctx.uid() > 0 { "user-loggedin" } else { "user-guest" }.to_owned());
    classes.join(" ")
}
