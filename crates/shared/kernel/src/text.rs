//! Helpers for turning untrusted path text into something safe to reason about.

use std::borrow::Cow;

#[forum_derive::forum_error]
pub enum TextError {
    #[error("URI malformed{}: {message}", format_context(.context))]
    MalformedUri { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

/// Strict percent-decoding of a URI component.
///
/// Every `%` must be followed by two hex digits and the decoded bytes must be UTF-8.
/// A `+` is kept as-is (path semantics, not form semantics).
///
/// # Errors
/// Returns [`TextError::MalformedUri`] for a dangling or non-hex escape and for
/// escapes that decode to invalid UTF-8.
pub fn decode_uri_component(input: &str) -> Result<Cow<'_, str>, TextError> {
    if !input.contains('%') {
        return Ok(Cow::Borrowed(input));
    }

    let bytes = input.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let pair = bytes.get(i + 1..i + 3).and_then(|pair| Some((hex(pair[0])?, hex(pair[1])?)));
            let Some((hi, lo)) = pair else {
                return Err(TextError::MalformedUri {
                    message: format!("invalid escape at byte {i}").into(),
                    context: None,
                });
            };
            decoded.push((hi << 4) | lo);
            i += 3;
        } else {
            decoded.push(bytes[i]);
            i += 1;
        }
    }

    String::from_utf8(decoded).map(Cow::Owned).map_err(|e| TextError::MalformedUri {
        message: e.to_string().into(),
        context: Some("escape sequence is not UTF-8".into()),
    })
}

const fn hex(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}

/// Lowercase, URL-friendly form of `input`: runs of anything that is not a letter or
/// digit collapse into a single `-`, with no leading or trailing dash.
///
/// ```
/// use forum_kernel::text::slugify;
///
/// assert_eq!(slugify("Hello, World!"), "hello-world");
/// assert_eq!(slugify("Ünïcode Ok"), "ünïcode-ok");
/// ```
#[must_use]
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_dash = false;
    for ch in input.chars() {
        if ch.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.extend(ch.to_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_valid_escapes() {
        assert_eq!(decode_uri_component("/topic/1/caf%C3%A9").unwrap(), "/topic/1/café");
        assert_eq!(decode_uri_component("a%2Fb+c").unwrap(), "a/b+c");
        assert!(matches!(decode_uri_component("/plain/path").unwrap(), Cow::Borrowed(_)));
    }

    #[test]
    fn rejects_malformed_escapes() {
        for bad in ["/topic/1/%", "/topic/1/%E", "/x/%zz", "/topic/1/%E0%A4%A"] {
            let err = decode_uri_component(bad).expect_err(bad);
            assert_eq!(err.variant_name(), "malformed_uri");
        }
    }

    #[test]
    fn rejects_invalid_utf8() {
        let err = decode_uri_component("/category/2/%C3%28").expect_err("invalid utf-8");
        assert!(err.to_string().starts_with("URI malformed (escape sequence is not UTF-8)"));
    }

    #[test]
    fn slugs_collapse_separators() {
        assert_eq!(slugify("  General   Discussion  "), "general-discussion");
        assert_eq!(slugify("---"), "");
        assert_eq!(slugify("42"), "42");
    }
}
