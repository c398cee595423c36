use crate::error::{ErrorHandlingError, ErrorHandlingErrorExt};
use async_trait::async_trait;
use fxhash::FxHashMap;

/// Resolves `[[namespace:key, arg1, ...]]` tokens into user-facing text.
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str) -> Result<String, ErrorHandlingError>;
}

/// In-memory language catalog.
///
/// Tokens whose namespace or key is unknown are left in place, so the raw key
/// stays visible instead of an empty string.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    namespaces: FxHashMap<String, FxHashMap<String, String>>,
}

const DEFAULT_ENTRIES: &[(&str, &str, &str)] = &[
    ("global", "400.title", "Bad Request."),
    (
        "global",
        "400.message",
        "It looks like this link is malformed, please double-check and try again.",
    ),
    ("global", "500.title", "Internal Error."),
    ("global", "500.message", "Oops! Looks like something went wrong!"),
    ("error", "api.400", "Something was wrong with the request payload you passed in."),
    ("error", "api.401", "A valid login session was not found. Please log in and try again."),
    ("error", "api.403", "You are not authorised to make this call"),
    ("error", "api.404", "Invalid API call"),
    (
        "error",
        "api.426",
        "HTTPS is required for requests to the write api, please re-send your request via HTTPS",
    ),
    ("error", "api.429", "You have made too many requests, please try again later"),
    ("error", "api.500", "An unexpected error was encountered while attempting to service your request."),
    ("error", "api.501", "The route you are trying to call is not implemented yet, please try again tomorrow"),
    (
        "error",
        "api.503",
        "The route you are trying to call is not currently available due to a server configuration",
    ),
    ("error", "invalid-data", "Invalid Data"),
    ("error", "not-logged-in", "You don't seem to be logged in."),
    ("error", "no-privileges", "You do not have enough privileges for this action."),
    ("error", "no-topic", "Topic does not exist"),
    ("error", "no-category", "Category does not exist"),
    ("error", "no-user", "User does not exist"),
];

impl Catalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog seeded with every key the error handlers emit.
    #[must_use]
    pub fn with_defaults() -> Self {
        DEFAULT_ENTRIES
            .iter()
            .fold(Self::new(), |catalog, (namespace, key, value)| catalog.with(namespace, key, value))
    }

    #[must_use]
    pub fn with(mut self, namespace: &str, key: &str, value: &str) -> Self {
        self.insert(namespace, key, value);
        self
    }

    pub fn insert(&mut self, namespace: &str, key: &str, value: &str) {
        self.namespaces
            .entry(namespace.to_owned())
            .or_default()
            .insert(key.to_owned(), value.to_owned());
    }

    /// Merges a flat JSON object (`{"key": "text", ...}`) into `namespace`.
    ///
    /// # Errors
    /// Returns [`ErrorHandlingError::Json`] when `json` is not an object of strings.
    pub fn load_json(&mut self, namespace: &str, json: &str) -> Result<usize, ErrorHandlingError> {
        let entries: FxHashMap<String, String> =
            serde_json::from_str(json).context(format!("Language file for '{namespace}'"))?;
        let count = entries.len();
        self.namespaces.entry(namespace.to_owned()).or_default().extend(entries);
        Ok(count)
    }

    #[must_use]
    pub fn lookup(&self, namespace: &str, key: &str) -> Option<&str> {
        self.namespaces.get(namespace)?.get(key).map(String::as_str)
    }

    /// Replaces every known token in `text`; `%1`, `%2`, ... take the token arguments.
    #[must_use]
    pub fn resolve(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut rest = text;

        while let Some(start) = rest.find("[[") {
            let Some(len) = rest[start + 2..].find("]]") else {
                break;
            };
            let token = &rest[start..start + 2 + len + 2];
            out.push_str(&rest[..start]);
            match self.resolve_token(&token[2..token.len() - 2]) {
                Some(resolved) => out.push_str(&resolved),
                None => out.push_str(token),
            }
            rest = &rest[start + token.len()..];
        }

        out.push_str(rest);
        out
    }

    fn resolve_token(&self, inner: &str) -> Option<String> {
        let (namespace, rest) = inner.split_once(':')?;
        let mut parts = rest.split(',').map(str::trim);
        let key = parts.next().filter(|key| !key.is_empty())?;
        let template = self.lookup(namespace.trim(), key)?;

        let args: Vec<&str> = parts.collect();
        // Highest index first, so `%1` never eats the prefix of `%10`.
        let resolved = args.iter().enumerate().rev().fold(template.to_owned(), |acc, (i, arg)| {
            acc.replace(&format!("%{}", i + 1), arg)
        });
        Some(resolved)
    }
}

#[async_trait]
impl Translator for Catalog {
    async fn translate(&self, text: &str) -> Result<String, ErrorHandlingError> {
        Ok(self.resolve(text))
    }
}
