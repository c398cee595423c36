use serde::{Deserialize, Deserializer};
use std::net::{IpAddr, Ipv4Addr};
use std::ops::{Deref, DerefMut};
use std::path::PathBuf;
use std::sync::Arc;

/// Top-level forum configuration.
#[derive(Default, Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ForumConfigInner {
    pub server: ServerConfig,
    pub site: SiteConfig,
    pub logging: LoggingConfig,
}

/// Thin Arc-wrapped config for inexpensive cloning into subsystems.
#[derive(Default, Debug, Clone, Deserialize)]
pub struct ForumConfig {
    #[serde(flatten, default)]
    inner: Arc<ForumConfigInner>,
}

impl Deref for ForumConfig {
    type Target = ForumConfigInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl DerefMut for ForumConfig {
    fn deref_mut(&mut self) -> &mut ForumConfigInner {
        Arc::make_mut(&mut self.inner)
    }
}

/// HTTP listener configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub address: IpAddr,
    pub port: u16,
}

/// Public site settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Mount prefix of the forum (`""` at the root, otherwise e.g. `/forum`).
    #[serde(deserialize_with = "deserialize_relative_path")]
    pub relative_path: String,
    pub title: String,
}

/// Logging sink settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// Directory for rolling log files; console only when absent.
    pub path: Option<PathBuf>,
    pub json: bool,
}

impl SiteConfig {
    #[must_use]
    pub fn with_relative_path(mut self, raw: &str) -> Self {
        self.relative_path = normalize_relative_path(raw);
        self
    }
}

/// Normalizes a mount prefix: leading `/`, no trailing `/`, empty for the root.
///
/// ```
/// use forum_domain::config::normalize_relative_path;
///
/// assert_eq!(normalize_relative_path("forum/"), "/forum");
/// assert_eq!(normalize_relative_path("/"), "");
/// ```
#[must_use]
pub fn normalize_relative_path(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() { String::new() } else { format!("/{trimmed}") }
}

fn deserialize_relative_path<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(normalize_relative_path(&raw))
}

// --- Default ---

impl Default for ServerConfig {
    fn default() -> Self {
        Self { address: IpAddr::V4(Ipv4Addr::UNSPECIFIED), port: 4567 }
    }
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self { relative_path: String::new(), title: "Forum".to_owned() }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_owned(), path: None, json: false }
    }
}
