use config::{Config, Environment, File};
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use std::path::Path;
use tracing::info;

/// Default configuration file stem, resolved against the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "forum";
/// Prefix of environment overrides (`FORUM__SITE__RELATIVE_PATH=/forum`).
pub const ENV_PREFIX: &str = "FORUM";

/// Custom error type for config loading.
#[forum_derive::forum_error]
pub enum ConfigError {
    #[error("Config error{}: {source}", format_context(.context))]
    Config { source: config::ConfigError, context: Option<Cow<'static, str>> },
}

/// Layered configuration loader: a file plus environment overrides.
///
/// 1. **Base File**: `path` when given (must exist), otherwise `forum.{toml,yaml,json,..}`
///    in the working directory if present.
/// 2. **Environment Overrides**: variables prefixed with `FORUM__`; nested keys are
///    separated by double underscores (`FORUM__SERVER__PORT` maps to `server.port`).
///
/// Every section of the forum configuration carries serde defaults, so an empty
/// environment with no file yields a runnable configuration.
///
/// # Errors
/// Returns [`ConfigError::Config`] if an explicit file is missing, a source is
/// malformed, or the merged values do not match `T`.
///
/// # Example
/// ```rust
/// use forum_kernel::config::load_config;
/// use forum_kernel::domain::config::ForumConfig;
///
/// let cfg: ForumConfig = load_config(None::<&str>).unwrap_or_default();
/// assert!(cfg.server.port > 0);
/// ```
pub fn load_config<T>(path: Option<impl AsRef<Path>>) -> Result<T, ConfigError>
where
    T: DeserializeOwned,
{
    load_layered(path, None)
}

/// Same as [`load_config`], reading overrides from `env` instead of the process environment.
///
/// # Errors
/// See [`load_config`].
pub fn load_config_with_env<T>(
    path: Option<impl AsRef<Path>>,
    env: config::Map<String, String>,
) -> Result<T, ConfigError>
where
    T: DeserializeOwned,
{
    load_layered(path, Some(env))
}

fn load_layered<T>(
    path: Option<impl AsRef<Path>>,
    env: Option<config::Map<String, String>>,
) -> Result<T, ConfigError>
where
    T: DeserializeOwned,
{
    let file = match &path {
        Some(p) => {
            info!("Loading config from {}", p.as_ref().display());
            File::from(p.as_ref()).required(true)
        },
        None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
    };

    let config = Config::builder()
        .add_source(file)
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true)
                .convert_case(config::Case::Snake)
                .source(env),
        )
        .build()
        .context("Failed to build config")?
        .try_deserialize::<T>()
        .context("Failed to deserialize config")?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use forum_domain::config::ForumConfig;
    use serial_test::serial;
    use std::io::Write;

    #[test]
    #[serial]
    fn loads_file_and_normalizes_relative_path() -> Result<(), Box<dyn std::error::Error>> {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile()?;
        writeln!(file, "[site]\nrelative_path = \"forum/\"\ntitle = \"Test Forum\"\n")?;
        writeln!(file, "[server]\nport = 8080")?;

        let cfg: ForumConfig = load_config(Some(file.path()))?;
        assert_eq!(cfg.site.relative_path, "/forum");
        assert_eq!(cfg.site.title, "Test Forum");
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.logging.level, "info");
        Ok(())
    }

    #[test]
    #[serial]
    fn environment_overrides_file_values() -> Result<(), Box<dyn std::error::Error>> {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile()?;
        writeln!(file, "[server]\nport = 8080")?;

        let env = config::Map::from([
            ("FORUM__SERVER__PORT".to_owned(), "9090".to_owned()),
            ("FORUM__LOGGING__JSON".to_owned(), "true".to_owned()),
            ("FORUM__SITE__TITLE".to_owned(), "Env Forum".to_owned()),
        ]);
        let cfg: ForumConfig = load_config_with_env(Some(file.path()), env)?;
        assert_eq!(cfg.server.port, 9090);
        assert!(cfg.logging.json);
        assert_eq!(cfg.site.title, "Env Forum");
        Ok(())
    }

    #[test]
    #[serial]
    fn missing_explicit_file_is_an_error() {
        let err = load_config::<ForumConfig>(Some("/definitely/not/here/forum.toml"))
            .expect_err("explicit file is required");
        assert_eq!(err.variant_name(), "config");
        assert!(err.to_string().contains("Failed to build config"));
    }
}
