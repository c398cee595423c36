use forum_domain::config::{ForumConfig, LoggingConfig, ServerConfig, SiteConfig};
use serde_json::json;

#[test]
fn config_defaults_are_sane() {
    let server = ServerConfig::default();
    assert_eq!(server.port, 4567);

    let site = SiteConfig::default();
    assert_eq!(site.relative_path, "");
    assert_eq!(site.title, "Forum");

    let logging = LoggingConfig::default();
    assert_eq!(logging.level, "info");
    assert!(logging.path.is_none());
    assert!(!logging.json);
}

#[test]
fn forum_config_deserializes_and_normalizes_relative_path() {
    let raw = json!({
        "server": { "address": "::", "port": 8080 },
        "site": { "relative_path": "community/", "title": "Community" },
        "logging": { "level": "debug", "path": "/var/log/forum", "json": true }
    });

    let cfg: ForumConfig = serde_json::from_value(raw).expect("config deserialize");
    assert_eq!(cfg.server.port, 8080);
    assert_eq!(cfg.site.relative_path, "/community");
    assert_eq!(cfg.site.title, "Community");
    assert_eq!(cfg.logging.path.as_deref(), Some(std::path::Path::new("/var/log/forum")));
    assert!(cfg.logging.json);
}

#[test]
fn missing_sections_fall_back_to_defaults() {
    let cfg: ForumConfig = serde_json::from_value(json!({ "site": { "relative_path": "/" } }))
        .expect("config deserialize");
    assert_eq!(cfg.site.relative_path, "");
    assert_eq!(cfg.site.title, "Forum");
    assert_eq!(cfg.server.port, 4567);
}

#[test]
fn config_is_mutable_through_deref() {
    let mut cfg = ForumConfig::default();
    let shared = cfg.clone();
    cfg.site = cfg.site.clone().with_relative_path("/forum/");

    assert_eq!(cfg.site.relative_path, "/forum");
    assert_eq!(shared.site.relative_path, "", "clones keep their own snapshot");
}
