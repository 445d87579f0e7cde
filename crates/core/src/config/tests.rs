use std::io::Write;
use std::time::Duration;

use crate::config::models::AppConfig;

#[test]
fn test_default_config() {
    let config = AppConfig::default();
    assert!(config.validate().is_ok());

    assert_eq!(config.database.max_connections, 10);
    assert_eq!(config.dispatcher.health_cache_ttl(), Duration::from_secs(30));
    assert_eq!(config.dispatcher.health_probe_timeout(), Duration::from_secs(5));
    assert_eq!(config.dispatcher.request_timeout(), Duration::from_secs(55));
    assert!(config.dispatcher.static_bearer_token().is_none());
    assert!(config.api.allows_any_origin());
}

#[test]
fn test_config_from_toml() {
    let toml_content = r#"
[database]
url = "postgresql://test:5432/lb_scrape_test"
max_connections = 15
min_connections = 2
connection_timeout_seconds = 30
idle_timeout_seconds = 600
max_lifetime_seconds = 300

[dispatcher]
health_cache_ttl_seconds = 10
health_probe_timeout_seconds = 2
request_timeout_seconds = 20
bearer_token = "static-secret"

[api]
bind_address = "127.0.0.1:9090"
cors_enabled = true
cors_origins = ["https://console.example.com"]

[observability]
log_level = "debug"
log_format = "json"
"#;

    let config = AppConfig::from_toml(toml_content).unwrap();
    assert_eq!(config.database.max_connections, 15);
    assert_eq!(config.dispatcher.health_cache_ttl(), Duration::from_secs(10));
    assert_eq!(
        config.dispatcher.static_bearer_token(),
        Some("static-secret")
    );
    assert_eq!(config.api.bind_address, "127.0.0.1:9090");
    assert!(!config.api.allows_any_origin());
    assert_eq!(config.observability.log_format, "json");
}

#[test]
fn test_bearer_token_is_optional_in_toml() {
    let config = AppConfig::default();
    let rendered = config.to_toml().unwrap();
    let parsed = AppConfig::from_toml(&rendered).unwrap();

    assert!(parsed.dispatcher.bearer_token.is_none());
    assert_eq!(parsed.api.bind_address, config.api.bind_address);
}

#[test]
fn test_empty_bearer_token_counts_as_unset() {
    let mut config = AppConfig::default();
    config.dispatcher.bearer_token = Some(String::new());
    assert!(config.dispatcher.static_bearer_token().is_none());
}

#[test]
fn test_invalid_configs_are_rejected() {
    let mut config = AppConfig::default();
    config.database.url = "mysql://localhost/db".to_string();
    assert!(config.validate().is_err());

    let mut config = AppConfig::default();
    config.database.min_connections = 20;
    assert!(config.validate().is_err());

    let mut config = AppConfig::default();
    config.dispatcher.request_timeout_seconds = 0;
    assert!(config.validate().is_err());

    let mut config = AppConfig::default();
    config.dispatcher.bearer_token = Some("has space".to_string());
    assert!(config.validate().is_err());

    let mut config = AppConfig::default();
    config.api.bind_address = "localhost".to_string();
    assert!(config.validate().is_err());

    let mut config = AppConfig::default();
    config.observability.log_format = "xml".to_string();
    assert!(config.validate().is_err());
}

#[test]
fn test_load_from_file_fills_missing_sections_with_defaults() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(
        file,
        r#"
[dispatcher]
health_cache_ttl_seconds = 5
health_probe_timeout_seconds = 1
request_timeout_seconds = 10
"#
    )
    .unwrap();

    let config = AppConfig::load(Some(file.path().to_str().unwrap())).unwrap();
    assert_eq!(config.dispatcher.health_cache_ttl_seconds, 5);
    assert_eq!(config.database.max_connections, 10);
    assert_eq!(config.api.bind_address, "0.0.0.0:8080");
}

#[test]
fn test_load_missing_file_fails() {
    let result = AppConfig::load(Some("/nonexistent/balancer.toml"));
    assert!(result.is_err());
}
