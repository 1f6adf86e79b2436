// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Configuration Integration Tests
//!
//! Loading configuration files from disk and the environment.
//!
//! ## Test Categories
//!
//! - `test_load_*`: File formats and defaults
//! - `test_env_*`: Environment overrides and placeholders
//! - `test_validation_*`: Rejected configurations

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use warden_config::{
    ConfigError, ConfigFormat, ConfigLoader, Environment, JwtAlgorithm, LogFormat, LogLevel,
    WardenConfig,
};
use warden_tests::prelude::*;

// =============================================================================
// Test Helpers
// =============================================================================

fn write(dir: &tempfile::TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).expect("write config file");
    path
}

/// A loader that sees only `vars`, never the process environment.
fn loader(vars: &[(&str, &str)]) -> ConfigLoader {
    let env: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    ConfigLoader::new().with_env(env)
}

// =============================================================================
// Load Tests
// =============================================================================

#[test]
fn test_load_minimal_yaml_uses_defaults() {
    let dir = temp_test_dir("warden-config");
    let path = write(&dir, "warden.yaml", &ConfigDocuments::minimal_yaml());

    let config = loader(&[]).load(&path).unwrap();

    assert_eq!(config.environment, Environment::Development);
    assert_eq!(config.server.port, 9999);
    assert_eq!(config.security.jwt.access_ttl_secs, 4 * 60 * 60);
    assert_eq!(config.security.jwt.refresh_ttl_secs, 7 * 24 * 60 * 60);
    assert_eq!(config.security.jwt.algorithm, JwtAlgorithm::HS256);
    assert_eq!(config.security.rate_limit.login.capacity, 5);
    assert_eq!(config.security.rate_limit.refresh.capacity, 10);
    assert!(config.rate_limit_enabled());
    assert!(config.seed.enabled);
    assert!(!config.expose_error_detail());
}

#[test]
fn test_load_full_yaml() {
    let dir = temp_test_dir("warden-config");
    let path = write(&dir, "warden.yml", &ConfigDocuments::full_yaml());

    let config = loader(&[]).load(&path).unwrap();

    assert!(config.environment.is_production());
    assert_eq!(config.server.socket_addr().to_string(), "127.0.0.1:8443");
    assert_eq!(config.server.request_timeout().as_secs(), 15);
    assert_eq!(config.server.max_body_size, 65536);
    assert_eq!(config.security.jwt.algorithm, JwtAlgorithm::HS512);
    assert_eq!(config.security.jwt.access_ttl().as_secs(), 900);
    assert_eq!(config.security.jwt.leeway_secs, 5);
    assert_eq!(config.security.rate_limit.login.capacity, 3);
    assert_eq!(config.security.rate_limit.login.window_secs, 30);
    assert!(config.security.rate_limit.trust_forwarded_for);
    assert_eq!(
        config.security.cors.allowed_origins,
        vec!["https://admin.example.com".to_string()]
    );
    assert_eq!(config.security.audit.exclude_paths, vec!["/health".to_string()]);
    assert_eq!(config.logging.level, LogLevel::Warn);
    assert_eq!(config.logging.format, LogFormat::Json);
    assert!(!config.seed.enabled);
}

#[test]
fn test_load_toml_and_json() {
    let dir = temp_test_dir("warden-config");

    let toml_path = write(&dir, "warden.toml", &ConfigDocuments::minimal_toml());
    let config = loader(&[]).load(&toml_path).unwrap();
    assert_eq!(config.environment, Environment::Testing);
    assert_eq!(config.server.port, 7000);
    assert_eq!(config.security.jwt.access_ttl_secs, 600);
    assert!(!config.rate_limit_enabled());

    let json_path = write(&dir, "warden.json", &ConfigDocuments::minimal_json());
    let config = loader(&[]).load(&json_path).unwrap();
    assert_eq!(config.server.port, 7001);
    assert_eq!(config.logging.level, LogLevel::Debug);
    assert_eq!(config.logging.format, LogFormat::Compact);
}

#[test]
fn test_load_from_str() {
    let config = loader(&[])
        .load_from_str(&ConfigDocuments::minimal_json(), ConfigFormat::Json)
        .unwrap();
    assert_eq!(config.server.port, 7001);
}

#[test]
fn test_load_missing_file() {
    let dir = temp_test_dir("warden-config");
    let err = loader(&[])
        .load(dir.path().join("absent.yaml"))
        .unwrap_err();
    assert!(err.is_io_error());
}

#[test]
fn test_load_unsupported_extension() {
    let dir = temp_test_dir("warden-config");
    let path = write(&dir, "warden.ini", "port = 1");
    assert!(matches!(
        loader(&[]).load(&path),
        Err(ConfigError::UnsupportedFormat { .. })
    ));
}

#[test]
fn test_load_parse_error_names_file() {
    let dir = temp_test_dir("warden-config");
    let path = write(&dir, "broken.yaml", "server: [unclosed");

    match loader(&[]).load(&path) {
        Err(ConfigError::Parse { path: reported, .. }) => assert_eq!(reported, path),
        other => panic!("expected parse error, got {other:?}"),
    }
}

#[test]
fn test_load_unknown_field_rejected() {
    let dir = temp_test_dir("warden-config");
    let content = format!("{}\nunexpected_section: true\n", ConfigDocuments::minimal_yaml());
    let path = write(&dir, "warden.yaml", &content);

    assert!(loader(&[]).load(&path).is_err());
}

#[test]
fn test_load_optional_without_file() {
    let config = loader(&[("WARDEN_SECRET_KEY", TEST_SECRET)])
        .load_optional(None)
        .unwrap();
    assert_eq!(config.server.port, 9999);
    assert_eq!(
        config
            .security
            .jwt
            .secret_key
            .as_ref()
            .map(|s| s.expose().to_string()),
        Some(TEST_SECRET.to_string())
    );
}

// =============================================================================
// Environment Tests
// =============================================================================

#[test]
fn test_env_overrides_file_values() {
    let dir = temp_test_dir("warden-config");
    let path = write(&dir, "warden.yaml", &ConfigDocuments::minimal_yaml());

    let config = loader(&[
        ("WARDEN_ENVIRONMENT", "test"),
        ("WARDEN_SERVER_PORT", "8181"),
        ("WARDEN_ACCESS_TTL_SECS", "60"),
        ("WARDEN_RATE_LIMIT_ENABLED", "true"),
        ("WARDEN_CORS_ORIGINS", "https://a.example.com, https://b.example.com"),
        ("WARDEN_LOG_LEVEL", "trace"),
        ("WARDEN_ADMIN_PASSWORD", "s3cret-pass"),
    ])
    .load(&path)
    .unwrap();

    assert_eq!(config.environment, Environment::Testing);
    assert_eq!(config.server.port, 8181);
    assert_eq!(config.security.jwt.access_ttl_secs, 60);
    assert!(config.rate_limit_enabled());
    assert_eq!(
        config.security.cors.allowed_origins,
        vec![
            "https://a.example.com".to_string(),
            "https://b.example.com".to_string()
        ]
    );
    assert_eq!(config.logging.level, LogLevel::Trace);
    assert_eq!(config.seed.admin_password.expose(), "s3cret-pass");
}

#[test]
fn test_env_invalid_value_rejected() {
    let err = loader(&[
        ("WARDEN_SECRET_KEY", TEST_SECRET),
        ("WARDEN_SERVER_PORT", "eighty"),
    ])
    .load_optional(None)
    .unwrap_err();

    match err {
        ConfigError::InvalidEnvVar { name, .. } => assert_eq!(name, "WARDEN_SERVER_PORT"),
        other => panic!("expected InvalidEnvVar, got {other:?}"),
    }
}

#[test]
fn test_env_placeholders_resolved() {
    let dir = temp_test_dir("warden-config");
    let path = write(&dir, "warden.yaml", ConfigDocuments::placeholder_yaml());

    let config = loader(&[("WARDEN_TEST_SECRET", TEST_SECRET)])
        .load(&path)
        .unwrap();
    assert_eq!(config.server.port, 9100);

    let config = loader(&[
        ("WARDEN_TEST_SECRET", TEST_SECRET),
        ("WARDEN_TEST_PORT", "9200"),
    ])
    .load(&path)
    .unwrap();
    assert_eq!(config.server.port, 9200);
}

#[test]
fn test_env_unresolved_placeholder_fails_validation() {
    let dir = temp_test_dir("warden-config");
    let path = write(&dir, "warden.yaml", ConfigDocuments::placeholder_yaml());

    // The literal placeholder is shorter than the minimum secret length.
    let err = loader(&[]).load(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Validation { .. }));
}

// =============================================================================
// Validation Tests
// =============================================================================

#[test]
fn test_validation_missing_secret() {
    let err = loader(&[]).load_optional(None).unwrap_err();
    assert!(matches!(err, ConfigError::MissingField { .. }));
    assert!(err.is_secret_error());
}

#[test]
fn test_validation_short_secret() {
    let err = loader(&[("WARDEN_SECRET_KEY", "too-short")])
        .load_optional(None)
        .unwrap_err();
    assert!(matches!(err, ConfigError::Validation { .. }));
}

#[test]
fn test_validation_refresh_must_outlive_access() {
    let err = loader(&[
        ("WARDEN_SECRET_KEY", TEST_SECRET),
        ("WARDEN_ACCESS_TTL_SECS", "3600"),
        ("WARDEN_REFRESH_TTL_SECS", "600"),
    ])
    .load_optional(None)
    .unwrap_err();
    assert!(matches!(err, ConfigError::Validation { .. }));
}

#[test]
fn test_validation_production_rejects_debug_and_localhost() {
    let debug = loader(&[
        ("WARDEN_SECRET_KEY", TEST_SECRET),
        ("WARDEN_ENVIRONMENT", "production"),
        ("WARDEN_DEBUG", "true"),
    ])
    .load_optional(None);
    assert!(debug.is_err());

    let localhost = loader(&[
        ("WARDEN_SECRET_KEY", TEST_SECRET),
        ("WARDEN_ENVIRONMENT", "production"),
        ("WARDEN_CORS_ORIGINS", "http://localhost:3000"),
    ])
    .load_optional(None);
    assert!(localhost.is_err());

    let fine = loader(&[
        ("WARDEN_SECRET_KEY", TEST_SECRET),
        ("WARDEN_ENVIRONMENT", "production"),
        ("WARDEN_CORS_ORIGINS", "https://admin.example.com"),
    ])
    .load_optional(None);
    assert!(fine.is_ok());
}

#[test]
fn test_validation_deferred_for_overrides() {
    let mut config = loader(&[])
        .with_validation(false)
        .load_optional(None)
        .unwrap();
    assert!(config.validate().is_err());

    config.security.jwt.secret_key = Some(warden_config::SecretValue::new(TEST_SECRET));
    config.validate().unwrap();
}

#[test]
fn test_validation_secret_never_printed() {
    let config = loader(&[("WARDEN_SECRET_KEY", TEST_SECRET)])
        .load_optional(None)
        .unwrap();

    let debug = format!("{config:?}");
    let json = serde_json::to_string(&config).unwrap();
    assert!(!debug.contains(TEST_SECRET));
    assert!(!json.contains(TEST_SECRET));
    assert!(!json.contains(ADMIN_PASSWORD));
}

#[test]
fn test_validation_default_config_is_not_loadable() {
    // Defaults alone lack a signing secret.
    assert!(WardenConfig::default().validate().is_err());
}
