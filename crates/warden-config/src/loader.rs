// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Configuration loading for Warden.
//!
//! # Loading Pipeline
//!
//! 1. Read the file (optional: defaults are used without one)
//! 2. Resolve `${VAR}` / `${VAR:default}` placeholders in the raw text
//! 3. Parse YAML/TOML/JSON by extension
//! 4. Apply `WARDEN_*` environment overrides
//! 5. Validate
//!
//! # Environment Variable Override
//!
//! ```text
//! WARDEN_SECRET_KEY=...32+ bytes...
//! WARDEN_SERVER_PORT=8080
//! WARDEN_ENVIRONMENT=production
//! WARDEN_CORS_ORIGINS=https://a.example.com,https://b.example.com
//! ```

use crate::error::{ConfigError, ConfigResult};
use crate::schema::{Environment, LogFormat, LogLevel, SecretValue, WardenConfig};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Default environment variable prefix.
pub const ENV_PREFIX: &str = "WARDEN";

type EnvLookup = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

// =============================================================================
// ConfigLoader
// =============================================================================

/// Configuration loader for Warden.
///
/// Environment lookups go through an injectable function so tests can run
/// without touching the process environment.
///
/// # Examples
///
/// ```no_run
/// use warden_config::loader::ConfigLoader;
///
/// let config = ConfigLoader::new().load("warden.yaml").unwrap();
/// ```
#[derive(Clone)]
pub struct ConfigLoader {
    env_prefix: String,
    env: EnvLookup,
    resolve_env_vars: bool,
    validate: bool,
}

impl ConfigLoader {
    /// Creates a loader reading the process environment.
    pub fn new() -> Self {
        Self {
            env_prefix: ENV_PREFIX.to_string(),
            env: Arc::new(|name| std::env::var(name).ok()),
            resolve_env_vars: true,
            validate: true,
        }
    }

    /// Replaces the environment with a fixed map.
    pub fn with_env(mut self, vars: HashMap<String, String>) -> Self {
        self.env = Arc::new(move |name| vars.get(name).cloned());
        self
    }

    /// Replaces the environment lookup function.
    pub fn with_env_lookup<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        self.env = Arc::new(lookup);
        self
    }

    /// Sets the environment variable prefix.
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Enables or disables placeholder substitution and overrides.
    pub fn with_env_vars(mut self, enabled: bool) -> Self {
        self.resolve_env_vars = enabled;
        self
    }

    /// Enables or disables the final validation step.
    ///
    /// Callers that apply further overrides (CLI flags) disable it here and
    /// call [`WardenConfig::validate`] themselves.
    pub fn with_validation(mut self, enabled: bool) -> Self {
        self.validate = enabled;
        self
    }

    /// Loads configuration from a file.
    ///
    /// The format follows the extension: `.yaml`/`.yml`, `.toml` or `.json`.
    pub fn load(&self, path: impl AsRef<Path>) -> ConfigResult<WardenConfig> {
        let path = path.as_ref();
        info!(path = %path.display(), "Loading configuration");

        let content = self.read_file(path)?;
        let format = ConfigFormat::from_path(path)?;
        let config = self.parse_content(&content, format).map_err(|e| match e {
            ConfigError::Serialization { message } => ConfigError::parse(path, message),
            other => other,
        })?;

        self.finish(config)
    }

    /// Loads from `path` when given, otherwise from defaults plus the
    /// environment.
    pub fn load_optional(&self, path: Option<&Path>) -> ConfigResult<WardenConfig> {
        match path {
            Some(path) => self.load(path),
            None => {
                debug!("No configuration file given, using defaults");
                self.finish(WardenConfig::default())
            }
        }
    }

    /// Loads configuration from a string.
    pub fn load_from_str(&self, content: &str, format: ConfigFormat) -> ConfigResult<WardenConfig> {
        let config = self.parse_content(content, format)?;
        self.finish(config)
    }

    fn finish(&self, mut config: WardenConfig) -> ConfigResult<WardenConfig> {
        if self.resolve_env_vars {
            self.apply_env_overrides(&mut config)?;
        }
        if self.validate {
            config.validate()?;
        }
        debug!(
            environment = %config.environment,
            port = config.server.port,
            "Configuration ready"
        );
        Ok(config)
    }

    fn read_file(&self, path: &Path) -> ConfigResult<String> {
        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }
        fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))
    }

    fn parse_content(&self, content: &str, format: ConfigFormat) -> ConfigResult<WardenConfig> {
        let content = if self.resolve_env_vars {
            self.resolve_env_placeholders(content)
        } else {
            content.to_string()
        };

        match format {
            ConfigFormat::Yaml => {
                // An empty YAML document is null, not an empty mapping.
                if content.trim().is_empty() {
                    return Ok(WardenConfig::default());
                }
                serde_yaml::from_str(&content).map_err(|e| ConfigError::serialization(e.to_string()))
            }
            ConfigFormat::Toml => {
                toml::from_str(&content).map_err(|e| ConfigError::serialization(e.to_string()))
            }
            ConfigFormat::Json => serde_json::from_str(&content)
                .map_err(|e| ConfigError::serialization(e.to_string())),
        }
    }

    /// Resolves `${VAR_NAME}` and `${VAR_NAME:default}` placeholders.
    ///
    /// An unset variable without a default is left in place.
    fn resolve_env_placeholders(&self, content: &str) -> String {
        let mut result = String::with_capacity(content.len());
        let mut chars = content.chars().peekable();

        while let Some(c) = chars.next() {
            if c != '$' || chars.peek() != Some(&'{') {
                result.push(c);
                continue;
            }
            chars.next();

            let mut var_content = String::new();
            let mut found_close = false;
            for c in chars.by_ref() {
                if c == '}' {
                    found_close = true;
                    break;
                }
                var_content.push(c);
            }

            if !found_close {
                result.push_str("${");
                result.push_str(&var_content);
                continue;
            }

            let (name, default) = match var_content.split_once(':') {
                Some((name, default)) => (name, Some(default)),
                None => (var_content.as_str(), None),
            };

            match ((self.env)(name), default) {
                (Some(value), _) => result.push_str(&value),
                (None, Some(default)) => result.push_str(default),
                (None, None) => {
                    warn!(variable = name, "Environment variable not found");
                    result.push_str("${");
                    result.push_str(name);
                    result.push('}');
                }
            }
        }

        result
    }

    fn var(&self, suffix: &str) -> Option<(String, String)> {
        let name = format!("{}_{}", self.env_prefix, suffix);
        (self.env)(&name).map(|value| (name, value))
    }

    fn parsed<T: FromStr>(&self, suffix: &str, expected: &str) -> ConfigResult<Option<T>> {
        match self.var(suffix) {
            Some((name, value)) => value
                .trim()
                .parse()
                .map(Some)
                .map_err(|_| ConfigError::invalid_env_var(name, format!("expected {expected}"))),
            None => Ok(None),
        }
    }

    fn apply_env_overrides(&self, config: &mut WardenConfig) -> ConfigResult<()> {
        if let Some((name, value)) = self.var("ENVIRONMENT") {
            config.environment = Environment::from_str(&value)
                .map_err(|e| ConfigError::invalid_env_var(name, e.to_string()))?;
        }

        // Server
        if let Some(host) = self.parsed("SERVER_HOST", "an IP address")? {
            config.server.host = host;
        }
        if let Some(port) = self.parsed("SERVER_PORT", "a valid port number")? {
            config.server.port = port;
        }
        if let Some((_, value)) = self.var("DEBUG") {
            config.server.debug = parse_bool(&value);
        }

        // Tokens
        if let Some((_, value)) = self.var("SECRET_KEY") {
            config.security.jwt.secret_key = Some(SecretValue::new(value));
        }
        if let Some(ttl) = self.parsed("ACCESS_TTL_SECS", "a number of seconds")? {
            config.security.jwt.access_ttl_secs = ttl;
        }
        if let Some(ttl) = self.parsed("REFRESH_TTL_SECS", "a number of seconds")? {
            config.security.jwt.refresh_ttl_secs = ttl;
        }

        if let Some((_, value)) = self.var("RATE_LIMIT_ENABLED") {
            config.security.rate_limit.enabled = Some(parse_bool(&value));
        }
        if let Some((_, value)) = self.var("CORS_ORIGINS") {
            config.security.cors.allowed_origins = value
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(String::from)
                .collect();
        }

        // Logging
        if let Some((name, value)) = self.var("LOG_LEVEL") {
            config.logging.level = LogLevel::from_str(&value)
                .map_err(|e| ConfigError::invalid_env_var(name, e.to_string()))?;
        }
        if let Some((name, value)) = self.var("LOG_FORMAT") {
            config.logging.format = LogFormat::from_str(&value)
                .map_err(|e| ConfigError::invalid_env_var(name, e.to_string()))?;
        }

        if let Some((_, value)) = self.var("ADMIN_PASSWORD") {
            config.seed.admin_password = SecretValue::new(value);
        }

        Ok(())
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ConfigLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigLoader")
            .field("env_prefix", &self.env_prefix)
            .field("resolve_env_vars", &self.resolve_env_vars)
            .field("validate", &self.validate)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// ConfigFormat
// =============================================================================

/// Supported configuration file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// YAML format.
    Yaml,
    /// TOML format.
    Toml,
    /// JSON format.
    Json,
}

impl ConfigFormat {
    /// Determines the format from a file path.
    pub fn from_path(path: &Path) -> ConfigResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());

        match ext.as_deref() {
            Some("yaml") | Some("yml") => Ok(ConfigFormat::Yaml),
            Some("toml") => Ok(ConfigFormat::Toml),
            Some("json") => Ok(ConfigFormat::Json),
            Some(other) => Err(ConfigError::unsupported_format(other)),
            None => Err(ConfigError::unsupported_format("(no extension)")),
        }
    }

    /// Returns the file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            ConfigFormat::Yaml => "yaml",
            ConfigFormat::Toml => "toml",
            ConfigFormat::Json => "json",
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "true" | "1" | "yes" | "on" | "enabled"
    )
}

/// Loads configuration from a file with default settings.
pub fn load_config(path: impl AsRef<Path>) -> ConfigResult<WardenConfig> {
    ConfigLoader::new().load(path)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn loader(pairs: &[(&str, &str)]) -> ConfigLoader {
        ConfigLoader::new().with_env(env(pairs))
    }

    fn temp_file(suffix: &str, content: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_yaml() {
        let file = temp_file(
            ".yaml",
            r#"
environment: production
server:
  port: 8080
security:
  jwt:
    secret_key: "${JWT_SECRET}"
    access_ttl_secs: 600
  cors:
    allowed_origins: ["https://app.example.com"]
logging:
  level: debug
  format: json
"#,
        );

        let config = loader(&[("JWT_SECRET", SECRET)]).load(file.path()).unwrap();
        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.security.jwt.access_ttl_secs, 600);
        assert_eq!(
            config.security.jwt.secret_key.as_ref().map(SecretValue::expose),
            Some(SECRET)
        );
        assert_eq!(config.logging.level, LogLevel::Debug);
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_load_toml() {
        let file = temp_file(
            ".toml",
            &format!(
                r#"
[server]
port = 7000

[security.jwt]
secret_key = "{SECRET}"

[security.rate_limit.login]
capacity = 3
window_secs = 30
"#
            ),
        );

        let config = loader(&[]).load(file.path()).unwrap();
        assert_eq!(config.server.port, 7000);
        assert_eq!(config.security.rate_limit.login.capacity, 3);
        assert_eq!(config.security.rate_limit.refresh.capacity, 10);
    }

    #[test]
    fn test_load_json() {
        let file = temp_file(
            ".json",
            &format!(r#"{{"security": {{"jwt": {{"secret_key": "{SECRET}"}}}}}}"#),
        );
        let config = loader(&[]).load(file.path()).unwrap();
        assert_eq!(config.server.port, crate::schema::DEFAULT_PORT);
    }

    #[test]
    fn test_missing_file() {
        let err = loader(&[]).load("/nonexistent/warden.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound { .. }));
    }

    #[test]
    fn test_parse_error_carries_path() {
        let file = temp_file(".yaml", "server: [unclosed");
        let err = loader(&[]).load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = loader(&[("WARDEN_SECRET_KEY", SECRET)])
            .load_from_str("server:\n  prot: 80\n", ConfigFormat::Yaml)
            .unwrap_err();
        assert_eq!(err.error_type(), "serialization");
    }

    #[test]
    fn test_defaults_plus_secret_env() {
        let config = loader(&[("WARDEN_SECRET_KEY", SECRET)])
            .load_optional(None)
            .unwrap();
        assert_eq!(config.server.port, 9999);
        assert_eq!(config.security.jwt.access_ttl_secs, 4 * 3600);
    }

    #[test]
    fn test_missing_secret_is_fatal() {
        let err = loader(&[]).load_optional(None).unwrap_err();
        assert!(err.is_secret_error());
    }

    #[test]
    fn test_env_overrides() {
        let config = loader(&[
            ("WARDEN_SECRET_KEY", SECRET),
            ("WARDEN_SERVER_PORT", "8081"),
            ("WARDEN_ENVIRONMENT", "testing"),
            ("WARDEN_LOG_LEVEL", "warn"),
            ("WARDEN_RATE_LIMIT_ENABLED", "true"),
            ("WARDEN_CORS_ORIGINS", "https://a.example.com, https://b.example.com"),
        ])
        .load_optional(None)
        .unwrap();

        assert_eq!(config.server.port, 8081);
        assert_eq!(config.environment, Environment::Testing);
        assert_eq!(config.logging.level, LogLevel::Warn);
        assert!(config.rate_limit_enabled());
        assert_eq!(config.security.cors.allowed_origins.len(), 2);
    }

    #[test]
    fn test_invalid_env_override() {
        let err = loader(&[("WARDEN_SECRET_KEY", SECRET), ("WARDEN_SERVER_PORT", "http")])
            .load_optional(None)
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar { .. }));
    }

    #[test]
    fn test_validation_can_be_deferred() {
        let config = loader(&[])
            .with_validation(false)
            .load_optional(None)
            .unwrap();
        assert!(config.security.jwt.secret_key.is_none());
    }

    #[test]
    fn test_env_placeholder_resolution() {
        let loader = loader(&[("HOST_PORT", "8088")]);
        assert_eq!(loader.resolve_env_placeholders("port: ${HOST_PORT}"), "port: 8088");
        assert_eq!(loader.resolve_env_placeholders("port: ${NOPE:7}"), "port: 7");
        assert_eq!(loader.resolve_env_placeholders("x: ${NOPE}"), "x: ${NOPE}");
        assert_eq!(loader.resolve_env_placeholders("x: ${open"), "x: ${open");
        assert_eq!(loader.resolve_env_placeholders("cost: $5"), "cost: $5");
    }

    #[test]
    fn test_config_format_from_path() {
        assert_eq!(
            ConfigFormat::from_path(Path::new("a.yml")).unwrap(),
            ConfigFormat::Yaml
        );
        assert_eq!(
            ConfigFormat::from_path(Path::new("a.TOML")).unwrap(),
            ConfigFormat::Toml
        );
        assert!(ConfigFormat::from_path(Path::new("a.ini")).is_err());
        assert!(ConfigFormat::from_path(Path::new("config")).is_err());
    }

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("yes"));
        assert!(parse_bool(" TRUE "));
        assert!(!parse_bool("off"));
    }
}
