// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Configuration schema definitions for Warden.
//!
//! # Schema Structure
//!
//! ```text
//! WardenConfig
//! ├── environment: Environment
//! ├── server: ServerConfig
//! ├── security: SecurityConfig
//! │   ├── jwt: JwtConfig
//! │   ├── rate_limit: RateLimitConfig
//! │   ├── cors: CorsConfig
//! │   └── audit: AuditConfig
//! ├── logging: LoggingConfig
//! └── seed: SeedConfig
//! ```
//!
//! Every section has defaults; only the signing secret must be supplied.

use crate::error::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

// =============================================================================
// Constants
// =============================================================================

/// Default listen port.
pub const DEFAULT_PORT: u16 = 9999;

/// Minimum signing secret length in bytes.
pub const MIN_SECRET_LENGTH: usize = 32;

/// Default access-token lifetime (4 hours).
pub const DEFAULT_ACCESS_TTL_SECS: u64 = 4 * 60 * 60;

/// Default refresh-token lifetime (7 days).
pub const DEFAULT_REFRESH_TTL_SECS: u64 = 7 * 24 * 60 * 60;

/// Default request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

// =============================================================================
// Top-Level Configuration
// =============================================================================

/// The root configuration structure for Warden.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WardenConfig {
    /// Deployment environment.
    pub environment: Environment,

    /// HTTP server configuration.
    pub server: ServerConfig,

    /// Security configuration.
    pub security: SecurityConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,

    /// First-start seeding.
    pub seed: SeedConfig,
}

impl WardenConfig {
    /// Validates the entire configuration.
    ///
    /// Production adds stricter checks on top of the per-section ones.
    pub fn validate(&self) -> ConfigResult<()> {
        self.server.validate()?;
        self.security.validate()?;
        self.seed.validate()?;

        if self.environment.is_production() {
            if self.server.debug {
                return Err(ConfigError::validation(
                    "server.debug",
                    "debug error detail must be disabled in production",
                ));
            }
            if let Some(origin) = self.security.cors.localhost_origin() {
                return Err(ConfigError::validation(
                    "security.cors.allowed_origins",
                    format!("'{origin}' is not allowed in production"),
                ));
            }
        }

        Ok(())
    }

    /// Returns `true` if rate limiting is active, taking the environment
    /// default into account.
    pub fn rate_limit_enabled(&self) -> bool {
        self.security
            .rate_limit
            .enabled
            .unwrap_or(!matches!(self.environment, Environment::Testing))
    }

    /// Returns `true` if detailed error descriptions go to clients.
    pub fn expose_error_detail(&self) -> bool {
        self.server.debug && !self.environment.is_production()
    }
}

// =============================================================================
// Environment
// =============================================================================

/// Deployment environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Local development.
    #[default]
    Development,
    /// Automated tests. Rate limiting is off unless enabled explicitly.
    Testing,
    /// Production.
    Production,
}

impl Environment {
    /// Returns the lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Testing => "testing",
            Environment::Production => "production",
        }
    }

    /// Returns `true` for production.
    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "testing" | "test" => Ok(Environment::Testing),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(ConfigError::validation(
                "environment",
                format!("unknown environment '{other}'"),
            )),
        }
    }
}

// =============================================================================
// Server Configuration
// =============================================================================

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Bind address.
    pub host: IpAddr,

    /// Listen port.
    pub port: u16,

    /// Request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Grace period for in-flight requests on shutdown, in seconds.
    pub shutdown_timeout_secs: u64,

    /// Maximum request body size in bytes.
    pub max_body_size: usize,

    /// Write detailed error descriptions into error bodies.
    pub debug: bool,
}

impl ServerConfig {
    /// Validates the server configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::validation(
                "server.request_timeout_secs",
                "cannot be zero",
            ));
        }
        if self.max_body_size == 0 {
            return Err(ConfigError::validation(
                "server.max_body_size",
                "cannot be zero",
            ));
        }
        Ok(())
    }

    /// Returns the socket address.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Returns the request timeout as a Duration.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Returns the shutdown grace period as a Duration.
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)),
            port: DEFAULT_PORT,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            shutdown_timeout_secs: 30,
            max_body_size: 1024 * 1024, // 1MB
            debug: false,
        }
    }
}

// =============================================================================
// Security Configuration
// =============================================================================

/// Security configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SecurityConfig {
    /// Token configuration.
    pub jwt: JwtConfig,

    /// Rate limiting configuration.
    pub rate_limit: RateLimitConfig,

    /// CORS configuration.
    pub cors: CorsConfig,

    /// Audit logging configuration.
    pub audit: AuditConfig,
}

impl SecurityConfig {
    /// Validates the security configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        self.jwt.validate()?;
        self.rate_limit.validate()?;
        self.audit.validate()?;
        Ok(())
    }
}

/// Token signing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct JwtConfig {
    /// HMAC signing secret. Required.
    pub secret_key: Option<SecretValue>,

    /// Signing algorithm.
    pub algorithm: JwtAlgorithm,

    /// Access-token lifetime in seconds.
    pub access_ttl_secs: u64,

    /// Refresh-token lifetime in seconds.
    pub refresh_ttl_secs: u64,

    /// Clock skew tolerated on expiry, in seconds.
    pub leeway_secs: u64,

    /// Embed a rotation sequence in refresh tokens so a rotated-out token
    /// is rejected.
    pub track_refresh_rotation: bool,
}

impl JwtConfig {
    /// Validates the token configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        let secret = self
            .secret_key
            .as_ref()
            .ok_or_else(|| ConfigError::missing_field("security.jwt.secret_key"))?;
        if secret.expose().trim().is_empty() {
            return Err(ConfigError::missing_field("security.jwt.secret_key"));
        }
        if secret.len() < MIN_SECRET_LENGTH {
            return Err(ConfigError::validation(
                "security.jwt.secret_key",
                format!("must be at least {MIN_SECRET_LENGTH} bytes"),
            ));
        }
        if self.access_ttl_secs == 0 {
            return Err(ConfigError::validation(
                "security.jwt.access_ttl_secs",
                "cannot be zero",
            ));
        }
        if self.refresh_ttl_secs == 0 {
            return Err(ConfigError::validation(
                "security.jwt.refresh_ttl_secs",
                "cannot be zero",
            ));
        }
        if self.refresh_ttl_secs <= self.access_ttl_secs {
            return Err(ConfigError::validation(
                "security.jwt.refresh_ttl_secs",
                "must be greater than access_ttl_secs",
            ));
        }
        Ok(())
    }

    /// Returns the access-token lifetime.
    pub fn access_ttl(&self) -> Duration {
        Duration::from_secs(self.access_ttl_secs)
    }

    /// Returns the refresh-token lifetime.
    pub fn refresh_ttl(&self) -> Duration {
        Duration::from_secs(self.refresh_ttl_secs)
    }
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret_key: None,
            algorithm: JwtAlgorithm::default(),
            access_ttl_secs: DEFAULT_ACCESS_TTL_SECS,
            refresh_ttl_secs: DEFAULT_REFRESH_TTL_SECS,
            leeway_secs: 0,
            track_refresh_rotation: true,
        }
    }
}

/// JWT signing algorithm. Only HMAC variants are supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum JwtAlgorithm {
    /// HMAC using SHA-256.
    #[default]
    HS256,
    /// HMAC using SHA-384.
    HS384,
    /// HMAC using SHA-512.
    HS512,
}

/// One rate-limit bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BucketConfig {
    /// Attempts per window.
    pub capacity: u32,
    /// Window length in seconds.
    pub window_secs: u64,
}

impl BucketConfig {
    /// `capacity` attempts per minute.
    pub const fn per_minute(capacity: u32) -> Self {
        Self {
            capacity,
            window_secs: 60,
        }
    }

    fn validate(&self, field: &str) -> ConfigResult<()> {
        if self.capacity == 0 {
            return Err(ConfigError::validation(
                format!("security.rate_limit.{field}.capacity"),
                "cannot be zero",
            ));
        }
        if self.window_secs == 0 {
            return Err(ConfigError::validation(
                format!("security.rate_limit.{field}.window_secs"),
                "cannot be zero",
            ));
        }
        Ok(())
    }
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RateLimitConfig {
    /// Whether rate limiting is enabled. Unset means on everywhere but the
    /// testing environment.
    pub enabled: Option<bool>,

    /// Login bucket.
    pub login: BucketConfig,

    /// Refresh bucket.
    pub refresh: BucketConfig,

    /// Key clients by `X-Forwarded-For` / `X-Real-IP` instead of the peer
    /// address. Only enable behind a proxy that sets these headers.
    pub trust_forwarded_for: bool,

    /// Interval between purges of stale counters, in seconds.
    pub cleanup_interval_secs: u64,
}

impl RateLimitConfig {
    /// Validates the rate limit configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.enabled == Some(false) {
            return Ok(());
        }
        self.login.validate("login")?;
        self.refresh.validate("refresh")?;
        Ok(())
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: None,
            login: BucketConfig::per_minute(5),
            refresh: BucketConfig::per_minute(10),
            trust_forwarded_for: false,
            cleanup_interval_secs: 60,
        }
    }
}

/// CORS configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CorsConfig {
    /// Allowed origins (use "*" for all).
    pub allowed_origins: Vec<String>,

    /// Allowed methods.
    pub allowed_methods: Vec<String>,

    /// Allowed headers.
    pub allowed_headers: Vec<String>,

    /// Allow credentials.
    pub allow_credentials: bool,

    /// Max age in seconds.
    pub max_age_secs: u64,
}

impl CorsConfig {
    /// Returns the first origin pointing at the local machine, if any.
    pub fn localhost_origin(&self) -> Option<&str> {
        self.allowed_origins
            .iter()
            .map(String::as_str)
            .find(|o| o.contains("localhost") || o.contains("127.0.0.1") || o.contains("[::1]"))
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["*".to_string()],
            allowed_methods: vec![
                "GET".to_string(),
                "POST".to_string(),
                "PUT".to_string(),
                "DELETE".to_string(),
                "OPTIONS".to_string(),
            ],
            allowed_headers: vec![
                "Content-Type".to_string(),
                "Authorization".to_string(),
                "X-Request-ID".to_string(),
            ],
            allow_credentials: false,
            max_age_secs: 3600,
        }
    }
}

/// Audit logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuditConfig {
    /// Whether per-request audit entries are written.
    pub enabled: bool,

    /// Paths the request audit layer skips.
    pub exclude_paths: Vec<String>,

    /// Entries kept in memory for `/api/v1/auditlog/list`. Oldest entries
    /// are evicted first.
    pub retention: usize,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            retention: 10_000,
            exclude_paths: vec![
                "/api/v1/base/access_token".to_string(),
                "/login".to_string(),
                "/api/v1/base/health".to_string(),
                "/health".to_string(),
            ],
        }
    }
}

impl AuditConfig {
    /// Validates the audit configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.enabled && self.retention == 0 {
            return Err(ConfigError::validation(
                "security.audit.retention",
                "cannot be zero while audit is enabled",
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Logging Configuration
// =============================================================================

/// Logging configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log level.
    pub level: LogLevel,

    /// Log format.
    pub format: LogFormat,
}

/// Log level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Trace level.
    Trace,
    /// Debug level.
    Debug,
    /// Info level.
    #[default]
    Info,
    /// Warning level.
    Warn,
    /// Error level.
    Error,
}

impl LogLevel {
    /// Returns the filter directive name.
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            other => Err(ConfigError::validation(
                "logging.level",
                format!("unknown level '{other}'"),
            )),
        }
    }
}

/// Log format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// Single-line compact text.
    Compact,
    /// JSON lines.
    Json,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "pretty" => Ok(LogFormat::Text),
            "compact" => Ok(LogFormat::Compact),
            "json" => Ok(LogFormat::Json),
            other => Err(ConfigError::validation(
                "logging.format",
                format!("unknown format '{other}'"),
            )),
        }
    }
}

// =============================================================================
// Seed Configuration
// =============================================================================

/// Superuser created on first start against an empty store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SeedConfig {
    /// Whether to seed an empty store.
    pub enabled: bool,

    /// Superuser login name.
    pub admin_username: String,

    /// Superuser password.
    pub admin_password: SecretValue,

    /// Superuser email.
    pub admin_email: String,
}

impl SeedConfig {
    /// Validates the seed configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        if !self.enabled {
            return Ok(());
        }
        if self.admin_username.trim().is_empty() {
            return Err(ConfigError::validation(
                "seed.admin_username",
                "cannot be empty",
            ));
        }
        if self.admin_password.len() < 8 {
            return Err(ConfigError::validation(
                "seed.admin_password",
                "must be at least 8 characters",
            ));
        }
        Ok(())
    }
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            admin_username: "admin".to_string(),
            admin_password: SecretValue::new("abcd1234"),
            admin_email: "admin@admin.com".to_string(),
        }
    }
}

// =============================================================================
// Secret Value
// =============================================================================

/// A secret string that never shows up in logs or serialized output.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct SecretValue(String);

impl SecretValue {
    /// Creates a new secret value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the secret.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Returns the length in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for SecretValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretValue(***)")
    }
}

impl fmt::Display for SecretValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}

impl Serialize for SecretValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str("***")
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn valid() -> WardenConfig {
        let mut config = WardenConfig::default();
        config.security.jwt.secret_key = Some(SecretValue::new(SECRET));
        config
    }

    #[test]
    fn test_default_needs_only_secret() {
        assert!(WardenConfig::default().validate().is_err());
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn test_secret_validation() {
        let mut config = valid();
        config.security.jwt.secret_key = Some(SecretValue::new("short"));
        let err = config.validate().unwrap_err();
        assert!(err.is_secret_error());

        config.security.jwt.secret_key = Some(SecretValue::new("   "));
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingField { .. })
        ));
    }

    #[test]
    fn test_ttl_validation() {
        let mut config = valid();
        config.security.jwt.access_ttl_secs = 0;
        assert!(config.validate().is_err());

        let mut config = valid();
        config.security.jwt.refresh_ttl_secs = config.security.jwt.access_ttl_secs;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bucket_validation() {
        let mut config = valid();
        config.security.rate_limit.login.capacity = 0;
        assert!(config.validate().is_err());

        config.security.rate_limit.enabled = Some(false);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_audit_retention_validation() {
        let mut config = valid();
        assert_eq!(config.security.audit.retention, 10_000);

        config.security.audit.retention = 0;
        assert!(config.validate().is_err());

        config.security.audit.enabled = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_production_rules() {
        let mut config = valid();
        config.environment = Environment::Production;
        assert!(config.validate().is_ok());

        config.server.debug = true;
        assert!(config.validate().is_err());

        config.server.debug = false;
        config.security.cors.allowed_origins = vec!["http://localhost:3000".into()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rate_limit_environment_default() {
        let mut config = valid();
        assert!(config.rate_limit_enabled());

        config.environment = Environment::Testing;
        assert!(!config.rate_limit_enabled());

        config.security.rate_limit.enabled = Some(true);
        assert!(config.rate_limit_enabled());
    }

    #[test]
    fn test_secret_never_printed() {
        let config = valid();
        assert!(!format!("{config:?}").contains(SECRET));
        assert!(!serde_json::to_string(&config).unwrap().contains(SECRET));
    }

    #[test]
    fn test_environment_parse() {
        assert_eq!("prod".parse::<Environment>().unwrap(), Environment::Production);
        assert_eq!("Testing".parse::<Environment>().unwrap(), Environment::Testing);
        assert!("staging".parse::<Environment>().is_err());
    }

    #[test]
    fn test_log_level() {
        assert_eq!(LogLevel::Info.as_str(), "info");
        assert_eq!("WARNING".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Json);
    }
}
