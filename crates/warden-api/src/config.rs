// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! API server configuration.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::auth::JwtConfig;
use crate::middleware::RateLimitConfig;

// =============================================================================
// ApiConfig
// =============================================================================

/// Configuration for the API server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Server host address.
    pub host: IpAddr,
    /// Server port.
    pub port: u16,
    /// CORS configuration.
    pub cors: CorsConfig,
    /// JWT configuration.
    pub jwt: JwtConfig,
    /// Rate limiting configuration.
    pub rate_limit: RateLimitConfig,
    /// Audit logging configuration.
    pub audit: AuditConfig,
    /// Request timeout.
    #[serde(with = "duration_secs")]
    pub request_timeout: Duration,
    /// Graceful shutdown timeout.
    #[serde(with = "duration_secs")]
    pub shutdown_timeout: Duration,
    /// Maximum request body size in bytes.
    pub max_body_size: usize,
    /// Write the detailed error description into error bodies.
    ///
    /// Development only; production keeps the generic message.
    pub expose_error_detail: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)),
            port: 9999,
            cors: CorsConfig::default(),
            jwt: JwtConfig::default(),
            rate_limit: RateLimitConfig::default(),
            audit: AuditConfig::default(),
            request_timeout: Duration::from_secs(30),
            shutdown_timeout: Duration::from_secs(30),
            max_body_size: 1024 * 1024, // 1MB
            expose_error_detail: false,
        }
    }
}

impl ApiConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the socket address to bind to.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Sets the host address.
    pub fn with_host(mut self, host: IpAddr) -> Self {
        self.host = host;
        self
    }

    /// Sets the port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the JWT configuration.
    pub fn with_jwt(mut self, jwt: JwtConfig) -> Self {
        self.jwt = jwt;
        self
    }

    /// Sets the rate limit configuration.
    pub fn with_rate_limit(mut self, rate_limit: RateLimitConfig) -> Self {
        self.rate_limit = rate_limit;
        self
    }

    /// Enables or disables detailed error bodies.
    pub fn with_error_detail(mut self, expose: bool) -> Self {
        self.expose_error_detail = expose;
        self
    }
}

// =============================================================================
// CorsConfig
// =============================================================================

/// CORS (Cross-Origin Resource Sharing) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Allowed origins. `*` allows any origin.
    pub allowed_origins: Vec<String>,
    /// Allowed methods.
    pub allowed_methods: Vec<String>,
    /// Allowed headers. `*` allows any header.
    pub allowed_headers: Vec<String>,
    /// Whether to allow credentials.
    pub allow_credentials: bool,
    /// Max age for preflight cache (seconds).
    pub max_age: u64,
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
            max_age: 3600,
        }
    }
}

impl CorsConfig {
    /// Creates a restrictive CORS configuration for production.
    pub fn strict(origins: Vec<String>) -> Self {
        Self {
            allowed_origins: origins,
            allowed_methods: vec!["GET".to_string(), "POST".to_string()],
            allowed_headers: vec!["Content-Type".to_string(), "Authorization".to_string()],
            allow_credentials: true,
            max_age: 3600,
        }
    }

    /// Returns `true` if any origin is allowed.
    pub fn allows_any_origin(&self) -> bool {
        self.allowed_origins.iter().any(|o| o == "*")
    }
}

// =============================================================================
// AuditConfig
// =============================================================================

/// Request audit configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Whether per-request audit entries are written.
    pub enabled: bool,
    /// Paths never audited by the request layer. Login attempts are audited
    /// by the session manager instead, without the request body.
    pub exclude_paths: Vec<String>,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: true,
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
    /// Creates a disabled audit configuration.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }

    /// Returns `true` if requests to `path` should be audited.
    pub fn should_audit(&self, path: &str) -> bool {
        self.enabled && !self.exclude_paths.iter().any(|p| p == path)
    }
}

// =============================================================================
// Duration serialization (whole seconds)
// =============================================================================

pub(crate) mod duration_secs {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ApiConfig::default();
        assert_eq!(config.port, 9999);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert!(!config.expose_error_detail);
    }

    #[test]
    fn test_socket_addr() {
        let config = ApiConfig::default().with_port(9000);
        let addr = config.socket_addr();
        assert_eq!(addr.port(), 9000);
    }

    #[test]
    fn test_cors_strict() {
        let cors = CorsConfig::strict(vec!["https://admin.example.com".into()]);
        assert!(!cors.allows_any_origin());
        assert!(CorsConfig::default().allows_any_origin());
    }

    #[test]
    fn test_audit_excludes_login() {
        let audit = AuditConfig::default();
        assert!(!audit.should_audit("/api/v1/base/access_token"));
        assert!(audit.should_audit("/api/v1/user/list"));
        assert!(!AuditConfig::disabled().should_audit("/api/v1/user/list"));
    }

    #[test]
    fn test_durations_deserialize_from_seconds() {
        let config: ApiConfig =
            serde_json::from_str(r#"{"request_timeout": 5, "port": 8000}"#).unwrap();
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.port, 8000);
    }
}
