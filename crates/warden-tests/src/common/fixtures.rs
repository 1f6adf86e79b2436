// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Test Fixtures
//!
//! Well-known credentials, configurations and config documents.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use warden_api::{ApiConfig, AuditConfig, JwtConfig, RateLimitConfig};
use warden_core::password::HashParams;
use warden_core::seed::SeedOptions;
use warden_core::PasswordHasher;

// =============================================================================
// Credentials
// =============================================================================

/// Signing secret used by every test app. Exactly 32 bytes.
pub const TEST_SECRET: &str = "warden-test-secret-0123456789abc";

/// A different secret of valid length, for forged tokens.
pub const OTHER_SECRET: &str = "another-secret-value-9876543210z";

/// Seeded superuser login.
pub const ADMIN_USERNAME: &str = "admin";

/// Seeded superuser password.
pub const ADMIN_PASSWORD: &str = "abcd1234";

/// Seeded superuser email.
pub const ADMIN_EMAIL: &str = "admin@admin.com";

/// Password given to principals created by the builders.
pub const USER_PASSWORD: &str = "password123";

/// Access-token lifetime used by the fixtures (4 hours).
pub const ACCESS_TTL: Duration = Duration::from_secs(4 * 60 * 60);

/// Refresh-token lifetime used by the fixtures (7 days).
pub const REFRESH_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Login attempts allowed per minute per client.
pub const LOGIN_LIMIT: u32 = 5;

/// Refresh attempts allowed per minute per client.
pub const REFRESH_LIMIT: u32 = 10;

// =============================================================================
// Clients
// =============================================================================

/// Fixture providing client socket addresses.
pub struct ClientFixtures;

impl ClientFixtures {
    /// The default test client.
    pub fn default_client() -> SocketAddr {
        Self::client(1)
    }

    /// The `n`th client in 10.0.0.0/24.
    pub fn client(n: u8) -> SocketAddr {
        SocketAddr::new(IpAddr::V4(Ipv4Addr::new(10, 0, 0, n)), 40_000 + u16::from(n))
    }
}

// =============================================================================
// Configuration Fixtures
// =============================================================================

/// Fixture providing API and core configurations.
pub struct ConfigFixtures;

impl ConfigFixtures {
    /// JWT settings with [`TEST_SECRET`] and the fixture lifetimes.
    pub fn jwt_config() -> JwtConfig {
        JwtConfig::new(TEST_SECRET).with_ttls(ACCESS_TTL, REFRESH_TTL)
    }

    /// Rate limiting enabled with the default buckets.
    pub fn rate_limit_config() -> RateLimitConfig {
        RateLimitConfig::default()
    }

    /// API configuration as a production deployment would use it, with
    /// rate limiting and auditing on.
    pub fn api_config() -> ApiConfig {
        ApiConfig::new()
            .with_jwt(Self::jwt_config())
            .with_rate_limit(Self::rate_limit_config())
    }

    /// API configuration with rate limiting off.
    pub fn unlimited_api_config() -> ApiConfig {
        let mut config = Self::api_config();
        config.rate_limit.enabled = false;
        config
    }

    /// API configuration with auditing off.
    pub fn unaudited_api_config() -> ApiConfig {
        let mut config = Self::api_config();
        config.audit = AuditConfig::disabled();
        config
    }

    /// Cheap Argon2 parameters so tests do not spend seconds hashing.
    pub fn fast_hasher() -> PasswordHasher {
        PasswordHasher::new(HashParams::insecure_fast()).expect("fast argon2 parameters are valid")
    }

    /// Seed options for the well-known superuser and the full API catalog.
    pub fn seed_options() -> SeedOptions {
        SeedOptions {
            admin_username: ADMIN_USERNAME.to_string(),
            admin_password: ADMIN_PASSWORD.to_string(),
            admin_email: ADMIN_EMAIL.to_string(),
            api_catalog: warden_api::api_catalog(),
        }
    }
}

// =============================================================================
// Config Documents
// =============================================================================

/// Fixture providing configuration file contents.
pub struct ConfigDocuments;

impl ConfigDocuments {
    /// The smallest valid YAML document.
    pub fn minimal_yaml() -> String {
        format!(
            r#"
security:
  jwt:
    secret_key: "{TEST_SECRET}"
"#
        )
    }

    /// A YAML document touching every section.
    pub fn full_yaml() -> String {
        format!(
            r#"
environment: production
server:
  host: 127.0.0.1
  port: 8443
  request_timeout_secs: 15
  shutdown_timeout_secs: 5
  max_body_size: 65536
  debug: false
security:
  jwt:
    secret_key: "{TEST_SECRET}"
    algorithm: HS512
    access_ttl_secs: 900
    refresh_ttl_secs: 86400
    leeway_secs: 5
    track_refresh_rotation: true
  rate_limit:
    enabled: true
    login:
      capacity: 3
      window_secs: 30
    refresh:
      capacity: 20
      window_secs: 60
    trust_forwarded_for: true
    cleanup_interval_secs: 120
  cors:
    allowed_origins:
      - "https://admin.example.com"
    allow_credentials: true
    max_age_secs: 600
  audit:
    enabled: true
    exclude_paths:
      - /health
logging:
  level: warn
  format: json
seed:
  enabled: false
"#
        )
    }

    /// The minimal document as TOML.
    pub fn minimal_toml() -> String {
        format!(
            r#"
environment = "testing"

[server]
port = 7000

[security.jwt]
secret_key = "{TEST_SECRET}"
access_ttl_secs = 600
refresh_ttl_secs = 3600
"#
        )
    }

    /// The minimal document as JSON.
    pub fn minimal_json() -> String {
        format!(
            r#"{{
  "server": {{ "port": 7001 }},
  "security": {{ "jwt": {{ "secret_key": "{TEST_SECRET}" }} }},
  "logging": {{ "level": "debug", "format": "compact" }}
}}"#
        )
    }

    /// A YAML document whose secret comes from `WARDEN_TEST_SECRET`.
    pub fn placeholder_yaml() -> &'static str {
        r#"
server:
  port: ${WARDEN_TEST_PORT:9100}
security:
  jwt:
    secret_key: "${WARDEN_TEST_SECRET}"
"#
    }
}
