// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # warden-config
//!
//! Configuration management for the Warden authentication service.
//!
//! ## Features
//!
//! - **Schema Definition**: typed sections with defaults and startup validation
//! - **Multi-Format Support**: YAML, TOML and JSON configuration files
//! - **Environment Overrides**: `WARDEN_*` variables and `${VAR:default}`
//!   placeholders
//! - **Secret Handling**: the signing secret never appears in logs or
//!   serialized output
//!
//! ## Quick Start
//!
//! ```no_run
//! use warden_config::ConfigLoader;
//!
//! // A file is optional; WARDEN_SECRET_KEY alone is enough.
//! let config = ConfigLoader::new().load_optional(None).unwrap();
//! println!("Listening on {}", config.server.socket_addr());
//! ```
//!
//! ## Configuration Schema
//!
//! - `environment` - development, testing or production
//! - `server` - bind address, timeouts, body limit, debug detail
//! - `security` - tokens, rate limiting, CORS and audit
//! - `logging` - level and output format
//! - `seed` - superuser created against an empty store

#![warn(missing_docs)]
#![deny(unsafe_code)]

// =============================================================================
// Modules
// =============================================================================

pub mod error;
pub mod loader;
pub mod schema;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{ConfigError, ConfigResult};
pub use loader::{load_config, ConfigFormat, ConfigLoader, ENV_PREFIX};
pub use schema::{
    AuditConfig, BucketConfig, CorsConfig, Environment, JwtAlgorithm, JwtConfig, LogFormat,
    LogLevel, LoggingConfig, RateLimitConfig, SecretValue, SecurityConfig, SeedConfig,
    ServerConfig, WardenConfig, MIN_SECRET_LENGTH,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
