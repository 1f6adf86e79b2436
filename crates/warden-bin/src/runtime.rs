// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Service runtime orchestration.
//!
//! Startup order:
//!
//! 1. Load configuration, apply CLI overrides, validate
//! 2. Create the credential store and seed it when empty
//! 3. Create the audit sink (tracing output plus a bounded queryable ring)
//! 4. Build the API server and serve until shutdown

use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use jsonwebtoken::Algorithm;
use tracing::{info, warn};

use warden_api::{ApiConfig, ApiServer};
use warden_config::{ConfigLoader, JwtAlgorithm, WardenConfig};
use warden_core::seed::{seed_defaults, SeedOptions, SeedOutcome};
use warden_core::{
    AuditLog, AuditLogger, CredentialStore, InMemoryAuditLogger, InMemoryCredentialStore,
    NoOpAuditLogger, PasswordHasher, SystemClock, TeeLogger, TracingAuditLogger,
};

use crate::error::{BinError, BinResult};
use crate::shutdown::ShutdownCoordinator;

// =============================================================================
// WardenRuntime
// =============================================================================

/// The service runtime.
pub struct WardenRuntime {
    config: Arc<WardenConfig>,
    shutdown: ShutdownCoordinator,
}

impl WardenRuntime {
    /// Creates a runtime for an already validated configuration.
    pub fn new(config: WardenConfig) -> Self {
        Self {
            config: Arc::new(config),
            shutdown: ShutdownCoordinator::new(),
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &WardenConfig {
        &self.config
    }

    /// Returns a handle that can stop the runtime.
    pub fn shutdown_handle(&self) -> ShutdownCoordinator {
        self.shutdown.clone()
    }

    /// Runs the service until SIGINT/SIGTERM or a manual shutdown.
    pub async fn run(self) -> BinResult<()> {
        info!(
            version = warden_api::VERSION,
            environment = %self.config.environment,
            "Starting Warden"
        );

        let audit_logger = self.create_audit_logger();
        let store = self.create_store().await?;
        let server = ApiServer::builder()
            .config(api_config(&self.config))
            .store(store)
            .audit_logger(audit_logger.clone())
            .clock(SystemClock::shared())
            .build()
            .map_err(|e| BinError::init(format!("Failed to build API server: {e}")))?;

        if let Err(e) = audit_logger
            .log(AuditLog::system_start(warden_api::VERSION))
            .await
        {
            warn!(error = %e, "Failed to log startup event");
        }

        let signals = self.shutdown.clone();
        let signal_task = tokio::spawn(async move { signals.wait_for_os_signal().await });

        info!(addr = %server.addr(), "Warden is ready");
        let result = server
            .run_with_shutdown(self.shutdown.shutdown_signal().wait())
            .await
            .map_err(|e| BinError::runtime(e.to_string()));
        signal_task.abort();

        let reason = if result.is_ok() {
            "graceful shutdown"
        } else {
            "server error"
        };
        if let Err(e) = audit_logger
            .log(AuditLog::system_shutdown(Some(reason.to_string())))
            .await
        {
            warn!(error = %e, "Failed to log shutdown event");
        }

        info!("Warden shutdown complete");
        result
    }

    fn create_audit_logger(&self) -> Arc<dyn AuditLogger> {
        let audit = &self.config.security.audit;
        if audit.enabled {
            info!(retention = audit.retention, "Audit log kept in memory for queries");
            Arc::new(TeeLogger::new(
                TracingAuditLogger::new(),
                InMemoryAuditLogger::with_capacity(audit.retention),
            ))
        } else {
            info!("Audit logging disabled");
            Arc::new(NoOpAuditLogger::new())
        }
    }

    async fn create_store(&self) -> BinResult<Arc<dyn CredentialStore>> {
        let store: Arc<dyn CredentialStore> =
            Arc::new(InMemoryCredentialStore::with_clock(SystemClock::shared()));

        if self.config.seed.enabled {
            let options = seed_options(&self.config);
            let outcome = seed_defaults(store.as_ref(), &PasswordHasher::default(), &options)
                .await
                .map_err(|e| BinError::from(e).with_context("Seeding the credential store"))?;
            if outcome == SeedOutcome::Seeded {
                info!(username = %options.admin_username, "Seeded superuser and default roles");
            }
        }

        Ok(store)
    }
}

// =============================================================================
// RuntimeBuilder
// =============================================================================

/// Builder that loads configuration and applies command-line overrides
/// before validation.
#[derive(Default)]
pub struct RuntimeBuilder {
    config_path: Option<PathBuf>,
    config: Option<WardenConfig>,
    loader: Option<ConfigLoader>,
    dev_mode: bool,
    host: Option<IpAddr>,
    port: Option<u16>,
}

impl RuntimeBuilder {
    /// Creates a new runtime builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the configuration file path.
    pub fn config_path(mut self, path: Option<impl AsRef<Path>>) -> Self {
        self.config_path = path.map(|p| p.as_ref().to_path_buf());
        self
    }

    /// Sets the configuration directly, skipping file and environment.
    pub fn config(mut self, config: WardenConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Uses a custom loader, e.g. with an injected environment.
    pub fn loader(mut self, loader: ConfigLoader) -> Self {
        self.loader = Some(loader);
        self
    }

    /// Enables development mode (detailed error bodies).
    pub fn dev_mode(mut self, enabled: bool) -> Self {
        self.dev_mode = enabled;
        self
    }

    /// Overrides the bind address.
    pub fn host(mut self, host: Option<IpAddr>) -> Self {
        self.host = host;
        self
    }

    /// Overrides the listen port.
    pub fn port(mut self, port: Option<u16>) -> Self {
        self.port = port;
        self
    }

    /// Loads, overrides and validates the configuration.
    pub fn build_config(self) -> BinResult<WardenConfig> {
        let mut config = match self.config {
            Some(config) => config,
            None => self
                .loader
                .unwrap_or_default()
                .with_validation(false)
                .load_optional(self.config_path.as_deref())?,
        };

        if self.dev_mode {
            config.server.debug = true;
        }
        if let Some(host) = self.host {
            config.server.host = host;
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }

        config.validate()?;
        Ok(config)
    }

    /// Builds the runtime.
    pub fn build(self) -> BinResult<WardenRuntime> {
        Ok(WardenRuntime::new(self.build_config()?))
    }
}

// =============================================================================
// Configuration Mapping
// =============================================================================

/// Loads and validates configuration without overrides.
pub fn load_config(path: Option<&Path>) -> BinResult<WardenConfig> {
    Ok(ConfigLoader::new().load_optional(path)?)
}

/// Maps the file configuration onto the API server configuration.
pub fn api_config(config: &WardenConfig) -> ApiConfig {
    let server = &config.server;
    let security = &config.security;

    let jwt = warden_api::JwtConfig {
        secret: security
            .jwt
            .secret_key
            .as_ref()
            .map(|s| s.expose().to_string())
            .unwrap_or_default(),
        access_ttl_secs: security.jwt.access_ttl_secs,
        refresh_ttl_secs: security.jwt.refresh_ttl_secs,
        algorithm: algorithm(security.jwt.algorithm),
        leeway_secs: security.jwt.leeway_secs,
        track_refresh_rotation: security.jwt.track_refresh_rotation,
    };

    let bucket = |b: warden_config::BucketConfig| {
        warden_api::BucketConfig::new(b.capacity, Duration::from_secs(b.window_secs))
    };
    let rate_limit = warden_api::RateLimitConfig {
        enabled: config.rate_limit_enabled(),
        login: bucket(security.rate_limit.login),
        refresh: bucket(security.rate_limit.refresh),
        client_key: if security.rate_limit.trust_forwarded_for {
            warden_api::ClientKeySource::ForwardedFor
        } else {
            warden_api::ClientKeySource::Peer
        },
        cleanup_interval: Duration::from_secs(security.rate_limit.cleanup_interval_secs.max(1)),
    };

    let cors = warden_api::CorsConfig {
        allowed_origins: security.cors.allowed_origins.clone(),
        allowed_methods: security.cors.allowed_methods.clone(),
        allowed_headers: security.cors.allowed_headers.clone(),
        allow_credentials: security.cors.allow_credentials,
        max_age: security.cors.max_age_secs,
    };

    let audit = warden_api::AuditConfig {
        enabled: security.audit.enabled,
        exclude_paths: security.audit.exclude_paths.clone(),
    };

    ApiConfig {
        host: server.host,
        port: server.port,
        cors,
        jwt,
        rate_limit,
        audit,
        request_timeout: server.request_timeout(),
        shutdown_timeout: server.shutdown_timeout(),
        max_body_size: server.max_body_size,
        expose_error_detail: config.expose_error_detail(),
    }
}

fn algorithm(algorithm: JwtAlgorithm) -> Algorithm {
    match algorithm {
        JwtAlgorithm::HS256 => Algorithm::HS256,
        JwtAlgorithm::HS384 => Algorithm::HS384,
        JwtAlgorithm::HS512 => Algorithm::HS512,
    }
}

fn seed_options(config: &WardenConfig) -> SeedOptions {
    SeedOptions {
        admin_username: config.seed.admin_username.clone(),
        admin_password: config.seed.admin_password.expose().to_string(),
        admin_email: config.seed.admin_email.clone(),
        api_catalog: warden_api::api_catalog(),
    }
}

// =============================================================================
// Tests
// =============================================================================
