// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Application state shared across handlers.

use std::sync::Arc;

use warden_core::seed::ApiEntry;
use warden_core::{
    AuditLogger, CredentialStore, InMemoryCredentialStore, NoOpAuditLogger, PasswordHasher,
    SharedClock, SystemClock,
};

use crate::auth::{JwtManager, RbacPolicy, SessionManager};
use crate::config::ApiConfig;
use crate::error::ApiResult;
use crate::middleware::RateLimiter;

// =============================================================================
// AppState
// =============================================================================

/// Application state shared across all handlers.
///
/// This is the central state container that is passed to all handlers via
/// Axum's state extraction mechanism.
#[derive(Clone)]
pub struct AppState {
    /// API configuration.
    pub config: Arc<ApiConfig>,
    /// Login, refresh and per-request authentication.
    pub sessions: Arc<SessionManager>,
    /// Credential store.
    pub store: Arc<dyn CredentialStore>,
    /// Audit logger.
    pub audit_logger: Arc<dyn AuditLogger>,
    /// Rate limiter shared by the login and refresh routes.
    pub limiter: Arc<RateLimiter>,
    /// Permission evaluator.
    pub rbac_policy: RbacPolicy,
    /// Time source.
    pub clock: SharedClock,
    /// Every API the server exposes.
    pub api_catalog: Arc<[ApiEntry]>,
}

impl AppState {
    /// Creates a new app state builder.
    pub fn builder() -> AppStateBuilder {
        AppStateBuilder::new()
    }

    /// Returns the session manager.
    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    /// Returns the credential store.
    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.store
    }

    /// Returns the RBAC policy.
    pub fn rbac(&self) -> &RbacPolicy {
        &self.rbac_policy
    }

    /// Returns the audit logger.
    pub fn audit(&self) -> &Arc<dyn AuditLogger> {
        &self.audit_logger
    }

    /// Returns the rate limiter.
    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .field("apis", &self.api_catalog.len())
            .finish_non_exhaustive()
    }
}

// =============================================================================
// AppStateBuilder
// =============================================================================

/// Builder for constructing AppState.
///
/// Everything but the configuration has a default: an empty in-memory
/// store, a no-op audit sink, the system clock and the default Argon2 cost.
#[derive(Default)]
pub struct AppStateBuilder {
    config: Option<ApiConfig>,
    store: Option<Arc<dyn CredentialStore>>,
    audit_logger: Option<Arc<dyn AuditLogger>>,
    clock: Option<SharedClock>,
    hasher: Option<PasswordHasher>,
    api_catalog: Option<Vec<ApiEntry>>,
}

impl AppStateBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the configuration.
    pub fn config(mut self, config: ApiConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Sets the credential store.
    pub fn store(mut self, store: Arc<dyn CredentialStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Sets the audit logger.
    pub fn audit_logger(mut self, logger: Arc<dyn AuditLogger>) -> Self {
        self.audit_logger = Some(logger);
        self
    }

    /// Sets the clock.
    pub fn clock(mut self, clock: SharedClock) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Sets the password hasher.
    pub fn hasher(mut self, hasher: PasswordHasher) -> Self {
        self.hasher = Some(hasher);
        self
    }

    /// Overrides the API catalog reported by `/base/userapi`.
    pub fn api_catalog(mut self, catalog: Vec<ApiEntry>) -> Self {
        self.api_catalog = Some(catalog);
        self
    }

    /// Builds the AppState.
    ///
    /// Fails if the JWT configuration is unusable.
    pub fn build(self) -> ApiResult<AppState> {
        let config = self.config.unwrap_or_default();
        let clock = self.clock.unwrap_or_else(SystemClock::shared);
        let store = self
            .store
            .unwrap_or_else(|| Arc::new(InMemoryCredentialStore::with_clock(clock.clone())));
        let audit_logger = self
            .audit_logger
            .unwrap_or_else(|| Arc::new(NoOpAuditLogger::new()));
        let hasher = self.hasher.unwrap_or_default();
        let api_catalog = self.api_catalog.unwrap_or_else(crate::server::api_catalog);

        let jwt = JwtManager::new(config.jwt.clone(), clock.clone())?;
        let sessions = SessionManager::new(
            store.clone(),
            hasher,
            jwt,
            audit_logger.clone(),
            clock.clone(),
        )?;
        let limiter = RateLimiter::new(&config.rate_limit, clock.clone());

        Ok(AppState {
            config: Arc::new(config),
            sessions: Arc::new(sessions),
            store,
            audit_logger,
            limiter: Arc::new(limiter),
            rbac_policy: RbacPolicy::new(),
            clock,
            api_catalog: api_catalog.into(),
        })
    }
}

// =============================================================================
// FromRef implementations for extracting parts of state
// =============================================================================

impl axum::extract::FromRef<AppState> for Arc<SessionManager> {
    fn from_ref(state: &AppState) -> Self {
        state.sessions.clone()
    }
}

impl axum::extract::FromRef<AppState> for Arc<ApiConfig> {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

// =============================================================================
// Tests
// =============================================================================
