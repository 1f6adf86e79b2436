// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! API server implementation.

use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderName, HeaderValue, Method, StatusCode},
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    set_header::SetResponseHeaderLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{info, warn};
use warden_core::seed::{ApiEntry, BASE_MODULE};
use warden_core::{AuditLogger, CredentialStore, PasswordHasher, SharedClock};

use crate::config::{ApiConfig, CorsConfig};
use crate::error::{ApiError, ApiResult};
use crate::handlers;
use crate::middleware::{
    AuditLayer, AuthLayer, ErrorDetailLayer, RateLimitLayer, RbacLayer, LOGIN_BUCKET,
    REFRESH_BUCKET,
};
use crate::state::{AppState, AppStateBuilder};

// =============================================================================
// Paths
// =============================================================================

/// Route paths.
pub mod paths {
    /// Login.
    pub const ACCESS_TOKEN: &str = "/api/v1/base/access_token";
    /// Login, short alias.
    pub const LOGIN: &str = "/login";
    /// Refresh.
    pub const REFRESH_TOKEN: &str = "/api/v1/base/refresh_token";
    /// Refresh, short alias.
    pub const REFRESH: &str = "/refresh";
    /// Current principal.
    pub const USERINFO: &str = "/api/v1/base/userinfo";
    /// APIs the caller may call.
    pub const USERAPI: &str = "/api/v1/base/userapi";
    /// Change password.
    pub const UPDATE_PASSWORD: &str = "/api/v1/base/update_password";
    /// Liveness.
    pub const BASE_HEALTH: &str = "/api/v1/base/health";
    /// Liveness, short alias.
    pub const HEALTH: &str = "/health";
    /// Version.
    pub const VERSION: &str = "/api/v1/base/version";
    /// List principals.
    pub const USER_LIST: &str = "/api/v1/user/list";
    /// Deactivate a principal.
    pub const USER_DEACTIVATE: &str = "/api/v1/user/deactivate";
    /// List roles.
    pub const ROLE_LIST: &str = "/api/v1/role/list";
    /// Query the audit log.
    pub const AUDITLOG_LIST: &str = "/api/v1/auditlog/list";
}

/// Returns the catalog of authenticated APIs, used to seed roles and to
/// answer `/base/userapi`.
pub fn api_catalog() -> Vec<ApiEntry> {
    vec![
        ApiEntry::new("GET", paths::USERINFO, BASE_MODULE, "Current user info"),
        ApiEntry::new("GET", paths::USERAPI, BASE_MODULE, "APIs available to the current user"),
        ApiEntry::new("POST", paths::UPDATE_PASSWORD, BASE_MODULE, "Change password"),
        ApiEntry::new("GET", paths::USER_LIST, "user", "List users"),
        ApiEntry::new("POST", paths::USER_DEACTIVATE, "user", "Deactivate a user"),
        ApiEntry::new("GET", paths::ROLE_LIST, "role", "List roles"),
        ApiEntry::new("GET", paths::AUDITLOG_LIST, "auditlog", "Query the audit log"),
    ]
}

// =============================================================================
// Router
// =============================================================================

/// Builds the application router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let config = state.config.clone();
    let keys = config.rate_limit.client_key.extractor();

    let auth = AuthLayer::new(state.sessions.clone()).with_ip_source(config.rate_limit.client_key);
    let audit = AuditLayer::new(
        state.audit_logger.clone(),
        config.audit.clone(),
        state.clock.clone(),
    );
    let rbac = RbacLayer::new(state.rbac_policy, state.audit_logger.clone(), state.clock.clone());

    // Public, rate limited.
    let login: Router<AppState> = Router::new()
        .route(paths::ACCESS_TOKEN, post(handlers::login))
        .route(paths::LOGIN, post(handlers::login))
        .route_layer(RateLimitLayer::new(
            state.limiter.clone(),
            LOGIN_BUCKET,
            keys.clone(),
        ));
    let refresh: Router<AppState> = Router::new()
        .route(paths::REFRESH_TOKEN, post(handlers::refresh_token))
        .route(paths::REFRESH, post(handlers::refresh_token))
        .route_layer(RateLimitLayer::new(
            state.limiter.clone(),
            REFRESH_BUCKET,
            keys,
        ));

    // Public.
    let public: Router<AppState> = Router::new()
        .route(paths::HEALTH, get(handlers::health))
        .route(paths::BASE_HEALTH, get(handlers::health))
        .route(paths::VERSION, get(handlers::version));

    // Any authenticated principal.
    let base: Router<AppState> = Router::new()
        .route(paths::USERINFO, get(handlers::userinfo))
        .route(paths::USERAPI, get(handlers::userapi))
        .route(paths::UPDATE_PASSWORD, post(handlers::update_password))
        .route_layer(audit.clone())
        .route_layer(auth.clone());

    // Authenticated and authorized. Layers run auth, audit, then RBAC.
    let protected: Router<AppState> = Router::new()
        .route(paths::USER_LIST, get(handlers::list_users))
        .route(paths::USER_DEACTIVATE, post(handlers::deactivate_user))
        .route(paths::ROLE_LIST, get(handlers::list_roles))
        .route(paths::AUDITLOG_LIST, get(handlers::list_audit_logs))
        .route_layer(rbac)
        .route_layer(audit)
        .route_layer(auth);

    let middleware_stack = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_XSS_PROTECTION,
            HeaderValue::from_static("1; mode=block"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::REFERRER_POLICY,
            HeaderValue::from_static("strict-origin-when-cross-origin"),
        ))
        .layer(ErrorDetailLayer::new(config.expose_error_detail))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            config.request_timeout,
        ))
        .layer(create_cors_layer(&config.cors));

    Router::new()
        .merge(login)
        .merge(refresh)
        .merge(public)
        .merge(base)
        .merge(protected)
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(config.max_body_size))
        .layer(middleware_stack)
        .with_state(state)
}

async fn not_found() -> ApiError {
    ApiError::not_found("route")
}

// =============================================================================
// ApiServer
// =============================================================================

/// The API server.
///
/// This is the main entry point for creating and running the HTTP server.
pub struct ApiServer {
    state: AppState,
    config: Arc<ApiConfig>,
}

impl ApiServer {
    /// Creates a new API server with the given state.
    pub fn new(state: AppState) -> Self {
        let config = state.config.clone();
        Self { state, config }
    }

    /// Creates a server builder.
    pub fn builder() -> ApiServerBuilder {
        ApiServerBuilder::new()
    }

    /// Creates the router with all routes and middleware.
    pub fn router(&self) -> Router {
        build_router(self.state.clone())
    }

    /// Returns the shared state.
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Returns the configured server address.
    pub fn addr(&self) -> SocketAddr {
        self.config.socket_addr()
    }

    /// Binds the configured address and runs until `shutdown_signal` fires.
    pub async fn run_with_shutdown(
        self,
        shutdown_signal: impl std::future::Future<Output = ()> + Send + 'static,
    ) -> ApiResult<()> {
        let addr = self.addr();
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ApiError::internal(format!("Failed to bind {addr}: {e}")))?;
        self.serve(listener, shutdown_signal).await
    }

    /// Serves on an already bound listener.
    ///
    /// Once `shutdown_signal` fires, in-flight requests get the configured
    /// shutdown timeout to finish before connections are dropped.
    pub async fn serve(
        self,
        listener: TcpListener,
        shutdown_signal: impl std::future::Future<Output = ()> + Send + 'static,
    ) -> ApiResult<()> {
        let local = listener
            .local_addr()
            .map_err(|e| ApiError::internal(format!("Failed to read local address: {e}")))?;
        let router = self.router();

        let cleanup = self
            .state
            .limiter
            .is_enabled()
            .then(|| self.state.limiter.spawn_cleanup(self.config.rate_limit.cleanup_interval));

        info!(addr = %local, "Starting API server");

        let (fired_tx, fired_rx) = tokio::sync::oneshot::channel::<()>();
        let signal = async move {
            shutdown_signal.await;
            let _ = fired_tx.send(());
        };
        let grace = self.config.shutdown_timeout;
        let deadline = async move {
            match fired_rx.await {
                Ok(()) => tokio::time::sleep(grace).await,
                Err(_) => std::future::pending::<()>().await,
            }
        };

        let server = axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(signal)
        .into_future();

        let result = tokio::select! {
            result = server => {
                result.map_err(|e| ApiError::internal(format!("Server error: {e}")))
            }
            _ = deadline => {
                warn!(grace_secs = grace.as_secs(), "Graceful shutdown timed out, dropping connections");
                Ok(())
            }
        };

        if let Some(handle) = cleanup {
            handle.abort();
        }

        info!("API server shutdown complete");
        result
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Creates the CORS layer from configuration.
///
/// Credentials are never combined with a wildcard origin.
pub fn create_cors_layer(cors: &CorsConfig) -> CorsLayer {
    let wildcard_origin = cors.allows_any_origin();
    let credentials = cors.allow_credentials && !wildcard_origin;
    if cors.allow_credentials && wildcard_origin {
        warn!("CORS credentials ignored because any origin is allowed");
    }

    let mut layer = CorsLayer::new().max_age(Duration::from_secs(cors.max_age));

    // Origins
    layer = if wildcard_origin {
        layer.allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> = cors
            .allowed_origins
            .iter()
            .filter_map(|origin| match origin.parse::<HeaderValue>() {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!(%origin, "Skipping invalid CORS origin");
                    None
                }
            })
            .collect();
        layer.allow_origin(AllowOrigin::list(origins))
    };

    // Methods
    let methods: Vec<Method> = cors
        .allowed_methods
        .iter()
        .filter_map(|m| m.parse().ok())
        .collect();
    layer = layer.allow_methods(methods);

    // Headers
    if cors.allowed_headers.iter().any(|h| h == "*") && !credentials {
        layer = layer.allow_headers(Any);
    } else {
        let headers: Vec<HeaderName> = cors
            .allowed_headers
            .iter()
            .filter_map(|h| h.parse().ok())
            .collect();
        layer = layer.allow_headers(headers);
    }

    // Credentials
    if credentials {
        layer = layer.allow_credentials(true);
    }

    layer
}

// =============================================================================
// Server Builder
// =============================================================================

/// Builder for creating the API server.
#[derive(Default)]
pub struct ApiServerBuilder {
    state_builder: AppStateBuilder,
}

impl ApiServerBuilder {
    /// Creates a new server builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the configuration.
    pub fn config(mut self, config: ApiConfig) -> Self {
        self.state_builder = self.state_builder.config(config);
        self
    }

    /// Sets the credential store.
    pub fn store(mut self, store: Arc<dyn CredentialStore>) -> Self {
        self.state_builder = self.state_builder.store(store);
        self
    }

    /// Sets the audit logger.
    pub fn audit_logger(mut self, logger: Arc<dyn AuditLogger>) -> Self {
        self.state_builder = self.state_builder.audit_logger(logger);
        self
    }

    /// Sets the clock.
    pub fn clock(mut self, clock: SharedClock) -> Self {
        self.state_builder = self.state_builder.clock(clock);
        self
    }

    /// Sets the password hasher.
    pub fn hasher(mut self, hasher: PasswordHasher) -> Self {
        self.state_builder = self.state_builder.hasher(hasher);
        self
    }

    /// Builds the server.
    pub fn build(self) -> ApiResult<ApiServer> {
        let state = self.state_builder.build()?;
        Ok(ApiServer::new(state))
    }
}

// =============================================================================
// Tests
// =============================================================================
