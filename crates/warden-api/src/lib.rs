// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # warden-api
//!
//! HTTP authentication and authorization service for Warden.
//!
//! This crate provides:
//!
//! - **Token codec**: signed access/refresh tokens with an injectable clock
//! - **Sessions**: login, refresh-token rotation with reuse detection,
//!   password change
//! - **RBAC**: method and path-pattern permissions evaluated once per request
//! - **Rate limiting**: per-client fixed windows on login and refresh
//! - **Server**: axum router, tower middleware and handlers
//!
//! ## Example
//!
//! ```rust,ignore
//! use warden_api::{ApiConfig, ApiServer, JwtConfig};
//!
//! let config = ApiConfig::default().with_jwt(JwtConfig::new(secret));
//! let server = ApiServer::builder().config(config).store(store).build()?;
//! server.run_with_shutdown(shutdown_signal()).await?;
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod auth;
pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod server;
pub mod state;

pub use auth::{
    AuthContext, AuthError, Claims, Decision, JwtConfig, JwtManager, PermissionSet, RbacPolicy,
    SessionManager, TokenPair, TokenType,
};
pub use config::{ApiConfig, AuditConfig, CorsConfig};
pub use error::{ApiError, ApiResult, ErrorResponseBody};
pub use middleware::{BucketConfig, ClientKeySource, RateLimitConfig, RateLimiter};
pub use response::{ApiResponse, PageResponse};
pub use server::{api_catalog, build_router, paths, ApiServer, ApiServerBuilder};
pub use state::AppState;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
