// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Middleware implementations for the API server.
//!
//! This module provides a layered middleware stack for security and observability:
//!
//! - [`AuthMiddleware`]: bearer-token authentication
//! - [`RbacLayer`]: role-based access control
//! - [`RateLimitLayer`]: per-client rate limiting
//! - [`AuditMiddleware`]: audit logging
//! - [`ErrorDetailLayer`]: development-mode error bodies

mod auth;
pub mod audit;
mod error_detail;
mod rbac;
pub mod rate_limit;

pub use auth::{client_ip, extract_bearer_token, AuthLayer, AuthMiddleware, REQUEST_ID_HEADER};
pub use audit::{AuditLayer, AuditMiddleware};
pub use error_detail::{ErrorDetailLayer, ErrorDetailMiddleware};
pub use rbac::{RbacLayer, RbacMiddleware};
pub use rate_limit::{
    BucketConfig, ClientKeyExtractor, ClientKeySource, RateLimitConfig, RateLimitLayer,
    RateLimitResult, RateLimiter, LOGIN_BUCKET, REFRESH_BUCKET,
};
