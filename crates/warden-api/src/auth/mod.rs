// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Authentication and authorization module.
//!
//! This module provides:
//! - Token codec (JWT creation and verification)
//! - Session/refresh manager (login, rotation, per-request authentication)
//! - Permission evaluator (RBAC over compiled path patterns)
//! - Authentication context and error taxonomy

mod claims;
mod context;
mod error;
mod jwt;
pub mod permission;
mod rbac;
mod session;

pub use claims::{Claims, TokenType};
pub use context::AuthContext;
pub use error::{AuthError, AuthResult};
pub use jwt::{JwtConfig, JwtManager, VerifiedToken, MIN_SECRET_LENGTH};
pub use permission::PermissionSet;
pub use rbac::{AllowReason, Decision, RbacPolicy};
pub use session::{SessionManager, TokenPair};
