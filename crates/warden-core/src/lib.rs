// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # warden-core
//!
//! Core abstractions and shared types for the Warden authentication service.
//!
//! This crate holds everything that does not speak HTTP:
//!
//! - **Types**: `Principal`, `Role`, `Permission` and their identifiers
//! - **Store**: the `CredentialStore` trait, login-session bookkeeping and an
//!   in-memory implementation
//! - **Password**: Argon2 password hashing with constant-time verification
//! - **Clock**: injectable time source shared by token and rate-limit logic
//! - **Audit**: security audit logging
//! - **Error**: store and hashing error hierarchy
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use warden_core::{InMemoryCredentialStore, PasswordHasher, seed};
//!
//! let store = Arc::new(InMemoryCredentialStore::new());
//! let hasher = PasswordHasher::default();
//! seed::seed_defaults(store.as_ref(), &hasher, &seed::SeedOptions::default()).await?;
//!
//! let admin = store.find_by_username("admin").await?.unwrap();
//! assert!(admin.is_superuser);
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]

// =============================================================================
// Core Modules
// =============================================================================

pub mod clock;
pub mod error;
pub mod types;

// =============================================================================
// Credential Modules
// =============================================================================

pub mod password;
pub mod seed;
pub mod store;

// =============================================================================
// Audit
// =============================================================================

pub mod audit;

// =============================================================================
// Re-exports for convenience
// =============================================================================

pub use clock::{Clock, ManualClock, SharedClock, SystemClock};
pub use error::{CoreError, CoreResult};
pub use password::PasswordHasher;
pub use store::{CredentialStore, InMemoryCredentialStore, SessionAdvance};
pub use types::{
    NewPrincipal, Permission, Principal, PrincipalId, PrincipalView, RefreshRotation, Role,
    RoleId, SessionId,
};

pub use audit::{
    ActionResult, AuditAction, AuditError, AuditFilter, AuditLog, AuditLogger, AuditResult,
    InMemoryAuditLogger, NoOpAuditLogger, TeeLogger, TracingAuditLogger,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
