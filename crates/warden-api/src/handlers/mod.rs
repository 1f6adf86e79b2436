// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! API handlers for all endpoints.
//!
//! - [`health`]: Health check endpoint
//! - [`auditlog`]: Audit log queries
//! - [`auth`]: Login and refresh
//! - [`base`]: Self-service endpoints for any authenticated principal
//! - [`users`]: Principal administration
//! - [`roles`]: Role listing

mod auditlog;
mod auth;
mod base;
mod health;
mod roles;
mod users;

pub use auditlog::*;
pub use auth::*;
pub use base::*;
pub use health::*;
pub use roles::*;
pub use users::*;
