// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Warden Integration Tests
//!
//! End-to-end tests for the Warden authentication service, plus the
//! utilities they share.
//!
//! ## Module Structure
//!
//! - [`common`]: Shared test utilities
//!   - `fixtures`: Well-known credentials and configurations
//!   - `builders`: Builders for principals and roles
//!   - `assertions`: Response assertion helpers
//!   - `mocks`: Failing store for error-path tests
//!   - `harness`: A router wired to an in-memory store and a manual clock
//!
//! ## Running Tests
//!
//! ```bash
//! # Run all integration tests
//! cargo test -p warden-tests
//!
//! # Run specific test suite
//! cargo test -p warden-tests --test integration_auth
//! cargo test -p warden-tests --test integration_api
//! cargo test -p warden-tests --test integration_config
//!
//! # Run with verbose output
//! cargo test -p warden-tests -- --nocapture
//! ```
//!
//! ## Test Categories
//!
//! ### Auth Tests (`integration_auth.rs`)
//! - Token issuance and verification
//! - Refresh rotation and reuse detection
//! - RBAC decisions against seeded roles
//!
//! ### API Tests (`integration_api.rs`)
//! - Login, refresh and protected routes over HTTP
//! - Rate limiting with a manual clock
//! - Error envelopes, security headers and health
//!
//! ### Config Tests (`integration_config.rs`)
//! - YAML, TOML and JSON loading
//! - Environment overrides and placeholders
//! - Validation rules
//!
//! ## Writing New Tests
//!
//! ```rust,ignore
//! use warden_tests::prelude::*;
//!
//! #[tokio::test]
//! async fn test_something() {
//!     let app = TestApp::new().await;
//!     let pair = app.login_ok(ADMIN_USERNAME, ADMIN_PASSWORD).await;
//!     let response = app.get(paths::USERINFO, Some(&pair.access_token)).await;
//!     response.assert_status(StatusCode::OK);
//! }
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod common;

/// Re-export commonly used items for convenience.
pub mod prelude {
    pub use crate::common::assertions::*;
    pub use crate::common::builders::*;
    pub use crate::common::fixtures::*;
    pub use crate::common::harness::*;
    pub use crate::common::mocks::*;
    pub use crate::common::{init_test_logging, temp_test_dir};

    pub use axum::http::StatusCode;
    pub use warden_api::paths;
}
