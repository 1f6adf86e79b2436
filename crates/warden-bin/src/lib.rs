// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # warden-bin
//!
//! CLI binary for the Warden authentication service.
//!
//! - CLI argument parsing with clap
//! - Runtime orchestration: configuration, store seeding, API server
//! - Graceful shutdown on SIGINT/SIGTERM
//! - Logging initialization
//!
//! ## Architecture
//!
//! ```text
//!                   main.rs
//!                      │
//!                   cli.rs
//!                      │
//!          ┌───────────┼───────────┐
//!          ▼           ▼           ▼
//!      commands     runtime     logging
//!                      │
//!                  shutdown
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Start the server (default command)
//! WARDEN_SECRET_KEY=... warden
//!
//! # Start with a config file in development mode
//! warden -c /etc/warden/config.yaml run --dev
//!
//! # Validate configuration
//! warden validate --show
//!
//! # Hash a password, mint a token
//! warden hash-password --password 'correct horse'
//! warden token --user-id 1 --type refresh
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

// =============================================================================
// Modules
// =============================================================================

pub mod cli;
pub mod commands;
pub mod error;
pub mod logging;
pub mod runtime;
pub mod shutdown;

// =============================================================================
// Re-exports
// =============================================================================

pub use cli::{Cli, Commands};
pub use error::{BinError, BinResult};
pub use logging::init_logging;
pub use runtime::{RuntimeBuilder, WardenRuntime};
pub use shutdown::{ShutdownCoordinator, ShutdownSignal};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
