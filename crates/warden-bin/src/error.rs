// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Error types for the Warden binary.
//!
//! Exit codes: 0 ok, 1 general, 2 configuration, 3 initialization,
//! 4 runtime.

use thiserror::Error;

/// Result type alias for warden-bin operations.
pub type BinResult<T> = Result<T, BinError>;

/// Process exit codes.
pub mod exit_code {
    /// Success.
    pub const OK: i32 = 0;
    /// Anything not covered below.
    pub const GENERAL: i32 = 1;
    /// Configuration could not be loaded or failed validation.
    pub const CONFIG: i32 = 2;
    /// Startup failed after configuration was accepted.
    pub const INIT: i32 = 3;
    /// The server failed while running.
    pub const RUNTIME: i32 = 4;
}

/// Errors that can occur in the Warden binary.
#[derive(Debug, Error)]
pub enum BinError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Initialization error.
    #[error("Initialization error: {0}")]
    Initialization(String),

    /// Runtime error.
    #[error("Runtime error: {0}")]
    Runtime(String),

    /// Config loading or validation error.
    #[error("Config error: {}", .0.user_message())]
    Config(#[from] warden_config::ConfigError),

    /// Store or hashing error.
    #[error("Core error: {0}")]
    Core(#[from] warden_core::CoreError),

    /// API error.
    #[error("API error: {0}")]
    Api(#[from] warden_api::ApiError),

    /// Anything else.
    #[error(transparent)]
    Other(#[from] anyhow::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        /// The context description.
        context: String,
        /// The underlying error.
        #[source]
        source: Box<BinError>,
    },
}

impl BinError {
    /// Creates a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Creates an initialization error.
    pub fn init(msg: impl Into<String>) -> Self {
        Self::Initialization(msg.into())
    }

    /// Creates a runtime error.
    pub fn runtime(msg: impl Into<String>) -> Self {
        Self::Runtime(msg.into())
    }

    /// Adds context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        Self::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Returns the exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Configuration(_) | Self::Config(_) => exit_code::CONFIG,
            Self::Initialization(_) | Self::Core(_) => exit_code::INIT,
            Self::Runtime(_) | Self::Api(_) => exit_code::RUNTIME,
            Self::Other(_) => exit_code::GENERAL,
            Self::WithContext { source, .. } => source.exit_code(),
        }
    }
}

impl From<std::io::Error> for BinError {
    fn from(err: std::io::Error) -> Self {
        Self::Other(err.into())
    }
}

// =============================================================================
// Error Reporting
// =============================================================================

/// Reports an error with its cause chain on stderr.
pub fn report_error(error: &BinError) {
    eprintln!("Error: {}", error);

    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        eprintln!("  Caused by: {}", cause);
        source = cause.source();
    }
}

/// Reports an error and exits with the appropriate code.
pub fn report_error_and_exit(error: BinError) -> ! {
    report_error(&error);
    std::process::exit(error.exit_code())
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = BinError::config("test error");
        assert_eq!(err.to_string(), "Configuration error: test error");
    }

    #[test]
    fn test_error_with_context() {
        let err = BinError::init("inner error").with_context("outer context");
        assert_eq!(
            err.to_string(),
            "outer context: Initialization error: inner error"
        );
        assert_eq!(err.exit_code(), exit_code::INIT);
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(BinError::config("test").exit_code(), 2);
        assert_eq!(BinError::init("test").exit_code(), 3);
        assert_eq!(BinError::runtime("test").exit_code(), 4);
        assert_eq!(BinError::from(anyhow::anyhow!("test")).exit_code(), 1);
        assert_eq!(
            BinError::from(warden_config::ConfigError::missing_field("security.jwt.secret_key"))
                .exit_code(),
            2
        );
    }

    #[test]
    fn test_config_error_carries_hint() {
        let err = BinError::from(warden_config::ConfigError::missing_field(
            "security.jwt.secret_key",
        ));
        assert!(err.to_string().contains("WARDEN_SECRET_KEY"));
    }
}
