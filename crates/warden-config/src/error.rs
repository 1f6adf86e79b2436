// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Configuration error types for warden-config.
//!
//! Every variant is fatal at startup: a service with a bad configuration
//! does not start.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to parse configuration file.
    #[error("Failed to parse config file '{path}': {message}")]
    Parse {
        /// Path to the configuration file.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Configuration validation failed.
    #[error("Validation failed for '{field}': {message}")]
    Validation {
        /// The field that failed validation.
        field: String,
        /// Error message.
        message: String,
    },

    /// Required field is missing.
    #[error("Missing required field: {field}")]
    MissingField {
        /// The missing field name.
        field: String,
    },

    /// File I/O error.
    #[error("Failed to read config file '{path}': {source}")]
    Io {
        /// Path to the file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Invalid environment variable value.
    #[error("Invalid environment variable value for '{name}': {message}")]
    InvalidEnvVar {
        /// The environment variable name.
        name: String,
        /// Error message.
        message: String,
    },

    /// File not found.
    #[error("File not found: {path}")]
    FileNotFound {
        /// The path that was not found.
        path: PathBuf,
    },

    /// Unsupported configuration format.
    #[error("Unsupported configuration format: {format}")]
    UnsupportedFormat {
        /// The unsupported format.
        format: String,
    },

    /// Serialization error.
    #[error("Serialization error: {message}")]
    Serialization {
        /// Error message.
        message: String,
    },
}

impl ConfigError {
    /// Creates a parse error.
    pub fn parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a validation error.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Creates a missing field error.
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }

    /// Creates an I/O error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates an invalid environment variable error.
    pub fn invalid_env_var(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidEnvVar {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Creates a file not found error.
    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    /// Creates an unsupported format error.
    pub fn unsupported_format(format: impl Into<String>) -> Self {
        Self::UnsupportedFormat {
            format: format.into(),
        }
    }

    /// Creates a serialization error.
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Returns a message suitable for operators, with a hint where one helps.
    pub fn user_message(&self) -> String {
        match self {
            Self::MissingField { field } if field.contains("secret") => format!(
                "Missing required field: {field}. Set it in the config file or via WARDEN_SECRET_KEY"
            ),
            Self::FileNotFound { path } => format!(
                "Configuration file not found: {}. Check the path or omit --config to use defaults",
                path.display()
            ),
            other => other.to_string(),
        }
    }

    /// Returns `true` if this error concerns the signing secret.
    pub fn is_secret_error(&self) -> bool {
        match self {
            Self::Validation { field, .. } | Self::MissingField { field } => {
                field.contains("secret")
            }
            _ => false,
        }
    }

    /// Returns `true` if this is an I/O-related error.
    pub fn is_io_error(&self) -> bool {
        matches!(self, Self::Io { .. } | Self::FileNotFound { .. })
    }

    /// Returns a short category name.
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::Parse { .. } => "parse",
            Self::Validation { .. } => "validation",
            Self::MissingField { .. } => "missing_field",
            Self::Io { .. } => "io",
            Self::InvalidEnvVar { .. } => "invalid_env_var",
            Self::FileNotFound { .. } => "file_not_found",
            Self::UnsupportedFormat { .. } => "unsupported_format",
            Self::Serialization { .. } => "serialization",
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_creation() {
        let err = ConfigError::validation("security.jwt.secret_key", "too short");
        assert!(err.to_string().contains("security.jwt.secret_key"));
        assert_eq!(err.error_type(), "validation");
    }

    #[test]
    fn test_secret_hint() {
        let err = ConfigError::missing_field("security.jwt.secret_key");
        assert!(err.is_secret_error());
        assert!(err.user_message().contains("WARDEN_SECRET_KEY"));
    }

    #[test]
    fn test_is_io_error() {
        assert!(ConfigError::file_not_found("/nope.yaml").is_io_error());
        assert!(!ConfigError::serialization("x").is_io_error());
    }
}
