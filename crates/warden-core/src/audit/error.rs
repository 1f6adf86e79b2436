// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Audit error types.

use thiserror::Error;

/// Errors that can occur during audit logging.
#[derive(Debug, Error)]
pub enum AuditError {
    /// Failed to write audit log.
    #[error("Failed to write audit log: {message}")]
    WriteFailed {
        /// Error message.
        message: String,
    },

    /// Query not supported by this logger.
    #[error("Query not supported by this logger: {logger_type}")]
    QueryNotSupported {
        /// The type of logger that doesn't support queries.
        logger_type: String,
    },

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AuditError {
    /// Creates a write failed error.
    pub fn write_failed(message: impl Into<String>) -> Self {
        Self::WriteFailed {
            message: message.into(),
        }
    }

    /// Creates a query-not-supported error.
    pub fn query_not_supported(logger_type: impl Into<String>) -> Self {
        Self::QueryNotSupported {
            logger_type: logger_type.into(),
        }
    }
}

/// Result type for audit operations.
pub type AuditResult<T> = Result<T, AuditError>;
