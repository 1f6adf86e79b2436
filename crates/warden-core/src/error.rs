// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Error hierarchy for the credential store and password hashing.
//!
//! Authentication failures (bad password, expired token, ...) are not
//! represented here. They are client-facing outcomes and live in the API
//! crate. `CoreError` covers the collaborators those flows depend on:
//!
//! ```text
//! CoreError
//! ├── NotFound    - lookup of an unknown principal or role
//! ├── Conflict    - uniqueness violation (username, email, role name)
//! ├── Validation  - malformed input rejected by the store
//! ├── Hashing     - password hash could not be produced or parsed
//! └── Storage     - backend failure (I/O, connection, poisoned state)
//! ```

use thiserror::Error;

// =============================================================================
// CoreError
// =============================================================================

/// Errors raised by the credential store and password hasher.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The requested entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Entity kind ("principal", "role").
        entity: &'static str,
        /// Identifier that was looked up.
        id: String,
    },

    /// A uniqueness constraint was violated.
    #[error("Conflict: {message}")]
    Conflict {
        /// Error message.
        message: String,
    },

    /// Input was rejected before reaching storage.
    #[error("Validation failed for '{field}': {message}")]
    Validation {
        /// Field that failed validation.
        field: String,
        /// Error message.
        message: String,
    },

    /// Password hashing failed.
    #[error("Password hashing failed: {message}")]
    Hashing {
        /// Error message.
        message: String,
    },

    /// The storage backend failed.
    #[error("Storage error: {message}")]
    Storage {
        /// Error message.
        message: String,
        /// Underlying error.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl CoreError {
    /// Creates a not found error.
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Creates a conflict error.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
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

    /// Creates a hashing error.
    pub fn hashing(message: impl Into<String>) -> Self {
        Self::Hashing {
            message: message.into(),
        }
    }

    /// Creates a storage error.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a storage error with a source.
    pub fn storage_with<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Storage {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Returns `true` if this is a not found error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns the error type as a string for logging.
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::Conflict { .. } => "conflict",
            Self::Validation { .. } => "validation",
            Self::Hashing { .. } => "hashing",
            Self::Storage { .. } => "storage",
        }
    }
}

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display() {
        let err = CoreError::not_found("principal", 42);
        assert_eq!(err.to_string(), "principal not found: 42");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_storage_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk gone");
        let err = CoreError::storage_with("write failed", io);
        assert!(!err.is_not_found());
        assert_eq!(err.error_type(), "storage");
        assert!(std::error::Error::source(&err).is_some());
    }
}
