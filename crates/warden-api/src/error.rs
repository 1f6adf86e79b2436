// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! API error types and handling.
//!
//! [`ApiError`] maps every failure to an HTTP status and a JSON body:
//!
//! ```json
//! { "code": 401, "error": "TOKEN_EXPIRED", "msg": "Token is invalid or expired", "detail": null }
//! ```
//!
//! `msg` is always the generic, production-safe message. The detailed
//! description travels in the response extensions as [`ErrorDetail`] and is
//! written into `detail` only by the development-mode error layer.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use warden_core::{AuditError, CoreError};

use crate::auth::AuthError;

/// Result type alias for API operations.
pub type ApiResult<T> = Result<T, ApiError>;

// =============================================================================
// ApiError
// =============================================================================

/// API error type with HTTP status code mapping.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Authentication or authorization failure (401/403/429).
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Resource not found (404).
    #[error("Resource not found: {resource}")]
    NotFound {
        /// The resource that was not found.
        resource: String,
    },

    /// Bad request (400).
    #[error("Bad request: {message}")]
    BadRequest {
        /// Error message.
        message: String,
    },

    /// Validation error (422).
    #[error("Validation error: {message}")]
    Validation {
        /// Error message.
        message: String,
    },

    /// Conflict (409).
    #[error("Conflict: {message}")]
    Conflict {
        /// Error message.
        message: String,
    },

    /// Internal server error (500).
    #[error("Internal error: {message}")]
    Internal {
        /// Error message (for logging, not user-facing).
        message: String,
    },
}

impl ApiError {
    // =========================================================================
    // Constructors
    // =========================================================================

    /// Creates a not found error.
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    /// Creates a bad request error.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Creates a conflict error.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    // =========================================================================
    // Properties
    // =========================================================================

    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Auth(e) => e.status_code(),
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Conflict { .. } => StatusCode::CONFLICT,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the error code for categorization.
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::Auth(e) => e.error_code(),
            ApiError::NotFound { .. } => "NOT_FOUND",
            ApiError::BadRequest { .. } => "BAD_REQUEST",
            ApiError::Validation { .. } => "VALIDATION_ERROR",
            ApiError::Conflict { .. } => "CONFLICT",
            ApiError::Internal { .. } => "INTERNAL_ERROR",
        }
    }

    /// Returns the message shown to clients in every mode.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Auth(e) => e.public_message().to_string(),
            ApiError::NotFound { .. } => "Requested resource does not exist".to_string(),
            ApiError::BadRequest { message } => message.clone(),
            ApiError::Validation { .. } => {
                "Request parameter validation failed, please check input format".to_string()
            }
            ApiError::Conflict { message } => message.clone(),
            ApiError::Internal { .. } => {
                "Internal server error, please try again later".to_string()
            }
        }
    }

    /// Returns `true` if this error should be logged at error level.
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }
}

// =============================================================================
// IntoResponse Implementation
// =============================================================================

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code();

        if self.is_server_error() {
            tracing::error!(
                error = %self,
                error_code = error_code,
                status = %status,
                "Server error occurred"
            );
        } else {
            tracing::debug!(
                error = %self,
                error_code = error_code,
                status = %status,
                "Client error occurred"
            );
        }

        let body = ErrorResponseBody {
            code: status.as_u16(),
            error: error_code.to_string(),
            msg: self.user_message(),
            detail: None,
        };
        let detailed = ErrorResponseBody {
            detail: Some(self.to_string()),
            ..body.clone()
        };

        let mut response = (status, Json(body)).into_response();
        response.extensions_mut().insert(ErrorDetail(detailed));

        if status == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(
                header::WWW_AUTHENTICATE,
                HeaderValue::from_static("Bearer"),
            );
        }

        if let ApiError::Auth(auth) = &self {
            if let Some(seconds) = auth.retry_after_secs() {
                response
                    .headers_mut()
                    .insert(header::RETRY_AFTER, HeaderValue::from(seconds));
            }
        }

        response
    }
}

// =============================================================================
// Error Response Body
// =============================================================================

/// Error response body structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponseBody {
    /// HTTP status code.
    pub code: u16,
    /// Error code for programmatic handling.
    pub error: String,
    /// Generic human-readable message.
    pub msg: String,
    /// Detailed description; development mode only.
    pub detail: Option<String>,
}

/// The detailed variant of an error body, attached to error responses as an
/// extension for the development-mode error layer.
#[derive(Debug, Clone)]
pub struct ErrorDetail(pub ErrorResponseBody);

// =============================================================================
// From Implementations
// =============================================================================

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::NotFound { entity, id } => ApiError::not_found(format!("{entity} {id}")),
            CoreError::Conflict { message } => ApiError::conflict(message),
            CoreError::Validation { field, message } => {
                ApiError::validation(format!("{field}: {message}"))
            }
            other => ApiError::internal(format!("{} error: {other}", other.error_type())),
        }
    }
}

impl From<AuditError> for ApiError {
    fn from(err: AuditError) -> Self {
        ApiError::internal(format!("audit: {err}"))
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::bad_request(format!("Invalid JSON: {}", err))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(ApiError::not_found("x").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::bad_request("x").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::from(AuthError::Expired).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::validation("x").status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ApiError::internal("crash").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_internal_message_is_generic() {
        let err = ApiError::internal("connection refused to db-01:5432");
        assert!(!err.user_message().contains("db-01"));
        assert!(err.to_string().contains("db-01"));
    }

    #[test]
    fn test_core_error_mapping() {
        let err: ApiError = CoreError::not_found("principal", 9).into();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);

        let err: ApiError = CoreError::storage("boom").into();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.to_string().contains("storage error"));
        assert!(!err.user_message().contains("boom"));
    }

    #[test]
    fn test_audit_error_is_internal() {
        let err: ApiError = AuditError::query_not_supported("tracing").into();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.to_string().contains("tracing"));
    }

    #[test]
    fn test_response_headers() {
        let resp = ApiError::from(AuthError::MissingToken).into_response();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(resp.headers()[header::WWW_AUTHENTICATE], "Bearer");

        let resp = ApiError::from(AuthError::RateLimited {
            bucket: "login".into(),
            retry_after: Duration::from_secs(42),
        })
        .into_response();
        assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(resp.headers()[header::RETRY_AFTER], "42");
    }

    #[test]
    fn test_detail_attached_as_extension() {
        let resp = ApiError::from(AuthError::Expired).into_response();
        let detail = resp.extensions().get::<ErrorDetail>().unwrap();
        assert_eq!(detail.0.error, "TOKEN_EXPIRED");
        assert_eq!(detail.0.detail.as_deref(), Some("Token has expired"));
    }
}
