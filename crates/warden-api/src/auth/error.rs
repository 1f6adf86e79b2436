// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Authentication and authorization failures.
//!
//! Every variant is a client-facing outcome. The `Display` text is the
//! detailed, internal description (logged, and shown only in development
//! mode); [`AuthError::public_message`] is what production clients see.

use std::time::Duration;

use axum::http::StatusCode;
use thiserror::Error;

use super::claims::TokenType;

/// Authentication and authorization error taxonomy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// Username unknown or password wrong. The two are indistinguishable.
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// The principal exists and the password matched, but it is deactivated.
    #[error("Account '{username}' is inactive")]
    AccountInactive {
        /// Login name of the inactive principal.
        username: String,
    },

    /// No bearer token was presented.
    #[error("Missing bearer token")]
    MissingToken,

    /// The token MAC did not verify.
    #[error("Token signature is invalid")]
    InvalidSignature,

    /// The token is malformed, names an unknown subject, or was rotated out.
    #[error("Invalid token: {reason}")]
    InvalidToken {
        /// Why the token was rejected.
        reason: String,
    },

    /// The token's expiry has passed.
    #[error("Token has expired")]
    Expired,

    /// A refresh token was used where an access token was expected, or the
    /// other way round.
    #[error("Wrong token type: expected {expected}, got {actual}")]
    WrongTokenType {
        /// Type the caller required.
        expected: TokenType,
        /// Type carried by the token.
        actual: TokenType,
    },

    /// The permission evaluator denied the request.
    #[error("Permission denied: {method} {path}")]
    PermissionDenied {
        /// Request method.
        method: String,
        /// Request path.
        path: String,
    },

    /// The caller lacks an action permission a handler requires.
    #[error("Action not permitted: {action}")]
    ActionDenied {
        /// Required action name.
        action: String,
    },

    /// Too many attempts in the current window.
    #[error("Rate limit exceeded for bucket '{bucket}', retry in {}s", retry_after.as_secs())]
    RateLimited {
        /// Bucket name.
        bucket: String,
        /// Time until the next attempt is allowed.
        retry_after: Duration,
    },
}

impl AuthError {
    /// Creates an invalid token error.
    pub fn invalid_token(reason: impl Into<String>) -> Self {
        Self::InvalidToken {
            reason: reason.into(),
        }
    }

    /// Returns the HTTP status for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::PermissionDenied { .. } | Self::ActionDenied { .. } => StatusCode::FORBIDDEN,
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::UNAUTHORIZED,
        }
    }

    /// Returns the machine-readable error code.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::AccountInactive { .. } => "ACCOUNT_INACTIVE",
            Self::MissingToken => "MISSING_TOKEN",
            Self::InvalidSignature => "INVALID_SIGNATURE",
            Self::InvalidToken { .. } => "INVALID_TOKEN",
            Self::Expired => "TOKEN_EXPIRED",
            Self::WrongTokenType { .. } => "WRONG_TOKEN_TYPE",
            Self::PermissionDenied { .. } | Self::ActionDenied { .. } => "PERMISSION_DENIED",
            Self::RateLimited { .. } => "RATE_LIMITED",
        }
    }

    /// Returns the message safe to show in production.
    ///
    /// Token failures share one message. The machine-readable
    /// [`error_code`](Self::error_code) still names the failed check, so a
    /// client can tell an expired token, which a refresh fixes, from one
    /// that needs a new login.
    pub fn public_message(&self) -> &'static str {
        match self {
            Self::InvalidCredentials => "Incorrect username or password",
            Self::AccountInactive { .. } => "Account is disabled",
            Self::MissingToken => "Authentication required",
            Self::InvalidSignature
            | Self::InvalidToken { .. }
            | Self::Expired
            | Self::WrongTokenType { .. } => "Token is invalid or expired",
            Self::PermissionDenied { .. } | Self::ActionDenied { .. } => "Permission denied",
            Self::RateLimited { .. } => "Too many requests, please try again later",
        }
    }

    /// Returns the retry hint in whole seconds (at least 1), if any.
    pub fn retry_after_secs(&self) -> Option<u64> {
        match self {
            Self::RateLimited { retry_after, .. } => {
                let secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
                Some(secs.max(1))
            }
            _ => None,
        }
    }
}

/// Result type for authentication operations.
pub type AuthResult<T> = Result<T, AuthError>;
