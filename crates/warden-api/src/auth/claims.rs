// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! JWT claims structure.
//!
//! The wire payload is exactly:
//!
//! ```json
//! { "sub": "1", "type": "access", "iat": 1700000000, "exp": 1700014400 }
//! ```
//!
//! plus `"sid"` (login session) and `"seq"` (rotation sequence) on refresh
//! tokens when rotation tracking is enabled.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use warden_core::{PrincipalId, RefreshRotation, SessionId};

use super::error::{AuthError, AuthResult};

// =============================================================================
// TokenType
// =============================================================================

/// Distinguishes access tokens from refresh tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    /// Short-lived token authorizing individual requests.
    Access,
    /// Long-lived token used only to mint new pairs.
    Refresh,
}

impl TokenType {
    /// Returns the wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::Access => "access",
            TokenType::Refresh => "refresh",
        }
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TokenType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "access" => Ok(TokenType::Access),
            "refresh" => Ok(TokenType::Refresh),
            other => Err(format!("unknown token type: {other}")),
        }
    }
}

// =============================================================================
// Claims
// =============================================================================

/// JWT claims carried by every Warden token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the decimal principal ID.
    pub sub: String,

    /// Token type tag.
    #[serde(rename = "type")]
    pub token_type: TokenType,

    /// Issued at (Unix seconds).
    pub iat: i64,

    /// Expiry (Unix seconds). The token is valid while `now < exp`.
    pub exp: i64,

    /// Login session a refresh token belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sid: Option<SessionId>,

    /// Rotation sequence within the session.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seq: Option<u64>,
}

impl Claims {
    /// Creates claims issued at `issued_at` and expiring `ttl` later.
    pub fn new(
        subject: PrincipalId,
        token_type: TokenType,
        issued_at: i64,
        ttl: Duration,
    ) -> Self {
        let ttl_secs = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
        Self {
            sub: subject.to_string(),
            token_type,
            iat: issued_at,
            exp: issued_at.saturating_add(ttl_secs),
            sid: None,
            seq: None,
        }
    }

    /// Binds the token to a session position.
    pub fn with_rotation(mut self, rotation: RefreshRotation) -> Self {
        self.sid = Some(rotation.session);
        self.seq = Some(rotation.seq);
        self
    }

    /// Returns the session position, if the token carries a complete one.
    pub fn rotation(&self) -> Option<RefreshRotation> {
        Some(RefreshRotation {
            session: self.sid?,
            seq: self.seq?,
        })
    }

    /// Parses the subject into a principal ID.
    pub fn principal_id(&self) -> AuthResult<PrincipalId> {
        self.sub
            .parse()
            .map_err(|_| AuthError::invalid_token("subject is not a principal id"))
    }

    /// Returns `true` if the token has expired at `now` (Unix seconds).
    pub fn is_expired_at(&self, now: i64) -> bool {
        now >= self.exp
    }
}

// =============================================================================
// Tests
// =============================================================================
