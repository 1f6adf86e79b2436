// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Token codec.
//!
//! Mints and verifies HMAC-signed JWTs. Verification is pure computation:
//! signature, then expiry against the injected clock, then the type tag.
//! Nothing here touches the credential store.

use std::sync::Arc;
use std::time::Duration;

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use warden_core::{PrincipalId, RefreshRotation, SharedClock};

use super::claims::{Claims, TokenType};
use super::error::{AuthError, AuthResult};
use crate::error::{ApiError, ApiResult};

/// Minimum secret length in bytes.
pub const MIN_SECRET_LENGTH: usize = 32;

/// Default access-token lifetime (4 hours).
pub const DEFAULT_ACCESS_TTL_SECS: u64 = 4 * 3600;

/// Default refresh-token lifetime (7 days).
pub const DEFAULT_REFRESH_TTL_SECS: u64 = 7 * 86400;

// =============================================================================
// JwtConfig
// =============================================================================

/// JWT configuration.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JwtConfig {
    /// Secret key for signing tokens.
    #[serde(skip_serializing)]
    pub secret: String,
    /// Access-token lifetime in seconds.
    pub access_ttl_secs: u64,
    /// Refresh-token lifetime in seconds.
    pub refresh_ttl_secs: u64,
    /// HMAC algorithm.
    #[serde(with = "algorithm_serde")]
    pub algorithm: Algorithm,
    /// Clock skew tolerance in seconds.
    pub leeway_secs: u64,
    /// Bind refresh tokens to a login session and rotation sequence so each
    /// one works exactly once.
    pub track_refresh_rotation: bool,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            access_ttl_secs: DEFAULT_ACCESS_TTL_SECS,
            refresh_ttl_secs: DEFAULT_REFRESH_TTL_SECS,
            algorithm: Algorithm::HS256,
            leeway_secs: 0,
            track_refresh_rotation: true,
        }
    }
}

impl JwtConfig {
    /// Creates a new configuration with the given secret.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            ..Default::default()
        }
    }

    /// Sets both lifetimes.
    pub fn with_ttls(mut self, access: Duration, refresh: Duration) -> Self {
        self.access_ttl_secs = access.as_secs();
        self.refresh_ttl_secs = refresh.as_secs();
        self
    }

    /// Enables or disables rotation tracking.
    pub fn with_rotation_tracking(mut self, enabled: bool) -> Self {
        self.track_refresh_rotation = enabled;
        self
    }

    /// Access-token lifetime.
    pub fn access_ttl(&self) -> Duration {
        Duration::from_secs(self.access_ttl_secs)
    }

    /// Refresh-token lifetime.
    pub fn refresh_ttl(&self) -> Duration {
        Duration::from_secs(self.refresh_ttl_secs)
    }

    /// Validates the configuration. Any failure here is fatal at startup.
    pub fn validate(&self) -> ApiResult<()> {
        if self.secret.is_empty() {
            return Err(ApiError::internal("JWT secret is not configured"));
        }
        if self.secret.len() < MIN_SECRET_LENGTH {
            return Err(ApiError::internal(format!(
                "JWT secret must be at least {MIN_SECRET_LENGTH} bytes"
            )));
        }
        if !matches!(
            self.algorithm,
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512
        ) {
            return Err(ApiError::internal("Only HMAC algorithms are supported"));
        }
        if self.access_ttl_secs == 0 || self.refresh_ttl_secs == 0 {
            return Err(ApiError::internal("Token lifetimes must be non-zero"));
        }
        Ok(())
    }
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"[REDACTED]")
            .field("access_ttl_secs", &self.access_ttl_secs)
            .field("refresh_ttl_secs", &self.refresh_ttl_secs)
            .field("algorithm", &self.algorithm)
            .field("leeway_secs", &self.leeway_secs)
            .field("track_refresh_rotation", &self.track_refresh_rotation)
            .finish()
    }
}

// =============================================================================
// VerifiedToken
// =============================================================================

/// A token that passed verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedToken {
    /// Parsed subject.
    pub subject: PrincipalId,
    /// Full claims.
    pub claims: Claims,
}

// =============================================================================
// JwtManager
// =============================================================================

/// Creates and verifies tokens.
#[derive(Clone)]
pub struct JwtManager {
    config: Arc<JwtConfig>,
    encoding_key: Arc<EncodingKey>,
    decoding_key: Arc<DecodingKey>,
    validation: Arc<Validation>,
    clock: SharedClock,
}

impl JwtManager {
    /// Creates a new JWT manager with the given configuration and clock.
    pub fn new(config: JwtConfig, clock: SharedClock) -> ApiResult<Self> {
        config.validate()?;

        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        // Expiry is checked against our clock, not jsonwebtoken's.
        let mut validation = Validation::new(config.algorithm);
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Ok(Self {
            config: Arc::new(config),
            encoding_key: Arc::new(encoding_key),
            decoding_key: Arc::new(decoding_key),
            validation: Arc::new(validation),
            clock,
        })
    }

    /// Signs the given claims.
    pub fn encode_claims(&self, claims: &Claims) -> ApiResult<String> {
        let header = Header::new(self.config.algorithm);
        encode(&header, claims, &self.encoding_key)
            .map_err(|e| ApiError::internal(format!("Failed to create token: {}", e)))
    }

    /// Creates a token for `subject` of `token_type` that expires after `ttl`.
    pub fn create(
        &self,
        subject: PrincipalId,
        token_type: TokenType,
        ttl: Duration,
    ) -> ApiResult<String> {
        let claims = Claims::new(subject, token_type, self.clock.unix_timestamp(), ttl);
        self.encode_claims(&claims)
    }

    /// Creates an access token with the configured lifetime.
    pub fn create_access_token(&self, subject: PrincipalId) -> ApiResult<(String, Claims)> {
        let claims = Claims::new(
            subject,
            TokenType::Access,
            self.clock.unix_timestamp(),
            self.config.access_ttl(),
        );
        Ok((self.encode_claims(&claims)?, claims))
    }

    /// Creates a refresh token with the configured lifetime, bound to
    /// `rotation` when given.
    pub fn create_refresh_token(
        &self,
        subject: PrincipalId,
        rotation: Option<RefreshRotation>,
    ) -> ApiResult<(String, Claims)> {
        let mut claims = Claims::new(
            subject,
            TokenType::Refresh,
            self.clock.unix_timestamp(),
            self.config.refresh_ttl(),
        );
        if let Some(rotation) = rotation {
            claims = claims.with_rotation(rotation);
        }
        Ok((self.encode_claims(&claims)?, claims))
    }

    /// Verifies signature, expiry and type, in that order.
    pub fn verify(&self, token: &str, expected: TokenType) -> AuthResult<VerifiedToken> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature => AuthError::InvalidSignature,
                ErrorKind::ExpiredSignature => AuthError::Expired,
                ErrorKind::InvalidAlgorithm => AuthError::invalid_token("unexpected algorithm"),
                ErrorKind::MissingRequiredClaim(claim) => {
                    AuthError::invalid_token(format!("missing claim '{claim}'"))
                }
                _ => AuthError::invalid_token(format!("malformed token: {e}")),
            })?;

        let now = self.clock.unix_timestamp();
        let leeway = i64::try_from(self.config.leeway_secs).unwrap_or(i64::MAX);
        if claims.is_expired_at(now.saturating_sub(leeway)) {
            return Err(AuthError::Expired);
        }

        if claims.token_type != expected {
            return Err(AuthError::WrongTokenType {
                expected,
                actual: claims.token_type,
            });
        }

        let subject = claims.principal_id()?;
        Ok(VerifiedToken { subject, claims })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &JwtConfig {
        &self.config
    }

    /// Returns the access-token lifetime in seconds.
    pub fn access_ttl_secs(&self) -> u64 {
        self.config.access_ttl_secs
    }

    /// Returns `true` if refresh rotation is tracked.
    pub fn tracks_rotation(&self) -> bool {
        self.config.track_refresh_rotation
    }
}

impl std::fmt::Debug for JwtManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtManager")
            .field("algorithm", &self.config.algorithm)
            .field("access_ttl_secs", &self.config.access_ttl_secs)
            .field("refresh_ttl_secs", &self.config.refresh_ttl_secs)
            .finish()
    }
}

// =============================================================================
// Algorithm Serialization
// =============================================================================

mod algorithm_serde {
    use jsonwebtoken::Algorithm;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(algorithm: &Algorithm, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let s = match algorithm {
            Algorithm::HS256 => "HS256",
            Algorithm::HS384 => "HS384",
            Algorithm::HS512 => "HS512",
            _ => "unsupported",
        };
        s.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Algorithm, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        match s.to_ascii_uppercase().as_str() {
            "HS256" => Ok(Algorithm::HS256),
            "HS384" => Ok(Algorithm::HS384),
            "HS512" => Ok(Algorithm::HS512),
            _ => Err(serde::de::Error::custom(format!(
                "Unsupported algorithm: {} (expected HS256, HS384 or HS512)",
                s
            ))),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
