// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Session and refresh management.
//!
//! Per login session the client moves through
//! `Anonymous -> Authenticated -> AccessExpired -> RefreshExpired`; the last
//! state is terminal and requires a fresh login.
//!
//! With rotation tracking on, each login opens its own session in the
//! credential store and the refresh token carries that session's ID and
//! rotation sequence. A refresh must present the session's current sequence
//! and advances it atomically. A stale sequence is reuse and revokes that
//! session only; the principal's other sessions keep working. Password
//! changes and deactivation revoke every session.

use std::net::IpAddr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};
use warden_core::password::validate_password;
use warden_core::{
    ActionResult, AuditAction, AuditLog, AuditLogger, CredentialStore, PasswordHasher, Principal,
    RefreshRotation, SessionAdvance, SharedClock,
};

use super::claims::{Claims, TokenType};
use super::context::AuthContext;
use super::error::AuthError;
use super::jwt::JwtManager;
use crate::error::{ApiError, ApiResult};

const DUMMY_PASSWORD: &str = "warden-timing-equalizer";

// =============================================================================
// Token Pair
// =============================================================================

/// A freshly minted access and refresh token pair.
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    /// Access token.
    pub access_token: String,
    /// Refresh token.
    pub refresh_token: String,
    /// Login name of the subject.
    pub username: String,
    /// Always `bearer`.
    pub token_type: &'static str,
    /// Access-token lifetime in seconds.
    pub expires_in: u64,
    /// Access-token claims.
    #[serde(skip)]
    pub access_claims: Claims,
    /// Refresh-token claims.
    #[serde(skip)]
    pub refresh_claims: Claims,
}

// =============================================================================
// SessionManager
// =============================================================================

/// Issues, rotates and checks tokens against the credential store.
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn CredentialStore>,
    hasher: PasswordHasher,
    jwt: JwtManager,
    audit: Arc<dyn AuditLogger>,
    clock: SharedClock,
    dummy_hash: Arc<str>,
}

impl SessionManager {
    /// Creates a session manager.
    ///
    /// Hashes a throwaway password once so that logins for unknown usernames
    /// cost the same as logins with a wrong password.
    pub fn new(
        store: Arc<dyn CredentialStore>,
        hasher: PasswordHasher,
        jwt: JwtManager,
        audit: Arc<dyn AuditLogger>,
        clock: SharedClock,
    ) -> ApiResult<Self> {
        let dummy_hash = hasher.hash(DUMMY_PASSWORD)?;
        Ok(Self {
            store,
            hasher,
            jwt,
            audit,
            clock,
            dummy_hash: Arc::from(dummy_hash),
        })
    }

    /// Verifies credentials and mints a token pair.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
        client_ip: Option<IpAddr>,
    ) -> ApiResult<TokenPair> {
        let principal = self.store.find_by_username(username).await?;

        // Exactly one verification runs whether or not the user exists.
        let hash = principal
            .as_ref()
            .map(|p| p.password_hash.clone())
            .unwrap_or_else(|| self.dummy_hash.to_string());
        let matched = self
            .hasher
            .verify_blocking(password.to_string(), hash)
            .await?;

        let principal = match principal {
            Some(p) if matched => p,
            found => {
                let reason = if found.is_some() {
                    "wrong password"
                } else {
                    "unknown username"
                };
                debug!(username, reason, "Login rejected");
                self.record(AuditLog::login_failed(username, client_ip, reason))
                    .await;
                return Err(AuthError::InvalidCredentials.into());
            }
        };

        if !principal.is_active {
            self.record(AuditLog::login_failed(username, client_ip, "account inactive"))
                .await;
            return Err(AuthError::AccountInactive {
                username: principal.username,
            }
            .into());
        }

        self.store.record_login(principal.id, self.clock.now()).await?;
        let rotation = if self.jwt.tracks_rotation() {
            Some(
                self.store
                    .open_session(principal.id, self.refresh_expiry()?)
                    .await?,
            )
        } else {
            None
        };
        let pair = self.issue_pair(&principal, rotation)?;

        info!(user_id = %principal.id, username = %principal.username, "Login succeeded");
        self.record(AuditLog::login(principal.id, &principal.username, client_ip))
            .await;
        Ok(pair)
    }

    /// Validates a refresh token and rotates it into a new pair.
    pub async fn refresh(
        &self,
        refresh_token: &str,
        client_ip: Option<IpAddr>,
    ) -> ApiResult<TokenPair> {
        let outcome = self.try_refresh(refresh_token).await;

        let entry = match &outcome {
            Ok((principal, _)) => AuditLog::token_refresh(
                Some(principal.id.to_string()),
                client_ip,
                ActionResult::Success,
            )
            .with_username(principal.username.clone()),
            Err(e) => {
                AuditLog::token_refresh(None, client_ip, ActionResult::failure(e.to_string()))
            }
        };
        self.record(entry).await;

        outcome.map(|(_, pair)| pair)
    }

    async fn try_refresh(&self, refresh_token: &str) -> ApiResult<(Principal, TokenPair)> {
        let verified = self.jwt.verify(refresh_token, TokenType::Refresh)?;

        let principal = self
            .store
            .get_principal(verified.subject)
            .await?
            .ok_or_else(|| AuthError::invalid_token("subject no longer exists"))?;
        if !principal.is_active {
            return Err(AuthError::AccountInactive {
                username: principal.username,
            }
            .into());
        }

        let rotation = if self.jwt.tracks_rotation() {
            let presented = verified
                .claims
                .rotation()
                .ok_or_else(|| AuthError::invalid_token("refresh token is not bound to a session"))?;

            match self
                .store
                .advance_session(principal.id, presented, self.refresh_expiry()?)
                .await?
            {
                SessionAdvance::Advanced(seq) => Some(RefreshRotation { seq, ..presented }),
                SessionAdvance::Reused => {
                    warn!(
                        user_id = %principal.id,
                        session = %presented.session,
                        presented = presented.seq,
                        "Refresh token reuse detected, revoking session"
                    );
                    return Err(AuthError::invalid_token("refresh token was already rotated").into());
                }
                SessionAdvance::Unknown => {
                    return Err(AuthError::invalid_token("session has been revoked").into());
                }
            }
        } else {
            None
        };

        let pair = self.issue_pair(&principal, rotation)?;
        debug!(user_id = %principal.id, "Token pair rotated");
        Ok((principal, pair))
    }

    /// Verifies an access token and builds the request's auth context.
    ///
    /// The subject must still exist and be active.
    pub async fn authenticate(
        &self,
        access_token: &str,
        client_ip: Option<IpAddr>,
    ) -> ApiResult<AuthContext> {
        let verified = self.jwt.verify(access_token, TokenType::Access)?;

        let principal = self
            .store
            .get_principal(verified.subject)
            .await?
            .ok_or_else(|| AuthError::invalid_token("subject no longer exists"))?;
        if !principal.is_active {
            return Err(AuthError::AccountInactive {
                username: principal.username,
            }
            .into());
        }

        let roles = self.store.roles_for(&principal).await?;
        Ok(AuthContext::new(&principal, &roles).with_client_ip(client_ip))
    }

    /// Changes a principal's password and kills outstanding refresh tokens.
    pub async fn change_password(
        &self,
        ctx: &AuthContext,
        old_password: &str,
        new_password: &str,
    ) -> ApiResult<()> {
        validate_password(new_password)?;

        let principal = self
            .store
            .get_principal(ctx.user_id)
            .await?
            .ok_or_else(|| ApiError::not_found(format!("principal {}", ctx.user_id)))?;

        let matched = self
            .hasher
            .verify_blocking(old_password.to_string(), principal.password_hash.clone())
            .await?;
        if !matched {
            self.record(
                AuditLog::new(
                    AuditAction::PasswordChange,
                    "principal",
                    ActionResult::failure("old password mismatch"),
                )
                .with_user(principal.id, Some(&principal.username))
                .with_client_ip(ctx.client_ip),
            )
            .await;
            return Err(ApiError::bad_request("Old password is incorrect"));
        }

        let hash = self.hasher.hash_blocking(new_password.to_string()).await?;
        self.store.update_password_hash(principal.id, hash).await?;
        let revoked = self.store.revoke_sessions(principal.id).await?;

        info!(user_id = %principal.id, revoked, "Password changed");
        self.record(
            AuditLog::new(AuditAction::PasswordChange, "principal", ActionResult::Success)
                .with_user(principal.id, Some(&principal.username))
                .with_client_ip(ctx.client_ip),
        )
        .await;
        Ok(())
    }

    /// Returns the token codec.
    pub fn jwt(&self) -> &JwtManager {
        &self.jwt
    }

    /// Returns the credential store.
    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.store
    }

    /// Returns the audit sink.
    pub fn audit(&self) -> &Arc<dyn AuditLogger> {
        &self.audit
    }

    // =========================================================================
    // Internal
    // =========================================================================

    /// Expiry of a refresh token minted now.
    fn refresh_expiry(&self) -> ApiResult<DateTime<Utc>> {
        let ttl = i64::try_from(self.jwt.config().refresh_ttl_secs).unwrap_or(i64::MAX);
        DateTime::from_timestamp(self.clock.unix_timestamp().saturating_add(ttl), 0)
            .ok_or_else(|| ApiError::internal("refresh expiry out of range"))
    }

    fn issue_pair(
        &self,
        principal: &Principal,
        rotation: Option<RefreshRotation>,
    ) -> ApiResult<TokenPair> {
        let (access_token, access_claims) = self.jwt.create_access_token(principal.id)?;
        let (refresh_token, refresh_claims) =
            self.jwt.create_refresh_token(principal.id, rotation)?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            username: principal.username.clone(),
            token_type: "bearer",
            expires_in: self.jwt.access_ttl_secs(),
            access_claims,
            refresh_claims,
        })
    }

    async fn record(&self, entry: AuditLog) {
        let entry = entry.at(self.clock.now());
        if let Err(e) = self.audit.log(entry).await {
            warn!(error = %e, "Failed to write audit entry");
        }
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("store", &self.store.name())
            .field("audit", &self.audit.name())
            .field("jwt", &self.jwt)
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
