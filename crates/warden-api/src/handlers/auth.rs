// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Token issuing handlers.

use axum::{extract::State, response::IntoResponse};
use serde::Deserialize;

use crate::error::{ApiError, ApiResult};
use crate::extractors::{ClientIp, Validate, ValidatedJson};
use crate::response::ApiResponse;
use crate::state::AppState;

// =============================================================================
// Login
// =============================================================================

/// Login request body.
#[derive(Deserialize)]
pub struct LoginRequest {
    /// Login name.
    pub username: String,
    /// Password.
    pub password: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl Validate for LoginRequest {
    fn validate(&self) -> ApiResult<()> {
        if self.username.trim().is_empty() || self.password.is_empty() {
            return Err(ApiError::validation("username and password are required"));
        }
        Ok(())
    }
}

/// POST /api/v1/base/access_token
///
/// Exchanges credentials for an access and refresh token pair.
pub async fn login(
    State(state): State<AppState>,
    ClientIp(client_ip): ClientIp,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    let pair = state
        .sessions()
        .login(&request.username, &request.password, client_ip)
        .await?;
    Ok(ApiResponse::success(pair))
}

// =============================================================================
// Refresh Token
// =============================================================================

/// Refresh token request body.
#[derive(Deserialize)]
pub struct RefreshRequest {
    /// Refresh token.
    pub refresh_token: String,
}

impl std::fmt::Debug for RefreshRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshRequest")
            .field("refresh_token", &"[REDACTED]")
            .finish()
    }
}

impl Validate for RefreshRequest {
    fn validate(&self) -> ApiResult<()> {
        if self.refresh_token.trim().is_empty() {
            return Err(ApiError::validation("refresh_token is required"));
        }
        Ok(())
    }
}

/// POST /api/v1/base/refresh_token
///
/// Rotates a refresh token into a new pair. The presented token is spent.
pub async fn refresh_token(
    State(state): State<AppState>,
    ClientIp(client_ip): ClientIp,
    ValidatedJson(request): ValidatedJson<RefreshRequest>,
) -> ApiResult<impl IntoResponse> {
    let pair = state
        .sessions()
        .refresh(request.refresh_token.trim(), client_ip)
        .await?;
    Ok(ApiResponse::success(pair))
}

// =============================================================================
// Tests
// =============================================================================
