// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Self-service handlers available to every authenticated principal.

use axum::{extract::State, response::IntoResponse};
use serde::{Deserialize, Serialize};
use warden_core::seed::ApiEntry;
use warden_core::PrincipalView;

use crate::error::{ApiError, ApiResult};
use crate::extractors::{Auth, Validate, ValidatedJson};
use crate::response::{ApiResponse, ListResponse, VersionResponse};
use crate::state::AppState;

// =============================================================================
// User Info
// =============================================================================

/// Current principal response.
#[derive(Debug, Serialize)]
pub struct UserInfoResponse {
    /// The principal.
    #[serde(flatten)]
    pub principal: PrincipalView,
    /// Names of the bound roles.
    pub role_names: Vec<String>,
}

/// GET /api/v1/base/userinfo
///
/// Returns the authenticated principal, without its password hash.
pub async fn userinfo(
    State(state): State<AppState>,
    Auth(ctx): Auth,
) -> ApiResult<impl IntoResponse> {
    let principal = state
        .store()
        .get_principal(ctx.user_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("principal {}", ctx.user_id)))?;

    Ok(ApiResponse::success(UserInfoResponse {
        principal: principal.view(),
        role_names: ctx.roles,
    }))
}

// =============================================================================
// User APIs
// =============================================================================

/// GET /api/v1/base/userapi
///
/// Lists the catalog APIs the caller is allowed to call.
pub async fn userapi(State(state): State<AppState>, Auth(ctx): Auth) -> impl IntoResponse {
    let allowed: Vec<ApiEntry> = state
        .api_catalog
        .iter()
        .filter(|api| state.rbac().authorize(&ctx, &api.method, &api.path).is_allowed())
        .cloned()
        .collect();

    ApiResponse::success(ListResponse::new(allowed))
}

// =============================================================================
// Update Password
// =============================================================================

/// Change password request body.
#[derive(Deserialize)]
pub struct UpdatePasswordRequest {
    /// Current password.
    pub old_password: String,
    /// New password.
    pub new_password: String,
}

impl std::fmt::Debug for UpdatePasswordRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("UpdatePasswordRequest { .. }")
    }
}

impl Validate for UpdatePasswordRequest {
    fn validate(&self) -> ApiResult<()> {
        if self.old_password.is_empty() {
            return Err(ApiError::validation("old_password is required"));
        }
        if self.old_password == self.new_password {
            return Err(ApiError::validation(
                "new_password must differ from old_password",
            ));
        }
        Ok(())
    }
}

/// POST /api/v1/base/update_password
///
/// Changes the caller's password. Outstanding refresh tokens stop working.
pub async fn update_password(
    State(state): State<AppState>,
    Auth(ctx): Auth,
    ValidatedJson(request): ValidatedJson<UpdatePasswordRequest>,
) -> ApiResult<impl IntoResponse> {
    state
        .sessions()
        .change_password(&ctx, &request.old_password, &request.new_password)
        .await?;
    Ok(ApiResponse::ok().with_msg("Password updated"))
}

// =============================================================================
// Version
// =============================================================================

/// GET /api/v1/base/version
pub async fn version() -> impl IntoResponse {
    ApiResponse::success(VersionResponse::current())
}
