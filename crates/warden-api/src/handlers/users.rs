// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Principal administration handlers.

use axum::{extract::State, response::IntoResponse};
use serde::{Deserialize, Serialize};
use warden_core::{ActionResult, AuditAction, AuditLog, PrincipalId, PrincipalView};

use crate::auth::AuthError;
use crate::error::{ApiError, ApiResult};
use crate::extractors::{Auth, Validate, ValidatedJson};
use crate::response::{ApiResponse, ListResponse};
use crate::state::AppState;

/// Action a caller needs to deactivate a superuser.
pub const DEACTIVATE_SUPERUSER_ACTION: &str = "principal:deactivate_superuser";

// =============================================================================
// List
// =============================================================================

/// GET /api/v1/user/list
pub async fn list_users(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let principals: Vec<PrincipalView> = state
        .store()
        .list_principals()
        .await?
        .iter()
        .map(PrincipalView::from)
        .collect();

    Ok(ApiResponse::success(ListResponse::new(principals)))
}

// =============================================================================
// Deactivate
// =============================================================================

/// Deactivation request body.
#[derive(Debug, Deserialize)]
pub struct DeactivateRequest {
    /// Principal to deactivate.
    pub user_id: PrincipalId,
}

impl Validate for DeactivateRequest {
    fn validate(&self) -> ApiResult<()> {
        Ok(())
    }
}

/// Deactivation response.
#[derive(Debug, Serialize)]
pub struct DeactivateResponse {
    /// The principal after the update.
    pub principal: PrincipalView,
}

/// POST /api/v1/user/deactivate
///
/// Deactivates a principal. Its tokens stop authenticating on the next
/// request. Callers cannot deactivate themselves.
pub async fn deactivate_user(
    State(state): State<AppState>,
    Auth(ctx): Auth,
    ValidatedJson(request): ValidatedJson<DeactivateRequest>,
) -> ApiResult<impl IntoResponse> {
    if request.user_id == ctx.user_id {
        return Err(ApiError::bad_request("Cannot deactivate your own account"));
    }

    let target = state
        .store()
        .get_principal(request.user_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("principal {}", request.user_id)))?;

    if target.is_superuser && !ctx.can(DEACTIVATE_SUPERUSER_ACTION) {
        let entry = AuditLog::access_denied(
            ctx.user_id,
            "POST",
            crate::server::paths::USER_DEACTIVATE,
            ctx.client_ip,
        )
        .with_username(ctx.username.clone())
        .with_request_id(ctx.request_id.to_string())
        .with_details(serde_json::json!({
            "action": DEACTIVATE_SUPERUSER_ACTION,
            "target": target.username,
        }))
        .at(state.clock.now());
        if let Err(e) = state.audit().log(entry).await {
            tracing::warn!(error = %e, "Failed to write audit entry");
        }

        return Err(AuthError::ActionDenied {
            action: DEACTIVATE_SUPERUSER_ACTION.to_string(),
        }
        .into());
    }

    let updated = state.store().set_active(target.id, false).await?;

    tracing::info!(
        user_id = %ctx.user_id,
        target_id = %updated.id,
        target = %updated.username,
        "Principal deactivated"
    );

    let entry = AuditLog::new(
        AuditAction::PrincipalDeactivate,
        format!("principal/{}", updated.id),
        ActionResult::Success,
    )
    .with_user(ctx.user_id, Some(&ctx.username))
    .with_client_ip(ctx.client_ip)
    .with_request_id(ctx.request_id.to_string())
    .with_details(serde_json::json!({ "target": updated.username }))
    .at(state.clock.now());
    if let Err(e) = state.audit().log(entry).await {
        tracing::warn!(error = %e, "Failed to write audit entry");
    }

    Ok(ApiResponse::success(DeactivateResponse {
        principal: updated.view(),
    }))
}
