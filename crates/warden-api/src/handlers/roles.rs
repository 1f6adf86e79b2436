// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Role handlers.

use axum::{extract::State, response::IntoResponse};

use crate::error::ApiResult;
use crate::response::{ApiResponse, ListResponse};
use crate::state::AppState;

/// GET /api/v1/role/list
pub async fn list_roles(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let roles = state.store().list_roles().await?;
    Ok(ApiResponse::success(ListResponse::new(roles)))
}
