// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Health check handlers.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use crate::response::{ApiResponse, HealthResponse};
use crate::state::AppState;

// =============================================================================
// Health Check
// =============================================================================

/// GET /health
///
/// Liveness check. Returns 503 if the credential store does not answer.
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let store_healthy = state.store().health_check().await;
    let status = if store_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let mut body = ApiResponse::success(HealthResponse::from_store(store_healthy));
    body.code = status.as_u16();
    (status, Json(body))
}
