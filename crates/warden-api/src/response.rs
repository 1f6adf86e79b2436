// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! API response types.
//!
//! Successful responses share one envelope:
//!
//! ```json
//! { "code": 200, "msg": "OK", "data": { ... } }
//! ```

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

// =============================================================================
// ApiResponse
// =============================================================================

/// Generic API response wrapper.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// HTTP status code.
    pub code: u16,
    /// Short message.
    pub msg: String,
    /// Payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// Creates a successful response with data.
    pub fn success(data: T) -> Self {
        Self {
            code: StatusCode::OK.as_u16(),
            msg: "OK".to_string(),
            data: Some(data),
        }
    }

    /// Replaces the message.
    pub fn with_msg(mut self, msg: impl Into<String>) -> Self {
        self.msg = msg.into();
        self
    }
}

impl ApiResponse<()> {
    /// Creates a successful response without data.
    pub fn ok() -> Self {
        Self {
            code: StatusCode::OK.as_u16(),
            msg: "OK".to_string(),
            data: None,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.code).unwrap_or(StatusCode::OK);
        (status, Json(self)).into_response()
    }
}

// =============================================================================
// Typed Responses
// =============================================================================

/// A list payload.
#[derive(Debug, Serialize, Deserialize)]
pub struct ListResponse<T> {
    /// Number of items.
    pub total: usize,
    /// The items.
    pub items: Vec<T>,
}

impl<T> ListResponse<T> {
    /// Wraps a full, unpaginated list.
    pub fn new(items: Vec<T>) -> Self {
        Self {
            total: items.len(),
            items,
        }
    }
}

/// One page of a larger result set.
#[derive(Debug, Serialize, Deserialize)]
pub struct PageResponse<T> {
    /// Number of matching items across all pages.
    pub total: usize,
    /// 1-based page number.
    pub page: usize,
    /// Requested page size.
    pub page_size: usize,
    /// Items on this page.
    pub items: Vec<T>,
}

/// Health check response.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Overall status.
    pub status: String,
    /// Version string.
    pub version: String,
    /// Whether the credential store answered.
    pub store: bool,
}

impl HealthResponse {
    /// Creates a response from the store health check.
    pub fn from_store(store_healthy: bool) -> Self {
        Self {
            status: if store_healthy { "ok" } else { "degraded" }.to_string(),
            version: crate::VERSION.to_string(),
            store: store_healthy,
        }
    }
}

/// Version response.
#[derive(Debug, Serialize, Deserialize)]
pub struct VersionResponse {
    /// Service name.
    pub name: String,
    /// Version string.
    pub version: String,
}

impl VersionResponse {
    /// Returns this build's version.
    pub fn current() -> Self {
        Self {
            name: "warden".to_string(),
            version: crate::VERSION.to_string(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_response_success() {
        let response = ApiResponse::success(42);
        assert_eq!(response.code, 200);
        assert_eq!(response.msg, "OK");
        assert_eq!(response.data, Some(42));
    }

    #[test]
    fn test_envelope_shape() {
        let json = serde_json::to_value(ApiResponse::success("x")).unwrap();
        assert_eq!(json, serde_json::json!({"code": 200, "msg": "OK", "data": "x"}));

        let json = serde_json::to_value(ApiResponse::ok().with_msg("Password updated")).unwrap();
        assert_eq!(json, serde_json::json!({"code": 200, "msg": "Password updated"}));
    }

    #[test]
    fn test_list_response() {
        let list = ListResponse::new(vec![1, 2, 3]);
        assert_eq!(list.total, 3);
    }

    #[test]
    fn test_health_degraded() {
        assert_eq!(HealthResponse::from_store(true).status, "ok");
        assert_eq!(HealthResponse::from_store(false).status, "degraded");
    }
}
