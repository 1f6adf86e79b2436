// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Audit log query handler.

use axum::{extract::State, response::IntoResponse};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use warden_core::AuditFilter;

use crate::error::{ApiError, ApiResult};
use crate::extractors::{Validate, ValidatedQuery};
use crate::response::{ApiResponse, PageResponse};
use crate::state::AppState;

/// Largest page a client may request.
pub const MAX_PAGE_SIZE: usize = 100;

/// Query string for `/api/v1/auditlog/list`. Empty text parameters are
/// ignored.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AuditLogQuery {
    /// 1-based page number.
    pub page: usize,
    /// Entries per page.
    pub page_size: usize,
    /// Login name contains.
    pub username: Option<String>,
    /// Module contains, e.g. `user` or `session`.
    pub module: Option<String>,
    /// HTTP method contains.
    pub method: Option<String>,
    /// Exact HTTP status.
    pub status: Option<u16>,
    /// Inclusive lower bound (RFC 3339).
    pub start_time: Option<DateTime<Utc>>,
    /// Inclusive upper bound (RFC 3339).
    pub end_time: Option<DateTime<Utc>>,
}

impl Default for AuditLogQuery {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: 10,
            username: None,
            module: None,
            method: None,
            status: None,
            start_time: None,
            end_time: None,
        }
    }
}

impl Validate for AuditLogQuery {
    fn validate(&self) -> ApiResult<()> {
        if self.page == 0 {
            return Err(ApiError::validation("page starts at 1"));
        }
        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(ApiError::validation(format!(
                "page_size must be between 1 and {MAX_PAGE_SIZE}"
            )));
        }
        if let (Some(start), Some(end)) = (self.start_time, self.end_time) {
            if start > end {
                return Err(ApiError::validation("start_time is after end_time"));
            }
        }
        Ok(())
    }
}

impl AuditLogQuery {
    /// Builds the store filter for the requested page.
    pub fn to_filter(&self) -> AuditFilter {
        let mut filter = AuditFilter::new()
            .between(self.start_time, self.end_time)
            .offset((self.page - 1).saturating_mul(self.page_size))
            .limit(self.page_size);
        if let Some(username) = non_empty(&self.username) {
            filter = filter.username(username);
        }
        if let Some(module) = non_empty(&self.module) {
            filter = filter.module(module);
        }
        if let Some(method) = non_empty(&self.method) {
            filter = filter.method(method);
        }
        if let Some(status) = self.status {
            filter = filter.status(status);
        }
        filter
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// GET /api/v1/auditlog/list
///
/// Returns matching audit entries newest first, one page at a time.
pub async fn list_audit_logs(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<AuditLogQuery>,
) -> ApiResult<impl IntoResponse> {
    let filter = query.to_filter();
    let total = state.audit().count(filter.unpaged()).await?;
    let items = state.audit().query(filter).await?;

    Ok(ApiResponse::success(PageResponse {
        total,
        page: query.page,
        page_size: query.page_size,
        items,
    }))
}
