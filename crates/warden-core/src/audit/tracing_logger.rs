// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Audit logger that emits entries as `tracing` events.
//!
//! Entries go to the `audit` target, so they can be routed or filtered
//! separately (`RUST_LOG=audit=info`). With the JSON log format each entry
//! becomes one structured line.

use async_trait::async_trait;
use tracing::{info, warn};

use super::error::{AuditError, AuditResult};
use super::types::{AuditFilter, AuditLog, AuditSeverity};
use super::AuditLogger;

/// Writes audit entries through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAuditLogger;

impl TracingAuditLogger {
    /// Creates a new tracing logger.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AuditLogger for TracingAuditLogger {
    async fn log(&self, entry: AuditLog) -> AuditResult<()> {
        let details = if entry.details.is_null() {
            String::new()
        } else {
            serde_json::to_string(&entry.details)?
        };
        let client_ip = entry.client_ip.map(|ip| ip.to_string());

        match entry.severity {
            AuditSeverity::Info | AuditSeverity::Notice => info!(
                target: "audit",
                audit_id = %entry.id,
                action = entry.action.as_str(),
                severity = entry.severity.as_str(),
                user_id = entry.user_id.as_deref(),
                username = entry.username.as_deref(),
                client_ip = client_ip.as_deref(),
                method = entry.method.as_deref(),
                resource = %entry.resource,
                status = entry.status,
                duration_ms = entry.duration_ms,
                request_id = entry.request_id.as_deref(),
                details = %details,
                "audit"
            ),
            AuditSeverity::Warning | AuditSeverity::Critical => warn!(
                target: "audit",
                audit_id = %entry.id,
                action = entry.action.as_str(),
                severity = entry.severity.as_str(),
                user_id = entry.user_id.as_deref(),
                username = entry.username.as_deref(),
                client_ip = client_ip.as_deref(),
                method = entry.method.as_deref(),
                resource = %entry.resource,
                status = entry.status,
                duration_ms = entry.duration_ms,
                request_id = entry.request_id.as_deref(),
                details = %details,
                "audit"
            ),
        }
        Ok(())
    }

    async fn query(&self, _filter: AuditFilter) -> AuditResult<Vec<AuditLog>> {
        Err(AuditError::query_not_supported("tracing"))
    }

    fn name(&self) -> &str {
        "tracing"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_tracing_logger_accepts_entries() {
        let logger = TracingAuditLogger::new();
        let entry = AuditLog::login_failed("admin", None, "bad password")
            .with_details(serde_json::json!({ "attempt": 3 }));

        assert!(logger.log(entry).await.is_ok());
        assert!(logger.query(AuditFilter::new()).await.is_err());
        assert!(!logger.supports_query());
    }
}
