// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Audit log entry types.

use std::fmt;
use std::net::IpAddr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// AuditLog
// =============================================================================

const API_PREFIX: &str = "/api/v1/";

/// A structured audit log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditLog {
    /// Unique log entry ID.
    pub id: Uuid,

    /// When the event occurred.
    pub timestamp: DateTime<Utc>,

    /// Severity level of the event.
    pub severity: AuditSeverity,

    /// Principal ID (if authenticated).
    pub user_id: Option<String>,

    /// Login name, when known. Failed logins record the attempted name.
    pub username: Option<String>,

    /// Client IP address.
    pub client_ip: Option<IpAddr>,

    /// The action that was performed.
    pub action: AuditAction,

    /// HTTP method, for request-level entries.
    pub method: Option<String>,

    /// Request path or other affected resource.
    pub resource: String,

    /// HTTP status returned, for request-level entries.
    pub status: Option<u16>,

    /// The result of the action.
    pub result: ActionResult,

    /// Additional details.
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub details: serde_json::Value,

    /// Duration of the operation in milliseconds.
    pub duration_ms: Option<u64>,

    /// Request ID for correlation with traces.
    pub request_id: Option<String>,
}

impl AuditLog {
    /// Creates a new audit log entry.
    pub fn new(action: AuditAction, resource: impl Into<String>, result: ActionResult) -> Self {
        let severity = match result {
            ActionResult::Success => action.default_severity(),
            ActionResult::Failure { .. } | ActionResult::Denied => AuditSeverity::Warning,
        };
        Self {
            id: Uuid::now_v7(),
            timestamp: Utc::now(),
            severity,
            user_id: None,
            username: None,
            client_ip: None,
            action,
            method: None,
            resource: resource.into(),
            status: None,
            result,
            details: serde_json::Value::Null,
            duration_ms: None,
            request_id: None,
        }
    }

    /// Sets the principal.
    pub fn with_user(mut self, user_id: impl ToString, username: Option<&str>) -> Self {
        self.user_id = Some(user_id.to_string());
        self.username = username.map(str::to_string);
        self
    }

    /// Sets the attempted login name without a principal ID.
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Sets the client IP.
    pub fn with_client_ip(mut self, ip: Option<IpAddr>) -> Self {
        self.client_ip = ip;
        self
    }

    /// Sets HTTP request attributes.
    pub fn with_http(mut self, method: impl Into<String>, status: u16) -> Self {
        self.method = Some(method.into());
        self.status = Some(status);
        self
    }

    /// Sets the details.
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = details;
        self
    }

    /// Sets the duration.
    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    /// Sets the request ID.
    pub fn with_request_id(mut self, id: impl Into<String>) -> Self {
        self.request_id = Some(id.into());
        self
    }

    /// Sets the timestamp.
    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Returns the module the entry belongs to: the segment after
    /// `/api/v1/` for API paths, otherwise the first segment of the
    /// resource (`session`, `system`, `principal`).
    pub fn module(&self) -> &str {
        let path = self.resource.strip_prefix(API_PREFIX).unwrap_or(&self.resource);
        let path = path.trim_start_matches('/');
        path.split('/').next().unwrap_or(path)
    }

    // =========================================================================
    // Factory methods for common actions
    // =========================================================================

    /// Successful login.
    pub fn login(user_id: impl ToString, username: &str, client_ip: Option<IpAddr>) -> Self {
        Self::new(AuditAction::Login, "session", ActionResult::Success)
            .with_user(user_id, Some(username))
            .with_client_ip(client_ip)
    }

    /// Failed login. The reason is recorded but never returned to clients.
    pub fn login_failed(
        username: &str,
        client_ip: Option<IpAddr>,
        reason: impl Into<String>,
    ) -> Self {
        Self::new(
            AuditAction::LoginFailed,
            "session",
            ActionResult::failure(reason),
        )
        .with_username(username)
        .with_client_ip(client_ip)
    }

    /// Token refresh attempt.
    pub fn token_refresh(
        user_id: Option<String>,
        client_ip: Option<IpAddr>,
        result: ActionResult,
    ) -> Self {
        let mut log = Self::new(AuditAction::TokenRefresh, "session", result)
            .with_client_ip(client_ip);
        log.user_id = user_id;
        log
    }

    /// Access denied by the permission evaluator.
    pub fn access_denied(
        user_id: impl ToString,
        method: &str,
        path: &str,
        client_ip: Option<IpAddr>,
    ) -> Self {
        Self::new(AuditAction::AccessDenied, path, ActionResult::Denied)
            .with_user(user_id, None)
            .with_http(method, 403)
            .with_client_ip(client_ip)
    }

    /// System start.
    pub fn system_start(version: impl Into<String>) -> Self {
        Self::new(AuditAction::SystemStart, "system", ActionResult::Success)
            .with_details(serde_json::json!({ "version": version.into() }))
    }

    /// System shutdown.
    pub fn system_shutdown(reason: Option<String>) -> Self {
        let details = match reason {
            Some(r) => serde_json::json!({ "reason": r }),
            None => serde_json::Value::Null,
        };
        Self::new(AuditAction::SystemShutdown, "system", ActionResult::Success)
            .with_details(details)
    }
}

// =============================================================================
// AuditSeverity
// =============================================================================

/// Severity levels for audit entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditSeverity {
    /// Routine request records.
    Info,
    /// Security-relevant state change.
    Notice,
    /// Failed or denied attempt.
    Warning,
    /// Something that needs attention.
    Critical,
}

impl AuditSeverity {
    /// Returns the severity as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditSeverity::Info => "info",
            AuditSeverity::Notice => "notice",
            AuditSeverity::Warning => "warning",
            AuditSeverity::Critical => "critical",
        }
    }

    /// Returns the numeric level for comparison.
    pub fn level(&self) -> u8 {
        match self {
            AuditSeverity::Info => 1,
            AuditSeverity::Notice => 2,
            AuditSeverity::Warning => 3,
            AuditSeverity::Critical => 4,
        }
    }
}

impl fmt::Display for AuditSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// AuditAction
// =============================================================================

/// Audited actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// Successful login.
    Login,
    /// Failed login.
    LoginFailed,
    /// Token refresh (successful or not).
    TokenRefresh,
    /// Password change.
    PasswordChange,
    /// Principal deactivated.
    PrincipalDeactivate,
    /// Permission evaluator denied a request.
    AccessDenied,
    /// Generic HTTP request record.
    Request,
    /// Process start.
    SystemStart,
    /// Process shutdown.
    SystemShutdown,
}

impl AuditAction {
    /// Returns the action as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Login => "login",
            AuditAction::LoginFailed => "login_failed",
            AuditAction::TokenRefresh => "token_refresh",
            AuditAction::PasswordChange => "password_change",
            AuditAction::PrincipalDeactivate => "principal_deactivate",
            AuditAction::AccessDenied => "access_denied",
            AuditAction::Request => "request",
            AuditAction::SystemStart => "system_start",
            AuditAction::SystemShutdown => "system_shutdown",
        }
    }

    /// Returns `true` for actions that touch credentials or grants.
    pub fn is_security_sensitive(&self) -> bool {
        !matches!(self, AuditAction::Request)
    }

    /// Default severity for a successful action.
    pub fn default_severity(&self) -> AuditSeverity {
        match self {
            AuditAction::Login | AuditAction::TokenRefresh | AuditAction::Request => {
                AuditSeverity::Info
            }
            AuditAction::LoginFailed | AuditAction::AccessDenied => AuditSeverity::Warning,
            AuditAction::PasswordChange
            | AuditAction::PrincipalDeactivate
            | AuditAction::SystemStart
            | AuditAction::SystemShutdown => AuditSeverity::Notice,
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// ActionResult
// =============================================================================

/// Outcome of an audited action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ActionResult {
    /// Completed.
    Success,
    /// Failed.
    Failure {
        /// Why.
        reason: String,
    },
    /// Refused by policy.
    Denied,
}

impl ActionResult {
    /// Creates a failure result.
    pub fn failure(reason: impl Into<String>) -> Self {
        Self::Failure {
            reason: reason.into(),
        }
    }

    /// Returns `true` on success.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// Returns `true` on failure.
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failure { .. })
    }

    /// Returns `true` if denied.
    pub fn is_denied(&self) -> bool {
        matches!(self, Self::Denied)
    }

    /// Maps an HTTP status to a result.
    pub fn from_status(status: u16) -> Self {
        match status {
            401 | 403 => Self::Denied,
            s if s >= 400 => Self::failure(format!("HTTP {s}")),
            _ => Self::Success,
        }
    }
}

// =============================================================================
// AuditFilter
// =============================================================================

/// Query filter for loggers that support reading back.
///
/// Text fields match case-insensitive substrings. The time range is
/// inclusive on both ends.
#[derive(Debug, Clone, Default)]
pub struct AuditFilter {
    /// Only this action.
    pub action: Option<AuditAction>,
    /// Only this principal.
    pub user_id: Option<String>,
    /// Login name contains this.
    pub username: Option<String>,
    /// Module contains this.
    pub module: Option<String>,
    /// HTTP method contains this.
    pub method: Option<String>,
    /// Only this HTTP status.
    pub status: Option<u16>,
    /// At or after this time.
    pub since: Option<DateTime<Utc>>,
    /// At or before this time.
    pub until: Option<DateTime<Utc>>,
    /// At or above this severity.
    pub min_severity: Option<AuditSeverity>,
    /// Matching entries skipped before the first one returned.
    pub offset: usize,
    /// Maximum entries returned (newest first).
    pub limit: Option<usize>,
}

impl AuditFilter {
    /// Creates an empty filter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Filters by action.
    pub fn action(mut self, action: AuditAction) -> Self {
        self.action = Some(action);
        self
    }

    /// Filters by principal.
    pub fn user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Filters by login name.
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Filters by module.
    pub fn module(mut self, module: impl Into<String>) -> Self {
        self.module = Some(module.into());
        self
    }

    /// Filters by HTTP method.
    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    /// Filters by HTTP status.
    pub fn status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Restricts to entries within `[since, until]`. Either bound may be open.
    pub fn between(mut self, since: Option<DateTime<Utc>>, until: Option<DateTime<Utc>>) -> Self {
        self.since = since;
        self.until = until;
        self
    }

    /// Filters by minimum severity.
    pub fn min_severity(mut self, severity: AuditSeverity) -> Self {
        self.min_severity = Some(severity);
        self
    }

    /// Skips the first `offset` matches.
    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    /// Limits the result count.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Returns the same filter without paging, for counting matches.
    pub fn unpaged(&self) -> Self {
        Self {
            offset: 0,
            limit: None,
            ..self.clone()
        }
    }

    /// Returns `true` if the entry passes the filter. Paging is not
    /// considered.
    pub fn matches(&self, log: &AuditLog) -> bool {
        if let Some(action) = self.action {
            if log.action != action {
                return false;
            }
        }
        if let Some(ref user_id) = self.user_id {
            if log.user_id.as_ref() != Some(user_id) {
                return false;
            }
        }
        if let Some(ref username) = self.username {
            if !log.username.as_deref().is_some_and(|u| contains_ci(u, username)) {
                return false;
            }
        }
        if let Some(ref module) = self.module {
            if !contains_ci(log.module(), module) {
                return false;
            }
        }
        if let Some(ref method) = self.method {
            if !log.method.as_deref().is_some_and(|m| contains_ci(m, method)) {
                return false;
            }
        }
        if self.status.is_some() && log.status != self.status {
            return false;
        }
        if self.since.is_some_and(|since| log.timestamp < since) {
            return false;
        }
        if self.until.is_some_and(|until| log.timestamp > until) {
            return false;
        }
        if let Some(min) = self.min_severity {
            if log.severity.level() < min.level() {
                return false;
            }
        }
        true
    }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_login_is_warning() {
        let log = AuditLog::login_failed("admin", None, "bad password");
        assert_eq!(log.severity, AuditSeverity::Warning);
        assert_eq!(log.username.as_deref(), Some("admin"));
        assert!(log.user_id.is_none());
        assert!(log.result.is_failure());
    }

    #[test]
    fn test_result_from_status() {
        assert!(ActionResult::from_status(200).is_success());
        assert!(ActionResult::from_status(403).is_denied());
        assert!(ActionResult::from_status(500).is_failure());
    }

    #[test]
    fn test_filter_matches() {
        let log = AuditLog::login(1, "admin", None);
        assert!(AuditFilter::new().action(AuditAction::Login).matches(&log));
        assert!(!AuditFilter::new().action(AuditAction::LoginFailed).matches(&log));
        assert!(AuditFilter::new().user("1").matches(&log));
        assert!(!AuditFilter::new()
            .min_severity(AuditSeverity::Warning)
            .matches(&log));
    }

    #[test]
    fn test_module_from_resource() {
        let log = AuditLog::access_denied(3, "GET", "/api/v1/auditlog/list", None);
        assert_eq!(log.module(), "auditlog");
        assert_eq!(AuditLog::login(1, "admin", None).module(), "session");
        let log = AuditLog::new(AuditAction::PrincipalDeactivate, "principal/4", ActionResult::Success);
        assert_eq!(log.module(), "principal");
    }

    #[test]
    fn test_filter_request_fields() {
        let log = AuditLog::new(AuditAction::Request, "/api/v1/user/list", ActionResult::Success)
            .with_user(1, Some("Admin"))
            .with_http("GET", 200);

        assert!(AuditFilter::new().username("adm").matches(&log));
        assert!(AuditFilter::new().module("USER").matches(&log));
        assert!(AuditFilter::new().method("get").matches(&log));
        assert!(AuditFilter::new().status(200).matches(&log));
        assert!(!AuditFilter::new().status(403).matches(&log));
        assert!(!AuditFilter::new().module("role").matches(&log));
        assert!(!AuditFilter::new().method("POST").matches(&log));

        // Entries without a method never match a method filter.
        let login = AuditLog::login(1, "admin", None);
        assert!(!AuditFilter::new().method("GET").matches(&login));
    }

    #[test]
    fn test_filter_time_range_is_inclusive() {
        let at = Utc::now();
        let log = AuditLog::login(1, "admin", None).at(at);
        let second = chrono::Duration::seconds(1);

        assert!(AuditFilter::new().between(Some(at), Some(at)).matches(&log));
        assert!(AuditFilter::new().between(None, Some(at + second)).matches(&log));
        assert!(!AuditFilter::new().between(Some(at + second), None).matches(&log));
        assert!(!AuditFilter::new().between(None, Some(at - second)).matches(&log));
    }

    #[test]
    fn test_serializes_snake_case() {
        let json = serde_json::to_value(AuditLog::access_denied(3, "GET", "/x", None)).unwrap();
        assert_eq!(json["action"], "access_denied");
        assert_eq!(json["result"]["outcome"], "denied");
        assert_eq!(json["status"], 403);
    }
}
