// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Custom Test Assertions
//!
//! Assertion helpers for HTTP responses and audit trails, with failure
//! messages that include the offending body.

use axum::http::StatusCode;
use warden_core::{ActionResult, AuditAction, InMemoryAuditLogger};

use super::harness::TestResponse;

// =============================================================================
// Response Assertions
// =============================================================================

/// Assertion extensions for [`TestResponse`].
pub trait ResponseAssertions {
    /// Assert the status code.
    fn assert_status(&self, expected: StatusCode) -> &Self;

    /// Assert a 200 success envelope with `code == 200`.
    fn assert_success(&self) -> &Self;

    /// Assert an error body with the given status and error code.
    fn assert_error(&self, status: StatusCode, code: &str) -> &Self;

    /// Assert that a header is present with the given value.
    fn assert_header(&self, name: &str, expected: &str) -> &Self;

    /// Assert that the error body carries no detail.
    fn assert_no_detail(&self) -> &Self;
}

impl ResponseAssertions for TestResponse {
    fn assert_status(&self, expected: StatusCode) -> &Self {
        assert_eq!(
            self.status, expected,
            "Expected status {}, got {} with body {}",
            expected, self.status, self.body
        );
        self
    }

    fn assert_success(&self) -> &Self {
        self.assert_status(StatusCode::OK);
        assert_eq!(
            self.body["code"].as_u64(),
            Some(200),
            "Expected success envelope, got {}",
            self.body
        );
        self
    }

    fn assert_error(&self, status: StatusCode, code: &str) -> &Self {
        self.assert_status(status);
        assert_eq!(
            self.error_code(),
            Some(code),
            "Expected error code {code}, got body {}",
            self.body
        );
        assert_eq!(self.body["code"].as_u64(), Some(u64::from(status.as_u16())));
        assert!(
            self.body["msg"].as_str().is_some_and(|m| !m.is_empty()),
            "Error body has no message: {}",
            self.body
        );
        self
    }

    fn assert_header(&self, name: &str, expected: &str) -> &Self {
        assert_eq!(
            self.header(name),
            Some(expected),
            "Header {name} mismatch, headers: {:?}",
            self.headers
        );
        self
    }

    fn assert_no_detail(&self) -> &Self {
        assert!(
            self.body["detail"].is_null(),
            "Expected no error detail, got {}",
            self.body
        );
        self
    }
}

// =============================================================================
// Audit Assertions
// =============================================================================

/// Assertion extensions for [`InMemoryAuditLogger`].
pub trait AuditAssertions {
    /// Assert exactly `count` entries with `action`.
    fn assert_action_count(&self, action: AuditAction, count: usize);

    /// Assert at least one successful entry with `action`.
    fn assert_succeeded(&self, action: AuditAction);

    /// Assert at least one failed or denied entry with `action`.
    fn assert_failed(&self, action: AuditAction);
}

impl AuditAssertions for InMemoryAuditLogger {
    fn assert_action_count(&self, action: AuditAction, count: usize) {
        let actual = self.entries_for_action(action).len();
        assert_eq!(
            actual,
            count,
            "Expected {count} {} entries, found {actual}",
            action.as_str()
        );
    }

    fn assert_succeeded(&self, action: AuditAction) {
        let found = self.count_where(|l| l.action == action && l.result == ActionResult::Success);
        assert!(found > 0, "No successful {} entry", action.as_str());
    }

    fn assert_failed(&self, action: AuditAction) {
        let found = self.count_where(|l| l.action == action && l.result != ActionResult::Success);
        assert!(found > 0, "No failed {} entry", action.as_str());
    }
}
