// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Audit logging for security-relevant events.
//!
//! # Components
//!
//! - [`AuditLogger`]: core trait for audit sinks
//! - [`AuditLog`]: structured audit entry
//! - [`TracingAuditLogger`]: emits entries on the `audit` tracing target
//! - [`InMemoryAuditLogger`]: bounded in-memory sink with query support
//! - [`TeeLogger`]: writes to two sinks, queries the one that can answer
//! - [`NoOpAuditLogger`]: discards everything
//!
//! # Example
//!
//! ```rust,ignore
//! use warden_core::audit::{AuditLog, AuditLogger, InMemoryAuditLogger};
//!
//! let logger = InMemoryAuditLogger::new();
//! logger.log(AuditLog::login(1, "admin", None)).await?;
//! assert_eq!(logger.len(), 1);
//! ```

mod error;
mod memory_logger;
mod tee_logger;
mod tracing_logger;
mod types;

pub use error::{AuditError, AuditResult};
pub use memory_logger::InMemoryAuditLogger;
pub use tee_logger::TeeLogger;
pub use tracing_logger::TracingAuditLogger;
pub use types::{ActionResult, AuditAction, AuditFilter, AuditLog, AuditSeverity};

use async_trait::async_trait;

// =============================================================================
// Core Trait
// =============================================================================

/// Trait for audit logger implementations.
#[async_trait]
pub trait AuditLogger: Send + Sync {
    /// Logs an audit entry.
    async fn log(&self, entry: AuditLog) -> AuditResult<()>;

    /// Queries audit logs with the given filter, newest first.
    ///
    /// Write-only sinks return [`AuditError::QueryNotSupported`].
    async fn query(&self, filter: AuditFilter) -> AuditResult<Vec<AuditLog>>;

    /// Counts entries matching the filter, ignoring its paging.
    async fn count(&self, filter: AuditFilter) -> AuditResult<usize> {
        Ok(self.query(filter.unpaged()).await?.len())
    }

    /// Flushes any buffered logs.
    async fn flush(&self) -> AuditResult<()> {
        Ok(())
    }

    /// Returns the logger name for identification.
    fn name(&self) -> &str {
        "audit_logger"
    }

    /// Returns `true` if this logger supports querying.
    fn supports_query(&self) -> bool {
        false
    }
}

// =============================================================================
// No-Op Logger
// =============================================================================

/// A no-op audit logger that discards all entries.
///
/// Used when audit logging is disabled.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpAuditLogger;

impl NoOpAuditLogger {
    /// Creates a new no-op logger.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AuditLogger for NoOpAuditLogger {
    async fn log(&self, _entry: AuditLog) -> AuditResult<()> {
        Ok(())
    }

    async fn query(&self, _filter: AuditFilter) -> AuditResult<Vec<AuditLog>> {
        Ok(Vec::new())
    }

    fn name(&self) -> &str {
        "noop"
    }
}

// =============================================================================
// Tests
// =============================================================================
