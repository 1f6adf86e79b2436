// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Audit logger that writes every entry to two sinks.

use async_trait::async_trait;

use super::error::{AuditError, AuditResult};
use super::types::{AuditFilter, AuditLog};
use super::AuditLogger;

/// Writes to two loggers and answers queries from whichever supports them.
///
/// The server pairs a [`TracingAuditLogger`](super::TracingAuditLogger) with
/// a bounded [`InMemoryAuditLogger`](super::InMemoryAuditLogger), so entries
/// reach the log stream and stay queryable through the audit log API.
#[derive(Debug, Clone)]
pub struct TeeLogger<A, B> {
    primary: A,
    secondary: B,
}

impl<A, B> TeeLogger<A, B>
where
    A: AuditLogger,
    B: AuditLogger,
{
    /// Creates a new tee logger.
    pub fn new(primary: A, secondary: B) -> Self {
        Self { primary, secondary }
    }

    /// Returns the primary logger.
    pub fn primary(&self) -> &A {
        &self.primary
    }

    /// Returns the secondary logger.
    pub fn secondary(&self) -> &B {
        &self.secondary
    }

    fn query_side(&self) -> Option<&dyn AuditLogger> {
        if self.primary.supports_query() {
            Some(&self.primary)
        } else if self.secondary.supports_query() {
            Some(&self.secondary)
        } else {
            None
        }
    }
}

#[async_trait]
impl<A, B> AuditLogger for TeeLogger<A, B>
where
    A: AuditLogger,
    B: AuditLogger,
{
    async fn log(&self, entry: AuditLog) -> AuditResult<()> {
        let primary = self.primary.log(entry.clone()).await;
        let secondary = self.secondary.log(entry).await;

        match (primary, secondary) {
            (Ok(()), Ok(())) => Ok(()),
            (Err(e), Ok(())) | (Ok(()), Err(e)) => Err(e),
            (Err(e1), Err(e2)) => Err(AuditError::write_failed(format!(
                "{}: {e1}; {}: {e2}",
                self.primary.name(),
                self.secondary.name()
            ))),
        }
    }

    async fn query(&self, filter: AuditFilter) -> AuditResult<Vec<AuditLog>> {
        match self.query_side() {
            Some(logger) => logger.query(filter).await,
            None => Err(AuditError::query_not_supported("tee")),
        }
    }

    async fn count(&self, filter: AuditFilter) -> AuditResult<usize> {
        match self.query_side() {
            Some(logger) => logger.count(filter).await,
            None => Err(AuditError::query_not_supported("tee")),
        }
    }

    async fn flush(&self) -> AuditResult<()> {
        self.primary.flush().await?;
        self.secondary.flush().await
    }

    fn name(&self) -> &str {
        "tee"
    }

    fn supports_query(&self) -> bool {
        self.primary.supports_query() || self.secondary.supports_query()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::{AuditAction, InMemoryAuditLogger, TracingAuditLogger};

    #[tokio::test]
    async fn test_tee_queries_the_queryable_side() {
        let memory = InMemoryAuditLogger::with_capacity(10);
        let tee = TeeLogger::new(TracingAuditLogger::new(), memory.clone());
        assert!(tee.supports_query());

        tee.log(AuditLog::login(1, "admin", None)).await.unwrap();
        tee.log(AuditLog::login_failed("ghost", None, "unknown user"))
            .await
            .unwrap();

        assert_eq!(memory.len(), 2);
        let failed = tee
            .query(AuditFilter::new().action(AuditAction::LoginFailed))
            .await
            .unwrap();
        assert_eq!(failed.len(), 1);
        assert_eq!(tee.count(AuditFilter::new()).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_tee_without_query_support() {
        let tee = TeeLogger::new(TracingAuditLogger::new(), TracingAuditLogger::new());
        assert!(!tee.supports_query());
        assert!(tee.query(AuditFilter::new()).await.is_err());
        assert!(tee.count(AuditFilter::new()).await.is_err());
    }
}
