// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! In-memory audit logger backing audit queries and tests.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::error::AuditResult;
use super::types::{AuditAction, AuditFilter, AuditLog};
use super::AuditLogger;

// =============================================================================
// In-Memory Audit Logger
// =============================================================================

/// In-memory audit logger.
///
/// Stores entries in a bounded ring (oldest evicted first) and supports
/// querying. Clones share the same entries, so a test can keep one handle
/// while the server writes through another.
#[derive(Debug, Clone)]
pub struct InMemoryAuditLogger {
    logs: Arc<RwLock<VecDeque<AuditLog>>>,
    /// Maximum number of entries to keep (0 = unlimited).
    max_entries: usize,
}

impl Default for InMemoryAuditLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryAuditLogger {
    /// Creates a new in-memory logger with unlimited capacity.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates a new in-memory logger keeping at most `max_entries`.
    pub fn with_capacity(max_entries: usize) -> Self {
        Self {
            logs: Arc::new(RwLock::new(VecDeque::with_capacity(max_entries.min(10_000)))),
            max_entries,
        }
    }

    /// Returns all logged entries, oldest first.
    pub fn entries(&self) -> Vec<AuditLog> {
        self.logs.read().iter().cloned().collect()
    }

    /// Returns entries matching a predicate.
    pub fn entries_where<F>(&self, predicate: F) -> Vec<AuditLog>
    where
        F: Fn(&AuditLog) -> bool,
    {
        self.logs.read().iter().filter(|l| predicate(l)).cloned().collect()
    }

    /// Returns entries for a specific action.
    pub fn entries_for_action(&self, action: AuditAction) -> Vec<AuditLog> {
        self.entries_where(|l| l.action == action)
    }

    /// Counts entries matching a predicate.
    pub fn count_where<F>(&self, predicate: F) -> usize
    where
        F: Fn(&AuditLog) -> bool,
    {
        self.logs.read().iter().filter(|l| predicate(l)).count()
    }

    /// Clears all entries.
    pub fn clear(&self) {
        self.logs.write().clear();
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.logs.read().len()
    }

    /// Returns `true` if empty.
    pub fn is_empty(&self) -> bool {
        self.logs.read().is_empty()
    }
}

#[async_trait]
impl AuditLogger for InMemoryAuditLogger {
    async fn log(&self, entry: AuditLog) -> AuditResult<()> {
        let mut logs = self.logs.write();
        if self.max_entries > 0 && logs.len() >= self.max_entries {
            logs.pop_front();
        }
        logs.push_back(entry);
        Ok(())
    }

    async fn query(&self, filter: AuditFilter) -> AuditResult<Vec<AuditLog>> {
        let logs = self.logs.read();
        let matching = logs
            .iter()
            .rev()
            .filter(|log| filter.matches(log))
            .skip(filter.offset);

        let results = match filter.limit {
            Some(limit) => matching.take(limit).cloned().collect(),
            None => matching.cloned().collect(),
        };
        Ok(results)
    }

    async fn count(&self, filter: AuditFilter) -> AuditResult<usize> {
        Ok(self.count_where(|log| filter.matches(log)))
    }

    fn name(&self) -> &str {
        "memory"
    }

    fn supports_query(&self) -> bool {
        true
    }
}

// =============================================================================
// Tests
// =============================================================================
