// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Mock Implementations
//!
//! A credential store whose failures can be switched on mid-test.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use warden_core::{
    CoreError, CoreResult, CredentialStore, InMemoryCredentialStore, NewPrincipal, Permission,
    Principal, PrincipalId, RefreshRotation, Role, SessionAdvance,
};

// =============================================================================
// MockCredentialStore
// =============================================================================

/// Wraps an [`InMemoryCredentialStore`] and fails on demand.
///
/// While failing, every call returns a storage error and the health check
/// reports the store as down.
pub struct MockCredentialStore {
    inner: InMemoryCredentialStore,
    failing: AtomicBool,
    calls: AtomicU64,
}

impl MockCredentialStore {
    /// A healthy store.
    pub fn new() -> Self {
        Self {
            inner: InMemoryCredentialStore::new(),
            failing: AtomicBool::new(false),
            calls: AtomicU64::new(0),
        }
    }

    /// A store that fails from the start.
    pub fn failing() -> Self {
        let store = Self::new();
        store.set_failing(true);
        store
    }

    /// Shared handle.
    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Switches failure injection on or off.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of store calls, health probes excluded.
    pub fn call_count(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }

    fn check(&self) -> CoreResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(CoreError::storage("injected store failure"));
        }
        Ok(())
    }
}

impl Default for MockCredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CredentialStore for MockCredentialStore {
    async fn find_by_username(&self, username: &str) -> CoreResult<Option<Principal>> {
        self.check()?;
        self.inner.find_by_username(username).await
    }

    async fn get_principal(&self, id: PrincipalId) -> CoreResult<Option<Principal>> {
        self.check()?;
        self.inner.get_principal(id).await
    }

    async fn list_principals(&self) -> CoreResult<Vec<Principal>> {
        self.check()?;
        self.inner.list_principals().await
    }

    async fn principal_count(&self) -> CoreResult<usize> {
        self.check()?;
        self.inner.principal_count().await
    }

    async fn create_principal(&self, new: NewPrincipal) -> CoreResult<Principal> {
        self.check()?;
        self.inner.create_principal(new).await
    }

    async fn set_active(&self, id: PrincipalId, active: bool) -> CoreResult<Principal> {
        self.check()?;
        self.inner.set_active(id, active).await
    }

    async fn record_login(&self, id: PrincipalId, at: DateTime<Utc>) -> CoreResult<()> {
        self.check()?;
        self.inner.record_login(id, at).await
    }

    async fn update_password_hash(&self, id: PrincipalId, hash: String) -> CoreResult<()> {
        self.check()?;
        self.inner.update_password_hash(id, hash).await
    }

    async fn open_session(
        &self,
        id: PrincipalId,
        expires_at: DateTime<Utc>,
    ) -> CoreResult<RefreshRotation> {
        self.check()?;
        self.inner.open_session(id, expires_at).await
    }

    async fn advance_session(
        &self,
        id: PrincipalId,
        presented: RefreshRotation,
        expires_at: DateTime<Utc>,
    ) -> CoreResult<SessionAdvance> {
        self.check()?;
        self.inner.advance_session(id, presented, expires_at).await
    }

    async fn revoke_sessions(&self, id: PrincipalId) -> CoreResult<usize> {
        self.check()?;
        self.inner.revoke_sessions(id).await
    }

    async fn session_count(&self, id: PrincipalId) -> CoreResult<usize> {
        self.check()?;
        self.inner.session_count(id).await
    }

    async fn create_role(
        &self,
        name: &str,
        description: &str,
        permissions: Vec<Permission>,
    ) -> CoreResult<Role> {
        self.check()?;
        self.inner.create_role(name, description, permissions).await
    }

    async fn list_roles(&self) -> CoreResult<Vec<Role>> {
        self.check()?;
        self.inner.list_roles().await
    }

    async fn roles_for(&self, principal: &Principal) -> CoreResult<Vec<Role>> {
        self.check()?;
        self.inner.roles_for(principal).await
    }

    fn name(&self) -> &str {
        "mock"
    }

    async fn health_check(&self) -> bool {
        !self.failing.load(Ordering::SeqCst)
    }
}
