// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Credential store.
//!
//! [`CredentialStore`] is the persistence seam for principals, roles and
//! login sessions. Reads are plain lookups; every mutation is a single
//! atomic operation on the backend so callers never need an
//! application-level lock. Session rotation in particular is a
//! compare-and-advance, which is what makes refresh-token reuse detection
//! race-free.
//!
//! Each login opens its own session with its own rotation sequence, so a
//! principal signed in on several devices rotates and loses those sessions
//! independently.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tracing::debug;

use crate::clock::{SharedClock, SystemClock};
use crate::error::{CoreError, CoreResult};
use crate::types::{
    NewPrincipal, Permission, Principal, PrincipalId, RefreshRotation, Role, RoleId, SessionId,
};

// =============================================================================
// Session Advance
// =============================================================================

/// Outcome of presenting a rotation sequence to its session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionAdvance {
    /// The sequence was current and has been advanced to the carried value.
    Advanced(u64),
    /// The sequence was stale. The session has been revoked.
    Reused,
    /// The session does not exist: never opened, expired or revoked.
    Unknown,
}

// =============================================================================
// Core Trait
// =============================================================================

/// Persistence for principals and roles.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Looks up a principal by login name.
    async fn find_by_username(&self, username: &str) -> CoreResult<Option<Principal>>;

    /// Looks up a principal by ID.
    async fn get_principal(&self, id: PrincipalId) -> CoreResult<Option<Principal>>;

    /// Lists all principals ordered by ID.
    async fn list_principals(&self) -> CoreResult<Vec<Principal>>;

    /// Number of stored principals.
    async fn principal_count(&self) -> CoreResult<usize>;

    /// Creates a principal. Fails with `Conflict` on a duplicate username
    /// or email, and with `NotFound` when a referenced role does not exist.
    async fn create_principal(&self, new: NewPrincipal) -> CoreResult<Principal>;

    /// Sets the active flag and returns the updated principal.
    /// Deactivation also revokes every session.
    async fn set_active(&self, id: PrincipalId, active: bool) -> CoreResult<Principal>;

    /// Records a successful login.
    async fn record_login(&self, id: PrincipalId, at: DateTime<Utc>) -> CoreResult<()>;

    /// Replaces the stored password hash.
    async fn update_password_hash(&self, id: PrincipalId, hash: String) -> CoreResult<()>;

    /// Opens a new login session at sequence 1, valid until `expires_at`.
    ///
    /// Other sessions of the principal are untouched apart from pruning
    /// those already past their expiry.
    async fn open_session(
        &self,
        id: PrincipalId,
        expires_at: DateTime<Utc>,
    ) -> CoreResult<RefreshRotation>;

    /// Compare-and-advance within one session.
    ///
    /// If `presented.seq` is the session's current sequence, it is advanced
    /// and the expiry pushed to `expires_at`. A stale sequence is reuse: the
    /// session is revoked in the same step.
    async fn advance_session(
        &self,
        id: PrincipalId,
        presented: RefreshRotation,
        expires_at: DateTime<Utc>,
    ) -> CoreResult<SessionAdvance>;

    /// Revokes every session of a principal. Returns how many were open.
    async fn revoke_sessions(&self, id: PrincipalId) -> CoreResult<usize>;

    /// Number of open, unexpired sessions of a principal.
    async fn session_count(&self, id: PrincipalId) -> CoreResult<usize>;

    /// Creates a role. Fails with `Conflict` on a duplicate name.
    async fn create_role(
        &self,
        name: &str,
        description: &str,
        permissions: Vec<Permission>,
    ) -> CoreResult<Role>;

    /// Lists all roles ordered by ID.
    async fn list_roles(&self) -> CoreResult<Vec<Role>>;

    /// Returns the roles bound to a principal. Dangling role IDs are skipped.
    async fn roles_for(&self, principal: &Principal) -> CoreResult<Vec<Role>>;

    /// Returns the store name for identification.
    fn name(&self) -> &str {
        "credential_store"
    }

    /// Returns `true` if the backend is reachable.
    async fn health_check(&self) -> bool {
        true
    }
}

// =============================================================================
// In-Memory Store
// =============================================================================

#[derive(Debug, Clone, Copy)]
struct SessionEntry {
    seq: u64,
    expires_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct StoreInner {
    principals: BTreeMap<PrincipalId, Principal>,
    roles: BTreeMap<RoleId, Role>,
    sessions: HashMap<PrincipalId, HashMap<SessionId, SessionEntry>>,
    next_principal_id: u64,
    next_role_id: u64,
}

impl StoreInner {
    fn principal_mut(&mut self, id: PrincipalId) -> CoreResult<&mut Principal> {
        self.principals
            .get_mut(&id)
            .ok_or_else(|| CoreError::not_found("principal", id))
    }
}

/// In-memory credential store.
///
/// Every mutation takes the write lock once, which makes each trait method
/// atomic with respect to every other. Clones share the same data.
#[derive(Clone)]
pub struct InMemoryCredentialStore {
    inner: Arc<RwLock<StoreInner>>,
    clock: SharedClock,
}

impl InMemoryCredentialStore {
    /// Creates an empty store using the system clock.
    pub fn new() -> Self {
        Self::with_clock(SystemClock::shared())
    }

    /// Creates an empty store stamping records with the given clock.
    pub fn with_clock(clock: SharedClock) -> Self {
        Self {
            inner: Arc::new(RwLock::new(StoreInner {
                next_principal_id: 1,
                next_role_id: 1,
                ..Default::default()
            })),
            clock,
        }
    }
}

impl Default for InMemoryCredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InMemoryCredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.read();
        f.debug_struct("InMemoryCredentialStore")
            .field("principals", &inner.principals.len())
            .field("roles", &inner.roles.len())
            .finish()
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn find_by_username(&self, username: &str) -> CoreResult<Option<Principal>> {
        let inner = self.inner.read();
        Ok(inner
            .principals
            .values()
            .find(|p| p.username == username)
            .cloned())
    }

    async fn get_principal(&self, id: PrincipalId) -> CoreResult<Option<Principal>> {
        Ok(self.inner.read().principals.get(&id).cloned())
    }

    async fn list_principals(&self) -> CoreResult<Vec<Principal>> {
        Ok(self.inner.read().principals.values().cloned().collect())
    }

    async fn principal_count(&self) -> CoreResult<usize> {
        Ok(self.inner.read().principals.len())
    }

    async fn create_principal(&self, new: NewPrincipal) -> CoreResult<Principal> {
        if new.username.trim().is_empty() {
            return Err(CoreError::validation("username", "must not be empty"));
        }

        let now = self.clock.now();
        let mut inner = self.inner.write();

        if inner.principals.values().any(|p| p.username == new.username) {
            return Err(CoreError::conflict(format!(
                "username '{}' already exists",
                new.username
            )));
        }
        if inner.principals.values().any(|p| p.email == new.email) {
            return Err(CoreError::conflict(format!(
                "email '{}' already exists",
                new.email
            )));
        }
        if let Some(missing) = new.role_ids.iter().find(|id| !inner.roles.contains_key(*id)) {
            return Err(CoreError::not_found("role", missing));
        }

        let id = PrincipalId::new(inner.next_principal_id);
        inner.next_principal_id += 1;

        let principal = Principal {
            id,
            username: new.username,
            email: new.email,
            alias: new.alias,
            password_hash: new.password_hash,
            is_active: new.is_active,
            is_superuser: new.is_superuser,
            role_ids: new.role_ids,
            last_login: None,
            created_at: now,
            updated_at: now,
        };
        inner.principals.insert(id, principal.clone());

        debug!(principal_id = %id, username = %principal.username, "Principal created");
        Ok(principal)
    }

    async fn set_active(&self, id: PrincipalId, active: bool) -> CoreResult<Principal> {
        let now = self.clock.now();
        let mut inner = self.inner.write();
        let principal = inner.principal_mut(id)?;
        principal.is_active = active;
        principal.updated_at = now;
        let principal = principal.clone();

        if !active {
            inner.sessions.remove(&id);
        }
        Ok(principal)
    }

    async fn record_login(&self, id: PrincipalId, at: DateTime<Utc>) -> CoreResult<()> {
        let mut inner = self.inner.write();
        inner.principal_mut(id)?.last_login = Some(at);
        Ok(())
    }

    async fn update_password_hash(&self, id: PrincipalId, hash: String) -> CoreResult<()> {
        let now = self.clock.now();
        let mut inner = self.inner.write();
        let principal = inner.principal_mut(id)?;
        principal.password_hash = hash;
        principal.updated_at = now;
        Ok(())
    }

    async fn open_session(
        &self,
        id: PrincipalId,
        expires_at: DateTime<Utc>,
    ) -> CoreResult<RefreshRotation> {
        let now = self.clock.now();
        let mut inner = self.inner.write();
        inner.principal_mut(id)?;

        let sessions = inner.sessions.entry(id).or_default();
        sessions.retain(|_, entry| entry.expires_at > now);

        let rotation = RefreshRotation {
            session: SessionId::generate(),
            seq: 1,
        };
        sessions.insert(
            rotation.session,
            SessionEntry {
                seq: rotation.seq,
                expires_at,
            },
        );

        debug!(
            principal_id = %id,
            session = %rotation.session,
            open = sessions.len(),
            "Session opened"
        );
        Ok(rotation)
    }

    async fn advance_session(
        &self,
        id: PrincipalId,
        presented: RefreshRotation,
        expires_at: DateTime<Utc>,
    ) -> CoreResult<SessionAdvance> {
        let now = self.clock.now();
        let mut inner = self.inner.write();
        let Some(sessions) = inner.sessions.get_mut(&id) else {
            return Ok(SessionAdvance::Unknown);
        };

        let outcome = match sessions.get_mut(&presented.session) {
            None => SessionAdvance::Unknown,
            Some(entry) if entry.expires_at <= now => {
                sessions.remove(&presented.session);
                SessionAdvance::Unknown
            }
            Some(entry) if entry.seq == presented.seq => {
                entry.seq = entry.seq.wrapping_add(1);
                entry.expires_at = expires_at;
                SessionAdvance::Advanced(entry.seq)
            }
            Some(_) => {
                sessions.remove(&presented.session);
                SessionAdvance::Reused
            }
        };
        Ok(outcome)
    }

    async fn revoke_sessions(&self, id: PrincipalId) -> CoreResult<usize> {
        let revoked = self
            .inner
            .write()
            .sessions
            .remove(&id)
            .map_or(0, |sessions| sessions.len());
        Ok(revoked)
    }

    async fn session_count(&self, id: PrincipalId) -> CoreResult<usize> {
        let now = self.clock.now();
        let inner = self.inner.read();
        Ok(inner.sessions.get(&id).map_or(0, |sessions| {
            sessions.values().filter(|e| e.expires_at > now).count()
        }))
    }

    async fn create_role(
        &self,
        name: &str,
        description: &str,
        permissions: Vec<Permission>,
    ) -> CoreResult<Role> {
        let mut inner = self.inner.write();

        if inner.roles.values().any(|r| r.name == name) {
            return Err(CoreError::conflict(format!("role '{name}' already exists")));
        }

        let id = RoleId::new(inner.next_role_id);
        inner.next_role_id += 1;

        let role = Role {
            id,
            name: name.to_string(),
            description: description.to_string(),
            permissions,
        };
        inner.roles.insert(id, role.clone());
        Ok(role)
    }

    async fn list_roles(&self) -> CoreResult<Vec<Role>> {
        Ok(self.inner.read().roles.values().cloned().collect())
    }

    async fn roles_for(&self, principal: &Principal) -> CoreResult<Vec<Role>> {
        let inner = self.inner.read();
        Ok(principal
            .role_ids
            .iter()
            .filter_map(|id| inner.roles.get(id).cloned())
            .collect())
    }

    fn name(&self) -> &str {
        "memory"
    }
}

// =============================================================================
// Tests
// =============================================================================
