// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Core data types for Warden.
//!
//! Principals own roles, roles own permissions. Permissions are plain data
//! here; matching them against requests is the job of the permission
//! evaluator in the API crate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::CoreError;

// =============================================================================
// Identifiers
// =============================================================================

/// A unique identifier for a principal.
///
/// Serialized as a bare integer in store snapshots and API payloads. Tokens
/// carry it as a decimal string in the `sub` claim.
///
/// # Examples
///
/// ```
/// use warden_core::types::PrincipalId;
///
/// let id: PrincipalId = "42".parse().unwrap();
/// assert_eq!(id.get(), 42);
/// assert_eq!(id.to_string(), "42");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrincipalId(u64);

impl PrincipalId {
    /// Creates a new principal ID.
    #[inline]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw numeric ID.
    #[inline]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for PrincipalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PrincipalId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u64>()
            .map(Self)
            .map_err(|_| CoreError::validation("principal_id", format!("not a valid id: {s:?}")))
    }
}

impl From<u64> for PrincipalId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// A unique identifier for a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleId(u64);

impl RoleId {
    /// Creates a new role ID.
    #[inline]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw numeric ID.
    #[inline]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RoleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifies one login session.
///
/// Every successful login opens a new session; refresh tokens minted from it
/// carry the ID in their `sid` claim. Sessions of the same principal rotate
/// and get revoked independently of each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Generates a new, time-ordered session ID.
    pub fn generate() -> Self {
        Self(Uuid::now_v7())
    }

    /// Wraps an existing UUID.
    pub const fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Position of a refresh token within its login session.
///
/// Only the token carrying the session's current `seq` may be exchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RefreshRotation {
    /// Login session.
    pub session: SessionId,
    /// Rotation sequence within the session, starting at 1.
    pub seq: u64,
}

// =============================================================================
// Permission
// =============================================================================

/// A grant bound to a role.
///
/// `Api` grants an HTTP method on a path pattern. Patterns are either exact
/// (`/api/v1/user/list`), contain `{param}` placeholders matching a single
/// non-empty segment (`/api/v1/user/{id}`), or end in `/*` to match a prefix.
///
/// `Action` grants an abstract capability checked by handlers directly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Permission {
    /// An HTTP method and path pattern.
    Api {
        /// Upper-case HTTP method.
        method: String,
        /// Path pattern.
        path: String,
    },
    /// An abstract action name.
    Action {
        /// Action name, e.g. `user:deactivate`.
        name: String,
    },
}

impl Permission {
    /// Creates an API permission. The method is normalized to upper case.
    pub fn api(method: impl AsRef<str>, path: impl Into<String>) -> Self {
        Self::Api {
            method: method.as_ref().to_ascii_uppercase(),
            path: path.into(),
        }
    }

    /// Creates an action permission.
    pub fn action(name: impl Into<String>) -> Self {
        Self::Action { name: name.into() }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Api { method, path } => write!(f, "{method} {path}"),
            Self::Action { name } => write!(f, "action:{name}"),
        }
    }
}

// =============================================================================
// Role
// =============================================================================

/// A named bundle of permissions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    /// Role ID.
    pub id: RoleId,
    /// Unique role name.
    pub name: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// Granted permissions.
    #[serde(default)]
    pub permissions: Vec<Permission>,
}

// =============================================================================
// Principal
// =============================================================================

/// A stored user identity.
///
/// Principals are deactivated rather than deleted so that audit records keep
/// pointing at something.
#[derive(Clone, Serialize, Deserialize)]
pub struct Principal {
    /// Principal ID.
    pub id: PrincipalId,
    /// Unique login name.
    pub username: String,
    /// Unique email address.
    pub email: String,
    /// Display name.
    pub alias: Option<String>,
    /// Argon2 PHC string.
    pub password_hash: String,
    /// Inactive principals cannot log in or use existing tokens.
    pub is_active: bool,
    /// Explicit superuser flag; bypasses permission checks.
    pub is_superuser: bool,
    /// Bound roles.
    pub role_ids: Vec<RoleId>,
    /// Last successful login.
    pub last_login: Option<DateTime<Utc>>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

impl Principal {
    /// Returns the client-facing view of this principal.
    pub fn view(&self) -> PrincipalView {
        PrincipalView::from(self)
    }
}

impl fmt::Debug for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Principal")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("email", &self.email)
            .field("is_active", &self.is_active)
            .field("is_superuser", &self.is_superuser)
            .field("role_ids", &self.role_ids)
            .field("password_hash", &"[REDACTED]")
            .finish()
    }
}

/// Input for creating a principal.
#[derive(Debug, Clone)]
pub struct NewPrincipal {
    /// Login name.
    pub username: String,
    /// Email address.
    pub email: String,
    /// Display name.
    pub alias: Option<String>,
    /// Pre-computed password hash.
    pub password_hash: String,
    /// Whether the principal can log in.
    pub is_active: bool,
    /// Superuser flag.
    pub is_superuser: bool,
    /// Roles to bind.
    pub role_ids: Vec<RoleId>,
}

/// A principal as returned to clients. Never carries the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrincipalView {
    /// Principal ID.
    pub id: PrincipalId,
    /// Login name.
    pub username: String,
    /// Email address.
    pub email: String,
    /// Display name.
    pub alias: Option<String>,
    /// Active flag.
    pub is_active: bool,
    /// Superuser flag.
    pub is_superuser: bool,
    /// Bound role IDs.
    pub roles: Vec<RoleId>,
    /// Last successful login.
    pub last_login: Option<DateTime<Utc>>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

impl From<&Principal> for PrincipalView {
    fn from(p: &Principal) -> Self {
        Self {
            id: p.id,
            username: p.username.clone(),
            email: p.email.clone(),
            alias: p.alias.clone(),
            is_active: p.is_active,
            is_superuser: p.is_superuser,
            roles: p.role_ids.clone(),
            last_login: p.last_login,
            created_at: p.created_at,
            updated_at: p.updated_at,
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
    fn test_principal_id_parse() {
        assert_eq!("7".parse::<PrincipalId>().unwrap(), PrincipalId::new(7));
        assert!("abc".parse::<PrincipalId>().is_err());
        assert!("-1".parse::<PrincipalId>().is_err());
    }

    #[test]
    fn test_permission_method_normalized() {
        let p = Permission::api("get", "/api/v1/user/list");
        assert_eq!(
            p,
            Permission::Api {
                method: "GET".into(),
                path: "/api/v1/user/list".into()
            }
        );
        assert_eq!(p.to_string(), "GET /api/v1/user/list");
    }

    #[test]
    fn test_permission_serde_tagged() {
        let json = serde_json::to_value(Permission::action("user:deactivate")).unwrap();
        assert_eq!(json["kind"], "action");
        assert_eq!(json["name"], "user:deactivate");
    }

    #[test]
    fn test_principal_debug_redacts_hash() {
        let now = Utc::now();
        let p = Principal {
            id: PrincipalId::new(1),
            username: "admin".into(),
            email: "admin@admin.com".into(),
            alias: None,
            password_hash: "$argon2id$secret".into(),
            is_active: true,
            is_superuser: true,
            role_ids: vec![],
            last_login: None,
            created_at: now,
            updated_at: now,
        };
        let debug = format!("{p:?}");
        assert!(!debug.contains("argon2id"));
        assert!(debug.contains("REDACTED"));

        let view = serde_json::to_value(p.view()).unwrap();
        assert!(view.get("password_hash").is_none());
    }

    #[test]
    fn test_session_ids_are_unique_strings() {
        let a = SessionId::generate();
        let b = SessionId::generate();
        assert_ne!(a, b);

        let json = serde_json::to_value(a).unwrap();
        assert_eq!(json, serde_json::Value::String(a.to_string()));
    }
}
