// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Role-Based Access Control (RBAC).
//!
//! The policy makes one decision per protected request from the capability
//! set already attached to the [`AuthContext`]. It never touches the store.

use std::fmt;

use serde::Serialize;

use super::context::AuthContext;

// =============================================================================
// Decision
// =============================================================================

/// Why a request was allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AllowReason {
    /// The principal carries the superuser flag.
    Superuser,
    /// A role permission matched.
    Granted,
}

/// Outcome of an authorization check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// Access granted.
    Allow(AllowReason),
    /// Access denied.
    Deny,
}

impl Decision {
    /// Returns `true` if access is granted.
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow(_))
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Allow(AllowReason::Superuser) => f.write_str("allow (superuser)"),
            Decision::Allow(AllowReason::Granted) => f.write_str("allow"),
            Decision::Deny => f.write_str("deny"),
        }
    }
}

// =============================================================================
// RBAC Policy
// =============================================================================

/// Permission evaluator.
///
/// Deny is the default: a principal with no roles, or whose roles grant
/// nothing matching, is denied. Any matching grant allows.
#[derive(Debug, Clone, Copy, Default)]
pub struct RbacPolicy;

impl RbacPolicy {
    /// Creates the policy.
    pub fn new() -> Self {
        Self
    }

    /// Decides whether `ctx` may call `method path`.
    pub fn authorize(&self, ctx: &AuthContext, method: &str, path: &str) -> Decision {
        if ctx.is_superuser {
            return Decision::Allow(AllowReason::Superuser);
        }
        if ctx.roles.is_empty() {
            return Decision::Deny;
        }
        if ctx.permissions.allows(method, path) {
            Decision::Allow(AllowReason::Granted)
        } else {
            Decision::Deny
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use warden_core::{Permission, Principal, PrincipalId, Role, RoleId};

    fn principal(superuser: bool, role_ids: Vec<RoleId>) -> Principal {
        let now = Utc::now();
        Principal {
            id: PrincipalId::new(2),
            username: "bob".into(),
            email: "bob@example.com".into(),
            alias: None,
            password_hash: String::new(),
            is_active: true,
            is_superuser: superuser,
            role_ids,
            last_login: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn role(permissions: Vec<Permission>) -> Role {
        Role {
            id: RoleId::new(1),
            name: "Regular User".into(),
            description: String::new(),
            permissions,
        }
    }

    #[test]
    fn test_no_roles_denies() {
        let ctx = AuthContext::new(&principal(false, vec![]), &[]);
        assert_eq!(
            RbacPolicy::new().authorize(&ctx, "GET", "/api/v1/user/list"),
            Decision::Deny
        );
    }

    #[test]
    fn test_superuser_bypasses() {
        let ctx = AuthContext::new(&principal(true, vec![]), &[]);
        let decision = RbacPolicy::new().authorize(&ctx, "DELETE", "/api/v1/anything");
        assert_eq!(decision, Decision::Allow(AllowReason::Superuser));
    }

    #[test]
    fn test_grant_allows_and_default_denies() {
        let roles = vec![role(vec![Permission::api("GET", "/api/v1/user/list")])];
        let ctx = AuthContext::new(&principal(false, vec![RoleId::new(1)]), &roles);
        let policy = RbacPolicy::new();

        assert!(policy.authorize(&ctx, "GET", "/api/v1/user/list").is_allowed());
        assert_eq!(
            policy.authorize(&ctx, "POST", "/api/v1/user/deactivate"),
            Decision::Deny
        );
    }

    #[test]
    fn test_role_without_matching_grant_denies() {
        let roles = vec![role(vec![Permission::action("user:deactivate")])];
        let ctx = AuthContext::new(&principal(false, vec![RoleId::new(1)]), &roles);
        assert_eq!(
            RbacPolicy::new().authorize(&ctx, "POST", "/api/v1/user/deactivate"),
            Decision::Deny
        );
    }
}
