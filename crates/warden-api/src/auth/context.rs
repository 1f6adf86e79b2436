// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Authentication context.

use std::net::IpAddr;
use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;
use warden_core::{Principal, PrincipalId, Role};

use super::permission::PermissionSet;

/// Authentication context for a request.
///
/// Built once after the access token verifies and the principal loads. It
/// carries the capability set used by the single authorization decision for
/// the request, plus what the audit layer needs.
#[derive(Debug, Clone, Serialize)]
pub struct AuthContext {
    /// Principal ID.
    pub user_id: PrincipalId,
    /// Login name.
    pub username: String,
    /// Explicit superuser flag copied from the principal.
    pub is_superuser: bool,
    /// Names of the bound roles.
    pub roles: Vec<String>,
    /// Union of the role permissions.
    #[serde(skip)]
    pub permissions: Arc<PermissionSet>,
    /// Client IP address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_ip: Option<IpAddr>,
    /// Request ID for tracing.
    pub request_id: Uuid,
}

impl AuthContext {
    /// Builds the context from a loaded principal and its roles.
    pub fn new(principal: &Principal, roles: &[Role]) -> Self {
        let mut permissions = PermissionSet::new();
        for role in roles {
            for permission in &role.permissions {
                permissions.add(permission);
            }
        }

        Self {
            user_id: principal.id,
            username: principal.username.clone(),
            is_superuser: principal.is_superuser,
            roles: roles.iter().map(|r| r.name.clone()).collect(),
            permissions: Arc::new(permissions),
            client_ip: None,
            request_id: Uuid::now_v7(),
        }
    }

    /// Sets the client IP address.
    pub fn with_client_ip(mut self, ip: Option<IpAddr>) -> Self {
        self.client_ip = ip;
        self
    }

    /// Sets the request ID.
    pub fn with_request_id(mut self, request_id: Uuid) -> Self {
        self.request_id = request_id;
        self
    }

    /// Returns `true` if the context has the given role.
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    /// Returns `true` if the caller may perform the named action.
    ///
    /// Superusers may perform every action.
    pub fn can(&self, action: &str) -> bool {
        self.is_superuser || self.permissions.can(action)
    }
}
