// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Test Builders
//!
//! Builders that create principals and roles directly in a store.
//!
//! ```rust,ignore
//! let bob = PrincipalBuilder::new("bob")
//!     .role(USER_ROLE)
//!     .create(app.store.as_ref(), &app.hasher)
//!     .await;
//! ```

use warden_core::{
    CredentialStore, NewPrincipal, PasswordHasher, Permission, Principal, Role, RoleId,
};

use super::fixtures::USER_PASSWORD;

// =============================================================================
// PrincipalBuilder
// =============================================================================

/// Builder for principals.
#[derive(Debug, Clone)]
pub struct PrincipalBuilder {
    username: String,
    email: Option<String>,
    alias: Option<String>,
    password: String,
    is_active: bool,
    is_superuser: bool,
    roles: Vec<String>,
}

impl PrincipalBuilder {
    /// Starts a builder for an active, non-superuser principal with
    /// [`USER_PASSWORD`] and no roles.
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            email: None,
            alias: None,
            password: USER_PASSWORD.to_string(),
            is_active: true,
            is_superuser: false,
            roles: Vec::new(),
        }
    }

    /// Sets the email. Defaults to `<username>@example.com`.
    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Sets the display alias.
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Sets the password.
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = password.into();
        self
    }

    /// Creates the principal inactive.
    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    /// Marks the principal as a superuser.
    pub fn superuser(mut self) -> Self {
        self.is_superuser = true;
        self
    }

    /// Binds a role by name. The role must already exist.
    pub fn role(mut self, name: impl Into<String>) -> Self {
        self.roles.push(name.into());
        self
    }

    /// Creates the principal in `store`.
    pub async fn create(self, store: &dyn CredentialStore, hasher: &PasswordHasher) -> Principal {
        let role_ids = resolve_roles(store, &self.roles).await;
        let password_hash = hasher.hash(&self.password).expect("hashing succeeds");
        let email = self
            .email
            .unwrap_or_else(|| format!("{}@example.com", self.username));

        store
            .create_principal(NewPrincipal {
                username: self.username,
                email,
                alias: self.alias,
                password_hash,
                is_active: self.is_active,
                is_superuser: self.is_superuser,
                role_ids,
            })
            .await
            .expect("principal is created")
    }
}

async fn resolve_roles(store: &dyn CredentialStore, names: &[String]) -> Vec<RoleId> {
    let roles = store.list_roles().await.expect("roles are listed");
    names
        .iter()
        .map(|name| {
            roles
                .iter()
                .find(|r| &r.name == name)
                .unwrap_or_else(|| panic!("role {name} does not exist"))
                .id
        })
        .collect()
}

// =============================================================================
// RoleBuilder
// =============================================================================

/// Builder for roles.
#[derive(Debug, Clone)]
pub struct RoleBuilder {
    name: String,
    description: String,
    permissions: Vec<Permission>,
}

impl RoleBuilder {
    /// Starts a builder for a role with no permissions.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            permissions: Vec::new(),
        }
    }

    /// Sets the description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Grants `method path`.
    pub fn api(mut self, method: &str, path: &str) -> Self {
        self.permissions.push(Permission::api(method, path));
        self
    }

    /// Grants a named action.
    pub fn action(mut self, name: &str) -> Self {
        self.permissions.push(Permission::action(name));
        self
    }

    /// Creates the role in `store`.
    pub async fn create(self, store: &dyn CredentialStore) -> Role {
        store
            .create_role(&self.name, &self.description, self.permissions)
            .await
            .expect("role is created")
    }
}
