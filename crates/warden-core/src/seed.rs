// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! First-run seeding of the credential store.
//!
//! An empty store gets two roles and one superuser:
//!
//! - `Administrator`: every API in the catalog
//! - `Regular User`: every `GET` API plus everything in the `base` module
//! - `admin`: superuser bound to `Administrator`
//!
//! Seeding is skipped entirely when any principal already exists.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::CoreResult;
use crate::password::PasswordHasher;
use crate::store::CredentialStore;
use crate::types::{NewPrincipal, Permission};

/// Name of the role granted the full API catalog.
pub const ADMIN_ROLE: &str = "Administrator";

/// Name of the read-mostly role.
pub const USER_ROLE: &str = "Regular User";

/// Module whose APIs every regular user may call.
pub const BASE_MODULE: &str = "base";

/// One entry of the API catalog used to build seed roles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiEntry {
    /// HTTP method.
    pub method: String,
    /// Path pattern.
    pub path: String,
    /// Module tag, e.g. `base`, `user`, `role`.
    pub module: String,
    /// Short description.
    pub summary: String,
}

impl ApiEntry {
    /// Creates a catalog entry.
    pub fn new(
        method: impl Into<String>,
        path: impl Into<String>,
        module: impl Into<String>,
        summary: impl Into<String>,
    ) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            module: module.into(),
            summary: summary.into(),
        }
    }

    fn permission(&self) -> Permission {
        Permission::api(&self.method, self.path.clone())
    }
}

/// Seed parameters.
#[derive(Debug, Clone)]
pub struct SeedOptions {
    /// Superuser login name.
    pub admin_username: String,
    /// Superuser password.
    pub admin_password: String,
    /// Superuser email.
    pub admin_email: String,
    /// API catalog the seed roles are built from.
    pub api_catalog: Vec<ApiEntry>,
}

impl Default for SeedOptions {
    fn default() -> Self {
        Self {
            admin_username: "admin".to_string(),
            admin_password: "abcd1234".to_string(),
            admin_email: "admin@admin.com".to_string(),
            api_catalog: Vec::new(),
        }
    }
}

/// What seeding did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedOutcome {
    /// Roles and superuser were created.
    Seeded,
    /// The store already had principals.
    Skipped,
}

/// Seeds an empty store.
pub async fn seed_defaults(
    store: &dyn CredentialStore,
    hasher: &PasswordHasher,
    options: &SeedOptions,
) -> CoreResult<SeedOutcome> {
    let existing = store.principal_count().await?;
    if existing > 0 {
        info!(principals = existing, "Store already populated, skipping seed");
        return Ok(SeedOutcome::Skipped);
    }

    let admin_permissions: Vec<Permission> =
        options.api_catalog.iter().map(ApiEntry::permission).collect();
    let user_permissions: Vec<Permission> = options
        .api_catalog
        .iter()
        .filter(|e| e.method.eq_ignore_ascii_case("GET") || e.module == BASE_MODULE)
        .map(ApiEntry::permission)
        .collect();

    let admin_role = store
        .create_role(ADMIN_ROLE, "Administrator role", admin_permissions)
        .await?;
    store
        .create_role(USER_ROLE, "Regular user role", user_permissions)
        .await?;

    let password_hash = hasher.hash_blocking(options.admin_password.clone()).await?;
    store
        .create_principal(NewPrincipal {
            username: options.admin_username.clone(),
            email: options.admin_email.clone(),
            alias: None,
            password_hash,
            is_active: true,
            is_superuser: true,
            role_ids: vec![admin_role.id],
        })
        .await?;

    info!(
        username = %options.admin_username,
        apis = options.api_catalog.len(),
        "Superuser and default roles created"
    );
    Ok(SeedOutcome::Seeded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::password::HashParams;
    use crate::store::InMemoryCredentialStore;

    fn catalog() -> Vec<ApiEntry> {
        vec![
            ApiEntry::new("POST", "/api/v1/base/update_password", "base", "Change password"),
            ApiEntry::new("GET", "/api/v1/user/list", "user", "List users"),
            ApiEntry::new("POST", "/api/v1/user/deactivate", "user", "Deactivate user"),
        ]
    }

    #[tokio::test]
    async fn test_seed_creates_admin_and_roles() {
        let store = InMemoryCredentialStore::new();
        let hasher = PasswordHasher::new(HashParams::insecure_fast()).unwrap();
        let options = SeedOptions {
            api_catalog: catalog(),
            ..Default::default()
        };

        let outcome = seed_defaults(&store, &hasher, &options).await.unwrap();
        assert_eq!(outcome, SeedOutcome::Seeded);

        let admin = store.find_by_username("admin").await.unwrap().unwrap();
        assert!(admin.is_superuser);
        assert!(hasher.verify("abcd1234", &admin.password_hash));

        let roles = store.list_roles().await.unwrap();
        let admin_role = roles.iter().find(|r| r.name == ADMIN_ROLE).unwrap();
        let user_role = roles.iter().find(|r| r.name == USER_ROLE).unwrap();
        assert_eq!(admin_role.permissions.len(), 3);
        // GET + base module, but not the user-module POST.
        assert_eq!(user_role.permissions.len(), 2);
        assert!(!user_role
            .permissions
            .contains(&Permission::api("POST", "/api/v1/user/deactivate")));
    }

    #[tokio::test]
    async fn test_seed_is_idempotent() {
        let store = InMemoryCredentialStore::new();
        let hasher = PasswordHasher::new(HashParams::insecure_fast()).unwrap();
        let options = SeedOptions::default();

        seed_defaults(&store, &hasher, &options).await.unwrap();
        let second = seed_defaults(&store, &hasher, &options).await.unwrap();

        assert_eq!(second, SeedOutcome::Skipped);
        assert_eq!(store.principal_count().await.unwrap(), 1);
        assert_eq!(store.list_roles().await.unwrap().len(), 2);
    }
}
