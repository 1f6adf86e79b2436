// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Argon2id password hashing.
//!
//! Hashes are stored as PHC strings, so verification reads its parameters
//! from the stored hash and keeps working after the configured cost changes.
//! Digest comparison inside `password-hash` is constant time.
//!
//! Hashing is intentionally slow. Async callers should use
//! [`PasswordHasher::hash_blocking`] / [`PasswordHasher::verify_blocking`],
//! which move the work onto tokio's blocking pool.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{
    PasswordHash, PasswordHasher as _, PasswordVerifier as _, SaltString,
};
use argon2::{Algorithm, Argon2, Params, Version};

use crate::error::{CoreError, CoreResult};

/// Minimum accepted password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

// =============================================================================
// HashParams
// =============================================================================

/// Argon2id cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashParams {
    /// Memory cost in KiB.
    pub memory_kib: u32,
    /// Number of passes.
    pub iterations: u32,
    /// Degree of parallelism.
    pub parallelism: u32,
}

impl HashParams {
    /// Minimal parameters for tests. Never use these in production.
    pub const fn insecure_fast() -> Self {
        Self {
            memory_kib: 64,
            iterations: 1,
            parallelism: 1,
        }
    }
}

impl Default for HashParams {
    fn default() -> Self {
        Self {
            memory_kib: Params::DEFAULT_M_COST,
            iterations: Params::DEFAULT_T_COST,
            parallelism: Params::DEFAULT_P_COST,
        }
    }
}

// =============================================================================
// PasswordHasher
// =============================================================================

/// Hashes and verifies passwords with Argon2id.
#[derive(Debug, Clone)]
pub struct PasswordHasher {
    params: Params,
}

impl PasswordHasher {
    /// Creates a hasher with the given cost parameters.
    pub fn new(params: HashParams) -> CoreResult<Self> {
        let params = Params::new(params.memory_kib, params.iterations, params.parallelism, None)
            .map_err(|e| CoreError::hashing(format!("invalid argon2 parameters: {e}")))?;
        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hashes a password into a PHC string.
    pub fn hash(&self, password: &str) -> CoreResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| CoreError::hashing(e.to_string()))
    }

    /// Verifies a password against a stored PHC string.
    ///
    /// An unparseable hash never verifies.
    pub fn verify(&self, password: &str, hash: &str) -> bool {
        let parsed = match PasswordHash::new(hash) {
            Ok(h) => h,
            Err(_) => return false,
        };
        self.argon2()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }

    /// Hashes on the blocking pool.
    pub async fn hash_blocking(&self, password: String) -> CoreResult<String> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| CoreError::hashing(format!("hashing task failed: {e}")))?
    }

    /// Verifies on the blocking pool.
    pub async fn verify_blocking(&self, password: String, hash: String) -> CoreResult<bool> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
            .await
            .map_err(|e| CoreError::hashing(format!("verification task failed: {e}")))
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self {
            params: Params::default(),
        }
    }
}

/// Rejects passwords that are too short to be worth hashing.
pub fn validate_password(password: &str) -> CoreResult<()> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(CoreError::validation(
            "password",
            format!("must be at least {MIN_PASSWORD_LENGTH} characters"),
        ));
    }
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================
