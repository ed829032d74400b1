//! Password hashing using Argon2id.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString},
    Argon2, Params,
};
use shaku::Component;
use std::sync::Arc;
use strata_core::{Interface, StrataError, StrataResult};
use tracing::debug;

/// Interface for password hashing operations.
pub trait PasswordHasherInterface: Interface + Send + Sync {
    /// Hashes a password into a PHC string with a fresh salt.
    fn hash(&self, password: &str) -> StrataResult<String>;

    /// Returns `Ok(false)` for a wrong password; errors only on a malformed hash.
    fn verify(&self, password: &str, hash: &str) -> StrataResult<bool>;

    /// True when `hash` was produced by another algorithm or is unreadable.
    fn needs_rehash(&self, hash: &str) -> bool;
}

/// Argon2id password hasher.
#[derive(Component, Clone)]
#[shaku(interface = PasswordHasherInterface)]
pub struct PasswordHasher {
    argon2: Arc<Argon2<'static>>,
}

impl PasswordHasher {
    #[must_use]
    pub fn new() -> Self {
        Self::with_params(Params::DEFAULT)
    }

    #[must_use]
    pub fn with_params(params: Params) -> Self {
        let argon2 = Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params);
        Self {
            argon2: Arc::new(argon2),
        }
    }

    /// Creates a hasher from a memory cost in MiB.
    #[must_use]
    pub fn with_cost(cost: u32) -> Self {
        let params = Params::new(cost.saturating_mul(1024), 2, 1, None).unwrap_or(Params::DEFAULT);
        Self::with_params(params)
    }

    /// Component parameters for registering a hasher in a shaku module.
    #[must_use]
    pub fn parameters(cost: u32) -> PasswordHasherParameters {
        PasswordHasherParameters {
            argon2: Self::with_cost(cost).argon2,
        }
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl PasswordHasherInterface for PasswordHasher {
    fn hash(&self, password: &str) -> StrataResult<String> {
        let salt = SaltString::generate(&mut OsRng);

        let hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| StrataError::Internal(format!("Failed to hash password: {e}")))?;

        debug!("Password hashed successfully");
        Ok(hash.to_string())
    }

    fn verify(&self, password: &str, hash: &str) -> StrataResult<bool> {
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|e| StrataError::Internal(format!("Invalid password hash format: {e}")))?;

        match self.argon2.verify_password(password.as_bytes(), &parsed_hash) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => {
                debug!("Password verification failed: incorrect password");
                Ok(false)
            }
            Err(e) => Err(StrataError::Internal(format!("Password verification error: {e}"))),
        }
    }

    fn needs_rehash(&self, hash: &str) -> bool {
        PasswordHash::new(hash)
            .map_or(true, |parsed| parsed.algorithm != argon2::Algorithm::Argon2id.ident())
    }
}

impl std::fmt::Debug for PasswordHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordHasher").finish_non_exhaustive()
    }
}
