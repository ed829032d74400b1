//! Shared fixtures for service tests.

use std::sync::Arc;
use strata_config::{DatabaseConfig, SecurityConfig};
use strata_repository::{create_pool, DatabasePoolInterface};
use strata_security::{PasswordHasher, TokenProvider};

pub(crate) async fn memory_pool() -> Arc<dyn DatabasePoolInterface> {
    let config = DatabaseConfig {
        url: "sqlite::memory:".to_string(),
        ..Default::default()
    };
    create_pool(&config).await.unwrap()
}

/// A migrated pool on a database file inside a fresh temp dir. Keep the dir
/// alive for as long as the pool is used.
pub(crate) async fn file_pool() -> (tempfile::TempDir, Arc<dyn DatabasePoolInterface>) {
    let dir = tempfile::tempdir().unwrap();
    let config = DatabaseConfig {
        url: format!("sqlite://{}?mode=rwc", dir.path().join("strata.db").display()),
        ..Default::default()
    };
    let pool = create_pool(&config).await.unwrap();
    (dir, pool)
}

pub(crate) fn hasher() -> Arc<PasswordHasher> {
    Arc::new(PasswordHasher::with_cost(1))
}

pub(crate) fn token_provider() -> Arc<TokenProvider> {
    Arc::new(TokenProvider::new(Arc::new(SecurityConfig {
        jwt_secret: "service-test-secret-0123456789abcdef".to_string(),
        ..Default::default()
    })))
}
