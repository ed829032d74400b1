//! Dependency injection module using Shaku.

use shaku::module;
use std::sync::Arc;
use strata_config::SecurityConfig;
use strata_repository::{DatabasePool, DatabasePoolInterface};
use strata_security::{PasswordHasher, TokenProvider};
use strata_service::{AuthServiceComponent, UserReadServiceComponent, UserWriteServiceComponent};

// Single-process module: database pool, password hashing, JWT tokens and
// the user/auth services.
module! {
    pub AppModule {
        components = [
            DatabasePool,
            PasswordHasher,
            TokenProvider,
            UserReadServiceComponent,
            UserWriteServiceComponent,
            AuthServiceComponent,
        ],
        providers = [],
    }
}

/// Builds the application module around an open pool.
pub fn build_module(pool: &DatabasePool, security: &SecurityConfig) -> Arc<AppModule> {
    let module = AppModule::builder()
        .with_component_parameters::<DatabasePool>(DatabasePool::parameters(pool.inner().clone()))
        .with_component_parameters::<PasswordHasher>(PasswordHasher::parameters(
            security.password_hash_cost,
        ))
        .with_component_parameters::<TokenProvider>(TokenProvider::parameters(Arc::new(
            security.clone(),
        )))
        .build();

    Arc::new(module)
}
