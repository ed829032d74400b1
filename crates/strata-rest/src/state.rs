//! Application state for Axum handlers.

use shaku::{HasComponent, Module};
use std::sync::Arc;
use strata_repository::DatabasePoolInterface;
use strata_service::{AuthService, UserReadService, UserWriteService};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub user_reader: Arc<dyn UserReadService>,
    pub user_writer: Arc<dyn UserWriteService>,
    pub auth_service: Arc<dyn AuthService>,
    pub database: Arc<dyn DatabasePoolInterface>,
}

impl AppState {
    /// Creates a new application state.
    pub fn new(
        user_reader: Arc<dyn UserReadService>,
        user_writer: Arc<dyn UserWriteService>,
        auth_service: Arc<dyn AuthService>,
        database: Arc<dyn DatabasePoolInterface>,
    ) -> Self {
        Self {
            user_reader,
            user_writer,
            auth_service,
            database,
        }
    }

    /// Resolves every service from a shaku module.
    pub fn from_module<M>(module: &M) -> Self
    where
        M: Module
            + HasComponent<dyn UserReadService>
            + HasComponent<dyn UserWriteService>
            + HasComponent<dyn AuthService>
            + HasComponent<dyn DatabasePoolInterface>,
    {
        Self::new(
            module.resolve(),
            module.resolve(),
            module.resolve(),
            module.resolve(),
        )
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState").finish_non_exhaustive()
    }
}
