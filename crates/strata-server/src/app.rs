//! HTTP serve loop.

use crate::{di::build_module, startup::print_startup_info};
use std::future::Future;
use std::net::SocketAddr;
use strata_config::AppConfig;
use strata_core::{StrataError, StrataResult};
use strata_repository::{create_pool, DatabasePoolInterface};
use strata_rest::{create_router, AppState};
use tracing::info;

/// Opens the database, wires the services and serves HTTP until `shutdown`
/// resolves.
pub async fn serve<F>(config: AppConfig, shutdown: F) -> StrataResult<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let pool = create_pool(&config.database).await?;
    let module = build_module(&pool, &config.security);
    let router = create_router(AppState::from_module(&*module), &config);

    let addr = config.server.addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| StrataError::Internal(format!("Failed to bind {addr}: {e}")))?;
    print_startup_info(&config, listener.local_addr().ok());

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown)
    .await
    .map_err(|e| StrataError::Internal(format!("REST server error: {e}")))?;

    pool.close().await;
    info!("Server shutdown complete");
    Ok(())
}
