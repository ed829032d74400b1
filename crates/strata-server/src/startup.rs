//! Server startup utilities.

use std::net::SocketAddr;
use strata_config::AppConfig;
use tracing::info;

/// Prints the startup banner.
pub fn print_banner() {
    info!(
        r"
       _             _
   ___| |_ _ __ __ _| |_ __ _
  / __| __| '__/ _` | __/ _` |
  \__ \ |_| | | (_| | || (_| |
  |___/\__|_|  \__,_|\__\__,_|
"
    );
}

/// Prints where the server can be reached.
pub fn print_startup_info(config: &AppConfig, bound: Option<SocketAddr>) {
    let addr = bound.map_or_else(|| config.server.addr(), |a| a.to_string());
    let separator = "=".repeat(60);
    info!("{}", separator);
    info!("Environment: {}", config.app.environment);
    info!("REST API:    http://{}/api/v1", addr);
    info!("Health:      http://{}/health", addr);
    info!("API Docs:    http://{}/swagger-ui", addr);
    info!("{}", separator);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_print_banner_does_not_panic() {
        let _ = tracing_subscriber::fmt::try_init();
        print_banner();
    }

    #[test]
    fn test_print_startup_info_does_not_panic() {
        let _ = tracing_subscriber::fmt::try_init();
        print_startup_info(&AppConfig::default(), None);
        print_startup_info(&AppConfig::default(), Some(SocketAddr::from(([127, 0, 0, 1], 3000))));
    }
}
