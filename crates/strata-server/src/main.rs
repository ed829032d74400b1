//! # Strata Server
//!
//! `strata-server serve` runs the HTTP API; `strata-server create-app <name>`
//! scaffolds a new app on the generic DAO/service layers.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use strata_config::{ConfigLoader, ObservabilityConfig};
use strata_core::StrataResult;
use strata_server::{app, scaffold, startup::print_banner};
use tokio::signal;
use tracing::{error, info};

#[derive(Debug, Parser)]
#[command(name = "strata-server", version, about = "Strata API server")]
struct Cli {
    /// Directory holding default.toml, {environment}.toml and local.toml.
    #[arg(long, env = "STRATA_CONFIG_DIR", default_value = "./config", global = true)]
    config_dir: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the HTTP API (default).
    Serve,
    /// Scaffold a new app.
    CreateApp {
        /// snake_case app name.
        name: String,
        /// Parent directory of the new app.
        #[arg(long, default_value = "apps")]
        dir: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => run_server(cli.config_dir).await,
        Command::CreateApp { name, dir } => {
            init_logging(&ObservabilityConfig::default());
            scaffold::create_app(&name, &dir).map(|_| ())
        }
    };

    if let Err(e) = result {
        error!("Application error: {}", e);
        std::process::exit(1);
    }
}

async fn run_server(config_dir: PathBuf) -> StrataResult<()> {
    let config = match ConfigLoader::new(config_dir) {
        Ok(loader) => loader.get().await,
        Err(e) => {
            init_logging(&ObservabilityConfig::default());
            return Err(e);
        }
    };

    init_logging(&config.observability);
    print_banner();
    info!("Starting Strata Server...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    app::serve(config, shutdown_signal()).await
}

fn init_logging(observability: &ObservabilityConfig) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "{},strata=debug,tower_http=debug",
            observability.log_level
        ))
    });

    let registry = tracing_subscriber::registry().with(filter);
    if observability.is_json() {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .init();
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        () = terminate => {
            info!("Received terminate signal, initiating graceful shutdown...");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults_to_serve() {
        let cli = Cli::try_parse_from(["strata-server"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.config_dir, PathBuf::from("./config"));
    }

    #[test]
    fn test_cli_create_app() {
        let cli = Cli::try_parse_from([
            "strata-server",
            "create-app",
            "orders",
            "--dir",
            "src/apps",
            "--config-dir",
            "conf",
        ])
        .unwrap();

        match cli.command {
            Some(Command::CreateApp { name, dir }) => {
                assert_eq!(name, "orders");
                assert_eq!(dir, PathBuf::from("src/apps"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
        assert_eq!(cli.config_dir, PathBuf::from("conf"));
    }
}
