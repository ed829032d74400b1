//! Configuration loader with layered sources.

use crate::{format_validation_errors, AppConfig, ConfigValidator, DEFAULT_JWT_SECRET};
use config::{Config, ConfigError, Environment, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use strata_core::StrataError;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Environment variable selecting `config/{environment}.toml`.
pub const ENVIRONMENT_VAR: &str = "STRATA_ENVIRONMENT";

/// Configuration loader with runtime reload support.
#[derive(Clone)]
pub struct ConfigLoader {
    config: Arc<RwLock<AppConfig>>,
    config_dir: PathBuf,
}

impl ConfigLoader {
    /// Loads and validates configuration.
    ///
    /// Sources, later ones overriding earlier ones:
    /// 1. `{dir}/default.toml`
    /// 2. `{dir}/{environment}.toml`, environment from `STRATA_ENVIRONMENT`
    /// 3. `{dir}/local.toml`
    /// 4. environment variables such as `STRATA__SERVER__PORT=9000`
    pub fn new(config_dir: impl Into<PathBuf>) -> Result<Self, StrataError> {
        let config_dir = config_dir.into();
        let config = Self::load_config(&config_dir)?;

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            config_dir,
        })
    }

    /// Loads configuration from `./config`.
    pub fn from_default_location() -> Result<Self, StrataError> {
        Self::new("./config")
    }

    /// Returns a snapshot of the current configuration.
    pub async fn get(&self) -> AppConfig {
        self.config.read().await.clone()
    }

    /// Re-reads every source. The previous configuration stays in place on error.
    pub async fn reload(&self) -> Result<(), StrataError> {
        let new_config = Self::load_config(&self.config_dir)?;
        *self.config.write().await = new_config;
        info!("Configuration reloaded successfully");
        Ok(())
    }

    fn load_config(config_dir: &Path) -> Result<AppConfig, StrataError> {
        if let Err(e) = dotenvy::dotenv() {
            debug!("No .env file loaded: {}", e);
        }

        let environment =
            std::env::var(ENVIRONMENT_VAR).unwrap_or_else(|_| "development".to_string());
        info!("Loading configuration for environment: {}", environment);

        let mut builder = Config::builder();
        for name in ["default", environment.as_str(), "local"] {
            let path = config_dir.join(format!("{name}.toml"));
            if path.exists() {
                debug!("Loading config file: {}", path.display());
                builder = builder.add_source(File::from(path).required(false));
            }
        }

        builder = builder.add_source(
            Environment::with_prefix("STRATA")
                .separator("__")
                .try_parsing(true),
        );

        let mut app_config: AppConfig = builder
            .build()
            .and_then(Config::try_deserialize)
            .map_err(config_error_to_strata_error)?;

        // An explicit STRATA_ENVIRONMENT wins over the file value.
        if std::env::var(ENVIRONMENT_VAR).is_ok() {
            app_config.app.environment = environment;
        }

        ConfigValidator::validate(&app_config)
            .map_err(|errors| StrataError::Configuration(format_validation_errors(&errors)))?;

        if app_config.app.is_production() && app_config.security.jwt_secret == DEFAULT_JWT_SECRET {
            warn!("Using the default JWT secret in production! This is a security risk.");
        }

        Ok(app_config)
    }
}

impl std::fmt::Debug for ConfigLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigLoader")
            .field("config_dir", &self.config_dir)
            .finish_non_exhaustive()
    }
}

fn config_error_to_strata_error(err: ConfigError) -> StrataError {
    StrataError::Configuration(err.to_string())
}
