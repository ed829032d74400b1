//! Configuration validation.
//!
//! Every rule runs and all violations are reported together, so a broken
//! deployment fails at startup with the full list instead of one error at a
//! time.

use crate::{AppConfig, DatabaseConfig, ObservabilityConfig, SecurityConfig, ServerConfig};
use std::fmt;
use url::Url;

/// A single configuration rule violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigValidationError {
    /// JWT secret is too short (minimum 32 characters).
    JwtSecretTooShort { actual: usize, minimum: usize },
    /// Port 0 cannot be bound.
    InvalidPort { name: String, value: u16 },
    /// Pool size configuration is invalid (min must be <= max).
    InvalidPoolSize { min: u32, max: u32 },
    /// Pool size exceeds maximum allowed.
    PoolSizeTooLarge { value: u32, maximum: u32 },
    InvalidUrl { url_type: String, message: String },
    /// Timeout or lifetime must be positive.
    NonPositiveValue { name: String },
    InvalidHashCost { value: u32, minimum: u32, maximum: u32 },
    /// Default access token lifetime outside the per-user bounds.
    InvalidAccessExpiration { value: u64, minimum: u64, maximum: u64 },
    InvalidLogLevel { value: String },
    InvalidLogFormat { value: String },
}

impl fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::JwtSecretTooShort { actual, minimum } => write!(
                f,
                "JWT secret too short: {actual} characters (minimum {minimum})"
            ),
            Self::InvalidPort { name, value } => {
                write!(f, "Invalid port for {name}: {value} (must be 1-65535)")
            }
            Self::InvalidPoolSize { min, max } => write!(
                f,
                "Invalid pool size: min ({min}) cannot be greater than max ({max})"
            ),
            Self::PoolSizeTooLarge { value, maximum } => {
                write!(f, "Pool size {value} exceeds maximum allowed ({maximum})")
            }
            Self::InvalidUrl { url_type, message } => {
                write!(f, "Invalid {url_type} URL: {message}")
            }
            Self::NonPositiveValue { name } => write!(f, "'{name}' must be positive"),
            Self::InvalidHashCost {
                value,
                minimum,
                maximum,
            } => write!(
                f,
                "Invalid password hash cost: {value} (must be between {minimum} and {maximum})"
            ),
            Self::InvalidAccessExpiration {
                value,
                minimum,
                maximum,
            } => write!(
                f,
                "Invalid access token lifetime: {value}s (must be between {minimum}s and {maximum}s)"
            ),
            Self::InvalidLogLevel { value } => write!(
                f,
                "Invalid log level: '{value}' (valid: trace, debug, info, warn, error)"
            ),
            Self::InvalidLogFormat { value } => {
                write!(f, "Invalid log format: '{value}' (valid: pretty, json)")
            }
        }
    }
}

impl std::error::Error for ConfigValidationError {}

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    const MIN_JWT_SECRET_LENGTH: usize = 32;
    const MAX_POOL_SIZE: u32 = 100;
    /// Argon2 memory cost bounds, in MiB.
    const MIN_HASH_COST: u32 = 1;
    const MAX_HASH_COST: u32 = 1024;
    const VALID_LOG_LEVELS: &'static [&'static str] = &["trace", "debug", "info", "warn", "error"];
    const VALID_LOG_FORMATS: &'static [&'static str] = &["pretty", "json"];

    /// Validates the entire configuration, collecting every violation.
    pub fn validate(config: &AppConfig) -> Result<(), Vec<ConfigValidationError>> {
        let mut errors = Vec::new();

        Self::validate_security(&config.security, &mut errors);
        Self::validate_server(&config.server, &mut errors);
        Self::validate_database(&config.database, &mut errors);
        Self::validate_observability(&config.observability, &mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn validate_security(config: &SecurityConfig, errors: &mut Vec<ConfigValidationError>) {
        if config.jwt_secret.len() < Self::MIN_JWT_SECRET_LENGTH {
            errors.push(ConfigValidationError::JwtSecretTooShort {
                actual: config.jwt_secret.len(),
                minimum: Self::MIN_JWT_SECRET_LENGTH,
            });
        }

        if !(Self::MIN_HASH_COST..=Self::MAX_HASH_COST).contains(&config.password_hash_cost) {
            errors.push(ConfigValidationError::InvalidHashCost {
                value: config.password_hash_cost,
                minimum: Self::MIN_HASH_COST,
                maximum: Self::MAX_HASH_COST,
            });
        }

        let (minimum, maximum) = (
            u64::from(strata_core::User::MIN_ACCESS_EXPIRATION_SECS),
            u64::from(strata_core::User::MAX_ACCESS_EXPIRATION_SECS),
        );
        if !(minimum..=maximum).contains(&config.jwt_access_expiration_secs) {
            errors.push(ConfigValidationError::InvalidAccessExpiration {
                value: config.jwt_access_expiration_secs,
                minimum,
                maximum,
            });
        }
        if config.jwt_refresh_expiration_secs == 0 {
            errors.push(ConfigValidationError::NonPositiveValue {
                name: "security.jwt_refresh_expiration_secs".to_string(),
            });
        }
    }

    fn validate_server(config: &ServerConfig, errors: &mut Vec<ConfigValidationError>) {
        if config.port == 0 {
            errors.push(ConfigValidationError::InvalidPort {
                name: "server.port".to_string(),
                value: config.port,
            });
        }
        if config.request_timeout_secs == 0 {
            errors.push(ConfigValidationError::NonPositiveValue {
                name: "server.request_timeout_secs".to_string(),
            });
        }
        if config.max_body_size == 0 {
            errors.push(ConfigValidationError::NonPositiveValue {
                name: "server.max_body_size".to_string(),
            });
        }
        for origin in config.cors_origins.iter().filter(|o| o.as_str() != "*") {
            if Url::parse(origin).is_err() {
                errors.push(ConfigValidationError::InvalidUrl {
                    url_type: "cors origin".to_string(),
                    message: format!("Invalid URL format: {origin}"),
                });
            }
        }
    }

    fn validate_database(config: &DatabaseConfig, errors: &mut Vec<ConfigValidationError>) {
        if config.url.is_empty() {
            errors.push(ConfigValidationError::InvalidUrl {
                url_type: "database".to_string(),
                message: "URL cannot be empty".to_string(),
            });
        } else if !config.url.starts_with("sqlite:") {
            errors.push(ConfigValidationError::InvalidUrl {
                url_type: "database".to_string(),
                message: "URL must start with sqlite:".to_string(),
            });
        }

        if config.min_connections > config.max_connections {
            errors.push(ConfigValidationError::InvalidPoolSize {
                min: config.min_connections,
                max: config.max_connections,
            });
        }
        if config.max_connections == 0 {
            errors.push(ConfigValidationError::NonPositiveValue {
                name: "database.max_connections".to_string(),
            });
        }
        if config.max_connections > Self::MAX_POOL_SIZE {
            errors.push(ConfigValidationError::PoolSizeTooLarge {
                value: config.max_connections,
                maximum: Self::MAX_POOL_SIZE,
            });
        }

        for (name, value) in [
            ("database.connect_timeout_secs", config.connect_timeout_secs),
            ("database.idle_timeout_secs", config.idle_timeout_secs),
            ("database.busy_timeout_secs", config.busy_timeout_secs),
        ] {
            if value == 0 {
                errors.push(ConfigValidationError::NonPositiveValue {
                    name: name.to_string(),
                });
            }
        }
        if config.save_batch_size == 0 {
            errors.push(ConfigValidationError::NonPositiveValue {
                name: "database.save_batch_size".to_string(),
            });
        }
    }

    fn validate_observability(
        config: &ObservabilityConfig,
        errors: &mut Vec<ConfigValidationError>,
    ) {
        let level = config.log_level.to_lowercase();
        if !Self::VALID_LOG_LEVELS.contains(&level.as_str()) {
            errors.push(ConfigValidationError::InvalidLogLevel {
                value: config.log_level.clone(),
            });
        }
        let format = config.log_format.to_lowercase();
        if !Self::VALID_LOG_FORMATS.contains(&format.as_str()) {
            errors.push(ConfigValidationError::InvalidLogFormat {
                value: config.log_format.clone(),
            });
        }
    }
}

/// Formats validation errors as a numbered list.
#[must_use]
pub fn format_validation_errors(errors: &[ConfigValidationError]) -> String {
    let mut output = String::from("Configuration validation failed:\n");
    for (i, error) in errors.iter().enumerate() {
        output.push_str(&format!("  {}. {}\n", i + 1, error));
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    fn errors_for(config: &AppConfig) -> Vec<ConfigValidationError> {
        ConfigValidator::validate(config).unwrap_err()
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(ConfigValidator::validate(&AppConfig::default()).is_ok());
    }

    #[test]
    fn test_jwt_secret_too_short() {
        let mut config = AppConfig::default();
        config.security.jwt_secret = "short".to_string();
        assert!(errors_for(&config)
            .iter()
            .any(|e| matches!(e, ConfigValidationError::JwtSecretTooShort { actual: 5, .. })));
    }

    #[test]
    fn test_access_expiration_bounds() {
        let mut config = AppConfig::default();
        config.security.jwt_access_expiration_secs = 60;
        assert!(errors_for(&config)
            .iter()
            .any(|e| matches!(e, ConfigValidationError::InvalidAccessExpiration { .. })));

        config.security.jwt_access_expiration_secs = 3600;
        assert!(ConfigValidator::validate(&config).is_ok());
    }

    #[test]
    fn test_invalid_port_and_timeout() {
        let mut config = AppConfig::default();
        config.server.port = 0;
        config.server.request_timeout_secs = 0;
        let errors = errors_for(&config);
        assert!(errors.iter().any(
            |e| matches!(e, ConfigValidationError::InvalidPort { name, .. } if name == "server.port")
        ));
        assert!(errors.iter().any(|e| matches!(
            e,
            ConfigValidationError::NonPositiveValue { name } if name == "server.request_timeout_secs"
        )));
    }

    #[test]
    fn test_database_rules() {
        let mut config = AppConfig::default();
        config.database.url = "mysql://localhost/strata".to_string();
        config.database.min_connections = 20;
        config.database.max_connections = 10;
        config.database.save_batch_size = 0;
        let errors = errors_for(&config);
        assert!(errors.iter().any(
            |e| matches!(e, ConfigValidationError::InvalidUrl { url_type, .. } if url_type == "database")
        ));
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigValidationError::InvalidPoolSize { min: 20, max: 10 })));
        assert!(errors.iter().any(|e| matches!(
            e,
            ConfigValidationError::NonPositiveValue { name } if name == "database.save_batch_size"
        )));
    }

    #[test]
    fn test_memory_database_url_is_accepted() {
        let mut config = AppConfig::default();
        config.database.url = "sqlite::memory:".to_string();
        assert!(ConfigValidator::validate(&config).is_ok());
    }

    #[test]
    fn test_cors_origin_must_be_url() {
        let mut config = AppConfig::default();
        config.server.cors_origins = vec!["*".to_string(), "not a url".to_string()];
        assert_eq!(errors_for(&config).len(), 1);

        config.server.cors_origins = vec!["https://app.example.com".to_string()];
        assert!(ConfigValidator::validate(&config).is_ok());
    }

    #[test]
    fn test_observability_rules() {
        let mut config = AppConfig::default();
        config.observability.log_level = "loud".to_string();
        config.observability.log_format = "xml".to_string();
        assert_eq!(errors_for(&config).len(), 2);

        config.observability.log_level = "DEBUG".to_string();
        config.observability.log_format = "json".to_string();
        assert!(ConfigValidator::validate(&config).is_ok());
    }

    #[test]
    fn test_hash_cost_bounds() {
        let mut config = AppConfig::default();
        config.security.password_hash_cost = 0;
        assert!(errors_for(&config)
            .iter()
            .any(|e| matches!(e, ConfigValidationError::InvalidHashCost { .. })));
    }

    #[test]
    fn test_format_validation_errors() {
        let output = format_validation_errors(&[
            ConfigValidationError::JwtSecretTooShort {
                actual: 10,
                minimum: 32,
            },
            ConfigValidationError::InvalidPort {
                name: "server.port".to_string(),
                value: 0,
            },
        ]);
        assert!(output.contains("1. JWT secret too short"));
        assert!(output.contains("2. Invalid port"));
    }
}
