//! # Strata Config
//!
//! Layered configuration: TOML files under `config/`, a `.env` file and
//! `STRATA__`-prefixed environment variables, validated before use.

mod app_config;
mod loader;
mod validation;

pub use app_config::*;
pub use loader::*;
pub use validation::*;
