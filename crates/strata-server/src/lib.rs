//! # Strata Server Library
//!
//! Dependency injection wiring, the HTTP serve loop and the `create-app`
//! scaffolding command behind the `strata-server` binary.

pub mod app;
pub mod di;
pub mod scaffold;
pub mod startup;
