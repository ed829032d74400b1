//! # Strata REST
//!
//! Axum surface over the Strata services: login and token refresh, user
//! management, health checks and the OpenAPI document. Every JSON body is
//! wrapped in the `{success, data | error}` envelope from [`responses`].

pub mod controllers;
pub mod extractors;
pub mod middleware;
pub mod openapi;
pub mod responses;
pub mod router;
pub mod state;

pub use router::*;
pub use state::*;
