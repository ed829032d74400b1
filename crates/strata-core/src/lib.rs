//! # Strata Core
//!
//! Foundational types shared by every layer of Strata: the unified error
//! type, typed identifiers, pagination, the [`Model`] contract with its
//! audit fields, and the data-only [`Query`] description consumed by the
//! generic DAO.

pub mod error;
pub mod id;
pub mod model;
pub mod pagination;
pub mod query;
pub mod result;
pub mod user;
pub mod validation;

pub use error::*;
pub use id::*;
pub use model::*;
pub use pagination::*;
pub use query::*;
pub use result::*;
pub use user::*;
pub use validation::*;

// Re-export shaku for dependency injection
pub use shaku::Interface;
