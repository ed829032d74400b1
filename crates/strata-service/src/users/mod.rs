//! The users app: serializer and read, write and auth services for [`User`](strata_core::User).

mod auth_service;
mod read_service;
mod serializer;
mod write_service;

pub use auth_service::*;
pub use read_service::*;
pub use serializer::*;
pub use write_service::*;
