//! # Strata Service
//!
//! Generic transactional services over any model, the serializer layer
//! that turns validated DTOs into entities and back, and the `users` app
//! built on both.

pub mod base;
pub mod dto;
pub mod serializer;
pub mod users;

#[cfg(test)]
pub(crate) mod test_support;

pub use base::*;
pub use dto::*;
pub use serializer::*;
pub use users::*;
