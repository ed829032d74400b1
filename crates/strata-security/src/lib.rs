//! # Strata Security
//!
//! JWT access/refresh tokens, Argon2 password hashing and authority checks
//! on token claims.

pub mod authority;
pub mod jwt;
pub mod password;

pub use authority::*;
pub use jwt::*;
pub use password::*;
