//! Custom Axum extractors.

mod claims;
mod client_ip;
mod pagination;
mod validated;

pub use claims::*;
pub use client_ip::*;
pub use pagination::*;
pub use validated::*;
