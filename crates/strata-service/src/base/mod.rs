//! Generic services over one [`Model`](strata_core::Model).
//!
//! Reads borrow a pooled connection; every write runs in its own transaction
//! that commits only when the DAO call succeeds.

mod read;
mod write;

pub use read::ReadService;
pub use write::WriteService;
