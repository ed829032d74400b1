//! Authority checks on authenticated principals.

mod checker;

pub use checker::*;
