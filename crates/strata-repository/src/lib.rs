//! # Strata Repository
//!
//! Data access for Strata:
//!
//! ```text
//! Service
//!   ↓  Arc<dyn Dao<E>>        (generic DAO interface)
//! SqliteDao<E>                (QueryBuilder over any Model)
//!   ↓  &mut SqliteConnection  (pooled connection or transaction)
//! SQLite
//! ```
//!
//! [`DatabasePool`] owns the connection pool and applies the migrations in
//! `migrations/`.

pub mod dao;
pub mod pool;

pub use dao::{Dao, SqliteDao, UserDao, SAVE_BATCH_SIZE};
pub use pool::*;
