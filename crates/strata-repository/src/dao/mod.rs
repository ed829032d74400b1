//! Generic data access for [`Model`] entities.
//!
//! Every operation runs on the connection it is handed, so the service layer
//! decides whether a call shares a transaction with others.

mod sql;
mod sqlite;

pub use sqlite::SqliteDao;

use async_trait::async_trait;
use sqlx::SqliteConnection;
use strata_core::{EntityId, Model, Page, PageRequest, Query, StrataResult, User, UserId, Value};

/// Rows per multi-row `INSERT` when the caller does not choose.
pub const SAVE_BATCH_SIZE: usize = 1000;

/// The DAO bound to [`User`].
pub type UserDao = SqliteDao<User>;

/// Data access object for one model.
#[async_trait]
pub trait Dao<E: Model>: Send + Sync {
    /// Finds a row by primary key, soft-deleted or not. The nil id matches nothing.
    async fn get(&self, conn: &mut SqliteConnection, id: EntityId) -> StrataResult<Option<E>>;

    async fn all(&self, conn: &mut SqliteConnection, include_deleted: bool) -> StrataResult<Vec<E>>;

    /// Inserts one entity, stamping its creation audit fields.
    async fn save(
        &self,
        conn: &mut SqliteConnection,
        entity: &mut E,
        actor: Option<UserId>,
    ) -> StrataResult<()>;

    /// Inserts in multi-row statements of at most `batch_size` rows.
    /// Returns `false` for an empty slice.
    async fn save_batch(
        &self,
        conn: &mut SqliteConnection,
        entities: &mut [E],
        batch_size: usize,
        actor: Option<UserId>,
    ) -> StrataResult<bool>;

    /// Writes every column by primary key. Returns whether a row matched.
    async fn update(
        &self,
        conn: &mut SqliteConnection,
        entity: &mut E,
        actor: Option<UserId>,
    ) -> StrataResult<bool>;

    async fn update_batch(
        &self,
        conn: &mut SqliteConnection,
        entities: &mut [E],
        actor: Option<UserId>,
    ) -> StrataResult<bool>;

    /// Applies `changes` to every matching row and returns the count.
    async fn update_by_query(
        &self,
        conn: &mut SqliteConnection,
        query: &Query,
        changes: &[(&str, Value)],
        actor: Option<UserId>,
    ) -> StrataResult<u64>;

    /// Hard delete.
    async fn delete(&self, conn: &mut SqliteConnection, entity: &E) -> StrataResult<bool>;

    async fn delete_batch(&self, conn: &mut SqliteConnection, entities: &[E]) -> StrataResult<bool>;

    async fn delete_by_query(&self, conn: &mut SqliteConnection, query: &Query) -> StrataResult<u64>;

    /// Flags the entity deleted and persists it. Returns `false` when the
    /// model has no soft-delete flag.
    async fn soft_delete(
        &self,
        conn: &mut SqliteConnection,
        entity: &mut E,
        actor: Option<UserId>,
    ) -> StrataResult<bool>;

    async fn find_one(&self, conn: &mut SqliteConnection, query: &Query) -> StrataResult<Option<E>>;

    async fn find_all(&self, conn: &mut SqliteConnection, query: &Query) -> StrataResult<Vec<E>>;

    async fn find_page(
        &self,
        conn: &mut SqliteConnection,
        query: &Query,
        page: PageRequest,
    ) -> StrataResult<Page<E>>;

    async fn exists(&self, conn: &mut SqliteConnection, query: &Query) -> StrataResult<bool>;

    async fn count(&self, conn: &mut SqliteConnection, query: &Query) -> StrataResult<u64>;
}
