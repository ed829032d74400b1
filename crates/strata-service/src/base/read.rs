//! Read-side service.

use sqlx::pool::PoolConnection;
use sqlx::Sqlite;
use std::sync::Arc;
use strata_core::{EntityId, Model, Page, PageRequest, Query, StrataError, StrataResult};
use strata_repository::{Dao, DatabasePoolInterface, SqliteDao};
use tracing::debug;

/// Read operations for one model, each on a pooled connection.
pub struct ReadService<E: Model> {
    pool: Arc<dyn DatabasePoolInterface>,
    dao: Arc<dyn Dao<E>>,
}

impl<E: Model> ReadService<E> {
    #[must_use]
    pub fn new(pool: Arc<dyn DatabasePoolInterface>, dao: Arc<dyn Dao<E>>) -> Self {
        Self { pool, dao }
    }

    /// Service backed by the SQLite DAO.
    #[must_use]
    pub fn sqlite(pool: Arc<dyn DatabasePoolInterface>) -> Self {
        Self::new(pool, Arc::new(SqliteDao::<E>::new()))
    }

    async fn connection(&self) -> StrataResult<PoolConnection<Sqlite>> {
        Ok(self.pool.inner().acquire().await?)
    }

    pub async fn get(&self, id: EntityId) -> StrataResult<Option<E>> {
        let mut conn = self.connection().await?;
        self.dao.get(&mut conn, id).await
    }

    /// Like [`get`](Self::get) but a missing row is `NotFound`.
    pub async fn require(&self, id: EntityId) -> StrataResult<E> {
        self.get(id)
            .await?
            .ok_or_else(|| StrataError::not_found(E::NAME, id))
    }

    pub async fn list_all(&self, include_deleted: bool) -> StrataResult<Vec<E>> {
        debug!("Listing all {} rows (include_deleted: {})", E::NAME, include_deleted);
        let mut conn = self.connection().await?;
        self.dao.all(&mut conn, include_deleted).await
    }

    pub async fn find_one(&self, query: &Query) -> StrataResult<Option<E>> {
        let mut conn = self.connection().await?;
        self.dao.find_one(&mut conn, query).await
    }

    pub async fn find_all(&self, query: &Query) -> StrataResult<Vec<E>> {
        let mut conn = self.connection().await?;
        self.dao.find_all(&mut conn, query).await
    }

    pub async fn find_page(&self, query: &Query, page: PageRequest) -> StrataResult<Page<E>> {
        debug!("Finding {} page {}, size {}", E::NAME, page.page, page.size);
        let mut conn = self.connection().await?;
        self.dao.find_page(&mut conn, query, page).await
    }

    pub async fn exists(&self, query: &Query) -> StrataResult<bool> {
        let mut conn = self.connection().await?;
        self.dao.exists(&mut conn, query).await
    }

    pub async fn count(&self, query: &Query) -> StrataResult<u64> {
        let mut conn = self.connection().await?;
        self.dao.count(&mut conn, query).await
    }
}

impl<E: Model> Clone for ReadService<E> {
    fn clone(&self) -> Self {
        Self {
            pool: Arc::clone(&self.pool),
            dao: Arc::clone(&self.dao),
        }
    }
}

impl<E: Model> std::fmt::Debug for ReadService<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadService").field("model", &E::NAME).finish()
    }
}
