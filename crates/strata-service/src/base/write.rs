//! Write-side service.

use sqlx::{Sqlite, Transaction};
use std::sync::Arc;
use strata_core::{
    EntityId, Model, Query, StrataError, StrataResult, UserId, Value,
};
use strata_repository::{Dao, DatabasePoolInterface, SqliteDao};
use tracing::{debug, info};

/// Write operations for one model.
///
/// Each call begins a transaction, delegates to the DAO and commits. On any
/// error the transaction is dropped and SQLite rolls it back, so batch calls
/// apply all of their rows or none.
pub struct WriteService<E: Model> {
    pool: Arc<dyn DatabasePoolInterface>,
    dao: Arc<dyn Dao<E>>,
    actor: Option<UserId>,
}

impl<E: Model> WriteService<E> {
    #[must_use]
    pub fn new(pool: Arc<dyn DatabasePoolInterface>, dao: Arc<dyn Dao<E>>) -> Self {
        Self {
            pool,
            dao,
            actor: None,
        }
    }

    /// Service backed by the SQLite DAO.
    #[must_use]
    pub fn sqlite(pool: Arc<dyn DatabasePoolInterface>) -> Self {
        Self::new(pool, Arc::new(SqliteDao::<E>::new()))
    }

    /// A copy that records `actor` in the `*_by` audit columns.
    #[must_use]
    pub fn acting_as(&self, actor: UserId) -> Self {
        Self {
            actor: Some(actor),
            ..self.clone()
        }
    }

    #[must_use]
    pub const fn actor(&self) -> Option<UserId> {
        self.actor
    }

    async fn begin(&self) -> StrataResult<Transaction<'static, Sqlite>> {
        self.pool.begin_write().await
    }

    pub async fn create(&self, mut entity: E) -> StrataResult<E> {
        let mut tx = self.begin().await?;
        self.dao.save(&mut tx, &mut entity, self.actor).await?;
        tx.commit().await?;

        info!("Created {} {}", E::NAME, entity.id());
        Ok(entity)
    }

    /// Persists every column of `entity`; `NotFound` when no row has its id.
    pub async fn update(&self, mut entity: E) -> StrataResult<E> {
        let mut tx = self.begin().await?;
        if !self.dao.update(&mut tx, &mut entity, self.actor).await? {
            return Err(StrataError::not_found(E::NAME, entity.id()));
        }
        tx.commit().await?;

        info!("Updated {} {}", E::NAME, entity.id());
        Ok(entity)
    }

    /// Loads, mutates and saves an entity inside one transaction. An error
    /// from `mutate` leaves the row untouched.
    pub async fn update_with<F>(&self, id: EntityId, mutate: F) -> StrataResult<E>
    where
        F: FnOnce(&mut E) -> StrataResult<()> + Send,
    {
        let mut tx = self.begin().await?;
        let mut entity = self
            .dao
            .get(&mut tx, id)
            .await?
            .ok_or_else(|| StrataError::not_found(E::NAME, id))?;

        mutate(&mut entity)?;
        self.dao.update(&mut tx, &mut entity, self.actor).await?;
        tx.commit().await?;

        info!("Updated {} {}", E::NAME, id);
        Ok(entity)
    }

    /// Hard delete. Returns whether a row was removed.
    pub async fn delete(&self, entity: &E) -> StrataResult<bool> {
        let mut tx = self.begin().await?;
        let deleted = self.dao.delete(&mut tx, entity).await?;
        tx.commit().await?;

        info!("Deleted {} {} (found: {})", E::NAME, entity.id(), deleted);
        Ok(deleted)
    }

    pub async fn soft_delete(&self, mut entity: E) -> StrataResult<E> {
        Self::ensure_soft_delete()?;
        let mut tx = self.begin().await?;
        if !self.dao.soft_delete(&mut tx, &mut entity, self.actor).await? {
            return Err(StrataError::not_found(E::NAME, entity.id()));
        }
        tx.commit().await?;

        info!("Soft-deleted {} {}", E::NAME, entity.id());
        Ok(entity)
    }

    /// Loads and soft-deletes by id in one transaction.
    pub async fn soft_delete_by_id(&self, id: EntityId) -> StrataResult<E> {
        Self::ensure_soft_delete()?;
        let mut tx = self.begin().await?;
        let mut entity = self
            .dao
            .get(&mut tx, id)
            .await?
            .ok_or_else(|| StrataError::not_found(E::NAME, id))?;
        self.dao.soft_delete(&mut tx, &mut entity, self.actor).await?;
        tx.commit().await?;

        info!("Soft-deleted {} {}", E::NAME, id);
        Ok(entity)
    }

    /// Inserts all entities or none. An empty input is a no-op.
    pub async fn create_batch(&self, mut entities: Vec<E>, batch_size: usize) -> StrataResult<Vec<E>> {
        let mut tx = self.begin().await?;
        if self
            .dao
            .save_batch(&mut tx, &mut entities, batch_size, self.actor)
            .await?
        {
            tx.commit().await?;
            info!("Created {} {} rows", entities.len(), E::NAME);
        }
        Ok(entities)
    }

    pub async fn update_batch(&self, mut entities: Vec<E>) -> StrataResult<Vec<E>> {
        let mut tx = self.begin().await?;
        if self.dao.update_batch(&mut tx, &mut entities, self.actor).await? {
            tx.commit().await?;
            info!("Updated {} {} rows", entities.len(), E::NAME);
        }
        Ok(entities)
    }

    pub async fn delete_batch(&self, entities: &[E]) -> StrataResult<bool> {
        let mut tx = self.begin().await?;
        let deleted = self.dao.delete_batch(&mut tx, entities).await?;
        tx.commit().await?;
        Ok(deleted)
    }

    pub async fn update_by_query(
        &self,
        query: &Query,
        changes: &[(&str, Value)],
    ) -> StrataResult<u64> {
        let mut tx = self.begin().await?;
        let affected = self
            .dao
            .update_by_query(&mut tx, query, changes, self.actor)
            .await?;
        tx.commit().await?;

        debug!("Updated {} {} rows by query", affected, E::NAME);
        Ok(affected)
    }

    pub async fn delete_by_query(&self, query: &Query) -> StrataResult<u64> {
        let mut tx = self.begin().await?;
        let affected = self.dao.delete_by_query(&mut tx, query).await?;
        tx.commit().await?;

        debug!("Deleted {} {} rows by query", affected, E::NAME);
        Ok(affected)
    }

    fn ensure_soft_delete() -> StrataResult<()> {
        if E::SOFT_DELETE {
            Ok(())
        } else {
            Err(StrataError::validation(format!(
                "{} does not support soft delete",
                E::NAME
            )))
        }
    }
}

impl<E: Model> Clone for WriteService<E> {
    fn clone(&self) -> Self {
        Self {
            pool: Arc::clone(&self.pool),
            dao: Arc::clone(&self.dao),
            actor: self.actor,
        }
    }
}

impl<E: Model> std::fmt::Debug for WriteService<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WriteService")
            .field("model", &E::NAME)
            .field("actor", &self.actor)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::ReadService;
    use crate::test_support::{file_pool, memory_pool};
    use strata_core::User;

    fn user(email: &str) -> User {
        User::new(email, "hash".to_string())
    }

    #[tokio::test]
    async fn test_create_and_read_back() {
        let pool = memory_pool().await;
        let writer = WriteService::<User>::sqlite(pool.clone());
        let reader = ReadService::<User>::sqlite(pool);

        let created = writer.create(user("ada@example.com")).await.unwrap();

        let found = reader.require(created.id).await.unwrap();
        assert_eq!(found.email, "ada@example.com");
        assert_eq!(reader.count(&Query::new()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_acting_as_stamps_actor() {
        let pool = memory_pool().await;
        let actor = UserId::new();
        let writer = WriteService::<User>::sqlite(pool.clone()).acting_as(actor);

        let created = writer.create(user("ada@example.com")).await.unwrap();
        let deleted = writer.soft_delete(created).await.unwrap();

        let found = ReadService::<User>::sqlite(pool)
            .require(deleted.id)
            .await
            .unwrap();
        assert_eq!(found.audit.created_by, Some(actor));
        assert_eq!(found.audit.deleted_by, Some(actor));
        assert!(found.audit.deleted);
    }

    #[tokio::test]
    async fn test_failed_mutation_rolls_back() {
        let pool = memory_pool().await;
        let writer = WriteService::<User>::sqlite(pool.clone());
        let created = writer.create(user("ada@example.com")).await.unwrap();

        let err = writer
            .update_with(created.id, |u| {
                u.first_name = "Changed".to_string();
                Err(StrataError::validation("rejected"))
            })
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_ERROR");

        let found = ReadService::<User>::sqlite(pool)
            .require(created.id)
            .await
            .unwrap();
        assert_eq!(found.first_name, "");
    }

    #[tokio::test]
    async fn test_batch_is_all_or_nothing() {
        let pool = memory_pool().await;
        let writer = WriteService::<User>::sqlite(pool.clone());

        let batch = vec![
            user("one@example.com"),
            user("two@example.com"),
            user("one@example.com"),
        ];
        let err = writer.create_batch(batch, 2).await.unwrap_err();
        assert_eq!(err.status_code(), 409);

        let reader = ReadService::<User>::sqlite(pool);
        assert_eq!(reader.count(&Query::new()).await.unwrap(), 0);

        let created = writer
            .create_batch(vec![user("one@example.com"), user("two@example.com")], 1)
            .await
            .unwrap();
        assert_eq!(created.len(), 2);
        assert_eq!(reader.count(&Query::new()).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let pool = memory_pool().await;
        let writer = WriteService::<User>::sqlite(pool);

        let err = writer.update(user("ghost@example.com")).await.unwrap_err();
        assert_eq!(err.status_code(), 404);

        let err = writer.soft_delete_by_id(UserId::new()).await.unwrap_err();
        assert_eq!(err.status_code(), 404);
    }

    #[tokio::test]
    async fn test_query_writes() {
        let pool = memory_pool().await;
        let writer = WriteService::<User>::sqlite(pool.clone());
        writer
            .create_batch(
                vec![user("a@example.com"), user("b@example.com"), user("c@other.org")],
                0,
            )
            .await
            .unwrap();

        let changed = writer
            .update_by_query(
                &Query::new().filter("email__endswith", "@example.com"),
                &[("two_factor", Value::from(true))],
            )
            .await
            .unwrap();
        assert_eq!(changed, 2);

        let removed = writer
            .delete_by_query(&Query::new().filter("two_factor", false))
            .await
            .unwrap();
        assert_eq!(removed, 1);

        let reader = ReadService::<User>::sqlite(pool);
        let remaining = reader.list_all(true).await.unwrap();
        assert!(remaining.iter().all(|u| u.two_factor));
        assert!(writer.delete_batch(&remaining).await.unwrap());
        assert!(!reader.exists(&Query::new()).await.unwrap());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_updates_on_file_database() {
        let (_dir, pool) = file_pool().await;
        let writer = WriteService::<User>::sqlite(pool.clone());

        let mut ids = Vec::new();
        for i in 0..8 {
            ids.push(writer.create(user(&format!("u{i}@example.com"))).await.unwrap().id);
        }

        let mut handles = Vec::new();
        for n in 0..80 {
            let writer = writer.clone();
            let id = ids[n % ids.len()];
            handles.push(tokio::spawn(async move {
                writer
                    .update_with(id, |u| {
                        u.first_name.push('x');
                        Ok(())
                    })
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let users = ReadService::<User>::sqlite(pool).list_all(false).await.unwrap();
        let total: usize = users.iter().map(|u| u.first_name.len()).sum();
        assert_eq!(total, 80);
    }
}
