//! [`Dao`] over SQLite via `sqlx::QueryBuilder`.

use super::sql::{push_order_by, push_row, push_value, push_where, MAX_BIND_VARIABLES};
use super::{Dao, SAVE_BATCH_SIZE};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};
use std::marker::PhantomData;
use strata_core::{
    EntityId, Model, Page, PageRequest, Query, StrataError, StrataResult, UserId, Value,
};
use tracing::debug;

/// Generic DAO for any [`Model`]; holds no state.
pub struct SqliteDao<E> {
    _model: PhantomData<fn() -> E>,
}

impl<E: Model> SqliteDao<E> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _model: PhantomData,
        }
    }

    fn select() -> QueryBuilder<'static, Sqlite> {
        QueryBuilder::new(format!(
            "SELECT {} FROM {}",
            E::columns().join(", "),
            E::TABLE
        ))
    }

    fn insert() -> QueryBuilder<'static, Sqlite> {
        QueryBuilder::new(format!(
            "INSERT INTO {} ({}) VALUES ",
            E::TABLE,
            E::columns().join(", ")
        ))
    }

    /// Rows per statement: the requested size, bounded by the bind limit.
    fn rows_per_insert(batch_size: usize) -> usize {
        let requested = if batch_size == 0 { SAVE_BATCH_SIZE } else { batch_size };
        let ceiling = (MAX_BIND_VARIABLES / E::columns().len()).max(1);
        requested.min(ceiling)
    }

    /// `UPDATE` of every column but the key.
    async fn write_all(conn: &mut SqliteConnection, entity: &E) -> StrataResult<bool> {
        let values = entity.values();
        let mut b = QueryBuilder::<Sqlite>::new(format!("UPDATE {} SET ", E::TABLE));
        for (i, (column, value)) in values.iter().filter(|(c, _)| *c != "id").enumerate() {
            if i > 0 {
                b.push(", ");
            }
            b.push(column).push(" = ");
            push_value(&mut b, value)?;
        }
        b.push(" WHERE id = ").push_bind(entity.id().to_string());

        let result = b.build().execute(&mut *conn).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn fetch(conn: &mut SqliteConnection, mut b: QueryBuilder<'_, Sqlite>) -> StrataResult<Vec<E>> {
        let rows = b.build().fetch_all(&mut *conn).await?;
        rows.iter().map(E::from_row).collect()
    }

    fn checked(query: &Query) -> StrataResult<()> {
        query.check(&E::columns())
    }
}

impl<E: Model> Default for SqliteDao<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Model> Clone for SqliteDao<E> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<E: Model> std::fmt::Debug for SqliteDao<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteDao").field("model", &E::NAME).finish()
    }
}

#[async_trait]
impl<E: Model> Dao<E> for SqliteDao<E> {
    async fn get(&self, conn: &mut SqliteConnection, id: EntityId) -> StrataResult<Option<E>> {
        if id.is_nil() {
            return Ok(None);
        }
        debug!("Finding {} by id: {}", E::NAME, id);

        let mut b = Self::select();
        b.push(" WHERE id = ").push_bind(id.to_string());
        let row = b.build().fetch_optional(&mut *conn).await?;
        row.as_ref().map(E::from_row).transpose()
    }

    async fn all(&self, conn: &mut SqliteConnection, include_deleted: bool) -> StrataResult<Vec<E>> {
        self.find_all(conn, &Query::new().include_deleted(include_deleted))
            .await
    }

    async fn save(
        &self,
        conn: &mut SqliteConnection,
        entity: &mut E,
        actor: Option<UserId>,
    ) -> StrataResult<()> {
        entity.audit_mut().touch_created(actor, Utc::now());

        let mut b = Self::insert();
        push_row(&mut b, &entity.values())?;
        b.build().execute(&mut *conn).await?;

        debug!("Saved {} {}", E::NAME, entity.id());
        Ok(())
    }

    async fn save_batch(
        &self,
        conn: &mut SqliteConnection,
        entities: &mut [E],
        batch_size: usize,
        actor: Option<UserId>,
    ) -> StrataResult<bool> {
        if entities.is_empty() {
            return Ok(false);
        }

        let now = Utc::now();
        for entity in entities.iter_mut() {
            entity.audit_mut().touch_created(actor, now);
        }

        let rows_per_insert = Self::rows_per_insert(batch_size);
        for chunk in entities.chunks(rows_per_insert) {
            let mut b = Self::insert();
            for (i, entity) in chunk.iter().enumerate() {
                if i > 0 {
                    b.push(", ");
                }
                push_row(&mut b, &entity.values())?;
            }
            b.build().execute(&mut *conn).await?;
        }

        debug!(
            "Saved {} {} rows in statements of {}",
            entities.len(),
            E::NAME,
            rows_per_insert
        );
        Ok(true)
    }

    async fn update(
        &self,
        conn: &mut SqliteConnection,
        entity: &mut E,
        actor: Option<UserId>,
    ) -> StrataResult<bool> {
        entity.audit_mut().touch_updated(actor, Utc::now());
        debug!("Updating {} {}", E::NAME, entity.id());
        Self::write_all(conn, entity).await
    }

    async fn update_batch(
        &self,
        conn: &mut SqliteConnection,
        entities: &mut [E],
        actor: Option<UserId>,
    ) -> StrataResult<bool> {
        if entities.is_empty() {
            return Ok(false);
        }
        let now = Utc::now();
        for entity in entities.iter_mut() {
            entity.audit_mut().touch_updated(actor, now);
            Self::write_all(conn, entity).await?;
        }
        Ok(true)
    }

    async fn update_by_query(
        &self,
        conn: &mut SqliteConnection,
        query: &Query,
        changes: &[(&str, Value)],
        actor: Option<UserId>,
    ) -> StrataResult<u64> {
        Self::checked(query)?;
        if changes.is_empty() {
            return Err(StrataError::validation("No changes given"));
        }
        let columns = E::columns();
        for (column, _) in changes {
            if *column == "id" {
                return Err(StrataError::validation("The id column cannot be changed"));
            }
            if !columns.contains(column) {
                return Err(StrataError::validation(format!("Unknown field '{column}'")));
            }
        }

        let changed = |name: &str| changes.iter().any(|(column, _)| *column == name);
        let mut assignments: Vec<(&str, Value)> = changes.to_vec();
        if !changed("updated_at") {
            assignments.push(("updated_at", Utc::now().into()));
        }
        if let (Some(actor), false) = (actor, changed("updated_by")) {
            assignments.push(("updated_by", actor.into()));
        }

        let mut b = QueryBuilder::<Sqlite>::new(format!("UPDATE {} SET ", E::TABLE));
        for (i, (column, value)) in assignments.iter().enumerate() {
            if i > 0 {
                b.push(", ");
            }
            b.push(column).push(" = ");
            push_value(&mut b, value)?;
        }
        push_where::<E>(&mut b, query)?;

        let affected = b.build().execute(&mut *conn).await?.rows_affected();
        debug!("Updated {} {} rows by query", affected, E::NAME);
        Ok(affected)
    }

    async fn delete(&self, conn: &mut SqliteConnection, entity: &E) -> StrataResult<bool> {
        debug!("Deleting {} {}", E::NAME, entity.id());
        let mut b = QueryBuilder::<Sqlite>::new(format!("DELETE FROM {}", E::TABLE));
        b.push(" WHERE id = ").push_bind(entity.id().to_string());
        let result = b.build().execute(&mut *conn).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_batch(&self, conn: &mut SqliteConnection, entities: &[E]) -> StrataResult<bool> {
        if entities.is_empty() {
            return Ok(false);
        }
        for chunk in entities.chunks(MAX_BIND_VARIABLES) {
            let mut b = QueryBuilder::<Sqlite>::new(format!("DELETE FROM {} WHERE id IN (", E::TABLE));
            let mut ids = b.separated(", ");
            for entity in chunk {
                ids.push_bind(entity.id().to_string());
            }
            ids.push_unseparated(")");
            b.build().execute(&mut *conn).await?;
        }
        debug!("Deleted {} {} rows", entities.len(), E::NAME);
        Ok(true)
    }

    async fn delete_by_query(&self, conn: &mut SqliteConnection, query: &Query) -> StrataResult<u64> {
        Self::checked(query)?;
        let mut b = QueryBuilder::<Sqlite>::new(format!("DELETE FROM {}", E::TABLE));
        push_where::<E>(&mut b, query)?;
        let affected = b.build().execute(&mut *conn).await?.rows_affected();
        debug!("Deleted {} {} rows by query", affected, E::NAME);
        Ok(affected)
    }

    async fn soft_delete(
        &self,
        conn: &mut SqliteConnection,
        entity: &mut E,
        actor: Option<UserId>,
    ) -> StrataResult<bool> {
        if !E::SOFT_DELETE {
            return Ok(false);
        }
        entity.audit_mut().mark_deleted(actor, Utc::now());
        debug!("Soft-deleting {} {}", E::NAME, entity.id());
        Self::write_all(conn, entity).await
    }

    async fn find_one(&self, conn: &mut SqliteConnection, query: &Query) -> StrataResult<Option<E>> {
        Self::checked(query)?;
        let mut b = Self::select();
        push_where::<E>(&mut b, query)?;
        push_order_by(&mut b, query);
        b.push(" LIMIT 1");
        Ok(Self::fetch(conn, b).await?.into_iter().next())
    }

    async fn find_all(&self, conn: &mut SqliteConnection, query: &Query) -> StrataResult<Vec<E>> {
        Self::checked(query)?;
        let mut b = Self::select();
        push_where::<E>(&mut b, query)?;
        push_order_by(&mut b, query);
        Self::fetch(conn, b).await
    }

    async fn find_page(
        &self,
        conn: &mut SqliteConnection,
        query: &Query,
        page: PageRequest,
    ) -> StrataResult<Page<E>> {
        let total = self.count(conn, query).await?;

        let mut b = Self::select();
        push_where::<E>(&mut b, query)?;
        push_order_by(&mut b, query);
        b.push(" LIMIT ")
            .push_bind(to_i64(page.limit()))
            .push(" OFFSET ")
            .push_bind(to_i64(page.offset()));
        let content = Self::fetch(conn, b).await?;

        Ok(Page::new(content, page, total))
    }

    async fn exists(&self, conn: &mut SqliteConnection, query: &Query) -> StrataResult<bool> {
        Self::checked(query)?;
        let mut b = QueryBuilder::<Sqlite>::new(format!("SELECT EXISTS(SELECT 1 FROM {}", E::TABLE));
        push_where::<E>(&mut b, query)?;
        b.push(")");
        let found: i64 = b.build_query_scalar().fetch_one(&mut *conn).await?;
        Ok(found != 0)
    }

    async fn count(&self, conn: &mut SqliteConnection, query: &Query) -> StrataResult<u64> {
        Self::checked(query)?;
        let mut b = QueryBuilder::<Sqlite>::new(format!("SELECT COUNT(*) FROM {}", E::TABLE));
        push_where::<E>(&mut b, query)?;
        let count: i64 = b.build_query_scalar().fetch_one(&mut *conn).await?;
        Ok(u64::try_from(count).unwrap_or(0))
    }
}

fn to_i64(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}
