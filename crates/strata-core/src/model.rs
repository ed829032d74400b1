//! The persisted-entity contract shared by every app.
//!
//! Each entity embeds [`AuditFields`] and implements [`Model`], which is all
//! the generic DAO needs to insert, update, soft-delete and query it.

use crate::{EntityId, StrataError, StrataResult, UserId, Value};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

/// Soft-delete flags, audit timestamps and actor references carried by every row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditFields {
    pub inactive: bool,
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<UserId>,
    pub updated_at: DateTime<Utc>,
    pub updated_by: Option<UserId>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub deleted_by: Option<UserId>,
}

impl AuditFields {
    pub const COLUMNS: [&'static str; 8] = [
        "inactive",
        "deleted",
        "created_at",
        "created_by",
        "updated_at",
        "updated_by",
        "deleted_at",
        "deleted_by",
    ];

    #[must_use]
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            inactive: false,
            deleted: false,
            created_at: now,
            created_by: None,
            updated_at: now,
            updated_by: None,
            deleted_at: None,
            deleted_by: None,
        }
    }

    /// Stamps a first insert.
    pub fn touch_created(&mut self, actor: Option<UserId>, now: DateTime<Utc>) {
        self.created_at = now;
        self.updated_at = now;
        if actor.is_some() {
            self.created_by = actor;
            self.updated_by = actor;
        }
    }

    /// Stamps a save of an existing row.
    pub fn touch_updated(&mut self, actor: Option<UserId>, now: DateTime<Utc>) {
        self.updated_at = now;
        if actor.is_some() {
            self.updated_by = actor;
        }
    }

    /// Flags the row as soft-deleted.
    pub fn mark_deleted(&mut self, actor: Option<UserId>, now: DateTime<Utc>) {
        self.deleted = true;
        self.deleted_at = Some(now);
        self.deleted_by = actor;
        self.touch_updated(actor, now);
    }

    /// Neither deactivated nor soft-deleted.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        !self.inactive && !self.deleted
    }

    #[must_use]
    pub fn values(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("inactive", self.inactive.into()),
            ("deleted", self.deleted.into()),
            ("created_at", self.created_at.into()),
            ("created_by", self.created_by.into()),
            ("updated_at", self.updated_at.into()),
            ("updated_by", self.updated_by.into()),
            ("deleted_at", self.deleted_at.into()),
            ("deleted_by", self.deleted_by.into()),
        ]
    }

    /// Decodes the audit columns of a row.
    pub fn from_row(row: &SqliteRow) -> StrataResult<Self> {
        Ok(Self {
            inactive: row.try_get("inactive")?,
            deleted: row.try_get("deleted")?,
            created_at: row.try_get("created_at")?,
            created_by: get_optional_id(row, "created_by")?,
            updated_at: row.try_get("updated_at")?,
            updated_by: get_optional_id(row, "updated_by")?,
            deleted_at: row.try_get("deleted_at")?,
            deleted_by: get_optional_id(row, "deleted_by")?,
        })
    }
}

impl Default for AuditFields {
    fn default() -> Self {
        Self::new()
    }
}

/// A persisted entity the generic DAO can store.
///
/// The primary key column is always `id`. [`columns`](Model::columns) is the
/// whitelist every query is checked against.
pub trait Model: Clone + Send + Sync + Unpin + Sized + 'static {
    /// Resource name used in errors and logs.
    const NAME: &'static str;

    const TABLE: &'static str;

    /// Entity-specific columns, without `id` and the audit columns.
    const FIELDS: &'static [&'static str];

    /// Whether soft deletes apply. They always toggle the `deleted` audit
    /// column; `false` makes the entity hard-delete only and stops listings
    /// from filtering on that column.
    const SOFT_DELETE: bool = true;

    fn id(&self) -> EntityId;

    fn audit(&self) -> &AuditFields;

    fn audit_mut(&mut self) -> &mut AuditFields;

    /// Values of [`FIELDS`](Model::FIELDS), in the same order.
    fn field_values(&self) -> Vec<(&'static str, Value)>;

    fn from_row(row: &SqliteRow) -> StrataResult<Self>;

    /// `id`, the entity fields, then the audit columns.
    #[must_use]
    fn columns() -> Vec<&'static str> {
        let mut columns = Vec::with_capacity(1 + Self::FIELDS.len() + AuditFields::COLUMNS.len());
        columns.push("id");
        columns.extend_from_slice(Self::FIELDS);
        columns.extend_from_slice(&AuditFields::COLUMNS);
        columns
    }

    /// Values for every column, in [`columns`](Model::columns) order.
    #[must_use]
    fn values(&self) -> Vec<(&'static str, Value)> {
        let mut values = vec![("id", Value::from(self.id()))];
        values.extend(self.field_values());
        values.extend(self.audit().values());
        values
    }
}

/// Reads a UUID stored as text.
pub fn get_id(row: &SqliteRow, column: &str) -> StrataResult<EntityId> {
    let raw: String = row.try_get(column)?;
    EntityId::parse(&raw)
        .map_err(|e| StrataError::Internal(format!("Invalid UUID in column {column}: {e}")))
}

/// Reads a nullable UUID stored as text.
pub fn get_optional_id(row: &SqliteRow, column: &str) -> StrataResult<Option<EntityId>> {
    let raw: Option<String> = row.try_get(column)?;
    raw.map(|s| {
        EntityId::parse(&s)
            .map_err(|e| StrataError::Internal(format!("Invalid UUID in column {column}: {e}")))
    })
    .transpose()
}
