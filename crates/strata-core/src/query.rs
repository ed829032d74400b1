//! Data-only description of filter, exclude and ordering criteria.
//!
//! A [`Query`] never touches the database. The DAO turns it into SQL after
//! checking every referenced field against the model's column list, so a
//! query built from user input cannot reference arbitrary columns.
//!
//! Filter keys use the `field__lookup` convention:
//!
//! ```
//! use strata_core::Query;
//!
//! let query = Query::new()
//!     .filter("email__iexact", "Ada@Example.com")
//!     .exclude("inactive", true)
//!     .order_by("-created_at");
//! assert!(query.check(&["email", "inactive", "created_at"]).is_ok());
//! ```

use crate::{EntityId, StrataError, StrataResult};
use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// A bindable column value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Uuid(Uuid),
    Timestamp(DateTime<Utc>),
    Text(String),
    List(Vec<Value>),
}

impl Value {
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<Uuid> for Value {
    fn from(v: Uuid) -> Self {
        Self::Uuid(v)
    }
}

impl From<EntityId> for Value {
    fn from(v: EntityId) -> Self {
        Self::Uuid(v.into_inner())
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Self::Timestamp(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Self::List(v.into_iter().map(Into::into).collect())
    }
}

/// Comparison applied by a filter or exclude condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    Exact,
    IExact,
    Ne,
    Contains,
    IContains,
    StartsWith,
    EndsWith,
    Gt,
    Gte,
    Lt,
    Lte,
    IsNull,
    In,
}

impl FromStr for Lookup {
    type Err = StrataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "exact" => Self::Exact,
            "iexact" => Self::IExact,
            "ne" => Self::Ne,
            "contains" => Self::Contains,
            "icontains" => Self::IContains,
            "startswith" => Self::StartsWith,
            "endswith" => Self::EndsWith,
            "gt" => Self::Gt,
            "gte" => Self::Gte,
            "lt" => Self::Lt,
            "lte" => Self::Lte,
            "isnull" => Self::IsNull,
            "in" => Self::In,
            other => return Err(StrataError::validation(format!("Unknown lookup '{other}'"))),
        })
    }
}

/// One `field__lookup = value` condition.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub field: String,
    pub lookup: Lookup,
    pub value: Value,
}

impl Condition {
    /// Parses a `field` or `field__lookup` key and checks the value shape.
    pub fn parse(key: &str, value: Value) -> StrataResult<Self> {
        let (field, lookup) = match key.split_once("__") {
            Some((field, lookup)) => (field, lookup.parse::<Lookup>()?),
            None => (key, Lookup::Exact),
        };
        if field.is_empty() {
            return Err(StrataError::validation(format!("Malformed lookup key '{key}'")));
        }

        match (lookup, &value) {
            (Lookup::IsNull, Value::Bool(_)) | (Lookup::In, Value::List(_)) => {}
            (Lookup::IsNull, _) => {
                return Err(StrataError::validation(format!(
                    "'{key}' expects a boolean"
                )));
            }
            (Lookup::In, _) => {
                return Err(StrataError::validation(format!("'{key}' expects a list")));
            }
            (_, Value::List(_)) => {
                return Err(StrataError::validation(format!(
                    "'{key}' does not accept a list"
                )));
            }
            _ => {}
        }

        Ok(Self {
            field: field.to_string(),
            lookup,
            value,
        })
    }
}

/// One ordering term; `-field` sorts descending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub field: String,
    pub descending: bool,
}

impl FromStr for OrderBy {
    type Err = StrataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (field, descending) = match s.strip_prefix('-') {
            Some(field) => (field, true),
            None => (s, false),
        };
        if field.is_empty() {
            return Err(StrataError::validation("Empty order_by term"));
        }
        Ok(Self {
            field: field.to_string(),
            descending,
        })
    }
}

impl fmt::Display for OrderBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.descending {
            write!(f, "-{}", self.field)
        } else {
            f.write_str(&self.field)
        }
    }
}

/// Filter, exclude and ordering criteria for DAO finders.
///
/// Filters are AND-ed. A row is excluded only when every exclude condition
/// matches it. Soft-deleted rows are left out unless
/// [`include_deleted`](Self::include_deleted) is set.
#[derive(Debug, Clone, Default)]
pub struct Query {
    filter: Vec<Condition>,
    exclude: Vec<Condition>,
    order_by: Vec<OrderBy>,
    include_deleted: bool,
    errors: Vec<String>,
}

impl Query {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a filter condition.
    #[must_use]
    pub fn filter(mut self, key: &str, value: impl Into<Value>) -> Self {
        match Condition::parse(key, value.into()) {
            Ok(condition) => self.filter.push(condition),
            Err(e) => self.errors.push(message_of(e)),
        }
        self
    }

    /// Adds an exclude condition.
    #[must_use]
    pub fn exclude(mut self, key: &str, value: impl Into<Value>) -> Self {
        match Condition::parse(key, value.into()) {
            Ok(condition) => self.exclude.push(condition),
            Err(e) => self.errors.push(message_of(e)),
        }
        self
    }

    /// Appends an ordering term.
    #[must_use]
    pub fn order_by(mut self, term: &str) -> Self {
        match term.parse::<OrderBy>() {
            Ok(order) => self.order_by.push(order),
            Err(e) => self.errors.push(message_of(e)),
        }
        self
    }

    #[must_use]
    pub fn include_deleted(mut self, include: bool) -> Self {
        self.include_deleted = include;
        self
    }

    #[must_use]
    pub fn filters(&self) -> &[Condition] {
        &self.filter
    }

    #[must_use]
    pub fn excludes(&self) -> &[Condition] {
        &self.exclude
    }

    #[must_use]
    pub fn ordering(&self) -> &[OrderBy] {
        &self.order_by
    }

    #[must_use]
    pub const fn includes_deleted(&self) -> bool {
        self.include_deleted
    }

    /// Fails on malformed terms or fields outside `columns`.
    pub fn check(&self, columns: &[&str]) -> StrataResult<()> {
        if !self.errors.is_empty() {
            return Err(StrataError::Validation(self.errors.join("; ")));
        }
        let fields = self
            .filter
            .iter()
            .chain(&self.exclude)
            .map(|c| c.field.as_str())
            .chain(self.order_by.iter().map(|o| o.field.as_str()));
        for field in fields {
            if !columns.contains(&field) {
                return Err(StrataError::validation(format!("Unknown field '{field}'")));
            }
        }
        Ok(())
    }
}

fn message_of(err: StrataError) -> String {
    match err {
        StrataError::Validation(message) => message,
        other => other.to_string(),
    }
}
