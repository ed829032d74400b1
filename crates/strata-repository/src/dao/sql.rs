//! SQL fragments for [`Query`] criteria.

use sqlx::{QueryBuilder, Sqlite};
use strata_core::{Condition, Lookup, Model, Query, StrataError, StrataResult, Value};

/// SQLite's default `SQLITE_MAX_VARIABLE_NUMBER`.
pub(crate) const MAX_BIND_VARIABLES: usize = 32_766;

pub(crate) fn push_value(b: &mut QueryBuilder<'_, Sqlite>, value: &Value) -> StrataResult<()> {
    match value {
        Value::Null => {
            b.push_bind(None::<String>);
        }
        Value::Bool(v) => {
            b.push_bind(*v);
        }
        Value::Int(v) => {
            b.push_bind(*v);
        }
        Value::Float(v) => {
            b.push_bind(*v);
        }
        Value::Uuid(v) => {
            b.push_bind(v.hyphenated().to_string());
        }
        Value::Timestamp(v) => {
            b.push_bind(*v);
        }
        Value::Text(v) => {
            b.push_bind(v.clone());
        }
        Value::List(_) => {
            return Err(StrataError::validation("A list value needs the __in lookup"));
        }
    }
    Ok(())
}

/// `(v1, v2, ...)`
pub(crate) fn push_row(
    b: &mut QueryBuilder<'_, Sqlite>,
    values: &[(&'static str, Value)],
) -> StrataResult<()> {
    b.push("(");
    for (i, (_, value)) in values.iter().enumerate() {
        if i > 0 {
            b.push(", ");
        }
        push_value(b, value)?;
    }
    b.push(")");
    Ok(())
}

/// ` WHERE ...` for the query, hiding soft-deleted rows unless asked not to.
///
/// Exclude conditions are AND-ed together and negated as a group. A group
/// that evaluates to NULL does not exclude the row.
pub(crate) fn push_where<E: Model>(
    b: &mut QueryBuilder<'_, Sqlite>,
    query: &Query,
) -> StrataResult<()> {
    b.push(" WHERE 1 = 1");
    if E::SOFT_DELETE && !query.includes_deleted() {
        b.push(" AND deleted = 0");
    }
    for condition in query.filters() {
        b.push(" AND (");
        push_condition(b, condition)?;
        b.push(")");
    }
    if !query.excludes().is_empty() {
        b.push(" AND NOT COALESCE((");
        for (i, condition) in query.excludes().iter().enumerate() {
            if i > 0 {
                b.push(" AND ");
            }
            b.push("(");
            push_condition(b, condition)?;
            b.push(")");
        }
        b.push("), 0)");
    }
    Ok(())
}

/// ` ORDER BY ...`, falling back to insertion order.
pub(crate) fn push_order_by(b: &mut QueryBuilder<'_, Sqlite>, query: &Query) {
    b.push(" ORDER BY ");
    for order in query.ordering() {
        b.push(&order.field)
            .push(if order.descending { " DESC, " } else { " ASC, " });
    }
    b.push("rowid");
}

fn push_condition(b: &mut QueryBuilder<'_, Sqlite>, condition: &Condition) -> StrataResult<()> {
    let column = condition.field.as_str();
    let value = &condition.value;

    match (condition.lookup, value) {
        (Lookup::IsNull, Value::Bool(true)) | (Lookup::Exact, Value::Null) => {
            b.push(column).push(" IS NULL");
        }
        (Lookup::IsNull, _) | (Lookup::Ne, Value::Null) => {
            b.push(column).push(" IS NOT NULL");
        }
        (Lookup::Exact, _) => push_comparison(b, column, " = ", value)?,
        (Lookup::IExact, _) => {
            push_comparison(b, column, " = ", value)?;
            b.push(" COLLATE NOCASE");
        }
        // IS NOT keeps NULL columns in the result.
        (Lookup::Ne, _) => push_comparison(b, column, " IS NOT ", value)?,
        (Lookup::Gt, _) => push_comparison(b, column, " > ", value)?,
        (Lookup::Gte, _) => push_comparison(b, column, " >= ", value)?,
        (Lookup::Lt, _) => push_comparison(b, column, " < ", value)?,
        (Lookup::Lte, _) => push_comparison(b, column, " <= ", value)?,
        (Lookup::Contains, _) => {
            let pattern = format!("*{}*", glob_escape(text_of(condition)?));
            b.push(column).push(" GLOB ").push_bind(pattern);
        }
        (Lookup::StartsWith, _) => {
            let pattern = format!("{}*", glob_escape(text_of(condition)?));
            b.push(column).push(" GLOB ").push_bind(pattern);
        }
        (Lookup::EndsWith, _) => {
            let pattern = format!("*{}", glob_escape(text_of(condition)?));
            b.push(column).push(" GLOB ").push_bind(pattern);
        }
        (Lookup::IContains, _) => {
            let pattern = format!("%{}%", like_escape(text_of(condition)?));
            b.push(column).push(" LIKE ").push_bind(pattern).push(" ESCAPE '\\'");
        }
        (Lookup::In, Value::List(items)) if items.is_empty() => {
            b.push("0");
        }
        (Lookup::In, Value::List(items)) => {
            b.push(column).push(" IN (");
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    b.push(", ");
                }
                push_value(b, item)?;
            }
            b.push(")");
        }
        (Lookup::In, _) => {
            return Err(StrataError::validation(format!("{column}__in expects a list")));
        }
    }
    Ok(())
}

fn push_comparison(
    b: &mut QueryBuilder<'_, Sqlite>,
    column: &str,
    operator: &str,
    value: &Value,
) -> StrataResult<()> {
    b.push(column).push(operator);
    push_value(b, value)
}

fn text_of(condition: &Condition) -> StrataResult<&str> {
    match &condition.value {
        Value::Text(text) => Ok(text),
        _ => Err(StrataError::validation(format!(
            "'{}' expects a text value",
            condition.field
        ))),
    }
}

/// GLOB is case-sensitive; its wildcards are escaped as one-char classes.
fn glob_escape(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '*' | '?' | '[') {
            escaped.push('[');
            escaped.push(c);
            escaped.push(']');
        } else {
            escaped.push(c);
        }
    }
    escaped
}

fn like_escape(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::User;

    fn where_sql(query: &Query) -> String {
        let mut b = QueryBuilder::<Sqlite>::new("SELECT id FROM users");
        push_where::<User>(&mut b, query).unwrap();
        b.sql().to_string()
    }

    #[test]
    fn test_default_query_hides_deleted() {
        assert_eq!(where_sql(&Query::new()), "SELECT id FROM users WHERE 1 = 1 AND deleted = 0");
        assert_eq!(
            where_sql(&Query::new().include_deleted(true)),
            "SELECT id FROM users WHERE 1 = 1"
        );
    }

    #[test]
    fn test_filters_and_excludes() {
        let query = Query::new()
            .filter("email__iexact", "a@b.c")
            .filter("last_login__isnull", true)
            .exclude("first_name", "Ada")
            .exclude("is_authority", true);

        let sql = where_sql(&query);
        assert!(sql.contains("AND (email = ? COLLATE NOCASE)"));
        assert!(sql.contains("AND (last_login IS NULL)"));
        assert!(sql.ends_with("AND NOT COALESCE(((first_name = ?) AND (is_authority = ?)), 0)"));
    }

    #[test]
    fn test_in_lookup() {
        let sql = where_sql(&Query::new().filter("email__in", vec!["a", "b"]));
        assert!(sql.contains("email IN (?, ?)"));

        let sql = where_sql(&Query::new().filter("email__in", Vec::<String>::new()));
        assert!(sql.contains("AND (0)"));
    }

    #[test]
    fn test_pattern_lookup_needs_text() {
        let mut b = QueryBuilder::<Sqlite>::new("");
        let err = push_where::<User>(&mut b, &Query::new().filter("email__contains", 3)).unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
    }

    #[test]
    fn test_order_by() {
        let mut b = QueryBuilder::<Sqlite>::new("");
        push_order_by(&mut b, &Query::new().order_by("-created_at").order_by("email"));
        assert_eq!(b.sql(), " ORDER BY created_at DESC, email ASC, rowid");
    }

    #[test]
    fn test_escaping() {
        assert_eq!(glob_escape("a*b?[c]"), "a[*]b[?][[]c]");
        assert_eq!(like_escape("50%_\\"), "50\\%\\_\\\\");
    }
}
