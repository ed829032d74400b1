//! `create-app`: skeleton of a new app on the generic DAO/service layers.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use strata_core::validation::rules::snake_case_identifier;
use strata_core::{StrataError, StrataResult};
use tracing::info;

const MOD_TEMPLATE: &str = r"//! The {{name}} app.

mod dao;
mod model;
mod routes;
mod service;

pub use dao::*;
pub use model::*;
pub use routes::*;
pub use service::*;
";

const MODEL_TEMPLATE: &str = r#"//! {{Name}} model.
//!
//! Backing table:
//!
//! ```sql
//! CREATE TABLE {{name}} (
//!     id TEXT PRIMARY KEY NOT NULL,
//!     title TEXT NOT NULL,
//!     inactive BOOLEAN NOT NULL DEFAULT 0,
//!     deleted BOOLEAN NOT NULL DEFAULT 0,
//!     created_at TEXT NOT NULL,
//!     created_by TEXT,
//!     updated_at TEXT NOT NULL,
//!     updated_by TEXT,
//!     deleted_at TEXT,
//!     deleted_by TEXT
//! );
//! ```

use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use strata_core::{get_id, AuditFields, EntityId, Model, StrataResult, Value};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct {{Name}} {
    pub id: EntityId,
    pub title: String,
    #[serde(flatten)]
    pub audit: AuditFields,
}

impl {{Name}} {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: EntityId::new(),
            title: title.into(),
            audit: AuditFields::new(),
        }
    }
}

impl Model for {{Name}} {
    const NAME: &'static str = "{{Name}}";
    const TABLE: &'static str = "{{name}}";
    const FIELDS: &'static [&'static str] = &["title"];

    fn id(&self) -> EntityId {
        self.id
    }

    fn audit(&self) -> &AuditFields {
        &self.audit
    }

    fn audit_mut(&mut self) -> &mut AuditFields {
        &mut self.audit
    }

    fn field_values(&self) -> Vec<(&'static str, Value)> {
        vec![("title", self.title.clone().into())]
    }

    fn from_row(row: &SqliteRow) -> StrataResult<Self> {
        Ok(Self {
            id: get_id(row, "id")?,
            title: row.try_get("title")?,
            audit: AuditFields::from_row(row)?,
        })
    }
}
"#;

const DAO_TEMPLATE: &str = r"//! {{Name}} data access.

use super::{{Name}};
use strata_repository::SqliteDao;

pub type {{Name}}Dao = SqliteDao<{{Name}}>;
";

const SERVICE_TEMPLATE: &str = r"//! {{Name}} services.

use super::{{Name}};
use std::sync::Arc;
use strata_core::UserId;
use strata_repository::DatabasePoolInterface;
use strata_service::{ReadService, WriteService};

pub type {{Name}}ReadService = ReadService<{{Name}}>;
pub type {{Name}}WriteService = WriteService<{{Name}}>;

pub fn {{name}}_reader(pool: Arc<dyn DatabasePoolInterface>) -> {{Name}}ReadService {
    ReadService::sqlite(pool)
}

/// Writes stamped with `actor` in the audit columns.
pub fn {{name}}_writer(pool: Arc<dyn DatabasePoolInterface>, actor: UserId) -> {{Name}}WriteService {
    WriteService::sqlite(pool).acting_as(actor)
}
";

const ROUTES_TEMPLATE: &str = r#"//! {{Name}} routes.
//!
//! Errors go out through `AppError`, so a missing row is a 404 and a
//! malformed id a 400, both in the JSON error envelope.

use super::{{{name}}_reader, {{Name}}};
use axum::{
    extract::{Path, State},
    routing::get,
    Router,
};
use std::sync::Arc;
use strata_core::{EntityId, StrataError};
use strata_repository::DatabasePoolInterface;
use strata_rest::responses::{ok, ApiResult};

pub fn router(pool: Arc<dyn DatabasePoolInterface>) -> Router {
    Router::new()
        .route("/{{name}}", get(list))
        .route("/{{name}}/:id", get(detail))
        .with_state(pool)
}

async fn list(State(pool): State<Arc<dyn DatabasePoolInterface>>) -> ApiResult<Vec<{{Name}}>> {
    let rows = {{name}}_reader(pool).list_all(false).await?;
    ok(rows)
}

async fn detail(
    State(pool): State<Arc<dyn DatabasePoolInterface>>,
    Path(id): Path<String>,
) -> ApiResult<{{Name}}> {
    let id = EntityId::parse(&id).map_err(|e| StrataError::validation(e.to_string()))?;
    let row = {{name}}_reader(pool).require(id).await?;
    ok(row)
}
"#;

/// Files written for every app, relative to its directory.
pub const APP_FILES: [(&str, &str); 5] = [
    ("mod.rs", MOD_TEMPLATE),
    ("model.rs", MODEL_TEMPLATE),
    ("dao.rs", DAO_TEMPLATE),
    ("service.rs", SERVICE_TEMPLATE),
    ("routes.rs", ROUTES_TEMPLATE),
];

/// Keywords that cannot name a module.
const RESERVED: &[&str] = &[
    "as", "async", "await", "break", "const", "continue", "crate", "dyn", "else", "enum",
    "extern", "false", "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod", "move",
    "mut", "pub", "ref", "return", "self", "static", "struct", "super", "trait", "true", "type",
    "unsafe", "use", "where", "while", "yield",
];

/// `snake_case` to `PascalCase`.
fn pascal_case(name: &str) -> String {
    name.split('_')
        .map(|part| {
            let mut chars = part.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_ascii_uppercase().to_string() + chars.as_str()
            })
        })
        .collect()
}

fn render(template: &str, name: &str) -> String {
    template
        .replace("{{name}}", name)
        .replace("{{Name}}", &pascal_case(name))
}

/// Creates `{dir}/{name}/` with the app skeleton.
///
/// Nothing is written when the name is invalid or any of the files already
/// exists. Returns the created files.
pub fn create_app(name: &str, dir: &Path) -> StrataResult<Vec<PathBuf>> {
    if snake_case_identifier(name).is_err() || RESERVED.contains(&name) {
        return Err(StrataError::validation(format!(
            "Invalid app name '{name}': expected a snake_case identifier"
        )));
    }

    let app_dir = dir.join(name);
    let targets: Vec<(PathBuf, &str)> = APP_FILES
        .iter()
        .map(|(file, template)| (app_dir.join(file), *template))
        .collect();

    if let Some((existing, _)) = targets.iter().find(|(path, _)| path.exists()) {
        return Err(StrataError::conflict(format!(
            "Refusing to overwrite {}",
            existing.display()
        )));
    }

    std::fs::create_dir_all(&app_dir).map_err(|e| {
        StrataError::internal(format!("Failed to create {}: {e}", app_dir.display()))
    })?;

    let mut created = Vec::with_capacity(targets.len());
    for (path, template) in targets {
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|e| StrataError::internal(format!("Failed to create {}: {e}", path.display())))?;
        file.write_all(render(template, name).as_bytes())
            .map_err(|e| StrataError::internal(format!("Failed to write {}: {e}", path.display())))?;
        created.push(path);
    }

    info!("Created app '{}' in {}", name, app_dir.display());
    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_pascal_case() {
        assert_eq!(pascal_case("orders"), "Orders");
        assert_eq!(pascal_case("line_item"), "LineItem");
        assert_eq!(pascal_case("v2_tag"), "V2Tag");
    }

    #[test]
    fn test_create_app_writes_skeleton() {
        let dir = tempfile::tempdir().unwrap();

        let created = create_app("line_item", dir.path()).unwrap();

        assert_eq!(created.len(), 5);
        let app_dir = dir.path().join("line_item");
        for (file, _) in APP_FILES {
            assert!(app_dir.join(file).is_file(), "{file}");
        }
        let model = fs::read_to_string(app_dir.join("model.rs")).unwrap();
        assert!(model.contains("pub struct LineItem"));
        assert!(model.contains(r#"const TABLE: &'static str = "line_item";"#));
        assert!(!model.contains("{{"));
        let dao = fs::read_to_string(app_dir.join("dao.rs")).unwrap();
        assert!(dao.contains("pub type LineItemDao = SqliteDao<LineItem>;"));

        let routes = fs::read_to_string(app_dir.join("routes.rs")).unwrap();
        assert!(routes.contains("-> ApiResult<LineItem>"));
        assert!(routes.contains("-> ApiResult<Vec<LineItem>>"));
        assert!(routes.contains("use strata_rest::responses::{ok, ApiResult};"));
        assert!(!routes.contains(", String>"));
        assert!(!routes.contains("{{"));
    }

    /// Same handler shape as the generated `detail` route, bound to `User`.
    mod generated_detail {
        use axum::extract::{Path, State};
        use axum::http::{Request, StatusCode};
        use axum::{routing::get, Router};
        use std::sync::Arc;
        use strata_config::DatabaseConfig;
        use strata_core::{EntityId, StrataError, User};
        use strata_repository::{create_pool, DatabasePoolInterface};
        use strata_rest::responses::{ok, ApiResult};
        use strata_service::ReadService;
        use tower::ServiceExt;

        async fn detail(
            State(pool): State<Arc<dyn DatabasePoolInterface>>,
            Path(id): Path<String>,
        ) -> ApiResult<User> {
            let id = EntityId::parse(&id).map_err(|e| StrataError::validation(e.to_string()))?;
            let row = ReadService::<User>::sqlite(pool).require(id).await?;
            ok(row)
        }

        async fn status_of(uri: &str) -> StatusCode {
            let pool: Arc<dyn DatabasePoolInterface> = create_pool(&DatabaseConfig {
                url: "sqlite::memory:".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
            let app = Router::new().route("/users/:id", get(detail)).with_state(pool);
            let request = Request::builder().uri(uri).body(axum::body::Body::empty()).unwrap();
            app.oneshot(request).await.unwrap().status()
        }

        #[tokio::test]
        async fn test_missing_row_is_not_found() {
            let uri = format!("/users/{}", EntityId::new());
            assert_eq!(status_of(&uri).await, StatusCode::NOT_FOUND);
        }

        #[tokio::test]
        async fn test_malformed_id_is_bad_request() {
            assert_eq!(status_of("/users/not-a-uuid").await, StatusCode::BAD_REQUEST);
        }
    }

    #[test]
    fn test_invalid_names_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["", "Orders", "1st", "bad-name", "trailing_", "two__parts", "type"] {
            let err = create_app(name, dir.path()).unwrap_err();
            assert_eq!(err.error_code(), "VALIDATION_ERROR", "{name}");
        }
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_existing_files_are_never_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let app_dir = dir.path().join("orders");
        fs::create_dir_all(&app_dir).unwrap();
        fs::write(app_dir.join("service.rs"), "// mine").unwrap();

        let err = create_app("orders", dir.path()).unwrap_err();

        assert_eq!(err.error_code(), "CONFLICT");
        assert_eq!(fs::read_to_string(app_dir.join("service.rs")).unwrap(), "// mine");
        assert!(!app_dir.join("model.rs").exists());
    }

    #[test]
    fn test_second_run_conflicts() {
        let dir = tempfile::tempdir().unwrap();
        create_app("orders", dir.path()).unwrap();
        assert!(create_app("orders", dir.path()).is_err());
    }
}
