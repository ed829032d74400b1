//! User entity.

use crate::model::{get_id, AuditFields, Model};
use crate::{StrataError, StrataResult, UserId, Value};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

/// An account that can log in with email and password.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,

    /// Public handle, generated once and never edited.
    pub username: Uuid,

    /// Login identifier, stored lower-cased and unique.
    pub email: String,

    /// Argon2 PHC string (never exposed via API).
    #[serde(skip_serializing)]
    pub password_hash: String,

    pub first_name: String,
    pub last_name: String,
    pub last_pass_change: DateTime<Utc>,
    pub forgot_password: bool,
    pub user_ip: String,

    #[serde(skip_serializing)]
    pub auth_token: Option<String>,

    /// Two-factor authentication switch.
    pub two_factor: bool,

    /// Access-token lifetime in seconds, within
    /// [`MIN_ACCESS_EXPIRATION_SECS`](Self::MIN_ACCESS_EXPIRATION_SECS)..=[`MAX_ACCESS_EXPIRATION_SECS`](Self::MAX_ACCESS_EXPIRATION_SECS).
    pub access_expiration_delta: u32,

    /// Relative path of the uploaded picture.
    pub profile_picture: Option<String>,

    /// Administrative power over other accounts.
    pub is_authority: bool,

    pub last_login: Option<DateTime<Utc>>,

    #[serde(flatten)]
    pub audit: AuditFields,
}

impl User {
    pub const DEFAULT_ACCESS_EXPIRATION_SECS: u32 = 600;
    pub const MIN_ACCESS_EXPIRATION_SECS: u32 = 300;
    pub const MAX_ACCESS_EXPIRATION_SECS: u32 = 3600;

    /// Creates a user with a fresh id and username.
    #[must_use]
    pub fn new(email: &str, password_hash: String) -> Self {
        let audit = AuditFields::new();
        Self {
            id: UserId::new(),
            username: Uuid::new_v4(),
            email: normalize_email(email),
            password_hash,
            first_name: String::new(),
            last_name: String::new(),
            last_pass_change: audit.created_at,
            forgot_password: false,
            user_ip: String::new(),
            auth_token: None,
            two_factor: false,
            access_expiration_delta: Self::DEFAULT_ACCESS_EXPIRATION_SECS,
            profile_picture: None,
            is_authority: false,
            last_login: None,
            audit,
        }
    }

    #[must_use]
    pub fn with_name(mut self, first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        self.first_name = first_name.into();
        self.last_name = last_name.into();
        self
    }

    #[must_use]
    pub fn with_authority(mut self, is_authority: bool) -> Self {
        self.is_authority = is_authority;
        self
    }

    /// Display name, `"{first} {last}"` with surrounding blanks removed.
    #[must_use]
    pub fn name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }

    /// Whether the account may authenticate.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.audit.is_active()
    }

    pub fn record_login(&mut self, ip: Option<&str>) {
        self.last_login = Some(Utc::now());
        if let Some(ip) = ip {
            self.user_ip = ip.to_string();
        }
    }

    /// Replaces the password hash and clears any reset request.
    pub fn set_password_hash(&mut self, password_hash: String) {
        self.password_hash = password_hash;
        self.last_pass_change = Utc::now();
        self.forgot_password = false;
    }
}

/// Lower-cases and trims an email address for storage and lookup.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl Model for User {
    const NAME: &'static str = "User";
    const TABLE: &'static str = "users";
    const FIELDS: &'static [&'static str] = &[
        "username",
        "email",
        "password_hash",
        "first_name",
        "last_name",
        "last_pass_change",
        "forgot_password",
        "user_ip",
        "auth_token",
        "two_factor",
        "access_expiration_delta",
        "profile_picture",
        "is_authority",
        "last_login",
    ];

    fn id(&self) -> UserId {
        self.id
    }

    fn audit(&self) -> &AuditFields {
        &self.audit
    }

    fn audit_mut(&mut self) -> &mut AuditFields {
        &mut self.audit
    }

    fn field_values(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("username", self.username.into()),
            ("email", self.email.clone().into()),
            ("password_hash", self.password_hash.clone().into()),
            ("first_name", self.first_name.clone().into()),
            ("last_name", self.last_name.clone().into()),
            ("last_pass_change", self.last_pass_change.into()),
            ("forgot_password", self.forgot_password.into()),
            ("user_ip", self.user_ip.clone().into()),
            ("auth_token", self.auth_token.clone().into()),
            ("two_factor", self.two_factor.into()),
            ("access_expiration_delta", self.access_expiration_delta.into()),
            ("profile_picture", self.profile_picture.clone().into()),
            ("is_authority", self.is_authority.into()),
            ("last_login", self.last_login.into()),
        ]
    }

    fn from_row(row: &SqliteRow) -> StrataResult<Self> {
        let username: String = row.try_get("username")?;
        let delta: i64 = row.try_get("access_expiration_delta")?;

        Ok(Self {
            id: get_id(row, "id")?,
            username: Uuid::parse_str(&username)
                .map_err(|e| StrataError::Internal(format!("Invalid username in database: {e}")))?,
            email: row.try_get("email")?,
            password_hash: row.try_get("password_hash")?,
            first_name: row.try_get("first_name")?,
            last_name: row.try_get("last_name")?,
            last_pass_change: row.try_get("last_pass_change")?,
            forgot_password: row.try_get("forgot_password")?,
            user_ip: row.try_get("user_ip")?,
            auth_token: row.try_get("auth_token")?,
            two_factor: row.try_get("two_factor")?,
            access_expiration_delta: u32::try_from(delta).map_err(|_| {
                StrataError::Internal(format!("Invalid access_expiration_delta in database: {delta}"))
            })?,
            profile_picture: row.try_get("profile_picture")?,
            is_authority: row.try_get("is_authority")?,
            last_login: row.try_get("last_login")?,
            audit: AuditFields::from_row(row)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_user_defaults() {
        let user = User::new("  Ada@Example.COM ", "hash".to_string());
        assert_eq!(user.email, "ada@example.com");
        assert_eq!(user.access_expiration_delta, 600);
        assert!(!user.is_authority);
        assert!(user.is_active());
        assert_eq!(user.username.get_version_num(), 4);
        assert_ne!(user.username, user.id.into_inner());
    }

    #[test]
    fn test_name_joins_first_and_last() {
        let user = User::new("a@b.c", String::new()).with_name("Ada", "Lovelace");
        assert_eq!(user.name(), "Ada Lovelace");
    }

    #[test]
    fn test_name_is_trimmed_when_parts_missing() {
        let only_first = User::new("a@b.c", String::new()).with_name("Ada", "");
        assert_eq!(only_first.name(), "Ada");
        let nothing = User::new("a@b.c", String::new());
        assert_eq!(nothing.name(), "");
    }

    #[test]
    fn test_set_password_hash_resets_forgot_flag() {
        let mut user = User::new("a@b.c", "old".to_string());
        user.forgot_password = true;
        let before = user.last_pass_change;

        user.set_password_hash("new".to_string());

        assert_eq!(user.password_hash, "new");
        assert!(!user.forgot_password);
        assert!(user.last_pass_change >= before);
    }

    #[test]
    fn test_record_login() {
        let mut user = User::new("a@b.c", String::new());
        user.record_login(Some("10.0.0.1"));
        assert!(user.last_login.is_some());
        assert_eq!(user.user_ip, "10.0.0.1");
    }

    #[test]
    fn test_columns_and_values_align() {
        let user = User::new("a@b.c", "hash".to_string());
        let names: Vec<&str> = user.values().into_iter().map(|(name, _)| name).collect();
        assert_eq!(names, User::columns());
        assert_eq!(names[0], "id");
    }

    #[test]
    fn test_password_hash_is_not_serialized() {
        let user = User::new("a@b.c", "secret-hash".to_string());
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("secret-hash"));
        assert!(json.contains("\"deleted\":false"));
    }
}
