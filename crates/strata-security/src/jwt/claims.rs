//! JWT claims structure.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use strata_core::{User, UserId};
use uuid::Uuid;

/// Claims carried by access and refresh tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID).
    pub sub: String,

    /// Public username handle.
    pub username: String,

    pub email: String,

    /// Administrative power at issue time.
    #[serde(default)]
    pub is_authority: bool,

    pub token_type: TokenType,

    /// Issued at timestamp.
    pub iat: i64,

    /// Expiration timestamp.
    pub exp: i64,

    /// Not before timestamp.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,

    pub iss: String,

    pub aud: String,

    /// JWT ID (unique identifier for this token).
    pub jti: String,

    /// Shared by the access and refresh token of one pair.
    pub session_id: String,
}

impl Claims {
    /// Builds claims for `user`, valid from `issued_at` for `lifetime`.
    #[must_use]
    pub fn for_user(
        user: &User,
        token_type: TokenType,
        issuer: &str,
        audience: &str,
        issued_at: DateTime<Utc>,
        lifetime: Duration,
        session_id: &str,
    ) -> Self {
        let iat = issued_at.timestamp();
        Self {
            sub: user.id.to_string(),
            username: user.username.to_string(),
            email: user.email.clone(),
            is_authority: user.is_authority,
            token_type,
            iat,
            exp: iat + lifetime.num_seconds(),
            nbf: Some(iat),
            iss: issuer.to_string(),
            aud: audience.to_string(),
            jti: Uuid::now_v7().to_string(),
            session_id: session_id.to_string(),
        }
    }

    /// Parses the subject as a user ID.
    #[must_use]
    pub fn user_id(&self) -> Option<UserId> {
        UserId::parse(&self.sub).ok()
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() > self.exp
    }

    #[must_use]
    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.exp, 0).unwrap_or_else(Utc::now)
    }

    #[must_use]
    pub const fn is_access_token(&self) -> bool {
        matches!(self.token_type, TokenType::Access)
    }

    #[must_use]
    pub const fn is_refresh_token(&self) -> bool {
        matches!(self.token_type, TokenType::Refresh)
    }
}

/// Token type enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    /// Short-lived, sent with API requests.
    Access,
    /// Long-lived, exchanged for a new pair.
    Refresh,
}

impl std::fmt::Display for TokenType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Access => write!(f, "access"),
            Self::Refresh => write!(f, "refresh"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User::new("ada@example.com", "hash".to_string()).with_authority(true)
    }

    #[test]
    fn test_claims_for_user() {
        let user = user();
        let now = Utc::now();
        let claims = Claims::for_user(
            &user,
            TokenType::Access,
            "iss",
            "aud",
            now,
            Duration::minutes(10),
            "s1",
        );

        assert_eq!(claims.user_id(), Some(user.id));
        assert_eq!(claims.username, user.username.to_string());
        assert!(claims.is_authority);
        assert!(claims.is_access_token());
        assert!(!claims.is_refresh_token());
        assert!(!claims.is_expired());
        assert_eq!(claims.exp - claims.iat, 600);
        assert_eq!(claims.expires_at().timestamp(), now.timestamp() + 600);
    }

    #[test]
    fn test_expired_claims() {
        let claims = Claims::for_user(
            &user(),
            TokenType::Refresh,
            "iss",
            "aud",
            Utc::now() - Duration::minutes(10),
            Duration::minutes(1),
            "s1",
        );
        assert!(claims.is_expired());
        assert!(claims.is_refresh_token());
    }

    #[test]
    fn test_token_type_serialization() {
        assert_eq!(serde_json::to_string(&TokenType::Refresh).unwrap(), "\"refresh\"");
        assert_eq!(TokenType::Access.to_string(), "access");
    }
}
