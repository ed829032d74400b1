//! Authority checks on token claims.

use crate::Claims;
use strata_core::{StrataError, StrataResult, UserId};

/// Extension trait for Claims to check access rights.
pub trait ClaimsExt {
    /// Requires the administrative flag.
    fn require_authority(&self) -> StrataResult<()>;

    /// Checks whether the claims belong to `user_id`.
    fn is_self(&self, user_id: UserId) -> bool;

    /// Requires the administrative flag or being `user_id`.
    fn require_self_or_authority(&self, user_id: UserId) -> StrataResult<()>;
}

impl ClaimsExt for Claims {
    fn require_authority(&self) -> StrataResult<()> {
        if self.is_authority {
            Ok(())
        } else {
            Err(StrataError::Forbidden("Authority required".to_string()))
        }
    }

    fn is_self(&self, user_id: UserId) -> bool {
        self.user_id().is_some_and(|id| id == user_id)
    }

    fn require_self_or_authority(&self, user_id: UserId) -> StrataResult<()> {
        if self.is_authority || self.is_self(user_id) {
            Ok(())
        } else {
            Err(StrataError::Forbidden(
                "You don't have permission to access this resource".to_string(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TokenType;
    use chrono::{Duration, Utc};
    use strata_core::User;

    fn claims_for(user: &User) -> Claims {
        Claims::for_user(
            user,
            TokenType::Access,
            "iss",
            "aud",
            Utc::now(),
            Duration::minutes(10),
            "s",
        )
    }

    #[test]
    fn test_plain_user() {
        let user = User::new("bob@example.com", "h".to_string());
        let claims = claims_for(&user);

        assert_eq!(claims.require_authority().unwrap_err().status_code(), 403);
        assert!(claims.is_self(user.id));
        assert!(claims.require_self_or_authority(user.id).is_ok());
        assert!(claims.require_self_or_authority(UserId::new()).is_err());
    }

    #[test]
    fn test_authority_user() {
        let admin = User::new("root@example.com", "h".to_string()).with_authority(true);
        let claims = claims_for(&admin);

        assert!(claims.require_authority().is_ok());
        assert!(!claims.is_self(UserId::new()));
        assert!(claims.require_self_or_authority(UserId::new()).is_ok());
    }
}
