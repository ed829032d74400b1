//! Authentication service.

use super::{UserReadService, UserWriteService};
use crate::dto::{LoginRequest, RefreshTokenRequest, TokenResponse};
use async_trait::async_trait;
use shaku::Component;
use std::sync::{Arc, OnceLock};
use strata_core::{Interface, StrataError, StrataResult, User, ValidateExt};
use strata_security::{Claims, PasswordHasherInterface, TokenProviderInterface};
use tracing::{debug, info, warn};

/// Authentication service trait.
#[async_trait]
pub trait AuthService: Interface + Send + Sync {
    /// The live, active user with these credentials, if any.
    async fn validate_user(&self, email: &str, password: &str) -> StrataResult<Option<User>>;

    /// Issues an access/refresh pair; the access lifetime is the user's own.
    fn get_tokens_for_user(&self, user: &User) -> StrataResult<TokenResponse>;

    /// Every failure, including a deactivated account, is `InvalidCredentials`.
    async fn login(&self, request: LoginRequest, ip: Option<String>) -> StrataResult<TokenResponse>;

    async fn refresh(&self, request: RefreshTokenRequest) -> StrataResult<TokenResponse>;

    fn validate_access_token(&self, token: &str) -> StrataResult<Claims>;
}

/// [`AuthService`] over the user services.
#[derive(Component)]
#[shaku(interface = AuthService)]
pub struct AuthServiceComponent {
    #[shaku(inject)]
    users: Arc<dyn UserReadService>,
    #[shaku(inject)]
    user_writer: Arc<dyn UserWriteService>,
    #[shaku(inject)]
    password_hasher: Arc<dyn PasswordHasherInterface>,
    #[shaku(inject)]
    token_provider: Arc<dyn TokenProviderInterface>,
    /// Hash checked on unknown emails so they take as long as a wrong password.
    #[shaku(default)]
    decoy_hash: OnceLock<String>,
}

impl AuthServiceComponent {
    #[must_use]
    pub fn new(
        users: Arc<dyn UserReadService>,
        user_writer: Arc<dyn UserWriteService>,
        password_hasher: Arc<dyn PasswordHasherInterface>,
        token_provider: Arc<dyn TokenProviderInterface>,
    ) -> Self {
        Self {
            users,
            user_writer,
            password_hasher,
            token_provider,
            decoy_hash: OnceLock::new(),
        }
    }

    fn verify_decoy(&self, password: &str) {
        let hash = self.decoy_hash.get_or_init(|| {
            self.password_hasher
                .hash("strata-decoy-password")
                .unwrap_or_default()
        });
        let _ = self.password_hasher.verify(password, hash);
    }
}

#[async_trait]
impl AuthService for AuthServiceComponent {
    async fn validate_user(&self, email: &str, password: &str) -> StrataResult<Option<User>> {
        let Some(user) = self.users.get_by_email(email).await? else {
            warn!("Login failed: unknown email - {}", email);
            self.verify_decoy(password);
            return Ok(None);
        };

        if !self.password_hasher.verify(password, &user.password_hash)? {
            warn!("Login failed: invalid password - {}", user.id);
            return Ok(None);
        }

        if !user.is_active() {
            warn!("Login failed: inactive account - {}", user.id);
            return Ok(None);
        }

        Ok(Some(user))
    }

    fn get_tokens_for_user(&self, user: &User) -> StrataResult<TokenResponse> {
        Ok(self.token_provider.generate_tokens(user)?.into())
    }

    async fn login(&self, request: LoginRequest, ip: Option<String>) -> StrataResult<TokenResponse> {
        debug!("Login attempt for: {}", request.email);
        request.validate_request()?;

        let user = self
            .validate_user(&request.email, &request.password)
            .await?
            .ok_or(StrataError::InvalidCredentials)?;

        let tokens = self.get_tokens_for_user(&user)?;

        if let Err(e) = self.user_writer.record_login(user.id, ip).await {
            warn!("Failed to record login for {}: {}", user.id, e);
        }

        info!("User logged in: {}", user.id);
        Ok(tokens)
    }

    async fn refresh(&self, request: RefreshTokenRequest) -> StrataResult<TokenResponse> {
        debug!("Refreshing token");
        request.validate_request()?;

        let claims = self
            .token_provider
            .validate_refresh_token(&request.refresh_token)?;
        let user_id = claims.user_id().ok_or_else(|| {
            StrataError::InvalidToken("Invalid refresh token: missing user ID".to_string())
        })?;

        let user = self
            .users
            .reader()
            .get(user_id)
            .await?
            .filter(User::is_active)
            .ok_or_else(|| StrataError::InvalidToken("User no longer exists".to_string()))?;

        info!("Token refreshed for user: {}", user.id);
        self.get_tokens_for_user(&user)
    }

    fn validate_access_token(&self, token: &str) -> StrataResult<Claims> {
        self.token_provider.validate_access_token(token)
    }
}

impl std::fmt::Debug for AuthServiceComponent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthServiceComponent").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dto::CreateUserRequest;
    use crate::test_support::{hasher, memory_pool, token_provider};
    use crate::users::{UserReadServiceComponent, UserWriteServiceComponent};
    use strata_core::{Query, UserId, Value};

    struct Fixture {
        auth: AuthServiceComponent,
        users: Arc<dyn UserReadService>,
        writer: Arc<dyn UserWriteService>,
        user_id: UserId,
    }

    async fn fixture() -> Fixture {
        let pool = memory_pool().await;
        let hasher = hasher();
        let users: Arc<dyn UserReadService> = Arc::new(UserReadServiceComponent::new(pool.clone()));
        let writer: Arc<dyn UserWriteService> =
            Arc::new(UserWriteServiceComponent::new(pool, hasher.clone()));

        let created = writer
            .create_user(
                CreateUserRequest {
                    email: "ada@example.com".to_string(),
                    password: "s3cretpass".to_string(),
                    first_name: "Ada".to_string(),
                    last_name: "Lovelace".to_string(),
                    is_authority: false,
                    access_expiration_delta: Some(1200),
                },
                None,
            )
            .await
            .unwrap();

        Fixture {
            auth: AuthServiceComponent::new(
                users.clone(),
                writer.clone(),
                hasher,
                token_provider(),
            ),
            users,
            writer,
            user_id: created.id,
        }
    }

    fn login(email: &str, password: &str) -> LoginRequest {
        LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn test_login_success() {
        let f = fixture().await;

        let tokens = f
            .auth
            .login(login("ADA@example.com", "s3cretpass"), Some("127.0.0.1".to_string()))
            .await
            .unwrap();

        assert_eq!(tokens.token_type, "Bearer");
        assert_eq!(tokens.expires_in, 1200);
        let claims = f.auth.validate_access_token(&tokens.access_token).unwrap();
        assert_eq!(claims.user_id(), Some(f.user_id));

        let user = f.users.reader().require(f.user_id).await.unwrap();
        assert!(user.last_login.is_some());
        assert_eq!(user.user_ip, "127.0.0.1");
    }

    #[tokio::test]
    async fn test_bad_credentials_are_unauthorized() {
        let f = fixture().await;

        for request in [
            login("ada@example.com", "wrong-password1"),
            login("nobody@example.com", "s3cretpass"),
        ] {
            let err = f.auth.login(request, None).await.unwrap_err();
            assert_eq!(err.status_code(), 401);
            assert_eq!(err.error_code(), "INVALID_CREDENTIALS");
        }
    }

    /// Counts `verify` calls on top of the real hasher.
    struct CountingHasher {
        inner: Arc<dyn PasswordHasherInterface>,
        verifies: std::sync::atomic::AtomicUsize,
    }

    impl PasswordHasherInterface for CountingHasher {
        fn hash(&self, password: &str) -> StrataResult<String> {
            self.inner.hash(password)
        }

        fn verify(&self, password: &str, hash: &str) -> StrataResult<bool> {
            self.verifies
                .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            self.inner.verify(password, hash)
        }

        fn needs_rehash(&self, hash: &str) -> bool {
            self.inner.needs_rehash(hash)
        }
    }

    #[tokio::test]
    async fn test_unknown_email_still_verifies_a_hash() {
        let f = fixture().await;
        let counting = Arc::new(CountingHasher {
            inner: hasher(),
            verifies: std::sync::atomic::AtomicUsize::new(0),
        });
        let auth = AuthServiceComponent::new(
            f.users.clone(),
            f.writer.clone(),
            counting.clone(),
            token_provider(),
        );

        for _ in 0..2 {
            let found = auth
                .validate_user("nobody@example.com", "s3cretpass")
                .await
                .unwrap();
            assert!(found.is_none());
        }
        assert_eq!(
            counting.verifies.load(std::sync::atomic::Ordering::SeqCst),
            2
        );
    }

    #[tokio::test]
    async fn test_malformed_login_is_validation_error() {
        let f = fixture().await;
        let err = f.auth.login(login("not-an-email", ""), None).await.unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[tokio::test]
    async fn test_inactive_and_deleted_users_cannot_log_in() {
        let f = fixture().await;
        f.writer
            .writer(None)
            .update_by_query(
                &Query::new().filter("id", f.user_id),
                &[("inactive", Value::from(true))],
            )
            .await
            .unwrap();

        let err = f.auth.login(login("ada@example.com", "s3cretpass"), None).await.unwrap_err();
        assert_eq!(err.error_code(), "INVALID_CREDENTIALS");

        f.writer.delete_user(f.user_id, None).await.unwrap();
        assert!(f
            .auth
            .validate_user("ada@example.com", "s3cretpass")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_refresh() {
        let f = fixture().await;
        let tokens = f.auth.login(login("ada@example.com", "s3cretpass"), None).await.unwrap();

        let refreshed = f
            .auth
            .refresh(RefreshTokenRequest {
                refresh_token: tokens.refresh_token.clone(),
            })
            .await
            .unwrap();
        assert!(f.auth.validate_access_token(&refreshed.access_token).is_ok());

        let err = f
            .auth
            .refresh(RefreshTokenRequest {
                refresh_token: tokens.access_token,
            })
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "INVALID_TOKEN");

        f.writer.delete_user(f.user_id, None).await.unwrap();
        let err = f
            .auth
            .refresh(RefreshTokenRequest {
                refresh_token: tokens.refresh_token,
            })
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 401);
    }
}
