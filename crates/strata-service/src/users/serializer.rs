//! User serializer.

use crate::dto::{CreateUserRequest, UpdateUserRequest, UserResponse};
use crate::serializer::ModelSerializer;
use std::sync::Arc;
use strata_core::{StrataResult, User};
use strata_security::PasswordHasherInterface;

/// Hashes the password on create and exposes the derived `name` on output.
pub struct UserSerializer {
    hasher: Arc<dyn PasswordHasherInterface>,
}

impl UserSerializer {
    #[must_use]
    pub fn new(hasher: Arc<dyn PasswordHasherInterface>) -> Self {
        Self { hasher }
    }
}

impl ModelSerializer<User> for UserSerializer {
    type Create = CreateUserRequest;
    type Update = UpdateUserRequest;
    type Output = UserResponse;

    fn build(&self, input: CreateUserRequest) -> StrataResult<User> {
        let password_hash = self.hasher.hash(&input.password)?;
        let mut user = User::new(&input.email, password_hash)
            .with_name(input.first_name.trim(), input.last_name.trim())
            .with_authority(input.is_authority);
        if let Some(delta) = input.access_expiration_delta {
            user.access_expiration_delta = delta;
        }
        Ok(user)
    }

    fn apply(&self, user: &mut User, input: UpdateUserRequest) -> StrataResult<()> {
        if let Some(first_name) = input.first_name {
            user.first_name = first_name.trim().to_string();
        }
        if let Some(last_name) = input.last_name {
            user.last_name = last_name.trim().to_string();
        }
        if let Some(two_factor) = input.two_factor {
            user.two_factor = two_factor;
        }
        if let Some(delta) = input.access_expiration_delta {
            user.access_expiration_delta = delta;
        }
        if let Some(picture) = input.profile_picture {
            user.profile_picture = Some(picture).filter(|p| !p.is_empty());
        }
        Ok(())
    }

    fn render(&self, user: &User) -> UserResponse {
        UserResponse::from(user)
    }
}

impl std::fmt::Debug for UserSerializer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserSerializer").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::WriteService;
    use crate::serializer::ServiceSerializer;
    use crate::test_support::{hasher, memory_pool};

    fn create_request() -> CreateUserRequest {
        CreateUserRequest {
            email: "Ada@Example.com".to_string(),
            password: "s3cretpass".to_string(),
            first_name: " Ada ".to_string(),
            last_name: "Lovelace".to_string(),
            is_authority: false,
            access_expiration_delta: Some(900),
        }
    }

    #[test]
    fn test_build_hashes_password() {
        let hasher = hasher();
        let serializer = UserSerializer::new(hasher.clone());

        let user = serializer.build(create_request()).unwrap();

        assert_eq!(user.email, "ada@example.com");
        assert_eq!(user.first_name, "Ada");
        assert_eq!(user.access_expiration_delta, 900);
        assert_ne!(user.password_hash, "s3cretpass");
        assert!(hasher.verify("s3cretpass", &user.password_hash).unwrap());
    }

    #[test]
    fn test_apply_only_touches_given_fields() {
        let serializer = UserSerializer::new(hasher());
        let mut user = User::new("ada@example.com", "h".to_string()).with_name("Ada", "Lovelace");

        serializer
            .apply(
                &mut user,
                UpdateUserRequest {
                    last_name: Some("King".to_string()),
                    two_factor: Some(true),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(serializer.render(&user).name, "Ada King");
        assert!(user.two_factor);
        assert_eq!(user.access_expiration_delta, 600);
    }

    #[tokio::test]
    async fn test_service_serializer_round_trip() {
        let pool = memory_pool().await;
        let serializer = ServiceSerializer::new(
            UserSerializer::new(hasher()),
            WriteService::<User>::sqlite(pool),
        );

        let created = serializer.create(create_request()).await.unwrap();
        assert_eq!(created.name, "Ada Lovelace");

        let updated = serializer
            .update(
                created.id,
                UpdateUserRequest {
                    first_name: Some("Augusta".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Augusta Lovelace");
        assert_eq!(updated.created_at, created.created_at);
    }

    #[tokio::test]
    async fn test_service_serializer_validates_first() {
        let pool = memory_pool().await;
        let serializer = ServiceSerializer::new(
            UserSerializer::new(hasher()),
            WriteService::<User>::sqlite(pool),
        );

        let err = serializer
            .create(CreateUserRequest {
                email: "nope".to_string(),
                ..create_request()
            })
            .await
            .unwrap_err();

        assert_eq!(err.status_code(), 400);
        assert!(err.to_string().contains("email"));
    }
}
