//! User write service.

use super::UserSerializer;
use crate::base::WriteService;
use crate::dto::{CreateUserRequest, SetPasswordRequest, UpdateUserRequest, UserResponse};
use crate::serializer::ServiceSerializer;
use async_trait::async_trait;
use shaku::Component;
use std::sync::Arc;
use strata_core::{
    normalize_email, Interface, Query, StrataError, StrataResult, User, UserId, ValidateExt,
};
use strata_repository::DatabasePoolInterface;
use strata_security::PasswordHasherInterface;
use tracing::{debug, info};

/// Write access to users. `actor` is recorded in the audit columns.
#[async_trait]
pub trait UserWriteService: Interface + Send + Sync {
    /// The generic write operations for users.
    fn writer(&self, actor: Option<UserId>) -> WriteService<User>;

    async fn create_user(
        &self,
        request: CreateUserRequest,
        actor: Option<UserId>,
    ) -> StrataResult<UserResponse>;

    async fn update_user(
        &self,
        id: UserId,
        request: UpdateUserRequest,
        actor: Option<UserId>,
    ) -> StrataResult<UserResponse>;

    /// Re-hashes the password and stamps `last_pass_change`.
    async fn set_password(
        &self,
        id: UserId,
        request: SetPasswordRequest,
        actor: Option<UserId>,
    ) -> StrataResult<()>;

    /// Soft delete.
    async fn delete_user(&self, id: UserId, actor: Option<UserId>) -> StrataResult<()>;

    /// Stamps `last_login` and, when known, the client address.
    async fn record_login(&self, id: UserId, ip: Option<String>) -> StrataResult<User>;
}

/// [`UserWriteService`] over the SQLite DAO.
#[derive(Component)]
#[shaku(interface = UserWriteService)]
pub struct UserWriteServiceComponent {
    #[shaku(inject)]
    pool: Arc<dyn DatabasePoolInterface>,
    #[shaku(inject)]
    hasher: Arc<dyn PasswordHasherInterface>,
}

impl UserWriteServiceComponent {
    #[must_use]
    pub fn new(
        pool: Arc<dyn DatabasePoolInterface>,
        hasher: Arc<dyn PasswordHasherInterface>,
    ) -> Self {
        Self { pool, hasher }
    }

    fn serializer(&self, actor: Option<UserId>) -> ServiceSerializer<User, UserSerializer> {
        ServiceSerializer::new(
            UserSerializer::new(Arc::clone(&self.hasher)),
            self.writer(actor),
        )
    }
}

#[async_trait]
impl UserWriteService for UserWriteServiceComponent {
    fn writer(&self, actor: Option<UserId>) -> WriteService<User> {
        let service = WriteService::sqlite(Arc::clone(&self.pool));
        match actor {
            Some(actor) => service.acting_as(actor),
            None => service,
        }
    }

    async fn create_user(
        &self,
        request: CreateUserRequest,
        actor: Option<UserId>,
    ) -> StrataResult<UserResponse> {
        debug!("Creating user: {}", request.email);

        let email = normalize_email(&request.email);
        let taken = crate::base::ReadService::<User>::sqlite(Arc::clone(&self.pool))
            .exists(&Query::new().filter("email", email.as_str()).include_deleted(true))
            .await?;
        if taken {
            return Err(StrataError::conflict(format!("Email '{email}' already exists")));
        }

        let created = self.serializer(actor).create(request).await?;
        info!("User created: {}", created.id);
        Ok(created)
    }

    async fn update_user(
        &self,
        id: UserId,
        request: UpdateUserRequest,
        actor: Option<UserId>,
    ) -> StrataResult<UserResponse> {
        debug!("Updating user: {}", id);
        self.serializer(actor).update(id, request).await
    }

    async fn set_password(
        &self,
        id: UserId,
        request: SetPasswordRequest,
        actor: Option<UserId>,
    ) -> StrataResult<()> {
        request.validate_request()?;
        let password_hash = self.hasher.hash(&request.password)?;

        self.writer(actor)
            .update_with(id, move |user| {
                user.set_password_hash(password_hash);
                Ok(())
            })
            .await?;

        info!("Password changed for user: {}", id);
        Ok(())
    }

    async fn delete_user(&self, id: UserId, actor: Option<UserId>) -> StrataResult<()> {
        self.writer(actor).soft_delete_by_id(id).await?;
        info!("User deleted: {}", id);
        Ok(())
    }

    async fn record_login(&self, id: UserId, ip: Option<String>) -> StrataResult<User> {
        self.writer(Some(id))
            .update_with(id, move |user| {
                user.record_login(ip.as_deref());
                Ok(())
            })
            .await
    }
}

impl std::fmt::Debug for UserWriteServiceComponent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserWriteServiceComponent").finish_non_exhaustive()
    }
}
