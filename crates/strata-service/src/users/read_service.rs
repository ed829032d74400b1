//! User read service.

use crate::base::ReadService;
use crate::dto::{UserListResponse, UserResponse};
use async_trait::async_trait;
use shaku::Component;
use std::sync::Arc;
use strata_core::{
    normalize_email, Interface, PageRequest, Query, StrataResult, User, UserId,
};
use strata_repository::DatabasePoolInterface;
use tracing::debug;
use uuid::Uuid;

/// Read access to users.
#[async_trait]
pub trait UserReadService: Interface + Send + Sync {
    /// The generic read operations for users.
    fn reader(&self) -> ReadService<User>;

    /// One user by id, soft-deleted or not; `NotFound` when absent.
    async fn get_user(&self, id: UserId) -> StrataResult<UserResponse>;

    async fn get_by_username(&self, username: Uuid) -> StrataResult<Option<User>>;

    /// The live user with this email, compared case-insensitively.
    async fn get_by_email(&self, email: &str) -> StrataResult<Option<User>>;

    async fn get_all_users(
        &self,
        page: PageRequest,
        include_deleted: bool,
    ) -> StrataResult<UserListResponse>;
}

/// [`UserReadService`] over the SQLite DAO.
#[derive(Component)]
#[shaku(interface = UserReadService)]
pub struct UserReadServiceComponent {
    #[shaku(inject)]
    pool: Arc<dyn DatabasePoolInterface>,
}

impl UserReadServiceComponent {
    #[must_use]
    pub fn new(pool: Arc<dyn DatabasePoolInterface>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserReadService for UserReadServiceComponent {
    fn reader(&self) -> ReadService<User> {
        ReadService::sqlite(Arc::clone(&self.pool))
    }

    async fn get_user(&self, id: UserId) -> StrataResult<UserResponse> {
        debug!("Getting user: {}", id);
        let user = self.reader().require(id).await?;
        Ok(UserResponse::from(user))
    }

    async fn get_by_username(&self, username: Uuid) -> StrataResult<Option<User>> {
        debug!("Getting user by username: {}", username);
        self.reader()
            .find_one(&Query::new().filter("username", username))
            .await
    }

    async fn get_by_email(&self, email: &str) -> StrataResult<Option<User>> {
        debug!("Getting user by email: {}", email);
        self.reader()
            .find_one(&Query::new().filter("email__iexact", normalize_email(email)))
            .await
    }

    async fn get_all_users(
        &self,
        page: PageRequest,
        include_deleted: bool,
    ) -> StrataResult<UserListResponse> {
        let query = Query::new()
            .include_deleted(include_deleted)
            .order_by("created_at")
            .order_by("email");
        let users = self.reader().find_page(&query, page).await?;
        Ok(UserListResponse::from(users.map(UserResponse::from)))
    }
}

impl std::fmt::Debug for UserReadServiceComponent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserReadServiceComponent").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::WriteService;
    use crate::test_support::memory_pool;

    async fn setup() -> (UserReadServiceComponent, Vec<User>) {
        let pool = memory_pool().await;
        let users = WriteService::<User>::sqlite(pool.clone())
            .create_batch(
                vec![
                    User::new("ada@example.com", "h".to_string()).with_name("Ada", "Lovelace"),
                    User::new("alan@example.com", "h".to_string()),
                    User::new("grace@example.com", "h".to_string()),
                ],
                0,
            )
            .await
            .unwrap();
        (UserReadServiceComponent::new(pool), users)
    }

    #[tokio::test]
    async fn test_get_user() {
        let (service, users) = setup().await;

        let found = service.get_user(users[0].id).await.unwrap();
        assert_eq!(found.name, "Ada Lovelace");

        let err = service.get_user(UserId::new()).await.unwrap_err();
        assert_eq!(err.status_code(), 404);
    }

    #[tokio::test]
    async fn test_get_by_username_and_email() {
        let (service, users) = setup().await;

        let by_username = service.get_by_username(users[1].username).await.unwrap();
        assert_eq!(by_username.unwrap().id, users[1].id);

        let by_email = service.get_by_email(" ALAN@example.com").await.unwrap();
        assert_eq!(by_email.unwrap().id, users[1].id);

        assert!(service.get_by_email("nobody@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_get_all_users_hides_deleted() {
        let (service, users) = setup().await;
        WriteService::<User>::sqlite(Arc::clone(&service.pool))
            .soft_delete(users[2].clone())
            .await
            .unwrap();

        let live = service.get_all_users(PageRequest::new(0, 10), false).await.unwrap();
        assert_eq!(live.total_elements, 2);
        assert!(live.users.iter().all(|u| !u.deleted));

        let all = service.get_all_users(PageRequest::new(0, 2), true).await.unwrap();
        assert_eq!(all.total_elements, 3);
        assert_eq!(all.users.len(), 2);
        assert_eq!(all.total_pages, 2);

        assert!(service.get_by_email("grace@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_get_all_users_past_the_end() {
        let (service, _) = setup().await;

        let page = service
            .get_all_users(PageRequest::new(usize::MAX, 100), false)
            .await
            .unwrap();
        assert!(page.users.is_empty());
        assert_eq!(page.total_elements, 3);
    }
}
