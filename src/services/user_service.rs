//! User service - account administration.
//!
//! DDD: Orchestrates domain operations via Unit of Work. Callers are
//! expected to have passed the admin role gate already.

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::{normalize_email, User, UserChanges};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::infra::{UnitOfWork, UpdateOutcome};
use crate::types::{Paginated, PaginationParams};

/// User service trait for dependency injection.
#[async_trait]
pub trait UserService: Send + Sync {
    /// Get user by ID
    async fn get_user(&self, id: Uuid) -> AppResult<User>;

    /// List users, newest first
    async fn list_users(&self, params: PaginationParams) -> AppResult<Paginated<User>>;

    /// Update name, email and/or role
    async fn update_user(&self, id: Uuid, changes: UserChanges) -> AppResult<User>;

    /// Delete user (their posts and comments cascade)
    async fn delete_user(&self, id: Uuid) -> AppResult<()>;
}

/// Concrete implementation of UserService using Unit of Work.
pub struct UserManager<U: UnitOfWork> {
    uow: Arc<U>,
}

impl<U: UnitOfWork> UserManager<U> {
    /// Create new user service instance with Unit of Work
    pub fn new(uow: Arc<U>) -> Self {
        Self { uow }
    }
}

#[async_trait]
impl<U: UnitOfWork> UserService for UserManager<U> {
    async fn get_user(&self, id: Uuid) -> AppResult<User> {
        self.uow.users().find_by_id(id).await?.ok_or_not_found()
    }

    async fn list_users(&self, params: PaginationParams) -> AppResult<Paginated<User>> {
        let (users, total) = self.uow.users().list(params).await?;
        Ok(Paginated::new(users, &params, total))
    }

    async fn update_user(&self, id: Uuid, mut changes: UserChanges) -> AppResult<User> {
        changes.name = changes
            .name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());
        changes.email = changes
            .email
            .map(|e| normalize_email(&e))
            .filter(|e| !e.is_empty());

        if changes.is_empty() {
            return self.get_user(id).await;
        }

        if let Some(email) = &changes.email {
            if let Some(existing) = self.uow.users().find_by_email(email).await? {
                if existing.id != id {
                    return Err(AppError::conflict("Email"));
                }
            }
        }

        match self.uow.users().update(id, changes).await? {
            UpdateOutcome::Updated(user) => {
                tracing::info!(user_id = %user.id, role = %user.role, "User updated by admin");
                Ok(user)
            }
            UpdateOutcome::NotFound => Err(AppError::NotFound),
            UpdateOutcome::DuplicateKey => Err(AppError::conflict("Email")),
        }
    }

    async fn delete_user(&self, id: Uuid) -> AppResult<()> {
        if !self.uow.users().delete(id).await? {
            return Err(AppError::NotFound);
        }
        tracing::info!(user_id = %id, "User deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::UserRole;
    use crate::infra::{
        CommentRepository, MockCommentRepository, MockPostRepository, MockUserRepository,
        PostRepository, UserRepository,
    };
    use chrono::Utc;

    struct MockUow {
        users: Arc<MockUserRepository>,
    }

    impl UnitOfWork for MockUow {
        fn users(&self) -> Arc<dyn UserRepository> {
            self.users.clone()
        }

        fn posts(&self) -> Arc<dyn PostRepository> {
            Arc::new(MockPostRepository::new())
        }

        fn comments(&self) -> Arc<dyn CommentRepository> {
            Arc::new(MockCommentRepository::new())
        }
    }

    fn service(users: MockUserRepository) -> UserManager<MockUow> {
        UserManager::new(Arc::new(MockUow {
            users: Arc::new(users),
        }))
    }

    fn sample_user(id: Uuid) -> User {
        let now = Utc::now();
        User {
            id,
            name: "Bob".to_string(),
            email: "bob@example.com".to_string(),
            role: UserRole::User,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_get_missing_user() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_id().returning(|_| Ok(None));

        let result = service(users).get_user(Uuid::new_v4()).await;
        assert!(matches!(result, Err(AppError::NotFound)));
    }

    #[tokio::test]
    async fn test_list_users_builds_meta() {
        let mut users = MockUserRepository::new();
        users
            .expect_list()
            .returning(|_| Ok((vec![sample_user(Uuid::new_v4())], 21)));

        let page = service(users)
            .list_users(PaginationParams::new(1, 10))
            .await
            .unwrap();
        assert_eq!(page.data.len(), 1);
        assert_eq!(page.meta.total, 21);
        assert_eq!(page.meta.pages, 3);
    }

    #[tokio::test]
    async fn test_promote_user() {
        let id = Uuid::new_v4();
        let mut users = MockUserRepository::new();
        users
            .expect_update()
            .withf(move |target, changes| *target == id && changes.role == Some(UserRole::Admin))
            .returning(|id, _| {
                let mut user = sample_user(id);
                user.role = UserRole::Admin;
                Ok(UpdateOutcome::Updated(user))
            });

        let changes = UserChanges {
            role: Some(UserRole::Admin),
            ..Default::default()
        };
        let user = service(users).update_user(id, changes).await.unwrap();
        assert_eq!(user.role, UserRole::Admin);
    }

    #[tokio::test]
    async fn test_update_email_taken() {
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_email()
            .withf(|email| email == "bob@example.com")
            .returning(|_| Ok(Some(sample_user(Uuid::new_v4()))));
        users.expect_update().never();

        let changes = UserChanges {
            email: Some(" BOB@example.com ".to_string()),
            ..Default::default()
        };
        let result = service(users).update_user(Uuid::new_v4(), changes).await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_delete_missing_user() {
        let mut users = MockUserRepository::new();
        users.expect_delete().returning(|_| Ok(false));

        let result = service(users).delete_user(Uuid::new_v4()).await;
        assert!(matches!(result, Err(AppError::NotFound)));
    }
}
