//! User repository - the credential store.

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, SqlErr, Statement, TransactionTrait,
};
use uuid::Uuid;

use super::entities::user::{self, ActiveModel, Entity as UserEntity};
use crate::config::ADMIN_CREATION_LOCK_KEY;
use crate::domain::{Credential, NewUser, Password, User, UserChanges, UserRole};
use crate::errors::{AppError, AppResult};
use crate::types::PaginationParams;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Result of inserting a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome {
    Created(User),
    /// The email is already taken.
    DuplicateKey,
}

/// Result of the capped admin insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminCreateOutcome {
    Created(User),
    DuplicateKey,
    /// Another admin was created after the caller's count was observed.
    AdminCountChanged,
}

/// Result of a partial update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    Updated(User),
    NotFound,
    DuplicateKey,
}

/// User repository trait for dependency injection.
///
/// Emails are expected in normalized form (see `domain::normalize_email`).
/// Plain lookups never return the password hash; use the `find_credential_*`
/// variants when it is needed.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find user by ID
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>>;

    /// Find user by email address
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;

    /// Find user by ID, including the password hash
    async fn find_credential_by_id(&self, id: Uuid) -> AppResult<Option<Credential>>;

    /// Find user by email, including the password hash
    async fn find_credential_by_email(&self, email: &str) -> AppResult<Option<Credential>>;

    /// Insert a new user; a taken email is reported as `DuplicateKey`
    async fn create(&self, new_user: NewUser) -> AppResult<CreateOutcome>;

    /// Insert an admin only if the admin count still equals `expected_admins`
    async fn create_admin_if_count(
        &self,
        new_user: NewUser,
        expected_admins: u64,
    ) -> AppResult<AdminCreateOutcome>;

    /// Count users holding `role`
    async fn count_by_role(&self, role: UserRole) -> AppResult<u64>;

    /// Apply a partial update
    async fn update(&self, id: Uuid, changes: UserChanges) -> AppResult<UpdateOutcome>;

    /// Replace the password hash; false if the user is gone
    async fn set_password(&self, id: Uuid, password: Password) -> AppResult<bool>;

    /// Delete user by ID; false if nothing was deleted
    async fn delete(&self, id: Uuid) -> AppResult<bool>;

    /// List users, newest first
    async fn list(&self, params: PaginationParams) -> AppResult<(Vec<User>, u64)>;
}

/// SeaORM-backed UserRepository
pub struct UserStore {
    db: DatabaseConnection,
}

impl UserStore {
    /// Create new repository instance
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

fn active_model(new_user: NewUser) -> ActiveModel {
    let now = chrono::Utc::now();
    ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(new_user.name),
        email: Set(new_user.email),
        password_hash: Set(new_user.password.into_string()),
        role: Set(new_user.role.to_string()),
        created_at: Set(now),
        updated_at: Set(now),
    }
}

#[async_trait]
impl UserRepository for UserStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        let result = UserEntity::find_by_id(id).one(&self.db).await?;
        Ok(result.map(User::from))
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let result = UserEntity::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await?;
        Ok(result.map(User::from))
    }

    async fn find_credential_by_id(&self, id: Uuid) -> AppResult<Option<Credential>> {
        let result = UserEntity::find_by_id(id).one(&self.db).await?;
        Ok(result.map(Credential::from))
    }

    async fn find_credential_by_email(&self, email: &str) -> AppResult<Option<Credential>> {
        let result = UserEntity::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await?;
        Ok(result.map(Credential::from))
    }

    async fn create(&self, new_user: NewUser) -> AppResult<CreateOutcome> {
        match active_model(new_user).insert(&self.db).await {
            Ok(model) => Ok(CreateOutcome::Created(User::from(model))),
            Err(e) if is_unique_violation(&e) => Ok(CreateOutcome::DuplicateKey),
            Err(e) => Err(AppError::from(e)),
        }
    }

    async fn create_admin_if_count(
        &self,
        new_user: NewUser,
        expected_admins: u64,
    ) -> AppResult<AdminCreateOutcome> {
        let txn = self.db.begin().await?;

        // Serializes admin creation; released on commit or rollback.
        txn.execute(Statement::from_sql_and_values(
            txn.get_database_backend(),
            "SELECT pg_advisory_xact_lock($1)",
            [ADMIN_CREATION_LOCK_KEY.into()],
        ))
        .await?;

        let current = UserEntity::find()
            .filter(user::Column::Role.eq(UserRole::Admin.as_str()))
            .count(&txn)
            .await?;

        if current != expected_admins {
            txn.rollback().await?;
            return Ok(AdminCreateOutcome::AdminCountChanged);
        }

        match active_model(new_user).insert(&txn).await {
            Ok(model) => {
                txn.commit().await?;
                Ok(AdminCreateOutcome::Created(User::from(model)))
            }
            Err(e) if is_unique_violation(&e) => {
                txn.rollback().await?;
                Ok(AdminCreateOutcome::DuplicateKey)
            }
            Err(e) => Err(AppError::from(e)),
        }
    }

    async fn count_by_role(&self, role: UserRole) -> AppResult<u64> {
        let count = UserEntity::find()
            .filter(user::Column::Role.eq(role.as_str()))
            .count(&self.db)
            .await?;
        Ok(count)
    }

    async fn update(&self, id: Uuid, changes: UserChanges) -> AppResult<UpdateOutcome> {
        let Some(model) = UserEntity::find_by_id(id).one(&self.db).await? else {
            return Ok(UpdateOutcome::NotFound);
        };

        let mut active: ActiveModel = model.into();
        if let Some(name) = changes.name {
            active.name = Set(name);
        }
        if let Some(email) = changes.email {
            active.email = Set(email);
        }
        if let Some(role) = changes.role {
            active.role = Set(role.to_string());
        }
        active.updated_at = Set(chrono::Utc::now());

        match active.update(&self.db).await {
            Ok(model) => Ok(UpdateOutcome::Updated(User::from(model))),
            Err(e) if is_unique_violation(&e) => Ok(UpdateOutcome::DuplicateKey),
            Err(e) => Err(AppError::from(e)),
        }
    }

    async fn set_password(&self, id: Uuid, password: Password) -> AppResult<bool> {
        let Some(model) = UserEntity::find_by_id(id).one(&self.db).await? else {
            return Ok(false);
        };

        let mut active: ActiveModel = model.into();
        active.password_hash = Set(password.into_string());
        active.updated_at = Set(chrono::Utc::now());
        active.update(&self.db).await?;
        Ok(true)
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let result = UserEntity::delete_by_id(id).exec(&self.db).await?;
        Ok(result.rows_affected > 0)
    }

    async fn list(&self, params: PaginationParams) -> AppResult<(Vec<User>, u64)> {
        let paginator = UserEntity::find()
            .order_by_desc(user::Column::CreatedAt)
            .paginate(&self.db, params.limit());
        let total = paginator.num_items().await?;
        let models = paginator.fetch_page(params.page() - 1).await?;
        Ok((models.into_iter().map(User::from).collect(), total))
    }
}
