//! Authentication service - registration, login and per-request identity.
//!
//! DDD: Uses domain Password value object for hashing.
//! DDD: Uses Unit of Work for repository access.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

use super::bootstrap::{self, AdminSlot};
use super::token_service::{IssuedToken, TokenService};
use crate::config::MIN_PASSWORD_LENGTH;
use crate::domain::{
    normalize_email, Credential, Identity, NewUser, Password, User, UserChanges, UserResponse,
    UserRole,
};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::infra::{AdminCreateOutcome, CreateOutcome, UnitOfWork, UpdateOutcome};

/// Verified against when the email is unknown, so both login failures cost the same.
static DUMMY_PASSWORD: Lazy<Option<Password>> =
    Lazy::new(|| Password::new("quill-login-timing-placeholder").ok());

/// Fields accepted at registration, already validated by the handler.
#[derive(Debug, Clone)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// User plus the token that logs them in
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AuthSession {
    pub user: UserResponse,
    pub token: IssuedToken,
}

/// Authentication service trait for dependency injection.
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Register a regular user and log them in
    async fn register(&self, input: Registration) -> AppResult<AuthSession>;

    /// Exchange email and password for a session
    async fn login(&self, email: String, password: String) -> AppResult<AuthSession>;

    /// Run the admin bootstrap gate for `caller` against the current admin count
    async fn evaluate_admin_bootstrap(&self, caller: Option<&Identity>) -> AppResult<AdminSlot>;

    /// Create an admin in the slot granted by `evaluate_admin_bootstrap`
    async fn register_admin(&self, slot: AdminSlot, input: Registration)
        -> AppResult<AuthSession>;

    /// Strict resolution: any failure is `Unauthenticated`, store errors propagate
    async fn authenticate(&self, token: Option<&str>) -> AppResult<Identity>;

    /// Optional resolution: never fails
    async fn try_authenticate(&self, token: Option<&str>) -> Option<Identity>;

    /// Load the caller's own record
    async fn current_user(&self, identity: &Identity) -> AppResult<User>;

    /// Change the caller's name and/or email
    async fn update_profile(
        &self,
        identity: &Identity,
        name: Option<String>,
        email: Option<String>,
    ) -> AppResult<User>;

    /// Replace the caller's password after checking the current one
    async fn change_password(
        &self,
        identity: &Identity,
        current_password: String,
        new_password: String,
    ) -> AppResult<()>;
}

/// Concrete implementation of AuthService using Unit of Work.
pub struct Authenticator<U: UnitOfWork> {
    uow: Arc<U>,
    tokens: Arc<TokenService>,
}

impl<U: UnitOfWork> Authenticator<U> {
    /// Create new auth service instance with Unit of Work
    pub fn new(uow: Arc<U>, tokens: Arc<TokenService>) -> Self {
        Self { uow, tokens }
    }

    fn session(&self, user: User) -> AppResult<AuthSession> {
        let token = self.tokens.issue(&Identity::from(&user))?;
        Ok(AuthSession {
            user: UserResponse::from(user),
            token,
        })
    }

    async fn new_user(input: Registration, role: UserRole) -> AppResult<NewUser> {
        let password = Password::hash_blocking(input.password).await?;
        Ok(NewUser {
            name: input.name.trim().to_string(),
            email: normalize_email(&input.email),
            password,
            role,
        })
    }

    async fn ensure_email_free(&self, email: &str) -> AppResult<()> {
        if self.uow.users().find_by_email(email).await?.is_some() {
            return Err(AppError::conflict("Email"));
        }
        Ok(())
    }
}

async fn burn_dummy_verify(password: String) {
    let _ = tokio::task::spawn_blocking(move || {
        if let Some(dummy) = DUMMY_PASSWORD.as_ref() {
            let _ = dummy.verify(&password);
        }
    })
    .await;
}

#[async_trait]
impl<U: UnitOfWork> AuthService for Authenticator<U> {
    async fn register(&self, input: Registration) -> AppResult<AuthSession> {
        self.ensure_email_free(&normalize_email(&input.email)).await?;

        let new_user = Self::new_user(input, UserRole::User).await?;
        match self.uow.users().create(new_user).await? {
            CreateOutcome::Created(user) => {
                tracing::info!(user_id = %user.id, "User registered");
                self.session(user)
            }
            CreateOutcome::DuplicateKey => Err(AppError::conflict("Email")),
        }
    }

    async fn login(&self, email: String, password: String) -> AppResult<AuthSession> {
        let email = normalize_email(&email);

        let Some(Credential { user, password: stored }) =
            self.uow.users().find_credential_by_email(&email).await?
        else {
            burn_dummy_verify(password).await;
            tracing::debug!("Login rejected: unknown email");
            return Err(AppError::Unauthenticated);
        };

        if !stored.verify_blocking(password).await? {
            tracing::debug!(user_id = %user.id, "Login rejected: wrong password");
            return Err(AppError::Unauthenticated);
        }

        tracing::info!(user_id = %user.id, "User logged in");
        self.session(user)
    }

    async fn evaluate_admin_bootstrap(&self, caller: Option<&Identity>) -> AppResult<AdminSlot> {
        let admins = self.uow.users().count_by_role(UserRole::Admin).await?;
        bootstrap::evaluate(caller, admins).inspect_err(|_| {
            tracing::warn!(
                admins,
                caller = ?caller.map(|c| c.id),
                "Admin registration denied"
            );
        })
    }

    async fn register_admin(
        &self,
        slot: AdminSlot,
        input: Registration,
    ) -> AppResult<AuthSession> {
        self.ensure_email_free(&normalize_email(&input.email)).await?;

        let new_user = Self::new_user(input, UserRole::Admin).await?;
        match self
            .uow
            .users()
            .create_admin_if_count(new_user, slot.observed_admins())
            .await?
        {
            AdminCreateOutcome::Created(user) => {
                tracing::info!(user_id = %user.id, "Admin account created");
                self.session(user)
            }
            AdminCreateOutcome::DuplicateKey => Err(AppError::conflict("Email")),
            AdminCreateOutcome::AdminCountChanged => {
                tracing::warn!(
                    observed = slot.observed_admins(),
                    "Admin registration lost a race with another admin creation"
                );
                Err(AppError::Forbidden)
            }
        }
    }

    async fn authenticate(&self, token: Option<&str>) -> AppResult<Identity> {
        let token = token.ok_or(AppError::Unauthenticated)?;

        let claimed = self.tokens.verify(token).map_err(|e| {
            tracing::debug!(reason = %e, "Token rejected");
            AppError::from(e)
        })?;

        let Some(user) = self.uow.users().find_by_id(claimed.id).await? else {
            tracing::debug!(user_id = %claimed.id, "Token subject no longer exists");
            return Err(AppError::Unauthenticated);
        };

        Ok(Identity::from(&user))
    }

    async fn try_authenticate(&self, token: Option<&str>) -> Option<Identity> {
        let token = token?;
        match self.authenticate(Some(token)).await {
            Ok(identity) => Some(identity),
            Err(AppError::Unauthenticated) => None,
            Err(e) => {
                tracing::warn!(error = %e, "Optional authentication skipped after store failure");
                None
            }
        }
    }

    async fn current_user(&self, identity: &Identity) -> AppResult<User> {
        self.uow.users().find_by_id(identity.id).await?.ok_or_not_found()
    }

    async fn update_profile(
        &self,
        identity: &Identity,
        name: Option<String>,
        email: Option<String>,
    ) -> AppResult<User> {
        let changes = UserChanges {
            name: name
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty()),
            email: email.map(|e| normalize_email(&e)).filter(|e| !e.is_empty()),
            role: None,
        };

        if changes.is_empty() {
            return Err(AppError::bad_request("Nothing to update"));
        }

        if let Some(email) = &changes.email {
            if let Some(existing) = self.uow.users().find_by_email(email).await? {
                if existing.id != identity.id {
                    return Err(AppError::conflict("Email"));
                }
            }
        }

        match self.uow.users().update(identity.id, changes).await? {
            UpdateOutcome::Updated(user) => Ok(user),
            UpdateOutcome::NotFound => Err(AppError::NotFound),
            UpdateOutcome::DuplicateKey => Err(AppError::conflict("Email")),
        }
    }

    async fn change_password(
        &self,
        identity: &Identity,
        current_password: String,
        new_password: String,
    ) -> AppResult<()> {
        if current_password.is_empty() || new_password.is_empty() {
            return Err(AppError::bad_request(
                "currentPassword and newPassword are required",
            ));
        }
        if (new_password.chars().count() as u64) < MIN_PASSWORD_LENGTH {
            return Err(AppError::validation(format!(
                "newPassword must be at least {} characters",
                MIN_PASSWORD_LENGTH
            )));
        }

        let credential = self
            .uow
            .users()
            .find_credential_by_id(identity.id)
            .await?
            .ok_or_not_found()?;

        if !credential.password.verify_blocking(current_password).await? {
            return Err(AppError::bad_request("Current password is incorrect"));
        }

        let replacement = Password::hash_blocking(new_password).await?;
        if !self.uow.users().set_password(identity.id, replacement).await? {
            return Err(AppError::NotFound);
        }

        tracing::info!(user_id = %identity.id, "Password changed");
        Ok(())
    }
}
