//! Service Container - Centralized service access.
//!
//! Builds every service once over a shared Unit of Work and token service.

use std::sync::Arc;

use super::{
    AuthService, Authenticator, CommentManager, CommentService, PostManager, PostService,
    TokenService, UserManager, UserService,
};
use crate::config::Config;
use crate::infra::{Persistence, UnitOfWork};

/// Service container trait for dependency injection.
pub trait ServiceContainer: Send + Sync {
    /// Get authentication service
    fn auth(&self) -> Arc<dyn AuthService>;

    /// Get user administration service
    fn users(&self) -> Arc<dyn UserService>;

    /// Get post service
    fn posts(&self) -> Arc<dyn PostService>;

    /// Get comment service
    fn comments(&self) -> Arc<dyn CommentService>;
}

/// Concrete implementation of ServiceContainer
#[derive(Clone)]
pub struct Services {
    auth_service: Arc<dyn AuthService>,
    user_service: Arc<dyn UserService>,
    post_service: Arc<dyn PostService>,
    comment_service: Arc<dyn CommentService>,
}

impl Services {
    /// Create service container over any Unit of Work
    pub fn from_unit_of_work<U: UnitOfWork>(uow: Arc<U>, config: &Config) -> Self {
        let tokens = Arc::new(TokenService::new(config));

        Self {
            auth_service: Arc::new(Authenticator::new(uow.clone(), tokens)),
            user_service: Arc::new(UserManager::new(uow.clone())),
            post_service: Arc::new(PostManager::new(uow.clone())),
            comment_service: Arc::new(CommentManager::new(uow)),
        }
    }

    /// Create service container from database connection and config
    pub fn from_connection(db: sea_orm::DatabaseConnection, config: &Config) -> Self {
        Self::from_unit_of_work(Arc::new(Persistence::new(db)), config)
    }
}

impl ServiceContainer for Services {
    fn auth(&self) -> Arc<dyn AuthService> {
        self.auth_service.clone()
    }

    fn users(&self) -> Arc<dyn UserService> {
        self.user_service.clone()
    }

    fn posts(&self) -> Arc<dyn PostService> {
        self.post_service.clone()
    }

    fn comments(&self) -> Arc<dyn CommentService> {
        self.comment_service.clone()
    }
}
