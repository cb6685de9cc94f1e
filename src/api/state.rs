//! Application state - Dependency injection container.
//!
//! Provides centralized access to all application services and infrastructure.

use std::sync::Arc;

use crate::config::Config;
use crate::infra::{Database, UnitOfWork};
use crate::services::{
    AuthService, CommentService, PostService, ServiceContainer, Services, UserService,
};

/// How the session cookie is written.
#[derive(Debug, Clone)]
pub struct CookieSettings {
    pub name: String,
    pub secure: bool,
}

impl CookieSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            name: config.auth_cookie_name.clone(),
            secure: config.auth_cookie_secure,
        }
    }
}

/// Application state containing all services (DI container).
#[derive(Clone)]
pub struct AppState {
    /// Authentication service
    pub auth_service: Arc<dyn AuthService>,
    /// User administration service
    pub user_service: Arc<dyn UserService>,
    /// Post service
    pub post_service: Arc<dyn PostService>,
    /// Comment service
    pub comment_service: Arc<dyn CommentService>,
    /// Session cookie settings
    pub cookies: CookieSettings,
    /// Database handle for health checks; absent when running over another store
    pub database: Option<Arc<Database>>,
}

impl AppState {
    /// Create application state from a connected database and config.
    pub fn from_config(database: Arc<Database>, config: &Config) -> Self {
        let container = Services::from_connection(database.get_connection(), config);
        Self::from_container(&container, config, Some(database))
    }

    /// Create application state over any Unit of Work (no database handle).
    pub fn with_unit_of_work<U: UnitOfWork>(uow: Arc<U>, config: &Config) -> Self {
        let container = Services::from_unit_of_work(uow, config);
        Self::from_container(&container, config, None)
    }

    fn from_container(
        container: &Services,
        config: &Config,
        database: Option<Arc<Database>>,
    ) -> Self {
        Self {
            auth_service: container.auth(),
            user_service: container.users(),
            post_service: container.posts(),
            comment_service: container.comments(),
            cookies: CookieSettings::from_config(config),
            database,
        }
    }
}
