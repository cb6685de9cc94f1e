//! Unit of Work - centralized repository access.
//!
//! Services depend on this trait rather than on concrete stores, so tests can
//! swap in in-memory or mocked repositories.

use sea_orm::DatabaseConnection;
use std::sync::Arc;

use super::repositories::{
    CommentRepository, CommentStore, PostRepository, PostStore, UserRepository, UserStore,
};

/// Unit of Work trait for dependency injection.
pub trait UnitOfWork: Send + Sync + 'static {
    /// Get user repository
    fn users(&self) -> Arc<dyn UserRepository>;

    /// Get post repository
    fn posts(&self) -> Arc<dyn PostRepository>;

    /// Get comment repository
    fn comments(&self) -> Arc<dyn CommentRepository>;
}

/// Concrete implementation of UnitOfWork over one connection pool
pub struct Persistence {
    user_repo: Arc<UserStore>,
    post_repo: Arc<PostStore>,
    comment_repo: Arc<CommentStore>,
}

impl Persistence {
    /// Create new UnitOfWork instance
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            user_repo: Arc::new(UserStore::new(db.clone())),
            post_repo: Arc::new(PostStore::new(db.clone())),
            comment_repo: Arc::new(CommentStore::new(db)),
        }
    }
}

impl UnitOfWork for Persistence {
    fn users(&self) -> Arc<dyn UserRepository> {
        self.user_repo.clone()
    }

    fn posts(&self) -> Arc<dyn PostRepository> {
        self.post_repo.clone()
    }

    fn comments(&self) -> Arc<dyn CommentRepository> {
        self.comment_repo.clone()
    }
}
