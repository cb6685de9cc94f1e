//! Comment service.

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::{ensure_owner_or_admin, Comment, Identity, NewComment};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::infra::UnitOfWork;
use crate::types::{Paginated, PaginationParams};

/// Comment service trait for dependency injection.
#[async_trait]
pub trait CommentService: Send + Sync {
    /// Comments on a post, newest first
    async fn list_comments(
        &self,
        post_id: Uuid,
        params: PaginationParams,
    ) -> AppResult<Paginated<Comment>>;

    /// Comment on an existing post as the caller
    async fn add_comment(
        &self,
        identity: &Identity,
        post_id: Uuid,
        content: String,
    ) -> AppResult<Comment>;

    /// Delete a comment; author or admin only
    async fn delete_comment(&self, identity: &Identity, comment_id: Uuid) -> AppResult<()>;
}

/// Concrete implementation of CommentService using Unit of Work.
pub struct CommentManager<U: UnitOfWork> {
    uow: Arc<U>,
}

impl<U: UnitOfWork> CommentManager<U> {
    pub fn new(uow: Arc<U>) -> Self {
        Self { uow }
    }
}

#[async_trait]
impl<U: UnitOfWork> CommentService for CommentManager<U> {
    async fn list_comments(
        &self,
        post_id: Uuid,
        params: PaginationParams,
    ) -> AppResult<Paginated<Comment>> {
        let (comments, total) = self.uow.comments().list_for_post(post_id, params).await?;
        Ok(Paginated::new(comments, &params, total))
    }

    async fn add_comment(
        &self,
        identity: &Identity,
        post_id: Uuid,
        content: String,
    ) -> AppResult<Comment> {
        let post = self.uow.posts().find_by_id(post_id).await?.ok_or_not_found()?;

        self.uow
            .comments()
            .create(NewComment {
                post_id: post.id,
                author_id: identity.id,
                content,
            })
            .await
    }

    async fn delete_comment(&self, identity: &Identity, comment_id: Uuid) -> AppResult<()> {
        let comment = self
            .uow
            .comments()
            .find_by_id(comment_id)
            .await?
            .ok_or_not_found()?;
        ensure_owner_or_admin(identity, &comment)?;

        if !self.uow.comments().delete(comment_id).await? {
            return Err(AppError::NotFound);
        }
        Ok(())
    }
}
