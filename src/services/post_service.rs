//! Post service - blog post use cases with ownership checks.

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::{ensure_owner_or_admin, Identity, NewPost, Post, PostChanges};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::infra::UnitOfWork;
use crate::types::{Paginated, PaginationParams};

/// Post service trait for dependency injection.
#[async_trait]
pub trait PostService: Send + Sync {
    /// Public listing, optionally filtered by author
    async fn list_posts(
        &self,
        author_id: Option<Uuid>,
        params: PaginationParams,
    ) -> AppResult<Paginated<Post>>;

    /// Posts written by the caller
    async fn list_my_posts(
        &self,
        identity: &Identity,
        params: PaginationParams,
    ) -> AppResult<Paginated<Post>>;

    async fn get_post(&self, id: Uuid) -> AppResult<Post>;

    /// Create a post authored by the caller
    async fn create_post(
        &self,
        identity: &Identity,
        title: String,
        content: String,
    ) -> AppResult<Post>;

    /// Edit a post; author or admin only
    async fn update_post(
        &self,
        identity: &Identity,
        id: Uuid,
        changes: PostChanges,
    ) -> AppResult<Post>;

    /// Delete a post; author or admin only
    async fn delete_post(&self, identity: &Identity, id: Uuid) -> AppResult<()>;
}

/// Concrete implementation of PostService using Unit of Work.
pub struct PostManager<U: UnitOfWork> {
    uow: Arc<U>,
}

impl<U: UnitOfWork> PostManager<U> {
    pub fn new(uow: Arc<U>) -> Self {
        Self { uow }
    }

    async fn owned_post(&self, identity: &Identity, id: Uuid) -> AppResult<Post> {
        let post = self.uow.posts().find_by_id(id).await?.ok_or_not_found()?;
        ensure_owner_or_admin(identity, &post)?;
        Ok(post)
    }
}

#[async_trait]
impl<U: UnitOfWork> PostService for PostManager<U> {
    async fn list_posts(
        &self,
        author_id: Option<Uuid>,
        params: PaginationParams,
    ) -> AppResult<Paginated<Post>> {
        let (posts, total) = self.uow.posts().list(author_id, params).await?;
        Ok(Paginated::new(posts, &params, total))
    }

    async fn list_my_posts(
        &self,
        identity: &Identity,
        params: PaginationParams,
    ) -> AppResult<Paginated<Post>> {
        self.list_posts(Some(identity.id), params).await
    }

    async fn get_post(&self, id: Uuid) -> AppResult<Post> {
        self.uow.posts().find_by_id(id).await?.ok_or_not_found()
    }

    async fn create_post(
        &self,
        identity: &Identity,
        title: String,
        content: String,
    ) -> AppResult<Post> {
        let post = self
            .uow
            .posts()
            .create(NewPost {
                title: title.trim().to_string(),
                content,
                author_id: identity.id,
            })
            .await?;

        tracing::info!(post_id = %post.id, author_id = %identity.id, "Post created");
        Ok(post)
    }

    async fn update_post(
        &self,
        identity: &Identity,
        id: Uuid,
        changes: PostChanges,
    ) -> AppResult<Post> {
        let post = self.owned_post(identity, id).await?;

        let changes = PostChanges {
            title: changes
                .title
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty()),
            content: changes.content.filter(|c| !c.is_empty()),
        };
        if changes.title.is_none() && changes.content.is_none() {
            return Ok(post);
        }

        self.uow
            .posts()
            .update(id, changes)
            .await?
            .ok_or(AppError::NotFound)
    }

    async fn delete_post(&self, identity: &Identity, id: Uuid) -> AppResult<()> {
        self.owned_post(identity, id).await?;

        if !self.uow.posts().delete(id).await? {
            return Err(AppError::NotFound);
        }
        tracing::info!(post_id = %id, by = %identity.id, "Post deleted");
        Ok(())
    }
}
