//! Post repository implementation.

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

use super::entities::post::{self, ActiveModel, Entity as PostEntity};
use crate::domain::{NewPost, Post, PostChanges};
use crate::errors::AppResult;
use crate::types::PaginationParams;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Post repository trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Insert a new post
    async fn create(&self, new_post: NewPost) -> AppResult<Post>;

    /// Find post by ID
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Post>>;

    /// List posts newest first, optionally restricted to one author
    async fn list(
        &self,
        author_id: Option<Uuid>,
        params: PaginationParams,
    ) -> AppResult<(Vec<Post>, u64)>;

    /// Edit title/content; `None` if the post is gone
    async fn update(&self, id: Uuid, changes: PostChanges) -> AppResult<Option<Post>>;

    /// Delete post by ID; false if nothing was deleted
    async fn delete(&self, id: Uuid) -> AppResult<bool>;
}

/// SeaORM-backed PostRepository
pub struct PostStore {
    db: DatabaseConnection,
}

impl PostStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl PostRepository for PostStore {
    async fn create(&self, new_post: NewPost) -> AppResult<Post> {
        let now = chrono::Utc::now();
        let active_model = ActiveModel {
            id: Set(Uuid::new_v4()),
            title: Set(new_post.title),
            content: Set(new_post.content),
            author_id: Set(new_post.author_id),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let model = active_model.insert(&self.db).await?;
        Ok(Post::from(model))
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Post>> {
        let result = PostEntity::find_by_id(id).one(&self.db).await?;
        Ok(result.map(Post::from))
    }

    async fn list(
        &self,
        author_id: Option<Uuid>,
        params: PaginationParams,
    ) -> AppResult<(Vec<Post>, u64)> {
        let mut query = PostEntity::find().order_by_desc(post::Column::CreatedAt);
        if let Some(author_id) = author_id {
            query = query.filter(post::Column::AuthorId.eq(author_id));
        }

        let paginator = query.paginate(&self.db, params.limit());
        let total = paginator.num_items().await?;
        let models = paginator.fetch_page(params.page() - 1).await?;
        Ok((models.into_iter().map(Post::from).collect(), total))
    }

    async fn update(&self, id: Uuid, changes: PostChanges) -> AppResult<Option<Post>> {
        let Some(model) = PostEntity::find_by_id(id).one(&self.db).await? else {
            return Ok(None);
        };

        let mut active: ActiveModel = model.into();
        if let Some(title) = changes.title {
            active.title = Set(title);
        }
        if let Some(content) = changes.content {
            active.content = Set(content);
        }
        active.updated_at = Set(chrono::Utc::now());

        let model = active.update(&self.db).await?;
        Ok(Some(Post::from(model)))
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let result = PostEntity::delete_by_id(id).exec(&self.db).await?;
        Ok(result.rows_affected > 0)
    }
}
