//! Comment repository implementation.

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

use super::entities::comment::{self, ActiveModel, Entity as CommentEntity};
use crate::domain::{Comment, NewComment};
use crate::errors::AppResult;
use crate::types::PaginationParams;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Comment repository trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait CommentRepository: Send + Sync {
    async fn create(&self, new_comment: NewComment) -> AppResult<Comment>;

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Comment>>;

    /// Comments of one post, newest first
    async fn list_for_post(
        &self,
        post_id: Uuid,
        params: PaginationParams,
    ) -> AppResult<(Vec<Comment>, u64)>;

    async fn delete(&self, id: Uuid) -> AppResult<bool>;
}

/// SeaORM-backed CommentRepository
pub struct CommentStore {
    db: DatabaseConnection,
}

impl CommentStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CommentRepository for CommentStore {
    async fn create(&self, new_comment: NewComment) -> AppResult<Comment> {
        let now = chrono::Utc::now();
        let active_model = ActiveModel {
            id: Set(Uuid::new_v4()),
            post_id: Set(new_comment.post_id),
            author_id: Set(new_comment.author_id),
            content: Set(new_comment.content),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let model = active_model.insert(&self.db).await?;
        Ok(Comment::from(model))
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Comment>> {
        let result = CommentEntity::find_by_id(id).one(&self.db).await?;
        Ok(result.map(Comment::from))
    }

    async fn list_for_post(
        &self,
        post_id: Uuid,
        params: PaginationParams,
    ) -> AppResult<(Vec<Comment>, u64)> {
        let paginator = CommentEntity::find()
            .filter(comment::Column::PostId.eq(post_id))
            .order_by_desc(comment::Column::CreatedAt)
            .paginate(&self.db, params.limit());
        let total = paginator.num_items().await?;
        let models = paginator.fetch_page(params.page() - 1).await?;
        Ok((models.into_iter().map(Comment::from).collect(), total))
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let result = CommentEntity::delete_by_id(id).exec(&self.db).await?;
        Ok(result.rows_affected > 0)
    }
}
