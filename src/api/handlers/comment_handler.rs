//! Comment handlers.

use axum::{
    extract::{Path, Query, State},
    response::Json,
    routing::{delete, get},
    Router,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::api::extractors::ValidatedJson;
use crate::api::middleware::CurrentUser;
use crate::api::AppState;
use crate::config::MAX_COMMENT_LENGTH;
use crate::domain::Comment;
use crate::errors::AppResult;
use crate::types::{ApiResponse, Created, Paginated, PaginationParams};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateCommentRequest {
    #[validate(length(
        min = 1,
        max = MAX_COMMENT_LENGTH,
        message = "Content must be between 1 and 2000 characters"
    ))]
    #[schema(example = "Great post!", min_length = 1, max_length = 2000)]
    pub content: String,
}

/// Create comment routes (mounted at `/api`).
///
/// The post segment is named `:id` to match the post routes it sits beside.
pub fn comment_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/posts/:id/comments",
            get(list_comments).post(add_comment),
        )
        .route("/comments/:comment_id", delete(delete_comment))
}

/// List comments on a post
#[utoipa::path(
    get,
    path = "/api/posts/{id}/comments",
    tag = "Comments",
    params(("id" = Uuid, Path, description = "Post ID"), PaginationParams),
    responses((status = 200, description = "Page of comments"))
)]
pub async fn list_comments(
    State(state): State<AppState>,
    Path(post_id): Path<Uuid>,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<Paginated<Comment>>> {
    let page = state.comment_service.list_comments(post_id, params).await?;
    Ok(Json(page))
}

/// Comment on a post as the caller
#[utoipa::path(
    post,
    path = "/api/posts/{id}/comments",
    tag = "Comments",
    params(("id" = Uuid, Path, description = "Post ID")),
    request_body = CreateCommentRequest,
    responses(
        (status = 201, description = "Comment created", body = Comment),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Post not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn add_comment(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    Path(post_id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<CreateCommentRequest>,
) -> AppResult<Created<Comment>> {
    let comment = state
        .comment_service
        .add_comment(&identity, post_id, payload.content)
        .await?;
    Ok(Created(comment))
}

/// Delete a comment (author or admin)
#[utoipa::path(
    delete,
    path = "/api/comments/{comment_id}",
    tag = "Comments",
    params(("comment_id" = Uuid, Path, description = "Comment ID")),
    responses(
        (status = 200, description = "Comment deleted"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not the author"),
        (status = 404, description = "Comment not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_comment(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    Path(comment_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<()>>> {
    state
        .comment_service
        .delete_comment(&identity, comment_id)
        .await?;
    Ok(Json(ApiResponse::message("Comment deleted")))
}
