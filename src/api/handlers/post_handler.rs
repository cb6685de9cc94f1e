//! Post handlers.

use axum::{
    extract::{Path, Query, State},
    response::Json,
    routing::get,
    Router,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use super::rules;
use crate::api::extractors::ValidatedJson;
use crate::api::middleware::CurrentUser;
use crate::api::AppState;
use crate::domain::{Post, PostChanges};
use crate::errors::AppResult;
use crate::types::{ApiResponse, Created, Paginated, PaginationParams};

/// Listing filter
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PostFilter {
    /// Only posts by this author
    pub author: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreatePostRequest {
    #[validate(custom(function = "rules::post_title"))]
    #[schema(example = "Hello, world", min_length = 2, max_length = 200)]
    pub title: String,
    #[validate(length(min = 1, message = "Content is required"))]
    #[schema(example = "My first post.")]
    pub content: String,
}

/// Partial post edit
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdatePostRequest {
    #[validate(custom(function = "rules::post_title"))]
    pub title: Option<String>,
    pub content: Option<String>,
}

/// Create post routes
pub fn post_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_posts).post(create_post))
        .route("/me/mine", get(list_my_posts))
        .route("/:id", get(get_post).put(update_post).delete(delete_post))
}

/// List posts, newest first
#[utoipa::path(
    get,
    path = "/api/posts",
    tag = "Posts",
    params(PaginationParams, PostFilter),
    responses((status = 200, description = "Page of posts"))
)]
pub async fn list_posts(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
    Query(filter): Query<PostFilter>,
) -> AppResult<Json<Paginated<Post>>> {
    let page = state.post_service.list_posts(filter.author, params).await?;
    Ok(Json(page))
}

/// List the caller's own posts
#[utoipa::path(
    get,
    path = "/api/posts/me/mine",
    tag = "Posts",
    params(PaginationParams),
    responses(
        (status = 200, description = "Page of the caller's posts"),
        (status = 401, description = "Not authenticated")
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_my_posts(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<Paginated<Post>>> {
    let page = state.post_service.list_my_posts(&identity, params).await?;
    Ok(Json(page))
}

/// Get a single post
#[utoipa::path(
    get,
    path = "/api/posts/{id}",
    tag = "Posts",
    params(("id" = Uuid, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Post found", body = Post),
        (status = 404, description = "Post not found")
    )
)]
pub async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Post>>> {
    let post = state.post_service.get_post(id).await?;
    Ok(Json(ApiResponse::success(post)))
}

/// Create a post as the caller
#[utoipa::path(
    post,
    path = "/api/posts",
    tag = "Posts",
    request_body = CreatePostRequest,
    responses(
        (status = 201, description = "Post created", body = Post),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Not authenticated")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_post(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    ValidatedJson(payload): ValidatedJson<CreatePostRequest>,
) -> AppResult<Created<Post>> {
    let post = state
        .post_service
        .create_post(&identity, payload.title, payload.content)
        .await?;
    Ok(Created(post))
}

/// Edit a post (author or admin)
#[utoipa::path(
    put,
    path = "/api/posts/{id}",
    tag = "Posts",
    params(("id" = Uuid, Path, description = "Post ID")),
    request_body = UpdatePostRequest,
    responses(
        (status = 200, description = "Post updated", body = Post),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not the author"),
        (status = 404, description = "Post not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_post(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdatePostRequest>,
) -> AppResult<Json<ApiResponse<Post>>> {
    let changes = PostChanges {
        title: payload.title,
        content: payload.content,
    };
    let post = state.post_service.update_post(&identity, id, changes).await?;
    Ok(Json(ApiResponse::success(post)))
}

/// Delete a post (author or admin)
#[utoipa::path(
    delete,
    path = "/api/posts/{id}",
    tag = "Posts",
    params(("id" = Uuid, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Post deleted"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not the author"),
        (status = 404, description = "Post not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_post(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<()>>> {
    state.post_service.delete_post(&identity, id).await?;
    Ok(Json(ApiResponse::message("Post deleted")))
}
