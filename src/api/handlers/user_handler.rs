//! User administration handlers (admin only).

use axum::{
    extract::{Path, Query, State},
    response::Json,
    routing::get,
    Router,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::rules;
use crate::api::extractors::ValidatedJson;
use crate::api::middleware::AdminUser;
use crate::api::AppState;
use crate::domain::{UserChanges, UserResponse, UserRole};
use crate::errors::AppResult;
use crate::types::{ApiResponse, Paginated, PaginationParams};

/// Admin update of a user record
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateUserRequest {
    #[validate(custom(function = "rules::display_name"))]
    #[schema(example = "Bob")]
    pub name: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "bob@example.com")]
    pub email: Option<String>,
    pub role: Option<UserRole>,
}

/// Create user routes
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users))
        .route("/:id", get(get_user).put(update_user).delete(delete_user))
}

/// List all users
#[utoipa::path(
    get,
    path = "/api/users",
    tag = "Users",
    params(PaginationParams),
    responses(
        (status = 200, description = "Page of users"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Admin role required")
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_users(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<Paginated<UserResponse>>> {
    let page = state.user_service.list_users(params).await?;
    Ok(Json(page.map(UserResponse::from)))
}

/// Get user by ID
#[utoipa::path(
    get,
    path = "/api/users/{id}",
    tag = "Users",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "User found", body = UserResponse),
        (status = 403, description = "Admin role required"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_user(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<UserResponse>>> {
    let user = state.user_service.get_user(id).await?;
    Ok(Json(ApiResponse::success(UserResponse::from(user))))
}

/// Update user name, email or role
#[utoipa::path(
    put,
    path = "/api/users/{id}",
    tag = "Users",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = UserResponse),
        (status = 403, description = "Admin role required"),
        (status = 404, description = "User not found"),
        (status = 409, description = "Email already in use")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_user(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateUserRequest>,
) -> AppResult<Json<ApiResponse<UserResponse>>> {
    let changes = UserChanges {
        name: payload.name,
        email: payload.email,
        role: payload.role,
    };
    let user = state.user_service.update_user(id, changes).await?;
    Ok(Json(ApiResponse::success(UserResponse::from(user))))
}

/// Delete user (posts and comments cascade)
#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    tag = "Users",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "User deleted"),
        (status = 403, description = "Admin role required"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_user(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<()>>> {
    state.user_service.delete_user(id).await?;
    Ok(Json(ApiResponse::message("User deleted")))
}
