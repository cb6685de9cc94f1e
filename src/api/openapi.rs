//! OpenAPI documentation configuration.
//!
//! Provides Swagger UI for API exploration and testing.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::api::handlers::{auth_handler, comment_handler, post_handler, user_handler};
use crate::domain::{Comment, Post, UserResponse, UserRole};
use crate::services::{AuthSession, IssuedToken};
use crate::types::PaginationMeta;

/// OpenAPI documentation for the Quill blog API
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Quill API",
        version = "0.1.0",
        description = "Blog backend: accounts, posts and comments with role and ownership checks",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "http://localhost:5000", description = "Local development server")
    ),
    paths(
        // Authentication endpoints
        auth_handler::register,
        auth_handler::login,
        auth_handler::register_admin,
        auth_handler::me,
        auth_handler::update_me,
        auth_handler::change_password,
        auth_handler::logout,
        // User administration
        user_handler::list_users,
        user_handler::get_user,
        user_handler::update_user,
        user_handler::delete_user,
        // Posts
        post_handler::list_posts,
        post_handler::list_my_posts,
        post_handler::get_post,
        post_handler::create_post,
        post_handler::update_post,
        post_handler::delete_post,
        // Comments
        comment_handler::list_comments,
        comment_handler::add_comment,
        comment_handler::delete_comment,
    ),
    components(
        schemas(
            // Domain types
            UserRole,
            UserResponse,
            Post,
            Comment,
            PaginationMeta,
            // Auth types
            AuthSession,
            IssuedToken,
            auth_handler::RegisterRequest,
            auth_handler::RegisterAdminRequest,
            auth_handler::LoginRequest,
            auth_handler::UpdateProfileRequest,
            auth_handler::ChangePasswordRequest,
            auth_handler::ProfileResponse,
            // Handler request types
            user_handler::UpdateUserRequest,
            post_handler::CreatePostRequest,
            post_handler::UpdatePostRequest,
            comment_handler::CreateCommentRequest,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "Registration, login and the caller's own account"),
        (name = "Users", description = "Account administration (admin only)"),
        (name = "Posts", description = "Blog posts"),
        (name = "Comments", description = "Comments on posts")
    )
)]
pub struct ApiDoc;

/// Security scheme modifier for JWT Bearer authentication
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("JWT token obtained from /api/auth/login"))
                        .build(),
                ),
            );
        }
    }
}
