//! Authentication handlers.

use axum::{
    extract::{rejection::JsonRejection, State},
    response::Json,
    routing::{get, post, put},
    Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use super::rules;
use crate::api::extractors::{into_app_error, ValidatedJson};
use crate::api::middleware::{CurrentUser, MaybeUser};
use crate::api::state::CookieSettings;
use crate::api::AppState;
use crate::config::{MIN_ADMIN_PASSWORD_LENGTH, MIN_PASSWORD_LENGTH};
use crate::domain::UserResponse;
use crate::errors::{AppError, AppResult};
use crate::services::{AuthSession, Registration};
use crate::types::{ApiResponse, Created};

/// User registration request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    /// User display name
    #[validate(custom(function = "rules::display_name"))]
    #[schema(example = "Alice", min_length = 2, max_length = 120)]
    pub name: String,
    /// User email address
    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "alice@example.com")]
    pub email: String,
    /// User password (minimum 6 characters)
    #[validate(length(min = MIN_PASSWORD_LENGTH, message = "Password must be at least 6 characters"))]
    #[schema(example = "secret123", min_length = 6)]
    pub password: String,
}

/// Admin registration request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterAdminRequest {
    #[validate(custom(function = "rules::display_name"))]
    #[schema(example = "Root")]
    pub name: String,
    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "root@example.com")]
    pub email: String,
    /// Admin password (minimum 8 characters)
    #[validate(length(min = MIN_ADMIN_PASSWORD_LENGTH, message = "Password must be at least 8 characters"))]
    #[schema(example = "SecurePass123!", min_length = 8)]
    pub password: String,
}

/// User login request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    /// User email address
    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "alice@example.com")]
    pub email: String,
    /// User password
    #[validate(length(min = MIN_PASSWORD_LENGTH, message = "Password must be at least 6 characters"))]
    #[schema(example = "secret123")]
    pub password: String,
}

/// Profile update; at least one field must be present
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateProfileRequest {
    #[validate(custom(function = "rules::display_name"))]
    pub name: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
}

/// Password change request
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// Wrapper for user-only responses
#[derive(Debug, Serialize, ToSchema)]
pub struct ProfileResponse {
    pub user: UserResponse,
}

/// Create authentication routes
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/register-admin", post(register_admin))
        .route("/me", get(me).put(update_me))
        .route("/me/password", put(change_password))
        .route("/logout", post(logout))
}

fn session_cookie(settings: &CookieSettings, token: &str) -> Cookie<'static> {
    Cookie::build((settings.name.clone(), token.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(settings.secure)
        .build()
}

/// Register a new user
#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "Authentication",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered and logged in", body = AuthSession),
        (status = 400, description = "Validation error"),
        (status = 409, description = "Email already in use")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    ValidatedJson(payload): ValidatedJson<RegisterRequest>,
) -> AppResult<(CookieJar, Created<AuthSession>)> {
    let session = state
        .auth_service
        .register(Registration {
            name: payload.name,
            email: payload.email,
            password: payload.password,
        })
        .await?;

    let jar = jar.add(session_cookie(&state.cookies, &session.token.access_token));
    Ok((jar, Created(session)))
}

/// Login and get a session token
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Authentication",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthSession),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    ValidatedJson(payload): ValidatedJson<LoginRequest>,
) -> AppResult<(CookieJar, Json<ApiResponse<AuthSession>>)> {
    let session = state
        .auth_service
        .login(payload.email, payload.password)
        .await?;

    let jar = jar.add(session_cookie(&state.cookies, &session.token.access_token));
    Ok((jar, Json(ApiResponse::success(session))))
}

/// Register an admin account.
///
/// The bootstrap gate runs before the body is looked at, so a caller who may
/// not create admins gets 403 even for an invalid body.
#[utoipa::path(
    post,
    path = "/api/auth/register-admin",
    tag = "Authentication",
    request_body = RegisterAdminRequest,
    responses(
        (status = 201, description = "Admin created", body = AuthSession),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Caller may not create admins, or the cap is reached"),
        (status = 409, description = "Email already in use")
    ),
    security((), ("bearer_auth" = []))
)]
pub async fn register_admin(
    State(state): State<AppState>,
    MaybeUser(caller): MaybeUser,
    payload: Result<Json<RegisterAdminRequest>, JsonRejection>,
) -> AppResult<Created<AuthSession>> {
    let slot = state
        .auth_service
        .evaluate_admin_bootstrap(caller.as_ref())
        .await?;

    let Json(payload) = payload.map_err(|e| AppError::validation(e.body_text()))?;
    payload.validate().map_err(into_app_error)?;

    let session = state
        .auth_service
        .register_admin(
            slot,
            Registration {
                name: payload.name,
                email: payload.email,
                password: payload.password,
            },
        )
        .await?;

    Ok(Created(session))
}

/// Get the current user's profile
#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "Authentication",
    responses(
        (status = 200, description = "Current user", body = ProfileResponse),
        (status = 401, description = "Not authenticated")
    ),
    security(("bearer_auth" = []))
)]
pub async fn me(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
) -> AppResult<Json<ApiResponse<ProfileResponse>>> {
    let user = state.auth_service.current_user(&identity).await?;
    Ok(Json(ApiResponse::success(ProfileResponse {
        user: UserResponse::from(user),
    })))
}

/// Update the current user's name or email
#[utoipa::path(
    put,
    path = "/api/auth/me",
    tag = "Authentication",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = ProfileResponse),
        (status = 400, description = "Nothing to update or validation error"),
        (status = 401, description = "Not authenticated"),
        (status = 409, description = "Email already in use")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_me(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    ValidatedJson(payload): ValidatedJson<UpdateProfileRequest>,
) -> AppResult<Json<ApiResponse<ProfileResponse>>> {
    let user = state
        .auth_service
        .update_profile(&identity, payload.name, payload.email)
        .await?;

    Ok(Json(ApiResponse::success(ProfileResponse {
        user: UserResponse::from(user),
    })))
}

/// Change the current user's password
#[utoipa::path(
    put,
    path = "/api/auth/me/password",
    tag = "Authentication",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password updated"),
        (status = 400, description = "Missing fields or wrong current password"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Account no longer exists")
    ),
    security(("bearer_auth" = []))
)]
pub async fn change_password(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    Json(payload): Json<ChangePasswordRequest>,
) -> AppResult<Json<ApiResponse<()>>> {
    state
        .auth_service
        .change_password(&identity, payload.current_password, payload.new_password)
        .await?;

    Ok(Json(ApiResponse::message("Password updated")))
}

/// Clear the session cookie. Issued tokens stay valid until they expire.
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    tag = "Authentication",
    responses(
        (status = 200, description = "Logged out"),
        (status = 401, description = "Not authenticated")
    ),
    security(("bearer_auth" = []))
)]
pub async fn logout(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    jar: CookieJar,
) -> (CookieJar, Json<ApiResponse<()>>) {
    let jar = jar.remove(Cookie::build((state.cookies.name.clone(), "")).path("/"));
    (jar, Json(ApiResponse::message("Logged out")))
}
