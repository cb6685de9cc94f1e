//! JWT authentication extractors.
//!
//! The resolved identity is handed to the handler as a value; nothing is
//! stored in request extensions.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use axum_extra::extract::CookieJar;
use std::convert::Infallible;

use crate::api::AppState;
use crate::config::BEARER_TOKEN_PREFIX;
use crate::domain::{require_role, Identity, UserRole};
use crate::errors::AppError;

/// Pull the session token from `Authorization: Bearer ...`, falling back to
/// the auth cookie. A header with another scheme counts as absent.
pub fn extract_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix(BEARER_TOKEN_PREFIX))
        .map(str::trim)
        .filter(|t| !t.is_empty());

    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    CookieJar::from_headers(headers)
        .get(cookie_name)
        .map(|c| c.value().to_string())
        .filter(|t| !t.is_empty())
}

/// Authenticated caller; rejects with 401 otherwise.
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser(pub Identity);

/// Caller identity if one could be resolved; never rejects.
#[derive(Debug, Clone, Copy)]
pub struct MaybeUser(pub Option<Identity>);

/// Authenticated caller holding the admin role.
#[derive(Debug, Clone, Copy)]
pub struct AdminUser(pub Identity);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_token(&parts.headers, &state.cookies.name);
        let identity = state.auth_service.authenticate(token.as_deref()).await?;
        Ok(CurrentUser(identity))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_token(&parts.headers, &state.cookies.name);
        Ok(MaybeUser(
            state.auth_service.try_authenticate(token.as_deref()).await,
        ))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(identity) = CurrentUser::from_request_parts(parts, state).await?;
        require_role(Some(&identity), &[UserRole::Admin])?;
        Ok(AdminUser(identity))
    }
}
