//! Validated JSON extractor - Combines deserialization with validation.

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors};

use crate::errors::{AppError, FieldError};

/// Validated JSON extractor that automatically validates requests.
///
/// # Example
///
/// ```rust,ignore
/// use serde::Deserialize;
/// use validator::Validate;
/// use quill_api::api::extractors::ValidatedJson;
///
/// #[derive(Deserialize, Validate)]
/// struct CreatePostRequest {
///     #[validate(length(min = 2, max = 200))]
///     title: String,
/// }
///
/// async fn create_post(ValidatedJson(payload): ValidatedJson<CreatePostRequest>) {
///     // payload is already validated
/// }
/// ```
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| AppError::validation(e.body_text()))?;

        value.validate().map_err(into_app_error)?;

        Ok(ValidatedJson(value))
    }
}

/// Convert validator output into one detail entry per failed rule.
pub fn into_app_error(errors: ValidationErrors) -> AppError {
    AppError::invalid_fields(field_errors(&errors))
}

fn field_errors(errors: &ValidationErrors) -> Vec<FieldError> {
    let mut details: Vec<FieldError> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| FieldError {
                field: field.to_string(),
                message: e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("{} is invalid", field)),
            })
        })
        .collect();

    // HashMap order is arbitrary
    details.sort_by(|a, b| a.field.cmp(&b.field));
    details
}
