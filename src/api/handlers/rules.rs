//! Custom field rules for request bodies.

use std::borrow::Cow;
use validator::ValidationError;

use crate::config::{MAX_NAME_LENGTH, MAX_TITLE_LENGTH, MIN_NAME_LENGTH, MIN_TITLE_LENGTH};

fn trimmed_length(
    value: &str,
    min: usize,
    max: u64,
    message: &'static str,
) -> Result<(), ValidationError> {
    let len = value.trim().chars().count();
    if len < min || len as u64 > max {
        let mut err = ValidationError::new("length");
        err.message = Some(Cow::Borrowed(message));
        return Err(err);
    }
    Ok(())
}

/// Display name: 2..=120 characters after trimming.
pub fn display_name(value: &str) -> Result<(), ValidationError> {
    trimmed_length(
        value,
        MIN_NAME_LENGTH,
        MAX_NAME_LENGTH,
        "Name must be between 2 and 120 characters",
    )
}

/// Post title: 2..=200 characters after trimming.
pub fn post_title(value: &str) -> Result<(), ValidationError> {
    trimmed_length(
        value,
        MIN_TITLE_LENGTH,
        MAX_TITLE_LENGTH,
        "Title must be between 2 and 200 characters",
    )
}
