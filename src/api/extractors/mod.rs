//! Custom request extractors.

mod validated_json;

pub use validated_json::{into_app_error, ValidatedJson};
