//! HTTP request handlers.

pub mod auth_handler;
pub mod comment_handler;
pub mod post_handler;
mod rules;
pub mod user_handler;

pub use auth_handler::auth_routes;
pub use comment_handler::comment_routes;
pub use post_handler::post_routes;
pub use user_handler::user_routes;
