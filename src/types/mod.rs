//! Shared types for list and envelope responses.

mod pagination;
mod response;

pub use pagination::{Paginated, PaginationMeta, PaginationParams};
pub use response::{ApiResponse, Created};
