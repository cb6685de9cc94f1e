//! Pagination types for list endpoints.

use serde::{Deserialize, Deserializer, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::config::{DEFAULT_PAGE_NUMBER, DEFAULT_PAGE_SIZE, MAX_PAGE_NUMBER, MAX_PAGE_SIZE};

/// Pagination query parameters, reused across all list endpoints
#[derive(Debug, Clone, Copy, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PaginationParams {
    #[serde(default = "default_page", deserialize_with = "lenient_number")]
    pub page: u64,
    #[serde(default = "default_limit", deserialize_with = "lenient_number")]
    pub limit: u64,
}

/// Unparseable values become 0, which the accessors map back to defaults.
fn lenient_number<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|s| s.trim().parse().ok()).unwrap_or(0))
}

fn default_page() -> u64 {
    DEFAULT_PAGE_NUMBER
}

fn default_limit() -> u64 {
    DEFAULT_PAGE_SIZE
}

impl PaginationParams {
    pub fn new(page: u64, limit: u64) -> Self {
        Self { page, limit }
    }

    /// 1-indexed page, clamped to `1..=MAX_PAGE_NUMBER`
    pub fn page(&self) -> u64 {
        self.page.clamp(1, MAX_PAGE_NUMBER)
    }

    /// Get limit capped at maximum; zero falls back to the default
    pub fn limit(&self) -> u64 {
        if self.limit == 0 {
            DEFAULT_PAGE_SIZE
        } else {
            self.limit.min(MAX_PAGE_SIZE)
        }
    }

    /// Calculate offset for database query
    pub fn offset(&self) -> u64 {
        (self.page() - 1) * self.limit()
    }
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE_NUMBER,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Paginated response wrapper
#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    pub success: bool,
    pub data: Vec<T>,
    pub meta: PaginationMeta,
}

/// Pagination metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct PaginationMeta {
    pub page: u64,
    pub limit: u64,
    pub total: u64,
    pub pages: u64,
}

impl<T> Paginated<T> {
    /// Create new paginated response
    pub fn new(data: Vec<T>, params: &PaginationParams, total: u64) -> Self {
        let limit = params.limit();
        Self {
            success: true,
            data,
            meta: PaginationMeta {
                page: params.page(),
                limit,
                total,
                pages: total.div_ceil(limit),
            },
        }
    }

    /// Convert the page items, keeping the metadata
    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Paginated<U> {
        Paginated {
            success: self.success,
            data: self.data.into_iter().map(f).collect(),
            meta: self.meta,
        }
    }
}
