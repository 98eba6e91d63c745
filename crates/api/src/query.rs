//! Shared query parameter types for API handlers.

use serde::{Deserialize, Serialize};

/// Default page size for paginated listings.
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Upper bound on the page size a client may request.
pub const MAX_PAGE_SIZE: i64 = 100;

/// Page-number pagination (`?page=&limit=`), 1-based.
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Highest page number accepted; keeps `(page - 1) * limit` inside `i64`.
pub const MAX_PAGE: i64 = i64::MAX / MAX_PAGE_SIZE;

impl PageParams {
    /// Clamped `(page, limit, offset)`.
    pub fn resolve(&self) -> (i64, i64, i64) {
        let page = self.page.unwrap_or(1).clamp(1, MAX_PAGE);
        let limit = self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        (page, limit, (page - 1) * limit)
    }
}

/// Pagination block returned next to a page of results.
#[derive(Debug, Serialize)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub pages: i64,
}

impl Pagination {
    pub fn new(page: i64, limit: i64, total: i64) -> Self {
        Self {
            page,
            limit,
            total,
            pages: (total + limit - 1) / limit,
        }
    }
}
