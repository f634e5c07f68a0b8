//! Pagination utilities for list endpoints.
//!
//! Supports offset-based (`limit` + `offset`) and page-based (`limit` + `page`)
//! pagination. When `page` is provided it takes precedence over `offset`.
//!
//! ```json
//! {
//!   "data": [...],
//!   "meta": { "total": 100, "limit": 10, "offset": 20, "page": 3, "has_more": true }
//! }
//! ```

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::serde::deserialize_optional_i64;

pub const DEFAULT_LIMIT: i64 = 10;
pub const MAX_LIMIT: i64 = 100;

/// Metadata about a paginated response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PaginationMeta {
    /// Total number of items across all pages
    pub total: i64,
    /// Maximum items per page (the limit that was applied)
    pub limit: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<i64>,
    /// Whether there are more items after this page
    pub has_more: bool,
}

impl PaginationMeta {
    /// Builds the metadata for a page fetched with `params` out of `total` rows.
    #[must_use]
    pub fn from_params(total: i64, params: &PaginationParams) -> Self {
        let limit = params.limit();
        let offset = params.offset();

        Self {
            total,
            limit,
            offset: Some(offset),
            page: params.page(),
            has_more: offset.saturating_add(limit) < total,
        }
    }
}

/// Query parameters for pagination.
///
/// - `limit` is clamped to `[1, 100]` (default 10)
/// - `offset` is clamped to a minimum of 0
/// - `page` is 1-indexed and clamped to a minimum of 1
#[derive(Debug, Clone, Hash, Deserialize, ToSchema)]
pub struct PaginationParams {
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub limit: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub offset: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub page: Option<i64>,
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            limit: Some(DEFAULT_LIMIT),
            offset: Some(0),
            page: None,
        }
    }
}

impl PaginationParams {
    #[must_use]
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }

    #[must_use]
    pub fn offset(&self) -> i64 {
        if let Some(page) = self.page {
            (page.max(1) - 1).saturating_mul(self.limit())
        } else {
            self.offset.unwrap_or(0).max(0)
        }
    }

    #[must_use]
    pub fn page(&self) -> Option<i64> {
        self.page.map(|p| p.max(1))
    }
}
