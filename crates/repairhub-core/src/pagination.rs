use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

pub const DEFAULT_PAGINATION_LIMIT: i64 = 20;
pub const MAX_PAGINATION_LIMIT: i64 = 100;

fn default_limit() -> i64 {
    DEFAULT_PAGINATION_LIMIT
}

/// `skip`/`limit` query parameters accepted by every list endpoint.
#[derive(Debug, Clone, Copy, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageParams {
    /// Number of records to skip.
    #[serde(default)]
    pub skip: i64,
    /// Maximum number of records to return (capped at 100).
    #[serde(default = "default_limit")]
    pub limit: i64,
}

impl Default for PageParams {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: DEFAULT_PAGINATION_LIMIT,
        }
    }
}

impl PageParams {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self { skip, limit }.normalized()
    }

    /// Clamps negative values to zero and the limit to the maximum.
    pub fn normalized(self) -> Self {
        Self {
            skip: self.skip.max(0),
            limit: self.limit.clamp(0, MAX_PAGINATION_LIMIT),
        }
    }
}

/// One page of results plus the numbers needed to render pagination.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    /// 1-based page number.
    pub page: i64,
    pub size: i64,
    pub pages: i64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: i64, params: PageParams) -> Self {
        let PageParams { skip, limit } = params;
        let (page, pages) = if limit > 0 {
            (skip / limit + 1, (total + limit - 1) / limit)
        } else {
            (1, 0)
        };
        Self {
            items,
            total,
            page,
            size: limit,
            pages,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            size: self.size,
            pages: self.pages,
        }
    }
}
