//! Pagination parameters and the `{page, limit, total, pages}` descriptor
//! shared by every list endpoint.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::config::QuillConfigSnapshot;

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_LIMIT: u64 = 10;
pub const DEFAULT_MAX_LIMIT: u64 = 100;

/// Limits applied when coercing `page`/`limit` query values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginateConfig {
    pub default_limit: u64,
    pub max_limit: u64,
}

impl Default for PaginateConfig {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_LIMIT,
            max_limit: DEFAULT_MAX_LIMIT,
        }
    }
}

impl PaginateConfig {
    /// Reads `paginate.default` and `paginate.max`, keeping defaults for
    /// missing or unparsable keys.
    pub fn from_snapshot(cfg: &QuillConfigSnapshot) -> Self {
        let mut out = Self::default();
        if let Some(v) = cfg.get_usize("paginate.default").filter(|v| *v > 0) {
            out.default_limit = v as u64;
        }
        if let Some(v) = cfg.get_usize("paginate.max").filter(|v| *v > 0) {
            out.max_limit = v as u64;
        }
        if out.default_limit > out.max_limit {
            out.default_limit = out.max_limit;
        }
        out
    }
}

/// A requested window: 1-based page number and page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub limit: u64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

fn positive(raw: Option<&String>) -> Option<u64> {
    raw.and_then(|s| s.trim().parse::<i64>().ok())
        .filter(|n| *n >= 1)
        .map(|n| n as u64)
}

impl PageRequest {
    pub fn new(page: u64, limit: u64) -> Self {
        Self {
            page: page.max(1),
            limit: limit.max(1),
        }
    }

    /// Coerces `page` and `limit` from raw query values. Non-numeric or
    /// non-positive input falls back to the default; `limit` is clamped to
    /// the configured maximum.
    pub fn from_query(query: &HashMap<String, String>, cfg: &PaginateConfig) -> Self {
        let page = positive(query.get("page")).unwrap_or(DEFAULT_PAGE);
        let limit = positive(query.get("limit"))
            .unwrap_or(cfg.default_limit)
            .min(cfg.max_limit);

        Self::new(page, limit)
    }

    /// Number of matching records to skip before this window.
    pub fn skip(&self) -> u64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

/// Summary of a windowed result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u64,
    pub limit: u64,
    pub total: u64,
    pub pages: u64,
}

impl Pagination {
    /// `pages = ceil(total / limit)`, 0 when nothing matched.
    pub fn new(req: &PageRequest, total: u64) -> Self {
        Self {
            page: req.page,
            limit: req.limit,
            total,
            pages: total.div_ceil(req.limit),
        }
    }
}

/// Result of a `find`-like call.
#[derive(Debug, Clone)]
pub struct Page<R> {
    pub data: Vec<R>,
    pub pagination: Option<Pagination>,
}

impl<R> Page<R> {
    pub fn new(data: Vec<R>, pagination: Pagination) -> Self {
        Self {
            data,
            pagination: Some(pagination),
        }
    }

    /// A plain list without a pagination descriptor.
    pub fn unpaginated(data: Vec<R>) -> Self {
        Self {
            data,
            pagination: None,
        }
    }

    pub fn map<T>(self, f: impl FnMut(R) -> T) -> Page<T> {
        Page {
            data: self.data.into_iter().map(f).collect(),
            pagination: self.pagination,
        }
    }
}
