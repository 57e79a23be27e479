use serde::Deserialize;

pub const DEFAULT_LIMIT: i64 = 20;

/// `?page=&limit=` query parameters shared by every list endpoint.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct Pagination {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl Pagination {
    /// Clamp to `page >= 1` and `1 <= limit <= max_limit`, returning `(limit, offset)`.
    pub fn resolve(&self, max_limit: i64) -> (i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let limit = self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, max_limit.max(1));
        (limit, (page - 1).saturating_mul(limit))
    }
}
