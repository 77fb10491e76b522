//! Offset pagination helpers for list endpoints.

use serde::{Deserialize, Serialize};

const DEFAULT_PER_PAGE: i64 = 20;
const MAX_PER_PAGE: i64 = 100;

/// Query parameters accepted by paginated list endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl PageQuery {
    /// Resolve to a sanitized (page, per_page) pair. Pages start at 1.
    pub fn resolve(&self) -> (i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let per_page = self
            .per_page
            .unwrap_or(DEFAULT_PER_PAGE)
            .clamp(1, MAX_PER_PAGE);
        (page, per_page)
    }

    /// SQL OFFSET for the resolved page.
    pub fn offset(&self) -> i64 {
        let (page, per_page) = self.resolve();
        (page - 1) * per_page
    }

    /// SQL LIMIT for the resolved page.
    pub fn limit(&self) -> i64 {
        self.resolve().1
    }
}

/// Pagination info included in list responses.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct Pagination {
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
    pub total_pages: i64,
}

impl Pagination {
    pub fn new(query: &PageQuery, total: i64) -> Self {
        let (page, per_page) = query.resolve();
        let total_pages = if total == 0 {
            0
        } else {
            (total + per_page - 1) / per_page
        };
        Self {
            page,
            per_page,
            total,
            total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let q = PageQuery::default();
        assert_eq!(q.resolve(), (1, 20));
        assert_eq!(q.offset(), 0);
        assert_eq!(q.limit(), 20);
    }

    #[test]
    fn test_clamping() {
        let q = PageQuery {
            page: Some(0),
            per_page: Some(10_000),
        };
        assert_eq!(q.resolve(), (1, 100));
    }

    #[test]
    fn test_offset_for_later_page() {
        let q = PageQuery {
            page: Some(3),
            per_page: Some(25),
        };
        assert_eq!(q.offset(), 50);
        assert_eq!(q.limit(), 25);
    }

    #[test]
    fn test_pagination_total_pages() {
        let q = PageQuery {
            page: Some(1),
            per_page: Some(20),
        };
        assert_eq!(Pagination::new(&q, 0).total_pages, 0);
        assert_eq!(Pagination::new(&q, 20).total_pages, 1);
        assert_eq!(Pagination::new(&q, 21).total_pages, 2);
    }
}
