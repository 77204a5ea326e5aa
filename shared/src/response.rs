//! Pagination types shared by list endpoints

use serde::{Deserialize, Serialize};

/// Default page size for list endpoints
pub const DEFAULT_PAGE_SIZE: u32 = 20;
/// Upper bound for `limit`
pub const MAX_PAGE_SIZE: u32 = 100;

/// `?page=&limit=` query parameters
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl PageQuery {
    /// 1-based page number, never zero
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    /// Page size clamped to `1..=MAX_PAGE_SIZE`
    pub fn per_page(&self) -> u32 {
        self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
    }

    /// SQL OFFSET for this page
    pub fn offset(&self) -> i64 {
        i64::from(self.page() - 1) * i64::from(self.per_page())
    }

    /// SQL LIMIT for this page
    pub fn limit(&self) -> i64 {
        i64::from(self.per_page())
    }
}

/// Pagination metadata
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Pagination {
    /// Current page number (1-based)
    pub page: u32,
    /// Items per page
    pub per_page: u32,
    /// Total number of items
    pub total: u64,
    /// Total number of pages
    pub total_pages: u32,
}

impl Pagination {
    pub fn new(page: u32, per_page: u32, total: u64) -> Self {
        let total_pages = if per_page == 0 {
            0
        } else {
            total.div_ceil(u64::from(per_page)) as u32
        };
        Self {
            page,
            per_page,
            total,
            total_pages,
        }
    }
}

/// A page of items plus its pagination metadata
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

impl<T> PaginatedResponse<T> {
    pub fn new(items: Vec<T>, query: &PageQuery, total: i64) -> Self {
        Self {
            items,
            pagination: Pagination::new(query.page(), query.per_page(), total.max(0) as u64),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_total_pages() {
        assert_eq!(Pagination::new(1, 20, 0).total_pages, 0);
        assert_eq!(Pagination::new(1, 20, 20).total_pages, 1);
        assert_eq!(Pagination::new(1, 20, 21).total_pages, 2);
        assert_eq!(Pagination::new(1, 0, 5).total_pages, 0);
    }

    #[test]
    fn test_page_query_defaults_and_clamp() {
        let q = PageQuery::default();
        assert_eq!(q.page(), 1);
        assert_eq!(q.per_page(), DEFAULT_PAGE_SIZE);
        assert_eq!(q.offset(), 0);

        let q = PageQuery {
            page: Some(0),
            limit: Some(500),
        };
        assert_eq!(q.page(), 1);
        assert_eq!(q.per_page(), MAX_PAGE_SIZE);

        let q = PageQuery {
            page: Some(3),
            limit: Some(10),
        };
        assert_eq!(q.offset(), 20);
        assert_eq!(q.limit(), 10);
    }

    #[test]
    fn test_paginated_response_serialize() {
        let page = PaginatedResponse::new(vec![1, 2], &PageQuery::default(), 42);
        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(json["items"], serde_json::json!([1, 2]));
        assert_eq!(json["pagination"]["total"], 42);
        assert_eq!(json["pagination"]["total_pages"], 3);
    }
}
