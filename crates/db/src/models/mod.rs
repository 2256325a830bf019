//! Database models for Mirror of Heart.
//!
//! Each module owns one table (messages live with their conversation) and
//! exposes associated async functions taking a `&SqlitePool`.

use serde::{Deserialize, Serialize};

pub mod api_log;
pub mod conversation;
pub mod journal;
pub mod mood_entry;
pub mod user;

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;
/// Keeps `offset()` far from overflow.
pub const MAX_PAGE: i64 = 1_000_000;

/// Page/limit query parameters, 1-based.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct Pagination {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl Pagination {
    pub fn new(page: i64, limit: i64) -> Self {
        Self {
            page: Some(page),
            limit: Some(limit),
        }
    }

    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).clamp(1, MAX_PAGE)
    }

    pub fn limit(&self) -> i64 {
        self.limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }

    pub fn offset(&self) -> i64 {
        (self.page() - 1) * self.limit()
    }
}

/// One page of results plus the total row count for the filter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: i64, pagination: &Pagination) -> Self {
        Self {
            items,
            total,
            page: pagination.page(),
            limit: pagination.limit(),
        }
    }
}

/// Escape `%`, `_` and `\` for use inside a `LIKE ... ESCAPE '\'` pattern.
pub(crate) fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_defaults_and_clamps() {
        let p = Pagination::default();
        assert_eq!((p.page(), p.limit(), p.offset()), (1, 20, 0));

        let p = Pagination::new(3, 500);
        assert_eq!((p.page(), p.limit(), p.offset()), (3, 100, 200));

        let p = Pagination::new(0, 0);
        assert_eq!((p.page(), p.limit()), (1, 1));
    }

    #[test]
    fn huge_page_is_capped() {
        let p = Pagination::new(i64::MAX, 100);
        assert_eq!(p.page(), MAX_PAGE);
        assert_eq!(p.offset(), (MAX_PAGE - 1) * 100);
    }

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
    }
}
