//! Pagination for list endpoints

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::error::{AppError, AppResult};

/// How a list endpoint orders and pages its records
#[derive(Debug, Clone, Copy)]
pub struct ListConfig {
    pub page_size: i64,
    /// ORDER BY clause; only ever a compile-time constant
    pub order_by: &'static str,
}

/// Page query parameter
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct PageQuery {
    /// Page number (default: 1)
    pub page: Option<i64>,
}

/// A validated page position within a result set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
}

impl Pagination {
    /// Page 1 always exists, even for an empty result set; any other page
    /// outside `1..=num_pages` is not found.
    pub fn new(page: Option<i64>, per_page: i64, total: i64) -> AppResult<Self> {
        let page = page.unwrap_or(1);
        let pagination = Self {
            page,
            per_page,
            total,
        };
        if page < 1 || page > pagination.num_pages() {
            return Err(AppError::NotFound(format!("Invalid page ({})", page)));
        }
        Ok(pagination)
    }

    pub fn num_pages(&self) -> i64 {
        if self.total == 0 {
            1
        } else {
            (self.total + self.per_page - 1) / self.per_page
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.per_page
    }

    pub fn limit(&self) -> i64 {
        self.per_page
    }

    pub fn has_next(&self) -> bool {
        self.page < self.num_pages()
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }
}

/// Paginated response wrapper
#[derive(Debug, Serialize, ToSchema)]
pub struct Page<T>
where
    T: for<'a> ToSchema<'a>,
{
    /// Records on this page
    pub items: Vec<T>,
    /// Total number of records
    pub total: i64,
    /// Current page number
    pub page: i64,
    /// Records per page
    pub per_page: i64,
    pub num_pages: i64,
    pub has_next: bool,
    pub has_previous: bool,
}

impl<T> Page<T>
where
    T: for<'a> ToSchema<'a>,
{
    pub fn new(items: Vec<T>, pagination: Pagination) -> Self {
        Self {
            items,
            total: pagination.total,
            page: pagination.page,
            per_page: pagination.per_page,
            num_pages: pagination.num_pages(),
            has_next: pagination.has_next(),
            has_previous: pagination.has_previous(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_five_records_two_per_page() {
        let first = Pagination::new(None, 2, 5).unwrap();
        assert_eq!(first.num_pages(), 3);
        assert_eq!((first.offset(), first.limit()), (0, 2));
        assert!(first.has_next());
        assert!(!first.has_previous());

        let last = Pagination::new(Some(3), 2, 5).unwrap();
        assert_eq!(last.offset(), 4);
        // Only one record remains past offset 4
        assert_eq!(last.total - last.offset(), 1);
        assert!(!last.has_next());
    }

    #[test]
    fn test_out_of_range_pages() {
        assert!(Pagination::new(Some(4), 2, 5).is_err());
        assert!(Pagination::new(Some(0), 2, 5).is_err());
        assert!(Pagination::new(Some(-1), 10, 50).is_err());
    }

    #[test]
    fn test_empty_result_has_one_page() {
        let empty = Pagination::new(Some(1), 10, 0).unwrap();
        assert_eq!(empty.num_pages(), 1);
        assert!(!empty.has_next());
        assert!(Pagination::new(Some(2), 10, 0).is_err());
    }
}
