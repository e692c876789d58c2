//! Pagination primitives shared by the listing endpoints

use serde::Serialize;

/// Pagination parameters (1-indexed page, capped page size)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ListParams {
    /// Page number (1-indexed)
    pub page: u32,
    /// Number of items per page
    pub limit: u32,
}

impl Default for ListParams {
    fn default() -> Self {
        Self { page: 1, limit: 20 }
    }
}

impl ListParams {
    /// Create pagination parameters, clamping to sane bounds
    pub fn new(page: u32, limit: u32) -> Self {
        Self {
            page: page.max(1),
            limit: limit.clamp(1, 100),
        }
    }

    /// Offset for database queries
    pub fn offset(&self) -> i64 {
        i64::from(self.page.saturating_sub(1)) * i64::from(self.limit)
    }

    /// Limit for database queries
    pub fn limit(&self) -> i64 {
        self.limit as i64
    }
}

/// Paginated result container
#[derive(Debug, Clone, Serialize)]
pub struct PagedResult<T> {
    /// Items in the current page
    pub items: Vec<T>,
    /// Total number of items across all pages
    pub total: i64,
    /// Current page number (1-indexed)
    pub page: u32,
    /// Number of items per page
    pub limit: u32,
}

impl<T> PagedResult<T> {
    /// Create a new paginated result
    pub fn new(items: Vec<T>, total: i64, params: &ListParams) -> Self {
        Self {
            items,
            total,
            page: params.page,
            limit: params.limit,
        }
    }

    /// Total number of pages
    pub fn pages(&self) -> i64 {
        if self.total == 0 {
            0
        } else {
            (self.total + self.limit as i64 - 1) / self.limit as i64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_params_clamps() {
        let params = ListParams::new(0, 500);
        assert_eq!(params.page, 1);
        assert_eq!(params.limit, 100);
        assert_eq!(params.offset(), 0);
    }

    #[test]
    fn test_list_params_offset() {
        let params = ListParams::new(3, 20);
        assert_eq!(params.offset(), 40);
        assert_eq!(ListParams::default().offset(), 0);
    }

    #[test]
    fn test_list_params_offset_huge_page() {
        let params = ListParams::new(u32::MAX, 100);
        assert_eq!(params.offset(), (u32::MAX as i64 - 1) * 100);
    }

    #[test]
    fn test_paged_result_pages() {
        let params = ListParams::new(1, 20);
        assert_eq!(PagedResult::<i32>::new(vec![], 0, &params).pages(), 0);
        assert_eq!(PagedResult::<i32>::new(vec![], 1, &params).pages(), 1);
        assert_eq!(PagedResult::<i32>::new(vec![], 20, &params).pages(), 1);
        assert_eq!(PagedResult::<i32>::new(vec![], 21, &params).pages(), 2);
    }
}
