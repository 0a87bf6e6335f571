use serde::Serialize;

use crate::errors::AppError;

pub const DEFAULT_PAGE_LIMIT: u32 = 10;
pub const MAX_PAGE_LIMIT: u32 = 100;

/// A validated 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: u32,
    pub limit: u32,
}

impl Default for Page {
    fn default() -> Self {
        Page {
            page: 1,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

impl Page {
    /// Builds a page from optional query parameters, applying defaults.
    pub fn from_query(page: Option<u32>, limit: Option<u32>) -> Result<Self, AppError> {
        let page = page.unwrap_or(1);
        let limit = limit.unwrap_or(DEFAULT_PAGE_LIMIT);
        if page == 0 {
            return Err(AppError::Validation("page must be at least 1".to_string()));
        }
        if limit == 0 || limit > MAX_PAGE_LIMIT {
            return Err(AppError::Validation(format!(
                "limit must be between 1 and {MAX_PAGE_LIMIT}"
            )));
        }
        Ok(Page { page, limit })
    }

    pub fn offset(&self) -> u64 {
        (self.page as u64 - 1) * self.limit as u64
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u64,
}

impl<T> Paginated<T> {
    pub fn new(data: Vec<T>, total: u64, page: Page) -> Self {
        Paginated {
            data,
            total,
            page: page.page,
            limit: page.limit,
            total_pages: total.div_ceil(page.limit as u64),
        }
    }

    /// Slices an already-ordered, unpaginated result set.
    pub fn from_all(all: Vec<T>, page: Page) -> Self {
        let total = all.len() as u64;
        let data = all
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit as usize)
            .collect();
        Paginated::new(data, total, page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_applied() {
        let page = Page::from_query(None, None).unwrap();
        assert_eq!(page, Page::default());
        assert_eq!(page.offset(), 0);
    }

    #[test]
    fn test_zero_page_and_oversized_limit_rejected() {
        assert!(Page::from_query(Some(0), None).is_err());
        assert!(Page::from_query(None, Some(0)).is_err());
        assert!(Page::from_query(None, Some(MAX_PAGE_LIMIT + 1)).is_err());
    }

    #[test]
    fn test_total_pages_rounds_up() {
        let page = Page { page: 1, limit: 10 };
        assert_eq!(Paginated::<u8>::new(vec![], 21, page).total_pages, 3);
        assert_eq!(Paginated::<u8>::new(vec![], 0, page).total_pages, 0);
    }

    #[test]
    fn test_from_all_slices_requested_page() {
        let page = Page { page: 2, limit: 3 };
        let result = Paginated::from_all((1..=8).collect::<Vec<u32>>(), page);
        assert_eq!(result.data, vec![4, 5, 6]);
        assert_eq!(result.total, 8);
        assert_eq!(result.total_pages, 3);
    }
}
