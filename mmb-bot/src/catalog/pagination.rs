//! Pagination for catalog listings

/// Pagination metadata calculated from total results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// Current page number (1-indexed)
    pub page: i64,
    /// Total number of pages
    pub total_pages: i64,
    /// Offset for SQL LIMIT/OFFSET query
    pub offset: i64,
    pub page_size: i64,
}

impl Pagination {
    /// Whether `requested_page` named a page that exists
    pub fn contains(&self, requested_page: i64) -> bool {
        requested_page >= 1 && requested_page <= self.total_pages
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}

/// Calculate pagination metadata from total results and requested page
///
/// The page is clamped into [1, total_pages]; an empty result set still
/// reports page 1 of 0.
///
/// ```
/// use mmb_bot::catalog::pagination::calculate_pagination;
///
/// // 12 tracks at 5 per page = 3 pages (5 + 5 + 2)
/// let p = calculate_pagination(12, 5, 2);
/// assert_eq!(p.page, 2);
/// assert_eq!(p.total_pages, 3);
/// assert_eq!(p.offset, 5);
/// ```
pub fn calculate_pagination(total_results: i64, page_size: i64, requested_page: i64) -> Pagination {
    let page_size = page_size.max(1);
    let total_pages = (total_results + page_size - 1) / page_size;
    let page = requested_page.max(1).min(total_pages.max(1));
    let offset = (page - 1) * page_size;

    Pagination {
        page,
        total_pages,
        offset,
        page_size,
    }
}
