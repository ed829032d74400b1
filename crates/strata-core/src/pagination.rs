//! Pagination types for list operations.

use serde::{Deserialize, Serialize};

/// A request for one page of rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// The page number (0-indexed).
    pub page: usize,
    /// The number of rows per page.
    pub size: usize,
}

impl PageRequest {
    pub const DEFAULT_SIZE: usize = 20;
    pub const MAX_SIZE: usize = 100;

    /// Creates a page request, clamping the size to `1..=MAX_SIZE`.
    #[must_use]
    pub fn new(page: usize, size: usize) -> Self {
        Self {
            page,
            size: size.clamp(1, Self::MAX_SIZE),
        }
    }

    /// First page with the default size.
    #[must_use]
    pub fn first() -> Self {
        Self::new(0, Self::DEFAULT_SIZE)
    }

    /// Row offset for `LIMIT .. OFFSET ..`, saturating for huge page numbers.
    #[must_use]
    pub const fn offset(&self) -> usize {
        self.page.saturating_mul(self.size)
    }

    #[must_use]
    pub const fn limit(&self) -> usize {
        self.size
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::first()
    }
}

/// Position of a page inside the full result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PageInfo {
    pub page: usize,
    pub size: usize,
    pub total_elements: u64,
    pub total_pages: u64,
    pub first: bool,
    pub last: bool,
}

impl PageInfo {
    #[must_use]
    pub fn new(request: PageRequest, total_elements: u64) -> Self {
        let size = request.size.max(1) as u64;
        let total_pages = total_elements.div_ceil(size);
        Self {
            page: request.page,
            size: request.size,
            total_elements,
            total_pages,
            first: request.page == 0,
            last: (request.page as u64).saturating_add(1) >= total_pages,
        }
    }
}

/// One page of results plus its position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub content: Vec<T>,
    #[serde(flatten)]
    pub info: PageInfo,
}

impl<T> Page<T> {
    #[must_use]
    pub fn new(content: Vec<T>, request: PageRequest, total_elements: u64) -> Self {
        Self {
            content,
            info: PageInfo::new(request, total_elements),
        }
    }

    #[must_use]
    pub fn empty(request: PageRequest) -> Self {
        Self::new(Vec::new(), request, 0)
    }

    /// Maps the page content, keeping the page position.
    #[must_use]
    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
        Page {
            content: self.content.into_iter().map(f).collect(),
            info: self.info,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.content.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    #[must_use]
    pub const fn has_next(&self) -> bool {
        !self.info.last
    }
}

impl<T> IntoIterator for Page<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.content.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_request_offset() {
        assert_eq!(PageRequest::new(0, 20).offset(), 0);
        assert_eq!(PageRequest::new(2, 10).offset(), 20);
        assert_eq!(PageRequest::new(5, 15).offset(), 75);
    }

    #[test]
    fn test_huge_page_number_saturates() {
        let request = PageRequest::new(usize::MAX, 100);
        assert_eq!(request.offset(), usize::MAX);

        let page: Page<i32> = Page::new(Vec::new(), request, 3);
        assert!(page.info.last);
        assert!(!page.info.first);
    }

    #[test]
    fn test_page_request_size_is_clamped() {
        assert_eq!(PageRequest::new(0, 1000).size, PageRequest::MAX_SIZE);
        assert_eq!(PageRequest::new(0, 0).size, 1);
        assert_eq!(PageRequest::default().size, PageRequest::DEFAULT_SIZE);
    }

    #[test]
    fn test_page_info_middle_page() {
        let page = Page::new(vec![1, 2], PageRequest::new(1, 2), 5);
        assert_eq!(page.info.total_pages, 3);
        assert!(!page.info.first);
        assert!(!page.info.last);
        assert!(page.has_next());
    }

    #[test]
    fn test_page_info_last_page() {
        let page = Page::new(vec![1], PageRequest::new(2, 2), 5);
        assert!(page.info.last);
        assert!(!page.has_next());
    }

    #[test]
    fn test_empty_page_is_first_and_last() {
        let page: Page<i32> = Page::empty(PageRequest::first());
        assert!(page.is_empty());
        assert_eq!(page.info.total_pages, 0);
        assert!(page.info.first);
        assert!(page.info.last);
    }

    #[test]
    fn test_page_map() {
        let page = Page::new(vec![1, 2, 3], PageRequest::first(), 3);
        let mapped = page.map(|x| x * 2);
        assert_eq!(mapped.content, vec![2, 4, 6]);
        assert_eq!(mapped.info.total_elements, 3);
    }
}
