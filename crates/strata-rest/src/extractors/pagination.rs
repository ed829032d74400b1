//! Pagination extractor.

use serde::Deserialize;
use strata_core::PageRequest;
use utoipa::IntoParams;

/// Query parameters for paginated lists.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PaginationQuery {
    /// Zero-based page number.
    #[serde(default)]
    pub page: Option<usize>,
    /// Rows per page, at most 100.
    #[serde(default)]
    pub size: Option<usize>,
    /// Include soft-deleted rows; authorities only.
    #[serde(default)]
    pub include_deleted: Option<bool>,
}

impl PaginationQuery {
    pub fn include_deleted(&self) -> bool {
        self.include_deleted.unwrap_or(false)
    }
}

impl From<&PaginationQuery> for PageRequest {
    fn from(query: &PaginationQuery) -> Self {
        PageRequest::new(
            query.page.unwrap_or(0),
            query.size.unwrap_or(PageRequest::DEFAULT_SIZE),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_and_clamping() {
        let page = PageRequest::from(&PaginationQuery::default());
        assert_eq!(page, PageRequest::first());

        let query = PaginationQuery {
            page: Some(3),
            size: Some(10_000),
            include_deleted: Some(true),
        };
        let page = PageRequest::from(&query);
        assert_eq!(page.page, 3);
        assert_eq!(page.size, PageRequest::MAX_SIZE);
        assert!(query.include_deleted());
    }
}
