use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_LIMIT: u32 = 100;
pub const MAX_PAGE_LIMIT: u32 = 250;

/// Limit/offset query parameters for paginated list endpoints.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageRequest {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl PageRequest {
    pub fn new(limit: Option<u32>, offset: Option<u32>) -> Self {
        Self { limit, offset }
    }

    /// Missing or zero falls back to the default; anything above the cap is clamped.
    pub fn limit(&self) -> u32 {
        match self.limit {
            None | Some(0) => DEFAULT_PAGE_LIMIT,
            Some(n) => n.min(MAX_PAGE_LIMIT),
        }
    }

    pub fn offset(&self) -> u32 {
        self.offset.unwrap_or(0)
    }
}

/// One page of results plus the total number of matching rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub count: u64,
    pub limit: u32,
    pub offset: u32,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    pub fn new(request: PageRequest, count: u64, results: Vec<T>) -> Self {
        Self {
            count,
            limit: request.limit(),
            offset: request.offset(),
            results,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_limit_when_unset() {
        let req = PageRequest::default();
        assert_eq!(req.limit(), DEFAULT_PAGE_LIMIT);
        assert_eq!(req.offset(), 0);
    }

    #[test]
    fn zero_limit_uses_default() {
        assert_eq!(PageRequest::new(Some(0), None).limit(), DEFAULT_PAGE_LIMIT);
    }

    #[test]
    fn limit_is_clamped() {
        assert_eq!(PageRequest::new(Some(251), None).limit(), MAX_PAGE_LIMIT);
        assert_eq!(PageRequest::new(Some(10_000), None).limit(), MAX_PAGE_LIMIT);
        assert_eq!(PageRequest::new(Some(250), None).limit(), 250);
        assert_eq!(PageRequest::new(Some(3), Some(9)).limit(), 3);
    }

    #[test]
    fn page_echoes_resolved_window() {
        let page = Page::new(PageRequest::new(Some(999), Some(5)), 42, vec![1, 2, 3]);
        assert_eq!(page.limit, MAX_PAGE_LIMIT);
        assert_eq!(page.offset, 5);
        assert_eq!(page.count, 42);
        assert_eq!(page.results, vec![1, 2, 3]);
    }
}
