//! Limit/offset pagination math

use crate::error::TweetError;
use crate::policy::DEFAULT_PAGE_LIMIT;

/// A validated limit/offset pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    limit: u64,
    offset: u64,
}

impl PageRequest {
    /// Validate raw caller input. A limit of 0 means the default page size.
    pub fn new(limit: i64, offset: i64, max_limit: u64) -> Result<Self, TweetError> {
        if limit < 0 {
            return Err(TweetError::InvalidArgument(
                "Limit must be a non-negative integer".to_string(),
            ));
        }
        if offset < 0 {
            return Err(TweetError::InvalidArgument(
                "Offset must be a non-negative integer".to_string(),
            ));
        }

        let limit = if limit == 0 {
            DEFAULT_PAGE_LIMIT
        } else {
            limit as u64
        };

        if limit > max_limit {
            return Err(TweetError::InvalidArgument(format!(
                "Limit must be at most {}",
                max_limit
            )));
        }

        Ok(Self {
            limit,
            offset: offset as u64,
        })
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }
}

/// Counters describing where a page sits in the full result set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageInfo {
    pub total_items: u64,
    pub total_pages: u64,
    pub current_page: u64,
    pub limit: u64,
}

impl PageInfo {
    pub fn compute(total_items: u64, request: &PageRequest) -> Self {
        let limit = request.limit;
        Self {
            total_items,
            // Never report zero pages, even for an empty result
            total_pages: total_items.div_ceil(limit).max(1),
            current_page: request.offset / limit + 1,
            limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_limit_uses_default() {
        let request = PageRequest::new(0, 0, 100).unwrap();
        assert_eq!(request.limit(), DEFAULT_PAGE_LIMIT);
        assert_eq!(request, PageRequest::new(10, 0, 100).unwrap());
    }

    #[test]
    fn test_negative_values_rejected() {
        assert!(matches!(
            PageRequest::new(-1, 0, 100),
            Err(TweetError::InvalidArgument(_))
        ));
        assert!(matches!(
            PageRequest::new(5, -3, 100),
            Err(TweetError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_limit_above_max_rejected() {
        assert!(PageRequest::new(101, 0, 100).is_err());
        assert!(PageRequest::new(100, 0, 100).is_ok());
    }

    #[test]
    fn test_empty_result_has_one_page() {
        let request = PageRequest::new(7, 0, 100).unwrap();
        let info = PageInfo::compute(0, &request);
        assert_eq!(info.total_pages, 1);
        assert_eq!(info.current_page, 1);
    }

    #[test]
    fn test_page_math() {
        let request = PageRequest::new(5, 10, 100).unwrap();
        let info = PageInfo::compute(11, &request);
        assert_eq!(info.total_pages, 3);
        assert_eq!(info.current_page, 3);
        assert_eq!(info.limit, 5);

        // Offsets that are not a multiple of the limit round down
        let request = PageRequest::new(5, 7, 100).unwrap();
        assert_eq!(PageInfo::compute(20, &request).current_page, 2);

        let request = PageRequest::new(10, 0, 100).unwrap();
        assert_eq!(PageInfo::compute(10, &request).total_pages, 1);
    }
}
