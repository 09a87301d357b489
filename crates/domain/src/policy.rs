//! Input limits and validation rules

use crate::error::TweetError;

/// Maximum topic length in characters
pub const MAX_TOPIC_CHARS: usize = 100;

/// Maximum search query length in characters
pub const MAX_SEARCH_CHARS: usize = 100;

/// Page size used when the caller passes 0
pub const DEFAULT_PAGE_LIMIT: u64 = 10;

/// Largest page size accepted by default
pub const MAX_PAGE_LIMIT: u64 = 100;

/// Validate a topic, returning it trimmed
pub fn validate_topic(topic: &str) -> Result<&str, TweetError> {
    let trimmed = topic.trim();

    if trimmed.is_empty() {
        return Err(TweetError::InvalidArgument(
            "Topic cannot be empty".to_string(),
        ));
    }

    if trimmed.chars().count() > MAX_TOPIC_CHARS {
        return Err(TweetError::InvalidArgument(format!(
            "Topic is too long, must be at most {} characters",
            MAX_TOPIC_CHARS
        )));
    }

    Ok(trimmed)
}

/// Validate a search query. Blank queries are treated as no search.
pub fn validate_search(search: Option<&str>) -> Result<Option<String>, TweetError> {
    let Some(search) = search else {
        return Ok(None);
    };

    if search.chars().count() > MAX_SEARCH_CHARS {
        return Err(TweetError::InvalidArgument(format!(
            "Search query is too long, must be at most {} characters",
            MAX_SEARCH_CHARS
        )));
    }

    if search.trim().is_empty() {
        return Ok(None);
    }

    Ok(Some(search.to_string()))
}
