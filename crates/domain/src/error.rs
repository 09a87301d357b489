//! Error taxonomy surfaced by the tweet lifecycle

use std::fmt::Display;

use thiserror::Error;

use crate::ports::{ImageStoreError, StoreError};

/// Failure of a lifecycle operation, discriminated by kind
#[derive(Debug, Error)]
pub enum TweetError {
    /// Malformed or out-of-range caller input
    #[error("{0}")]
    InvalidArgument(String),

    /// Tweet, image reference or image file absent
    #[error("{0}")]
    NotFound(String),

    /// Operation not allowed in the tweet's current state
    #[error("{0}")]
    InvalidState(String),

    /// AI or social collaborator failed
    #[error("{service} failed: {detail}")]
    Upstream {
        service: &'static str,
        status: Option<u16>,
        detail: String,
    },

    /// Local persistence failed
    #[error("Storage error: {0}")]
    Storage(String),
}

impl TweetError {
    pub fn upstream(service: &'static str, err: impl Display) -> Self {
        Self::Upstream {
            service,
            status: None,
            detail: err.to_string(),
        }
    }
}

impl From<StoreError> for TweetError {
    fn from(err: StoreError) -> Self {
        Self::Storage(err.to_string())
    }
}

impl From<ImageStoreError> for TweetError {
    fn from(err: ImageStoreError) -> Self {
        match err {
            ImageStoreError::NotFound(path) => {
                Self::NotFound(format!("Image file not found: {}", path))
            }
            other => Self::Storage(other.to_string()),
        }
    }
}
