//! Port definitions (traits) for external dependencies
//!
//! These traits define the boundaries between the domain and external systems.
//! Adapters implement these traits to connect to real infrastructure.

use async_trait::async_trait;
use thiserror::Error;
use time::OffsetDateTime;

use crate::model::{NewTweet, PublishResponse, Tweet, TweetFilter, TweetUpdate};

/// Error type for tweet store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Port for persisting tweets
#[async_trait]
pub trait TweetStore: Send + Sync {
    /// Insert a new tweet and return it with its assigned id
    async fn insert(&self, tweet: &NewTweet) -> Result<Tweet, StoreError>;

    /// Fetch a tweet by id
    async fn get(&self, id: i64) -> Result<Option<Tweet>, StoreError>;

    /// Apply the provided fields to a tweet that is not posted yet.
    ///
    /// Returns `None` when no unposted tweet with this id exists. Both fields
    /// are written in a single statement.
    async fn update_draft(&self, id: i64, update: &TweetUpdate)
    -> Result<Option<Tweet>, StoreError>;

    /// Flip `posted` to true. Returns false if the row was missing or already posted.
    async fn mark_posted(&self, id: i64) -> Result<bool, StoreError>;

    /// Replace or clear the image path. Returns false if the row was missing.
    async fn set_image_path(&self, id: i64, image_path: Option<&str>) -> Result<bool, StoreError>;

    /// Count tweets matching the filter
    async fn count(&self, filter: &TweetFilter) -> Result<u64, StoreError>;

    /// Page of matching tweets ordered by id descending
    async fn list(
        &self,
        filter: &TweetFilter,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<Tweet>, StoreError>;
}

/// Error type for generative AI calls
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("API error: {0}")]
    Api(String),
    #[error("Invalid response format: {0}")]
    InvalidFormat(String),
    #[error("Rate limited")]
    RateLimited,
    #[error("Timeout")]
    Timeout,
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Port for the text side of the AI collaborator
#[async_trait]
pub trait TweetWriter: Send + Sync {
    /// Write tweet text about a topic
    async fn write_tweet(&self, topic: &str) -> Result<String, GenerationError>;

    /// Decide whether a tweet about this topic should carry an image
    async fn needs_image(&self, topic: &str) -> Result<bool, GenerationError>;
}

/// Port for text-to-image generation
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Generate encoded image bytes illustrating the topic
    async fn generate_image(&self, topic: &str) -> Result<Vec<u8>, GenerationError>;
}

/// Error type for image file storage
#[derive(Debug, Error)]
pub enum ImageStoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image file not found: {0}")]
    NotFound(String),
}

/// Port for storing generated image files
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Save image bytes under a fresh unique name, returning the path
    async fn save(&self, bytes: &[u8]) -> Result<String, ImageStoreError>;

    /// Whether a file exists at the path
    async fn exists(&self, path: &str) -> bool;

    /// Read the file at the path
    async fn read(&self, path: &str) -> Result<Vec<u8>, ImageStoreError>;

    /// Remove the file at the path
    async fn remove(&self, path: &str) -> Result<(), ImageStoreError>;
}

/// Error type for publisher transport failures
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Timeout")]
    Timeout,
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Port for publishing tweet text to the social platform.
///
/// Any HTTP response is returned as-is; only transport failures are errors.
#[async_trait]
pub trait SocialPublisher: Send + Sync {
    async fn publish(&self, text: &str) -> Result<PublishResponse, PublishError>;

    /// Get the platform name
    fn platform(&self) -> &'static str;
}

/// Port for time/clock operations (enables deterministic testing)
pub trait Clock: Send + Sync {
    /// Get the current time
    fn now(&self) -> OffsetDateTime;
}

/// Real clock implementation
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}
