//! In-memory tweet store for testing and offline mode

use async_trait::async_trait;
use std::sync::RwLock;
use tweetbot_domain::{NewTweet, StoreError, Tweet, TweetFilter, TweetStore, TweetUpdate};

struct Inner {
    tweets: Vec<Tweet>,
    next_id: i64,
}

/// In-memory tweet store implementation
pub struct InMemoryTweetStore {
    inner: RwLock<Inner>,
}

impl InMemoryTweetStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                tweets: Vec::new(),
                next_id: 1,
            }),
        }
    }
}

impl Default for InMemoryTweetStore {
    fn default() -> Self {
        Self::new()
    }
}

fn lock_error(e: impl std::fmt::Display) -> StoreError {
    StoreError::Database(e.to_string())
}

#[async_trait]
impl TweetStore for InMemoryTweetStore {
    async fn insert(&self, tweet: &NewTweet) -> Result<Tweet, StoreError> {
        let mut inner = self.inner.write().map_err(lock_error)?;

        let row = Tweet {
            id: inner.next_id,
            topic: tweet.topic.clone(),
            content: tweet.content.clone(),
            posted: false,
            image_path: tweet.image_path.clone(),
            created_at: tweet.created_at,
        };
        inner.next_id += 1;
        inner.tweets.push(row.clone());

        Ok(row)
    }

    async fn get(&self, id: i64) -> Result<Option<Tweet>, StoreError> {
        let inner = self.inner.read().map_err(lock_error)?;
        Ok(inner.tweets.iter().find(|t| t.id == id).cloned())
    }

    async fn update_draft(
        &self,
        id: i64,
        update: &TweetUpdate,
    ) -> Result<Option<Tweet>, StoreError> {
        let mut inner = self.inner.write().map_err(lock_error)?;

        let Some(tweet) = inner.tweets.iter_mut().find(|t| t.id == id && !t.posted) else {
            return Ok(None);
        };

        if let Some(topic) = &update.topic {
            tweet.topic = topic.clone();
        }
        if let Some(content) = &update.content {
            tweet.content = content.clone();
        }

        Ok(Some(tweet.clone()))
    }

    async fn mark_posted(&self, id: i64) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().map_err(lock_error)?;

        match inner.tweets.iter_mut().find(|t| t.id == id && !t.posted) {
            Some(tweet) => {
                tweet.posted = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn set_image_path(&self, id: i64, image_path: Option<&str>) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().map_err(lock_error)?;

        match inner.tweets.iter_mut().find(|t| t.id == id) {
            Some(tweet) => {
                tweet.image_path = image_path.map(str::to_string);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn count(&self, filter: &TweetFilter) -> Result<u64, StoreError> {
        let inner = self.inner.read().map_err(lock_error)?;
        Ok(inner.tweets.iter().filter(|t| filter.matches(t)).count() as u64)
    }

    async fn list(
        &self,
        filter: &TweetFilter,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<Tweet>, StoreError> {
        let inner = self.inner.read().map_err(lock_error)?;

        // Rows are appended in id order, so reversing gives id descending
        Ok(inner
            .tweets
            .iter()
            .rev()
            .filter(|t| filter.matches(t))
            .skip(usize::try_from(offset).unwrap_or(usize::MAX))
            .take(usize::try_from(limit).unwrap_or(usize::MAX))
            .cloned()
            .collect())
    }
}
