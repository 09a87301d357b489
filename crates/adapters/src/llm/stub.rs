//! Stub writer for testing and offline mode

use async_trait::async_trait;
use tweetbot_domain::{GenerationError, TweetWriter};

/// Stub writer that returns configurable responses
pub struct StubWriter {
    text: Option<String>,
    needs_image: bool,
    error: Option<GenerationError>,
}

impl StubWriter {
    /// Create a stub that echoes the topic into a canned tweet
    pub fn echo() -> Self {
        Self {
            text: None,
            needs_image: false,
            error: None,
        }
    }

    /// Create a stub that always returns the given text
    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            needs_image: false,
            error: None,
        }
    }

    /// Create a stub that always returns an error
    pub fn with_error(error: GenerationError) -> Self {
        Self {
            text: None,
            needs_image: false,
            error: Some(error),
        }
    }

    /// Make the stub ask for an image on every topic
    pub fn wanting_images(mut self) -> Self {
        self.needs_image = true;
        self
    }

    fn configured_error(&self) -> Option<GenerationError> {
        self.error.as_ref().map(|error| match error {
            GenerationError::Api(msg) => GenerationError::Api(msg.clone()),
            GenerationError::InvalidFormat(msg) => GenerationError::InvalidFormat(msg.clone()),
            GenerationError::RateLimited => GenerationError::RateLimited,
            GenerationError::Timeout => GenerationError::Timeout,
            GenerationError::Config(msg) => GenerationError::Config(msg.clone()),
        })
    }
}

impl Default for StubWriter {
    fn default() -> Self {
        Self::echo()
    }
}

#[async_trait]
impl TweetWriter for StubWriter {
    async fn write_tweet(&self, topic: &str) -> Result<String, GenerationError> {
        if let Some(error) = self.configured_error() {
            return Err(error);
        }

        Ok(match &self.text {
            Some(text) => text.clone(),
            None => {
                let tag: String = topic.chars().filter(|c| c.is_alphanumeric()).collect();
                format!("Thoughts on {} #{}", topic, tag.to_lowercase())
            }
        })
    }

    async fn needs_image(&self, _topic: &str) -> Result<bool, GenerationError> {
        if let Some(error) = self.configured_error() {
            return Err(error);
        }
        Ok(self.needs_image)
    }
}
