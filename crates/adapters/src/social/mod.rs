//! Social platform publishing adapters

mod twitter_clone;

pub use twitter_clone::TwitterClonePublisher;

use async_trait::async_trait;
use std::sync::Mutex;
use tweetbot_domain::{PublishError, PublishResponse, SocialPublisher};

/// Stub publisher that records texts and answers with a fixed status
pub struct StubSocialPublisher {
    status_code: u16,
    published: Mutex<Vec<String>>,
}

impl StubSocialPublisher {
    /// Stub that accepts every post
    pub fn accepting() -> Self {
        Self::with_status(200)
    }

    /// Stub that answers every post with the given status
    pub fn with_status(status_code: u16) -> Self {
        Self {
            status_code,
            published: Mutex::new(Vec::new()),
        }
    }

    /// Texts received so far
    pub fn published(&self) -> Vec<String> {
        self.published
            .lock()
            .map(|texts| texts.clone())
            .unwrap_or_default()
    }
}

impl Default for StubSocialPublisher {
    fn default() -> Self {
        Self::accepting()
    }
}

#[async_trait]
impl SocialPublisher for StubSocialPublisher {
    async fn publish(&self, text: &str) -> Result<PublishResponse, PublishError> {
        if let Ok(mut texts) = self.published.lock() {
            texts.push(text.to_string());
        }

        Ok(PublishResponse {
            status_code: self.status_code,
            body: if (200..300).contains(&self.status_code) {
                r#"{"status":"ok"}"#.to_string()
            } else {
                r#"{"status":"rejected"}"#.to_string()
            },
        })
    }

    fn platform(&self) -> &'static str {
        "stub"
    }
}

/// Publisher standing in when credentials are missing; every publish fails
pub struct UnconfiguredPublisher {
    reason: String,
}

impl UnconfiguredPublisher {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl SocialPublisher for UnconfiguredPublisher {
    async fn publish(&self, _text: &str) -> Result<PublishResponse, PublishError> {
        Err(PublishError::Config(self.reason.clone()))
    }

    fn platform(&self) -> &'static str {
        "twitter_clone"
    }
}
