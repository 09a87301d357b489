//! Twitter-clone HTTP publisher

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use std::time::Duration;
use tweetbot_domain::{PublishError, PublishResponse, SocialPublisher};

/// Publisher posting tweet text to a Twitter-clone service
pub struct TwitterClonePublisher {
    client: Client,
    url: String,
    api_key: SecretString,
    username: String,
}

impl TwitterClonePublisher {
    pub fn new(
        url: String,
        api_key: SecretString,
        username: String,
        timeout_secs: u64,
    ) -> Result<Self, PublishError> {
        if url.trim().is_empty() {
            return Err(PublishError::Config(
                "Twitter clone URL is empty".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| PublishError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url,
            api_key,
            username,
        })
    }
}

#[derive(Serialize)]
struct CreatePostRequest<'a> {
    username: &'a str,
    text: &'a str,
}

#[async_trait]
impl SocialPublisher for TwitterClonePublisher {
    async fn publish(&self, text: &str) -> Result<PublishResponse, PublishError> {
        let request = CreatePostRequest {
            username: &self.username,
            text,
        };

        let response = self
            .client
            .post(&self.url)
            .header("api-key", self.api_key.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    PublishError::Timeout
                } else {
                    PublishError::Transport(e.to_string())
                }
            })?;

        let status_code = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();

        tracing::debug!(status_code, "Twitter clone responded");

        Ok(PublishResponse { status_code, body })
    }

    fn platform(&self) -> &'static str {
        "twitter_clone"
    }
}
