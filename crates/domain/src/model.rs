//! Domain models and value objects

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::policy::DEFAULT_PAGE_LIMIT;

/// A generated tweet as persisted in the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tweet {
    /// Store-assigned identifier, never reused
    pub id: i64,
    /// Topic the content was generated from
    pub topic: String,
    /// Tweet body
    pub content: String,
    /// Whether the tweet has been published (one-way flag)
    pub posted: bool,
    /// Path of the locally stored image, if any
    pub image_path: Option<String>,
    /// When the tweet was created
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// A tweet about to be inserted; the store assigns the id
#[derive(Debug, Clone)]
pub struct NewTweet {
    pub topic: String,
    pub content: String,
    pub image_path: Option<String>,
    pub created_at: OffsetDateTime,
}

/// Partial edit of a draft tweet
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TweetUpdate {
    pub topic: Option<String>,
    pub content: Option<String>,
}

impl TweetUpdate {
    /// Drop blank fields so that only meaningful values count as provided
    pub fn normalized(self) -> Self {
        Self {
            topic: self
                .topic
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty()),
            content: self.content.filter(|c| !c.trim().is_empty()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.topic.is_none() && self.content.is_none()
    }
}

/// Filters shared by the count and page queries
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TweetFilter {
    /// Exact match on the posted flag
    pub posted: Option<bool>,
    /// Case-insensitive substring matched against topic or content
    pub search: Option<String>,
}

impl TweetFilter {
    /// In-process evaluation of the filter, used by non-SQL stores
    pub fn matches(&self, tweet: &Tweet) -> bool {
        if let Some(posted) = self.posted {
            if tweet.posted != posted {
                return false;
            }
        }

        match &self.search {
            Some(needle) => {
                let needle = needle.to_lowercase();
                tweet.topic.to_lowercase().contains(&needle)
                    || tweet.content.to_lowercase().contains(&needle)
            }
            None => true,
        }
    }
}

/// Raw listing request as received from a caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub posted: Option<bool>,
    pub search: Option<String>,
    pub limit: i64,
    pub offset: i64,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            posted: None,
            search: None,
            limit: DEFAULT_PAGE_LIMIT as i64,
            offset: 0,
        }
    }
}

/// One page of tweets plus the pagination counters
#[derive(Debug, Clone, Serialize)]
pub struct TweetPage {
    pub items: Vec<Tweet>,
    pub total_items: u64,
    pub total_pages: u64,
    pub current_page: u64,
    pub limit: u64,
}

/// Result of a successful generation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedTweet {
    pub id: i64,
    pub topic: String,
    pub content: String,
    pub image_path: Option<String>,
}

/// Outcome of a post call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PostStatus {
    #[serde(rename = "posted")]
    Posted,
    #[serde(rename = "already posted")]
    AlreadyPosted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostOutcome {
    pub status: PostStatus,
    pub content: String,
}

/// A freshly generated image recorded for a tweet
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedImage {
    pub image_path: String,
    pub tweet_id: i64,
}

/// Image file contents ready to be served
#[derive(Debug, Clone)]
pub struct ImageFile {
    pub path: String,
    pub bytes: Vec<u8>,
    pub format: ImageFormat,
}

/// Image encodings recognised from magic bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageFormat {
    #[default]
    Png,
    Jpeg,
    Webp,
    Gif,
}

impl ImageFormat {
    /// Detect the format from the leading bytes, defaulting to PNG
    pub fn sniff(bytes: &[u8]) -> Self {
        if bytes.starts_with(&[0x89, b'P', b'N', b'G']) {
            Self::Png
        } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Self::Jpeg
        } else if bytes.len() >= 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
            Self::Webp
        } else if bytes.starts_with(b"GIF8") {
            Self::Gif
        } else {
            Self::Png
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::Webp => "webp",
            Self::Gif => "gif",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Webp => "image/webp",
            Self::Gif => "image/gif",
        }
    }
}

/// Raw response of the social platform's publish endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishResponse {
    pub status_code: u16,
    pub body: String,
}

impl PublishResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}
