//! Text-to-image adapters

mod huggingface;

pub use huggingface::{HuggingFaceConfig, HuggingFaceImageGenerator};

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use tweetbot_domain::{GenerationError, ImageGenerator};

/// Build the illustration prompt for a topic
pub fn build_image_prompt(topic: &str) -> String {
    format!(
        "A clean, eye-catching social media illustration about {}, \
         vibrant colors, no text",
        topic
    )
}

/// 1x1 transparent PNG returned by the stub generator
pub const PLACEHOLDER_PNG: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
    0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F,
    0x15, 0xC4, 0x89, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x00,
    0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00, 0x00, 0x00, 0x00, 0x49,
    0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
];

/// Stub image generator for testing and offline mode
pub struct StubImageGenerator {
    bytes: Vec<u8>,
    calls: AtomicUsize,
}

impl StubImageGenerator {
    /// Stub returning a placeholder PNG
    pub fn placeholder() -> Self {
        Self::with_bytes(PLACEHOLDER_PNG.to_vec())
    }

    /// Stub returning fixed bytes (empty bytes simulate a failed generation)
    pub fn with_bytes(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of images generated so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for StubImageGenerator {
    fn default() -> Self {
        Self::placeholder()
    }
}

#[async_trait]
impl ImageGenerator for StubImageGenerator {
    async fn generate_image(&self, _topic: &str) -> Result<Vec<u8>, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.bytes.clone())
    }
}
