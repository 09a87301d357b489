//! tweetbot adapters crate
//!
//! This crate contains infrastructure adapters implementing the domain ports:
//! - `store`: SQLite and in-memory tweet stores
//! - `images`: Filesystem image store
//! - `llm`: Tweet writers (Gemini, stub)
//! - `imagegen`: Text-to-image generators (Hugging Face, stub)
//! - `social`: Social publishers (Twitter clone, stub)

mod images_fs;
mod store_memory;
mod store_sqlite;

pub mod imagegen;
pub mod llm;
pub mod social;

/// Re-exports for tweet store adapters
pub mod store {
    pub use crate::store_memory::InMemoryTweetStore;
    pub use crate::store_sqlite::SqliteTweetStore;
}

/// Re-exports for image storage adapters
pub mod images {
    pub use crate::images_fs::FsImageStore;
}
