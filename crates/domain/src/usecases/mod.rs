//! Application use cases / business logic

pub mod pagination;
pub mod tweets;

pub use pagination::{PageInfo, PageRequest};
pub use tweets::{TweetService, TweetServiceConfig};
