//! tweetbot domain crate
//!
//! This crate contains the core domain logic following hexagonal architecture:
//! - `model`: Domain entities and value objects
//! - `ports`: Trait definitions for external dependencies (adapters)
//! - `usecases`: Tweet lifecycle and pagination
//! - `policy`: Input limits and validation
//! - `error`: Error taxonomy returned by the use cases

pub mod error;
pub mod model;
pub mod policy;
pub mod ports;
pub mod usecases;

pub use error::TweetError;
pub use model::*;
pub use ports::*;
