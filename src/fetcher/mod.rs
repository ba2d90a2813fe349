pub mod client;
pub mod errors;
pub mod pipeline;
pub mod types;

pub use client::FeedClient;
pub use errors::FetchError;
pub use types::{FeedKind, FetchResult, PageResponse};
