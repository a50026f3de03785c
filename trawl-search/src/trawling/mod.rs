//! Trawling Web `posts_full` integration surface.
//!
//! `query` turns [`SearchParameters`] into the canonical request URL, `client` runs
//! searches and follows `next` cursors, and `types` holds the wire models.
pub mod client;
pub mod query;
pub mod types;

pub use client::{SearchError, TrawlingApi, Transport};
pub use query::{DEFAULT_ENDPOINT, SearchParameters};
pub use types::{Author, Post, ResultPage, SearchResponse, ServiceError};
