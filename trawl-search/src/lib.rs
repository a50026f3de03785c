//! Search client for the Trawling Web social archive.
//!
//! Build a [`SearchParameters`], run it with [`TrawlingApi::search`], then keep calling
//! [`TrawlingApi::next_page`] while the returned page's `next` is non-empty.
//!
//! ```no_run
//! # async fn demo() -> Result<(), trawl_search::SearchError> {
//! use trawl_search::{SearchParameters, TrawlingApi};
//!
//! let api = TrawlingApi::new()?;
//! let params = SearchParameters::new("climate change")
//!     .with_token("my-token")
//!     .with_sort("published")
//!     .with_order("desc");
//!
//! let mut page = api.search(&params).await?;
//! loop {
//!     for post in &page.data {
//!         println!("@{}: {}", post.author.screen_name, post.text);
//!     }
//!     if !page.has_next() {
//!         break;
//!     }
//!     page = api.next_page(&page).await?;
//! }
//! # Ok(()) }
//! ```
pub mod trawling;

pub use trawling::*;
pub use trawl_http::TlsPolicy;
