//! Feed search abstraction layer.
//!
//! This module defines the [`FeedApi`] trait the aggregator queries, plus the
//! request and response types that cross it.  The concrete HTTP client lives
//! in [`stackexchange`].
//!
//! ## For contributors - adding a new backend
//!
//! 1. Create a new file in this directory.
//! 2. Implement [`FeedApi`] for your client, returning [`FeedItem`]s newest
//!    first.
//! 3. Re-export it below and construct it in `main.rs`.
//!
//! The aggregator, ledger and dispatcher are all backend-agnostic.

mod feed_item;
mod stackexchange;

pub use feed_item::FeedItem;
pub use stackexchange::StackExchangeApi;

use async_trait::async_trait;

use crate::error::Result;

/// One search: every tag a channel follows on one site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedQuery {
    pub site: String,
    pub tags: Vec<String>,
}

impl FeedQuery {
    /// The `tagged` parameter: tags joined with `;`.
    pub fn tagged(&self) -> String {
        self.tags.join(";")
    }
}

/// Rate-limit metadata the API returns alongside each page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Quota {
    pub remaining: u64,
    pub max: u64,
    /// Seconds the API asks callers to wait before the next request.
    pub backoff: Option<u64>,
}

impl Quota {
    pub fn percent_remaining(&self) -> f64 {
        if self.max == 0 {
            return 0.0;
        }
        self.remaining as f64 / self.max as f64 * 100.0
    }
}

#[derive(Debug, Clone, Default)]
pub struct FeedResponse {
    /// Newest first.
    pub items: Vec<FeedItem>,
    pub quota: Quota,
}

/// Trait that every search backend must implement.
///
/// The aggregator calls [`search()`](FeedApi::search) once per subscribed
/// site per channel per tick, from the scheduler task and from the command
/// loop, so implementations must be `Send + Sync`.
#[async_trait]
pub trait FeedApi: Send + Sync {
    /// Run one search.  A non-success response is an
    /// [`Error::FeedQueryFailed`](crate::error::Error::FeedQueryFailed).
    async fn search(&self, query: &FeedQuery) -> Result<FeedResponse>;
}
