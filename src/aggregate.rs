//! Collapses a channel's subscriptions into one search per site and filters
//! the results against the ledger.

use std::sync::Arc;

use crate::error::Result;
use crate::ledger::NotificationLedger;
use crate::registry::{SubscriptionRegistry, Subscriptions};
use crate::source::{FeedApi, FeedItem, FeedQuery, FeedResponse};

pub struct Aggregator {
    registry: Arc<SubscriptionRegistry>,
    ledger: Arc<NotificationLedger>,
    api: Arc<dyn FeedApi>,
}

/// One query per site that has at least one tag, in registry order.
pub fn build_queries(subs: &Subscriptions) -> Vec<FeedQuery> {
    subs.iter()
        .filter(|(_, tags)| !tags.is_empty())
        .map(|(site, tags)| FeedQuery {
            site: site.clone(),
            tags: tags.iter().cloned().collect(),
        })
        .collect()
}

impl Aggregator {
    pub fn new(
        registry: Arc<SubscriptionRegistry>,
        ledger: Arc<NotificationLedger>,
        api: Arc<dyn FeedApi>,
    ) -> Self {
        Self {
            registry,
            ledger,
            api,
        }
    }

    /// Items not yet announced to `channel`.
    ///
    /// Sites are queried in registry order and each site's items keep the
    /// API's newest-first order.  Nothing is deduplicated across sites.  A
    /// failing site is logged and skipped; a failing store aborts the whole
    /// channel.
    pub async fn collect_unseen(&self, channel: &str) -> Result<Vec<FeedItem>> {
        let subs = self.registry.get(channel)?;
        let mut unseen = Vec::new();

        for query in build_queries(&subs) {
            let response = match self.api.search(&query).await {
                Ok(response) => response,
                Err(e) => {
                    log::warn!(
                        "[AGGREGATE] Skipping {} for {}: {}",
                        query.site,
                        channel,
                        e
                    );
                    continue;
                }
            };
            log_quota(channel, &query, &response);

            for item in response.items {
                if !self.ledger.is_seen(channel, item.id)? {
                    unseen.push(item);
                }
            }
        }

        Ok(unseen)
    }
}

fn log_quota(channel: &str, query: &FeedQuery, response: &FeedResponse) {
    let quota = response.quota;
    let backoff = quota
        .backoff
        .map(|secs| format!(" {secs} second backoff"))
        .unwrap_or_default();
    log::debug!(
        "[AGGREGATE] Got {} questions from {} for {}. {:.0}% ({}/{}) of our quota remaining.{}",
        response.items.len(),
        query.site,
        channel,
        quota.percent_remaining(),
        quota.remaining,
        quota.max,
        backoff
    );
}
