//! Per-channel subscription sets.
//!
//! Each channel's subscriptions live in the store as one JSON object under
//! [`SUBSCRIPTIONS_KEY`], shaped `{"site": ["tag", ...]}`.  Every mutation
//! rewrites the whole object; there are no partial updates.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::store::KeyValueStore;

/// Store key holding a channel's serialized subscriptions.
pub const SUBSCRIPTIONS_KEY: &str = "stackexchange_subscriptions";

/// `site -> tags` for one channel.
pub type Subscriptions = BTreeMap<String, BTreeSet<String>>;

pub struct SubscriptionRegistry {
    store: Arc<dyn KeyValueStore>,
}

impl SubscriptionRegistry {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Current subscriptions for `channel`.
    ///
    /// A missing record is an empty map.  So is a record that no longer
    /// parses as `site -> [tag]`; it is logged and will be overwritten by the
    /// next mutation.
    pub fn get(&self, channel: &str) -> Result<Subscriptions> {
        let Some(raw) = self.store.get_channel_value(channel, SUBSCRIPTIONS_KEY)? else {
            return Ok(Subscriptions::new());
        };

        match serde_json::from_str::<Subscriptions>(&raw) {
            Ok(subs) => Ok(subs),
            Err(e) => {
                log::warn!(
                    "[REGISTRY] Ignoring malformed subscriptions for {}: {}",
                    channel,
                    e
                );
                Ok(Subscriptions::new())
            }
        }
    }

    /// Subscribe `channel` to `tag` on `site`.  Returns `false` when the tag
    /// was already present, in which case nothing is written.
    pub fn add(&self, channel: &str, site: &str, tag: &str) -> Result<bool> {
        let mut subs = self.get(channel)?;
        let added = subs
            .entry(site.to_string())
            .or_default()
            .insert(tag.to_string());
        if added {
            self.save(channel, &subs)?;
        }
        Ok(added)
    }

    /// Remove `tag` on `site`.  Returns `false` when the pair was not
    /// subscribed.  The site entry is kept even when its last tag goes.
    pub fn remove(&self, channel: &str, site: &str, tag: &str) -> Result<bool> {
        let mut subs = self.get(channel)?;
        let removed = subs
            .get_mut(site)
            .map(|tags| tags.remove(tag))
            .unwrap_or(false);
        if removed {
            self.save(channel, &subs)?;
        }
        Ok(removed)
    }

    fn save(&self, channel: &str, subs: &Subscriptions) -> Result<()> {
        let raw =
            serde_json::to_string(subs).map_err(|e| Error::StoreUnavailable(e.to_string()))?;
        self.store.set_channel_value(channel, SUBSCRIPTIONS_KEY, &raw)
    }
}
