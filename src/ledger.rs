//! Record of which questions each channel has already been told about.
//!
//! One store key per `(channel, question)`: presence means "announced".  The
//! stored timestamp is informational only.  Entries are never evicted.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::store::KeyValueStore;

pub struct NotificationLedger {
    store: Arc<dyn KeyValueStore>,
}

/// Store key for a question's ledger entry.
pub fn posted_key(item_id: u64) -> String {
    format!("stackexchange-posted-{item_id}")
}

impl NotificationLedger {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn is_seen(&self, channel: &str, item_id: u64) -> Result<bool> {
        Ok(self
            .store
            .get_channel_value(channel, &posted_key(item_id))?
            .is_some())
    }

    /// Record `item_id` as announced at `at`, overwriting any earlier entry.
    pub fn mark_seen(&self, channel: &str, item_id: u64, at: DateTime<Utc>) -> Result<()> {
        self.store
            .set_channel_value(channel, &posted_key(item_id), &at.timestamp().to_string())
    }
}
