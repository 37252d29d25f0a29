//! Persistent key-value storage, scoped per channel.
//!
//! The registry and the ledger only ever see the [`KeyValueStore`] trait, so
//! any backend with string get/set semantics can sit underneath them.  Two
//! adapters ship with the crate:
//!
//! * [`MemoryStore`] keeps everything in a `HashMap` and is used by the tests
//!   and by `MONITOR_DATABASE_URL=:memory:` runs.
//! * [`SqliteStore`] persists to a single SQLite table so the ledger survives
//!   restarts.

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::error::Result;

/// Channel-scoped string storage.
///
/// Implementations must be safe to share between the scheduler and the
/// command loop, hence `Send + Sync`.  All I/O failures are reported as
/// [`crate::error::Error::StoreUnavailable`].
pub trait KeyValueStore: Send + Sync {
    /// Read `key` for `channel`, `None` when it was never written.
    fn get_channel_value(&self, channel: &str, key: &str) -> Result<Option<String>>;

    /// Write `value` under `key` for `channel`, replacing any previous value.
    fn set_channel_value(&self, channel: &str, key: &str, value: &str) -> Result<()>;
}

/// Channel names are case-insensitive on chat networks, so both adapters
/// key on the lowercased form.
pub(crate) fn channel_key(channel: &str) -> String {
    channel.to_lowercase()
}
