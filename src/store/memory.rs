use std::collections::HashMap;
use std::sync::Mutex;

use super::{channel_key, KeyValueStore};
use crate::error::{Error, Result};

/// In-process store backed by a `HashMap`.  Nothing survives a restart.
#[derive(Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<(String, String), String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get_channel_value(&self, channel: &str, key: &str) -> Result<Option<String>> {
        let values = self
            .values
            .lock()
            .map_err(|e| Error::StoreUnavailable(e.to_string()))?;
        Ok(values.get(&(channel_key(channel), key.to_string())).cloned())
    }

    fn set_channel_value(&self, channel: &str, key: &str, value: &str) -> Result<()> {
        let mut values = self
            .values
            .lock()
            .map_err(|e| Error::StoreUnavailable(e.to_string()))?;
        values.insert((channel_key(channel), key.to_string()), value.to_string());
        Ok(())
    }
}
