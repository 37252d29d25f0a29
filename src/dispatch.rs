//! Announces new items to a channel and records them in the ledger.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::io::AsyncWriteExt;

use crate::error::{Error, Result};
use crate::ledger::NotificationLedger;
use crate::source::FeedItem;

/// Outbound chat connection.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Channels the bot currently sits in.  The scheduler polls every one.
    fn joined_channels(&self) -> Vec<String>;

    async fn send(&self, channel: &str, text: &str) -> Result<()>;
}

/// Writes every message to stdout as `<channel> <text>`.
pub struct ConsoleTransport {
    channels: Vec<String>,
}

impl ConsoleTransport {
    pub fn new(channels: Vec<String>) -> Self {
        Self { channels }
    }
}

#[async_trait]
impl Transport for ConsoleTransport {
    fn joined_channels(&self) -> Vec<String> {
        self.channels.clone()
    }

    async fn send(&self, channel: &str, text: &str) -> Result<()> {
        let line = format!("{channel} {text}\n");
        let mut stdout = tokio::io::stdout();
        stdout
            .write_all(line.as_bytes())
            .await
            .map_err(|e| Error::Transport(e.to_string()))?;
        stdout
            .flush()
            .await
            .map_err(|e| Error::Transport(e.to_string()))
    }
}

pub struct Dispatcher {
    ledger: Arc<NotificationLedger>,
    transport: Arc<dyn Transport>,
}

impl Dispatcher {
    pub fn new(ledger: Arc<NotificationLedger>, transport: Arc<dyn Transport>) -> Self {
        Self { ledger, transport }
    }

    /// Send one message per item, in order, marking each seen after its send
    /// succeeds.  Stops at the first failure; unsent items stay unseen and go
    /// out on a later tick.  Returns how many were sent.
    pub async fn dispatch(&self, channel: &str, items: &[FeedItem]) -> Result<usize> {
        for (sent, item) in items.iter().enumerate() {
            if let Err(e) = self.transport.send(channel, &item.message()).await {
                log::warn!(
                    "[DISPATCH] Send to {} failed after {} of {} items: {}",
                    channel,
                    sent,
                    items.len(),
                    e
                );
                return Err(e);
            }
            self.ledger.mark_seen(channel, item.id, Utc::now())?;
        }
        Ok(items.len())
    }
}
