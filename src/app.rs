//! Application state: the registry, ledger and the components that drive
//! them, bundled into one [`Monitor`] shared by the poller and the command
//! loop.

use std::sync::Arc;

use crate::aggregate::Aggregator;
use crate::commands::Authorizer;
use crate::dispatch::{Dispatcher, Transport};
use crate::error::Result;
use crate::ledger::NotificationLedger;
use crate::registry::SubscriptionRegistry;
use crate::source::FeedApi;
use crate::store::KeyValueStore;

pub struct Monitor {
    registry: Arc<SubscriptionRegistry>,
    ledger: Arc<NotificationLedger>,
    aggregator: Aggregator,
    dispatcher: Dispatcher,
    transport: Arc<dyn Transport>,
    authorizer: Box<dyn Authorizer>,
    command_prefix: String,
}

/// Outcome of one scheduler tick.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    /// Channels visited.
    pub channels: usize,
    /// Messages sent across all channels.
    pub emitted: usize,
    /// Channels whose processing stopped on an error.
    pub failed: usize,
}

impl Monitor {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        api: Arc<dyn FeedApi>,
        transport: Arc<dyn Transport>,
        authorizer: Box<dyn Authorizer>,
        command_prefix: impl Into<String>,
    ) -> Self {
        let registry = Arc::new(SubscriptionRegistry::new(store.clone()));
        let ledger = Arc::new(NotificationLedger::new(store));
        Self {
            aggregator: Aggregator::new(registry.clone(), ledger.clone(), api),
            dispatcher: Dispatcher::new(ledger.clone(), transport.clone()),
            registry,
            ledger,
            transport,
            authorizer,
            command_prefix: command_prefix.into(),
        }
    }

    pub fn registry(&self) -> &SubscriptionRegistry {
        &self.registry
    }

    pub fn ledger(&self) -> &NotificationLedger {
        &self.ledger
    }

    pub fn aggregator(&self) -> &Aggregator {
        &self.aggregator
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    pub fn authorizer(&self) -> &dyn Authorizer {
        self.authorizer.as_ref()
    }

    pub fn command_prefix(&self) -> &str {
        &self.command_prefix
    }

    /// Poll every joined channel once, one after another.  A failing channel
    /// is logged and counted; it never stops the others.
    pub async fn tick(&self) -> TickReport {
        let mut report = TickReport::default();

        for channel in self.transport.joined_channels() {
            report.channels += 1;
            match self.poll_channel(&channel).await {
                Ok(sent) => report.emitted += sent,
                Err(e) => {
                    report.failed += 1;
                    log::warn!("[POLL] Channel {} failed this tick: {}", channel, e);
                }
            }
        }

        report
    }

    async fn poll_channel(&self, channel: &str) -> Result<usize> {
        let items = self.aggregator.collect_unseen(channel).await?;
        if items.is_empty() {
            return Ok(0);
        }
        self.dispatcher.dispatch(channel, &items).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::tests::{item, FakeApi};
    use crate::commands::StaticAuthorizer;
    use crate::dispatch::tests::FakeTransport;
    use crate::error::Error;
    use crate::registry::SUBSCRIPTIONS_KEY;
    use crate::source::FeedItem;
    use crate::store::MemoryStore;

    /// Store whose writes fail for one channel.
    struct BrokenFor {
        inner: MemoryStore,
        channel: &'static str,
    }

    impl KeyValueStore for BrokenFor {
        fn get_channel_value(&self, channel: &str, key: &str) -> Result<Option<String>> {
            self.inner.get_channel_value(channel, key)
        }

        fn set_channel_value(&self, channel: &str, key: &str, value: &str) -> Result<()> {
            if channel == self.channel && key != SUBSCRIPTIONS_KEY {
                return Err(Error::StoreUnavailable("disk full".into()));
            }
            self.inner.set_channel_value(channel, key, value)
        }
    }

    fn build(
        store: Arc<dyn KeyValueStore>,
        api: FakeApi,
        channels: &[&str],
    ) -> (Arc<FakeTransport>, Monitor) {
        let transport = Arc::new(FakeTransport::in_channels(channels));
        let monitor = Monitor::new(
            store,
            Arc::new(api),
            transport.clone(),
            Box::new(StaticAuthorizer::new()),
            ".",
        );
        (transport, monitor)
    }

    #[tokio::test]
    async fn tick_announces_new_question_once() {
        let question = FeedItem {
            id: 42,
            title: "How to own a pointer".into(),
            link: ".../42/99".into(),
            answered: false,
        };
        let (transport, monitor) = build(
            Arc::new(MemoryStore::new()),
            FakeApi::default().with_site("stackoverflow", vec![question]),
            &["#chan"],
        );
        monitor.registry().add("#chan", "stackoverflow", "rust").unwrap();

        let report = monitor.tick().await;

        assert_eq!(report, TickReport { channels: 1, emitted: 1, failed: 0 });
        assert_eq!(
            transport.messages_to("#chan"),
            vec!["How to own a pointer [.../42]".to_string()]
        );
        assert!(monitor.ledger().is_seen("#chan", 42).unwrap());

        // Same search result next tick: nothing new.
        let report = monitor.tick().await;
        assert_eq!(report.emitted, 0);
        assert_eq!(transport.messages_to("#chan").len(), 1);
    }

    #[tokio::test]
    async fn failing_site_still_emits_other_sites() {
        let (transport, monitor) = build(
            Arc::new(MemoryStore::new()),
            FakeApi::default().with_site("superuser", vec![item(8, "works")]),
            &["#chan"],
        );
        monitor.registry().add("#chan", "broken", "x").unwrap();
        monitor.registry().add("#chan", "superuser", "linux").unwrap();

        let report = monitor.tick().await;
        assert_eq!(report.failed, 0);
        assert_eq!(transport.messages_to("#chan").len(), 1);
    }

    #[tokio::test]
    async fn channel_failure_is_isolated() {
        let store = Arc::new(BrokenFor {
            inner: MemoryStore::new(),
            channel: "#broken",
        });
        let (transport, monitor) = build(
            store,
            FakeApi::default().with_site("stackoverflow", vec![item(1, "q")]),
            &["#broken", "#fine"],
        );
        monitor.registry().add("#broken", "stackoverflow", "rust").unwrap();
        monitor.registry().add("#fine", "stackoverflow", "rust").unwrap();

        let report = monitor.tick().await;

        assert_eq!(report, TickReport { channels: 2, emitted: 1, failed: 1 });
        assert_eq!(transport.messages_to("#fine").len(), 1);
        // The send went out but the mark failed, so #broken gets it again.
        assert_eq!(transport.messages_to("#broken").len(), 1);
        monitor.tick().await;
        assert_eq!(transport.messages_to("#broken").len(), 2);
        assert_eq!(transport.messages_to("#fine").len(), 1);
    }

    #[tokio::test]
    async fn channels_without_subscriptions_are_quiet() {
        let (transport, monitor) = build(Arc::new(MemoryStore::new()), FakeApi::default(), &["#idle"]);
        let report = monitor.tick().await;
        assert_eq!(report, TickReport { channels: 1, emitted: 0, failed: 0 });
        assert!(transport.sent.lock().unwrap().is_empty());
    }
}
