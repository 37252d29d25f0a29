//! Background feed polling.
//!
//! Runs as a tokio task, calling [`Monitor::tick`] on a fixed interval until
//! the shutdown future resolves.
//!
//! ## For contributors
//!
//! Channels are polled one after another inside a tick.  Fanning out across
//! channels is safe as long as each channel keeps its own
//! query → filter → send → mark order.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{self, Instant, MissedTickBehavior};

use crate::app::Monitor;

/// Default time between ticks.
pub const POLL_INTERVAL: Duration = Duration::from_secs(60);

/// Poll until `shutdown` completes.  The first tick fires one `period` after
/// start.  A tick in progress when `shutdown` fires is dropped where it
/// stands; whatever it already marked stays marked, the rest is retried on
/// the next run.  Returns the number of completed ticks.
pub async fn run(monitor: Arc<Monitor>, period: Duration, shutdown: impl Future<Output = ()>) -> usize {
    let mut interval = time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tokio::pin!(shutdown);

    let mut ticks = 0;
    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            report = async {
                interval.tick().await;
                monitor.tick().await
            } => {
                ticks += 1;
                log::info!(
                    "[POLL] Tick {}: {} channels, {} sent, {} failed",
                    ticks,
                    report.channels,
                    report.emitted,
                    report.failed
                );
            }
        }
    }

    log::info!("[POLL] Stopped after {} ticks", ticks);
    ticks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::tests::{item, FakeApi};
    use crate::commands::StaticAuthorizer;
    use crate::dispatch::tests::FakeTransport;
    use crate::store::MemoryStore;

    fn monitor(api: Arc<FakeApi>, transport: Arc<FakeTransport>) -> Arc<Monitor> {
        Arc::new(Monitor::new(
            Arc::new(MemoryStore::new()),
            api,
            transport,
            Box::new(StaticAuthorizer::new()),
            ".",
        ))
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_on_interval_until_shutdown() {
        let api = Arc::new(FakeApi::default().with_site("stackoverflow", vec![item(1, "q")]));
        let transport = Arc::new(FakeTransport::in_channels(&["#chan"]));
        let monitor = monitor(api.clone(), transport.clone());
        monitor.registry().add("#chan", "stackoverflow", "rust").unwrap();

        let ticks = run(monitor, POLL_INTERVAL, time::sleep(Duration::from_secs(150))).await;

        assert_eq!(ticks, 2, "ticks at 60s and 120s, stop at 150s");
        assert_eq!(api.query_count(), 2);
        assert_eq!(transport.messages_to("#chan").len(), 1, "second tick finds nothing new");
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_before_first_tick_polls_nothing() {
        let api = Arc::new(FakeApi::default());
        let transport = Arc::new(FakeTransport::in_channels(&["#chan"]));
        let monitor = monitor(api.clone(), transport);

        let ticks = run(monitor, POLL_INTERVAL, time::sleep(Duration::from_secs(30))).await;
        assert_eq!(ticks, 0);
        assert_eq!(api.query_count(), 0);
    }
}
