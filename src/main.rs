//! se-monitor - announces new StackExchange questions to chat channels.
//!
//! ## Architecture overview
//!
//! ```text
//! ┌──────────┐ tick() ┌──────────────┐ search ┌──────────────┐
//! │ poll.rs  │ ─────► │  aggregate   │ ─────► │   source/    │
//! │ (task)   │        │ (per site)   │        │ (HTTP API)   │
//! └──────────┘        └──────────────┘        └──────────────┘
//!                        │ unseen items
//!                        ▼
//!                     ┌──────────────┐ send   ┌──────────────┐
//!                     │  dispatch    │ ─────► │  Transport   │
//!                     │ (mark seen)  │        │              │
//!                     └──────────────┘        └──────────────┘
//!
//! ┌──────────┐ Command ┌──────────────┐
//! │ input.rs │ ──────► │ commands.rs  │ ──► registry / ledger pre-seed
//! │ (stdin)  │         │              │
//! └──────────┘         └──────────────┘
//! ```
//!
//! * **`store/`** - the `KeyValueStore` trait plus memory and SQLite adapters.
//! * **`registry`** - per-channel `site -> tags` subscriptions.
//! * **`ledger`** - per-channel record of questions already announced.
//! * **`source/`** - the `FeedApi` trait and the StackExchange client.
//! * **`aggregate`** - one search per subscribed site, filtered by the ledger.
//! * **`dispatch`** - formats, sends and marks each new question.
//! * **`poll`** - runs a tick every interval until shutdown.
//! * **`commands`** - subscribe / unsubscribe / list and who may use them.
//! * **`input`** - maps stdin lines to commands.
//! * **`app`** - the `Monitor` that owns all of the above.
//! * **`main`** - wires everything together from the environment.

mod aggregate;
mod app;
mod commands;
mod config;
mod dispatch;
mod error;
mod input;
mod ledger;
mod poll;
mod registry;
mod source;
mod store;

use std::sync::Arc;

use anyhow::{Context, Result};
use dotenv::dotenv;
use tokio::io::BufReader;
use tokio::sync::oneshot;

use app::Monitor;
use config::{Config, MEMORY_DATABASE};
use dispatch::ConsoleTransport;
use source::StackExchangeApi;
use store::{KeyValueStore, MemoryStore, SqliteStore};

fn open_store(config: &Config) -> Result<Arc<dyn KeyValueStore>> {
    if config.database_url == MEMORY_DATABASE {
        log::warn!("Using in-memory store; subscriptions and history are lost on exit");
        return Ok(Arc::new(MemoryStore::new()));
    }
    let store = SqliteStore::open(&config.database_url)
        .with_context(|| format!("opening database {}", config.database_url))?;
    Ok(Arc::new(store))
}

/// Read commands from stdin until EOF, replying through the transport.
async fn command_loop(monitor: Arc<Monitor>) -> Result<()> {
    let mut reader = BufReader::new(tokio::io::stdin());

    while let Some(line) = input::read_line(&mut reader).await? {
        let Some(trigger) = input::parse_line(&line, monitor.command_prefix()) else {
            continue;
        };

        let replies = match trigger.command {
            Ok(command) => monitor.handle(&trigger.channel, &trigger.nick, command).await,
            Err(reply) => vec![reply],
        };
        for reply in replies {
            let text = format!("{}: {}", trigger.nick, reply);
            if let Err(e) = monitor.transport().send(&trigger.channel, &text).await {
                log::warn!("Reply to {} failed: {}", trigger.channel, e);
            }
        }
    }

    log::info!("stdin closed; no further commands will be read");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_env()?;
    log::info!("se-monitor v{}", env!("CARGO_PKG_VERSION"));
    log::info!(
        "StackExchange client id {}, polling {} channels every {:?}",
        config.client_id,
        config.channels.len(),
        config.poll_interval
    );

    let store = open_store(&config)?;
    let api = StackExchangeApi::new(&config.api_base, &config.key, config.token.clone())
        .context("building StackExchange client")?;
    let transport = ConsoleTransport::new(config.channels.clone());

    let monitor = Arc::new(Monitor::new(
        store,
        Arc::new(api),
        Arc::new(transport),
        Box::new(config.authorizer()),
        config.command_prefix.clone(),
    ));

    // -- start background polling --------------------------------------------
    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let poller = tokio::spawn(poll::run(monitor.clone(), config.poll_interval, async move {
        let _ = stop_rx.await;
    }));

    // -- read commands until Ctrl-C ------------------------------------------
    let commands = tokio::spawn(async move {
        if let Err(e) = command_loop(monitor).await {
            log::error!("Command loop stopped; commands are no longer read: {:#}", e);
        }
    });

    tokio::signal::ctrl_c().await.context("waiting for Ctrl-C")?;
    log::info!("Shutting down");

    commands.abort();
    let _ = stop_tx.send(());
    poller.await.context("poller task panicked")?;

    Ok(())
}
