//! Subscription commands: `subscribe`, `unsubscribe` and `list`.
//!
//! Every command resolves to reply text.  Usage, permission and
//! not-subscribed failures become a single user-facing line; store failures
//! are logged and reported generically.

use std::collections::{HashMap, HashSet};

use strum::{AsRefStr, EnumIter, EnumString, IntoEnumIterator};

use crate::app::Monitor;
use crate::error::{Error, Result};

/// Name the command is invoked under, after the prefix.
pub const COMMAND_NAME: &str = "stackexchange";

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, AsRefStr, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum Subcommand {
    Subscribe,
    Unsubscribe,
    List,
}

/// A parsed `stackexchange` invocation.  Arguments stay optional so that
/// missing ones can be reported with a usage line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Subscribe {
        site: Option<String>,
        tag: Option<String>,
    },
    Unsubscribe {
        site: Option<String>,
        tag: Option<String>,
    },
    List,
}

impl Command {
    /// Parse the words following the command name.  `Err` carries the reply
    /// for an unknown or missing subcommand.
    pub fn parse(args: &[&str]) -> std::result::Result<Self, String> {
        let subcommand = args
            .first()
            .and_then(|s| s.parse::<Subcommand>().ok())
            .ok_or_else(invalid_subcommand)?;

        let site = args.get(1).map(|s| s.to_string());
        let tag = args.get(2).map(|s| s.to_string());

        Ok(match subcommand {
            Subcommand::Subscribe => Command::Subscribe { site, tag },
            Subcommand::Unsubscribe => Command::Unsubscribe { site, tag },
            Subcommand::List => Command::List,
        })
    }
}

fn invalid_subcommand() -> String {
    let names: Vec<String> = Subcommand::iter().map(|s| s.as_ref().to_string()).collect();
    format!("Invalid subcommand. Please use one of {}", names.join(", "))
}

// ---------------------------------------------------------------------------
// Authorization
// ---------------------------------------------------------------------------

/// Decides who may change a channel's subscriptions.
pub trait Authorizer: Send + Sync {
    fn has_write_access(&self, channel: &str, nick: &str) -> bool;
}

/// Fixed admin list plus per-channel privilege levels.  Write access means
/// admin, or a privilege above zero in that channel.
#[derive(Debug, Default, Clone)]
pub struct StaticAuthorizer {
    admins: HashSet<String>,
    privileges: HashMap<(String, String), u8>,
}

impl StaticAuthorizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_admin(mut self, nick: &str) -> Self {
        self.admins.insert(nick.to_lowercase());
        self
    }

    pub fn with_privilege(mut self, channel: &str, nick: &str, level: u8) -> Self {
        self.privileges
            .insert((channel.to_lowercase(), nick.to_lowercase()), level);
        self
    }

    pub fn is_admin(&self, nick: &str) -> bool {
        self.admins.contains(&nick.to_lowercase())
    }

    pub fn channel_privilege(&self, channel: &str, nick: &str) -> u8 {
        self.privileges
            .get(&(channel.to_lowercase(), nick.to_lowercase()))
            .copied()
            .unwrap_or(0)
    }
}

impl Authorizer for StaticAuthorizer {
    fn has_write_access(&self, channel: &str, nick: &str) -> bool {
        self.is_admin(nick) || self.channel_privilege(channel, nick) > 0
    }
}

// ---------------------------------------------------------------------------
// Mutators
// ---------------------------------------------------------------------------

fn required<'a>(
    site: Option<&'a str>,
    tag: Option<&'a str>,
    usage: impl FnOnce() -> String,
) -> Result<(&'a str, &'a str)> {
    match (site, tag) {
        (Some(site), Some(tag)) => Ok((site, tag)),
        _ => Err(Error::Usage(usage())),
    }
}

impl Monitor {
    /// Run `command` issued by `nick` in `channel` and return the reply lines.
    pub async fn handle(&self, channel: &str, nick: &str, command: Command) -> Vec<String> {
        let result = match command {
            Command::Subscribe { site, tag } => self
                .subscribe(channel, nick, site.as_deref(), tag.as_deref())
                .await
                .map(|reply| vec![reply]),
            Command::Unsubscribe { site, tag } => self
                .unsubscribe(channel, nick, site.as_deref(), tag.as_deref())
                .map(|reply| vec![reply]),
            Command::List => self.list(channel),
        };

        match result {
            Ok(replies) => replies,
            Err(e) => vec![self.error_reply(e)],
        }
    }

    fn error_reply(&self, error: Error) -> String {
        match error {
            Error::Usage(_) | Error::PermissionDenied => error.to_string(),
            Error::NotSubscribed { .. } => format!(
                "{} (use {}{} list to see all subscriptions)",
                error,
                self.command_prefix(),
                COMMAND_NAME
            ),
            other => {
                log::error!("[COMMANDS] Command failed: {}", other);
                "Something went wrong, please try again later.".to_string()
            }
        }
    }

    /// Subscribe `channel` to `tag` on `site`.
    ///
    /// A new subscription immediately marks everything the search currently
    /// returns as seen, so only questions asked afterwards are announced.
    pub async fn subscribe(
        &self,
        channel: &str,
        nick: &str,
        site: Option<&str>,
        tag: Option<&str>,
    ) -> Result<String> {
        if !self.authorizer().has_write_access(channel, nick) {
            return Err(Error::PermissionDenied);
        }
        log::info!(
            "[COMMANDS] Subscription request from {} for {:?} on {:?}",
            channel,
            tag,
            site
        );
        let (site, tag) = required(site, tag, || {
            format!("Usage: {}{} subscribe site tag", self.command_prefix(), COMMAND_NAME)
        })?;

        if !self.registry().add(channel, site, tag)? {
            return Ok(format!("{channel} is already subscribed to {tag} on {site}"));
        }

        let backlog = self.aggregator().collect_unseen(channel).await?;
        let now = chrono::Utc::now();
        for item in &backlog {
            self.ledger().mark_seen(channel, item.id, now)?;
        }
        log::info!(
            "[COMMANDS] Subscribed {} to {} on {}; pre-seeded {} existing questions",
            channel,
            tag,
            site,
            backlog.len()
        );

        Ok(format!("Subscribed {channel} to {tag} on {site}"))
    }

    pub fn unsubscribe(
        &self,
        channel: &str,
        nick: &str,
        site: Option<&str>,
        tag: Option<&str>,
    ) -> Result<String> {
        if !self.authorizer().has_write_access(channel, nick) {
            return Err(Error::PermissionDenied);
        }
        log::info!(
            "[COMMANDS] Unsubscribe request from {} for {:?} on {:?}",
            channel,
            tag,
            site
        );
        let (site, tag) = required(site, tag, || {
            format!("Usage: {}{} unsubscribe site tag", self.command_prefix(), COMMAND_NAME)
        })?;

        if !self.registry().remove(channel, site, tag)? {
            return Err(Error::NotSubscribed {
                channel: channel.to_string(),
                site: site.to_string(),
                tag: tag.to_string(),
            });
        }
        Ok(format!("Unsubscribed {channel} from {tag} on {site}"))
    }

    /// One line per site that still has tags.
    pub fn list(&self, channel: &str) -> Result<Vec<String>> {
        let lines: Vec<String> = self
            .registry()
            .get(channel)?
            .iter()
            .filter(|(_, tags)| !tags.is_empty())
            .map(|(site, tags)| {
                let tags: Vec<&str> = tags.iter().map(String::as_str).collect();
                format!("Subscribed to tags {} on {}", tags.join(", "), site)
            })
            .collect();

        if lines.is_empty() {
            return Ok(vec![format!("No subscriptions found for {channel}")]);
        }
        Ok(lines)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
