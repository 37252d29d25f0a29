//! Runtime configuration from the environment.
//!
//! Variable names live in [`env_vars`] and fallbacks in [`defaults`].
//! `main` loads `.env` first, so either source works.

use std::collections::HashSet;
use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::commands::StaticAuthorizer;

/// Environment variable names - single source of truth
pub mod env_vars {
    pub const API_BASE: &str = "STACKEXCHANGE_API_BASE";
    pub const KEY: &str = "STACKEXCHANGE_KEY";
    /// Optional user access token, sent as `access_token`.
    pub const TOKEN: &str = "STACKEXCHANGE_TOKEN";
    pub const CLIENT_ID: &str = "STACKEXCHANGE_CLIENT_ID";
    /// Path of the SQLite database.  `:memory:` keeps state in-process.
    pub const DATABASE_URL: &str = "MONITOR_DATABASE_URL";
    pub const POLL_INTERVAL_SECS: &str = "MONITOR_POLL_INTERVAL_SECS";
    /// Comma-separated channels to poll.
    pub const CHANNELS: &str = "MONITOR_CHANNELS";
    /// Comma-separated nicks with write access everywhere.
    pub const ADMINS: &str = "MONITOR_ADMINS";
    /// Comma-separated `#channel:nick` pairs with write access in that channel.
    pub const OPS: &str = "MONITOR_OPS";
    pub const COMMAND_PREFIX: &str = "MONITOR_COMMAND_PREFIX";
}

/// Default values
pub mod defaults {
    pub const API_BASE: &str = "https://api.stackexchange.com/2.2";
    pub const KEY: &str = "435HbS5X8U3C2pDD8Y*tXA((";
    pub const CLIENT_ID: u64 = 9282;
    pub const DATABASE_URL: &str = "./.db/monitor.db";
    pub const POLL_INTERVAL_SECS: u64 = 60;
    pub const COMMAND_PREFIX: &str = ".";
}

/// In-memory database marker for [`Config::database_url`].
pub const MEMORY_DATABASE: &str = ":memory:";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub api_base: String,
    pub key: String,
    pub token: Option<String>,
    pub client_id: u64,
    pub database_url: String,
    pub poll_interval: Duration,
    pub channels: Vec<String>,
    pub admins: HashSet<String>,
    pub ops: Vec<(String, String)>,
    pub command_prefix: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable source.  Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let client_id = match get(env_vars::CLIENT_ID) {
            Some(raw) => raw
                .trim()
                .parse()
                .with_context(|| format!("{} must be a number, got {:?}", env_vars::CLIENT_ID, raw))?,
            None => defaults::CLIENT_ID,
        };

        let poll_secs: u64 = match get(env_vars::POLL_INTERVAL_SECS) {
            Some(raw) => raw.trim().parse().with_context(|| {
                format!("{} must be a number, got {:?}", env_vars::POLL_INTERVAL_SECS, raw)
            })?,
            None => defaults::POLL_INTERVAL_SECS,
        };
        if poll_secs == 0 {
            bail!("{} must be greater than zero", env_vars::POLL_INTERVAL_SECS);
        }

        let ops = split_list(get(env_vars::OPS))
            .into_iter()
            .map(|pair| match pair.split_once(':') {
                Some((channel, nick)) if !channel.is_empty() && !nick.is_empty() => {
                    Ok((channel.to_string(), nick.to_string()))
                }
                _ => bail!("{} entries must look like #channel:nick, got {:?}", env_vars::OPS, pair),
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            api_base: get(env_vars::API_BASE).unwrap_or_else(|| defaults::API_BASE.to_string()),
            key: get(env_vars::KEY).unwrap_or_else(|| defaults::KEY.to_string()),
            token: get(env_vars::TOKEN),
            client_id,
            database_url: get(env_vars::DATABASE_URL)
                .unwrap_or_else(|| defaults::DATABASE_URL.to_string()),
            poll_interval: Duration::from_secs(poll_secs),
            channels: split_list(get(env_vars::CHANNELS)),
            admins: split_list(get(env_vars::ADMINS)).into_iter().collect(),
            ops,
            command_prefix: get(env_vars::COMMAND_PREFIX)
                .unwrap_or_else(|| defaults::COMMAND_PREFIX.to_string()),
        })
    }

    pub fn authorizer(&self) -> StaticAuthorizer {
        let mut auth = StaticAuthorizer::new();
        for admin in &self.admins {
            auth = auth.with_admin(admin);
        }
        for (channel, nick) in &self.ops {
            auth = auth.with_privilege(channel, nick, 1);
        }
        auth
    }
}

fn split_list(raw: Option<String>) -> Vec<String> {
    raw.map(|raw| {
        raw.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect()
    })
    .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::Authorizer;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.api_base, defaults::API_BASE);
        assert_eq!(cfg.key, defaults::KEY);
        assert_eq!(cfg.token, None);
        assert_eq!(cfg.client_id, 9282);
        assert_eq!(cfg.poll_interval, Duration::from_secs(60));
        assert_eq!(cfg.command_prefix, ".");
        assert!(cfg.channels.is_empty());
    }

    #[test]
    fn lists_are_trimmed_and_split() {
        let cfg = config(&[
            (env_vars::CHANNELS, " #rust , #tokio,,"),
            (env_vars::ADMINS, "alice"),
            (env_vars::OPS, "#rust:bob, #tokio:carol"),
            (env_vars::TOKEN, "  "),
        ])
        .unwrap();

        assert_eq!(cfg.channels, vec!["#rust".to_string(), "#tokio".to_string()]);
        assert!(cfg.admins.contains("alice"));
        assert_eq!(cfg.token, None, "blank token counts as unset");

        let auth = cfg.authorizer();
        assert!(auth.has_write_access("#rust", "bob"));
        assert!(!auth.has_write_access("#tokio", "bob"));
        assert!(auth.has_write_access("#anything", "alice"));
    }

    #[test]
    fn rejects_bad_numbers() {
        assert!(config(&[(env_vars::POLL_INTERVAL_SECS, "soon")]).is_err());
        assert!(config(&[(env_vars::POLL_INTERVAL_SECS, "0")]).is_err());
        assert!(config(&[(env_vars::CLIENT_ID, "abc")]).is_err());
    }

    #[test]
    fn rejects_malformed_ops() {
        assert!(config(&[(env_vars::OPS, "bob")]).is_err());
        assert!(config(&[(env_vars::OPS, "#rust:")]).is_err());
    }
}
