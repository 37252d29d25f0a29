//! StackExchange `/search` client.
//!
//! One GET per [`FeedQuery`], newest questions first.  The API always
//! gzip-compresses its bodies; reqwest's `gzip` feature handles that.

use async_trait::async_trait;
use serde::Deserialize;

use super::{FeedApi, FeedItem, FeedQuery, FeedResponse, Quota};
use crate::error::{Error, Result};

const USER_AGENT: &str = "StackExchange Question Monitor";

/// An authenticated StackExchange API client.
pub struct StackExchangeApi {
    client: reqwest::Client,
    /// API root, e.g. `https://api.stackexchange.com/2.2`.
    base_url: String,
    /// Application key; raises the per-IP quota.
    key: String,
    /// Optional user access token.
    access_token: Option<String>,
}

/// The subset of the API's response wrapper the monitor reads.
#[derive(Debug, Deserialize)]
struct SearchBody {
    #[serde(default)]
    items: Vec<FeedItem>,
    #[serde(default)]
    quota_remaining: u64,
    #[serde(default)]
    quota_max: u64,
    backoff: Option<u64>,
}

impl StackExchangeApi {
    pub fn new(
        base_url: impl Into<String>,
        key: impl Into<String>,
        access_token: Option<String>,
    ) -> Result<Self> {
        let client = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            key: key.into(),
            access_token,
        })
    }

    /// Query-string parameters for `query`.
    pub fn params(&self, query: &FeedQuery) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("order", "desc".to_string()),
            ("sort", "creation".to_string()),
            ("tagged", query.tagged()),
            ("site", query.site.clone()),
            ("key", self.key.clone()),
        ];
        if let Some(token) = &self.access_token {
            params.push(("access_token", token.clone()));
        }
        params
    }

    /// Decode an already-fetched `/search` body.
    ///
    /// Pure function so tests can exercise decoding without the network.
    pub fn parse_response(body: &[u8]) -> Result<FeedResponse> {
        let body: SearchBody = serde_json::from_slice(body)?;
        Ok(FeedResponse {
            items: body.items,
            quota: Quota {
                remaining: body.quota_remaining,
                max: body.quota_max,
                backoff: body.backoff,
            },
        })
    }
}

#[async_trait]
impl FeedApi for StackExchangeApi {
    async fn search(&self, query: &FeedQuery) -> Result<FeedResponse> {
        log::debug!(
            "[SE] Searching {} for tagged={}",
            query.site,
            query.tagged()
        );

        let response = self
            .client
            .get(format!("{}/search", self.base_url))
            .query(&self.params(query))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::FeedQueryFailed {
                site: query.site.clone(),
                status: status.as_u16(),
                body,
            });
        }

        let body = response.bytes().await?;
        Self::parse_response(&body)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
