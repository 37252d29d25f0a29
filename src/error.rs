//! Error types for the monitor.
//!
//! Command-layer variants ([`Error::Usage`], [`Error::PermissionDenied`],
//! [`Error::NotSubscribed`]) are turned into a single reply message by
//! [`crate::commands`].  Everything else is logged by the scheduler and
//! isolated to the channel or site that produced it.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Usage(String),

    #[error("Must be admin or channel op!")]
    PermissionDenied,

    #[error("{channel} is not subscribed to {tag} on {site}")]
    NotSubscribed {
        channel: String,
        site: String,
        tag: String,
    },

    #[error("feed query for {site} returned {status}: {body}")]
    FeedQueryFailed {
        site: String,
        status: u16,
        body: String,
    },

    /// Never carries the request URL, which holds the API key and token.
    #[error("feed request failed: {0}")]
    FeedTransport(reqwest::Error),

    #[error("feed response could not be decoded: {0}")]
    FeedDecode(#[from] serde_json::Error),

    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("transport error: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::FeedTransport(e.without_url())
    }
}

impl From<rusqlite::Error> for Error {
    fn from(e: rusqlite::Error) -> Self {
        Error::StoreUnavailable(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn feed_transport_error_hides_credentials() {
        // Bind then drop to get a local port nothing listens on.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let url = format!("http://127.0.0.1:{port}/search?key=app-secret&access_token=user-secret");
        let client = reqwest::Client::builder().no_proxy().build().unwrap();
        let err = client.get(url).send().await.unwrap_err();
        let text = Error::from(err).to_string();

        assert!(text.starts_with("feed request failed"));
        assert!(!text.contains("app-secret"), "key leaked: {text}");
        assert!(!text.contains("user-secret"), "token leaked: {text}");
    }
}
