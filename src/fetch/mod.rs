pub mod lastfm;

use async_trait::async_trait;
use serde_json::Value;
use std::fmt::{Display, Formatter, Result as FormatResult};
use thiserror::Error;

pub use self::lastfm::LastFm;

/// One artist/title pair the remote search offered as a possible match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchCandidate {
    pub artist: String,
    pub title: String,
}

impl Display for SearchCandidate {
    fn fmt(&self, f: &mut Formatter<'_>) -> FormatResult {
        write!(f, "Artist: {}, Track: {}", self.artist, self.title)
    }
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("service returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("service error {code}: {message}")]
    Service { code: i64, message: String },
    #[error("{0}")]
    Decode(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        FetchError::Transport(e.to_string())
    }
}

/// A remote music-metadata service.
///
/// `search` returns candidates in the order the service ranked them;
/// `detail` returns the undecoded detail document, which may or may not
/// contain a track record.
#[async_trait]
pub trait Provider: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<SearchCandidate>, FetchError>;
    async fn detail(&self, candidate: &SearchCandidate) -> Result<Value, FetchError>;
}
