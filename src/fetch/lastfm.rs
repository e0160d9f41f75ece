use async_trait::async_trait;
use const_format::formatcp;
use log::trace;
use reqwest::header::USER_AGENT;
use serde::de::DeserializeOwned;
use serde_derive::Deserialize;
use serde_json::Value;
use std::time::Instant;

use super::{FetchError, Provider, SearchCandidate};
use crate::settings;

static LASTFM_USER_AGENT: &str =
    formatcp!("{}/{} ({})", crate::CLI_NAME, crate::VERSION, crate::GITHUB);

#[derive(Debug, Deserialize)]
struct SearchResponse {
    error: Option<i64>,
    message: Option<String>,
    results: Option<Results>,
}

#[derive(Debug, Deserialize)]
struct Results {
    trackmatches: Option<TrackMatches>,
}

#[derive(Debug, Deserialize)]
struct TrackMatches {
    #[serde(default)]
    track: OneOrMany<Match>,
}

// A single match sometimes comes back as a bare object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> Default for OneOrMany<T> {
    fn default() -> Self {
        OneOrMany::Many(vec![])
    }
}

impl<T> From<OneOrMany<T>> for Vec<T> {
    fn from(v: OneOrMany<T>) -> Self {
        match v {
            OneOrMany::Many(v) => v,
            OneOrMany::One(t) => vec![t],
        }
    }
}

#[derive(Debug, Deserialize)]
struct Match {
    name: String,
    artist: String,
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T, FetchError> {
    let de = &mut serde_json::Deserializer::from_str(body);
    serde_path_to_error::deserialize(de).map_err(|e| FetchError::Decode(e.to_string()))
}

pub(crate) fn decode_search(body: &str) -> Result<Vec<SearchCandidate>, FetchError> {
    let res: SearchResponse = decode(body)?;
    if let Some(code) = res.error {
        return Err(FetchError::Service {
            code,
            message: res.message.unwrap_or_default(),
        });
    }
    let matches: Vec<Match> = res
        .results
        .and_then(|r| r.trackmatches)
        .map(|m| m.track.into())
        .unwrap_or_default();
    Ok(matches
        .into_iter()
        .map(|m| SearchCandidate {
            artist: m.artist,
            title: m.name,
        })
        .collect())
}

pub struct LastFm {
    url: url::Url,
    api_key: String,
    limit: Option<u32>,
    client: reqwest::Client,
}

impl LastFm {
    pub fn new(settings: &settings::LastFm) -> Self {
        LastFm {
            url: settings.url.clone(),
            api_key: settings.api_key.clone(),
            limit: settings.search_limit,
            client: reqwest::Client::new(),
        }
    }

    fn method_url(&self, method: &str, params: &[(&str, &str)]) -> url::Url {
        let mut url = self.url.clone();
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("method", method);
            for (k, v) in params {
                pairs.append_pair(k, v);
            }
            pairs
                .append_pair("api_key", self.api_key.as_str())
                .append_pair("format", "json");
        }
        url
    }

    pub(crate) fn search_url(&self, query: &str) -> url::Url {
        let limit = self.limit.map(|l| l.to_string());
        let mut params = vec![("track", query)];
        if let Some(l) = &limit {
            params.push(("limit", l.as_str()));
        }
        self.method_url("track.search", &params)
    }

    pub(crate) fn detail_url(&self, candidate: &SearchCandidate) -> url::Url {
        self.method_url(
            "track.getInfo",
            &[
                ("artist", candidate.artist.as_str()),
                ("track", candidate.title.as_str()),
            ],
        )
    }

    /// Returns the body of a successful response. Error bodies that are
    /// still well-formed service errors are handed back too when
    /// `keep_service_errors` is set.
    async fn get(&self, url: url::Url, keep_service_errors: bool) -> Result<String, FetchError> {
        let start = Instant::now();
        let res = self
            .client
            .get(url)
            .header(USER_AGENT, LASTFM_USER_AGENT)
            .send()
            .await?;
        trace!("Last.fm HTTP request took {:?}", start.elapsed());
        let status = res.status();
        let body = res.text().await?;
        if !status.is_success() {
            let is_service_error = serde_json::from_str::<Value>(&body)
                .map(|v| v.get("error").is_some())
                .unwrap_or(false);
            if !(keep_service_errors && is_service_error) {
                return Err(FetchError::Status {
                    status: status.as_u16(),
                    body,
                });
            }
        }
        Ok(body)
    }
}

#[async_trait]
impl Provider for LastFm {
    async fn search(&self, query: &str) -> Result<Vec<SearchCandidate>, FetchError> {
        let body = self.get(self.search_url(query), false).await?;
        let start = Instant::now();
        let candidates = decode_search(&body)?;
        trace!("Last.fm search JSON parse took {:?}", start.elapsed());
        Ok(candidates)
    }

    async fn detail(&self, candidate: &SearchCandidate) -> Result<Value, FetchError> {
        let body = self.get(self.detail_url(candidate), true).await?;
        decode(&body)
    }
}
