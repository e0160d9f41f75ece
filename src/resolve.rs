use dialoguer::Input;
use log::{debug, info};
use serde_json::Value;
use thiserror::Error;

use crate::fetch::{FetchError, Provider, SearchCandidate};
use crate::parse::TrackQuery;
use crate::theme::DialoguerTheme;

/// Every field the tag writer receives. Missing remote data is replaced by
/// the sentinel, except `year` which is left empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedMetadata {
    pub artist: String,
    pub album: String,
    pub track: String,
    pub genre: String,
    pub year: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
    #[error("network error while resolving {query:?}: {reason}")]
    Network { query: String, reason: String },
    #[error("could not decode the response for {query:?}: {reason}")]
    Decode { query: String, reason: String },
    #[error("no matching tracks found for {query:?}")]
    NoMatch { query: String },
    #[error("search for {query:?} cancelled")]
    Cancelled { query: String },
    #[error("invalid choice {input:?} for {query:?}, expected a number between 1 and {count}")]
    InvalidSelection {
        query: String,
        input: String,
        count: usize,
    },
    #[error("detailed info could not be fetched for {query:?}: {reason}")]
    DetailUnavailable { query: String, reason: String },
}

impl ResolutionError {
    fn from_fetch(query: &str, e: FetchError) -> Self {
        match e {
            FetchError::Decode(reason) => ResolutionError::Decode {
                query: query.to_string(),
                reason,
            },
            e => ResolutionError::Network {
                query: query.to_string(),
                reason: e.to_string(),
            },
        }
    }

    pub fn query(&self) -> &str {
        match self {
            ResolutionError::Network { query, .. }
            | ResolutionError::Decode { query, .. }
            | ResolutionError::NoMatch { query }
            | ResolutionError::Cancelled { query }
            | ResolutionError::InvalidSelection { query, .. }
            | ResolutionError::DetailUnavailable { query, .. } => query,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Interactive,
    Quiet,
}

impl Mode {
    pub fn selector(&self) -> Box<dyn Selector> {
        match self {
            Mode::Interactive => Box::new(PromptSelector::default()),
            Mode::Quiet => Box::new(FirstSelector),
        }
    }
}

/// What the user (or the automatic strategy) answered when shown the
/// candidates. Numbers are 1-based, `0` cancels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    Number(usize),
    Text(String),
    Aborted,
}

pub trait Selector: Send + Sync {
    fn select(&self, query: &str, candidates: &[SearchCandidate]) -> Answer;
}

pub struct FirstSelector;

impl Selector for FirstSelector {
    fn select(&self, _: &str, _: &[SearchCandidate]) -> Answer {
        Answer::Number(1)
    }
}

#[derive(Default)]
pub struct PromptSelector {
    theme: DialoguerTheme,
}

impl Selector for PromptSelector {
    fn select(&self, query: &str, candidates: &[SearchCandidate]) -> Answer {
        info!("Found {} result(s) for '{}':", candidates.len(), query);
        for (i, c) in candidates.iter().enumerate() {
            info!("{}. {}", i + 1, c);
        }
        match Input::<String>::with_theme(&self.theme)
            .with_prompt("Select the track number (0 to cancel)")
            .allow_empty(true)
            .interact_text()
        {
            Ok(input) => answer_from(input.as_str()),
            Err(_) => Answer::Aborted,
        }
    }
}

/// Reads a typed selection. Anything but a plain number is kept as text.
pub fn answer_from(input: &str) -> Answer {
    match input.trim().parse::<usize>() {
        Ok(n) => Answer::Number(n),
        Err(_) => Answer::Text(input.to_string()),
    }
}

/// Maps an answer onto the candidate list.
pub fn pick<'a>(
    query: &str,
    candidates: &'a [SearchCandidate],
    answer: Answer,
) -> Result<&'a SearchCandidate, ResolutionError> {
    match answer {
        Answer::Number(0) | Answer::Aborted => Err(ResolutionError::Cancelled {
            query: query.to_string(),
        }),
        Answer::Number(n) if n <= candidates.len() => Ok(&candidates[n - 1]),
        Answer::Number(n) => Err(ResolutionError::InvalidSelection {
            query: query.to_string(),
            input: n.to_string(),
            count: candidates.len(),
        }),
        Answer::Text(input) => Err(ResolutionError::InvalidSelection {
            query: query.to_string(),
            input,
            count: candidates.len(),
        }),
    }
}

fn text_at<'a>(value: &'a Value, pointer: &str) -> Option<&'a str> {
    value.pointer(pointer).and_then(Value::as_str)
}

/// Pulls the metadata out of a detail document. Only a missing track record
/// yields `None`; any other gap is filled with `sentinel`.
pub fn extract(doc: &Value, sentinel: &str) -> Option<ResolvedMetadata> {
    let track = doc.get("track").filter(|t| t.is_object())?;
    let or_sentinel = |v: Option<&str>| v.map(String::from).unwrap_or_else(|| sentinel.to_string());
    let genre = text_at(track, "/toptags/tag/0/name").or_else(|| text_at(track, "/toptags/tag/name"));
    Some(ResolvedMetadata {
        artist: or_sentinel(text_at(track, "/artist/name")),
        album: or_sentinel(text_at(track, "/album/title")),
        track: or_sentinel(text_at(track, "/name")),
        genre: or_sentinel(genre),
        // truncated, not parsed: "2004-05-01" and "2004" both give "2004"
        year: text_at(track, "/release_date")
            .map(|d| d.chars().take(4).collect())
            .unwrap_or_default(),
    })
}

pub struct Resolver {
    provider: Box<dyn Provider>,
    selector: Box<dyn Selector>,
    sentinel: String,
}

impl Resolver {
    pub fn new(provider: Box<dyn Provider>, selector: Box<dyn Selector>, sentinel: String) -> Self {
        Resolver {
            provider,
            selector,
            sentinel,
        }
    }

    pub async fn resolve(&self, query: &TrackQuery) -> Result<ResolvedMetadata, ResolutionError> {
        let terms = query.search_terms();
        debug!("Searching for {:?} (from {:?})", terms, query.raw_filename);
        let candidates = self
            .provider
            .search(terms.as_str())
            .await
            .map_err(|e| ResolutionError::from_fetch(&terms, e))?;
        if candidates.is_empty() {
            return Err(ResolutionError::NoMatch { query: terms });
        }

        let answer = self.selector.select(terms.as_str(), &candidates);
        let candidate = pick(terms.as_str(), &candidates, answer)?;
        debug!("Fetching details for {}", candidate);

        let doc = self
            .provider
            .detail(candidate)
            .await
            .map_err(|e| ResolutionError::from_fetch(&terms, e))?;
        extract(&doc, self.sentinel.as_str()).ok_or_else(|| ResolutionError::DetailUnavailable {
            query: terms.clone(),
            reason: text_at(&doc, "/message")
                .unwrap_or("no track record in the response")
                .to_string(),
        })
    }
}
