use lazy_static::lazy_static;
use regex::Regex;
use std::path::Path;

lazy_static! {
    // The artist is lazy so the first hyphen or en-dash wins.
    static ref ARTIST_TITLE: Regex = Regex::new(r"^(.*?)\s*[-–]\s*(.*)$").unwrap();
    static ref ANNOTATION: Regex = Regex::new(r"\([^)]*\)").unwrap();
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
}

/// Best-effort guess of what a file contains, derived from its name alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackQuery {
    pub raw_filename: String,
    pub guessed_artist: Option<String>,
    pub guessed_title: String,
}

impl TrackQuery {
    /// The string sent to the remote search: the title, then the artist.
    pub fn search_terms(&self) -> String {
        match &self.guessed_artist {
            Some(artist) => format!("{} {}", self.guessed_title, artist),
            None => self.guessed_title.clone(),
        }
    }
}

fn strip_extension(filename: &str) -> &str {
    Path::new(filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|_| Path::new(filename).extension().is_some())
        .unwrap_or(filename)
}

/// Removes `(feat. ...)` and any other parenthesized annotation.
fn clean_title(title: &str) -> String {
    let stripped = ANNOTATION.replace_all(title, " ");
    WHITESPACE.replace_all(stripped.trim(), " ").into_owned()
}

/// Never fails: a name without a separator becomes a title-only query.
pub fn parse(filename: &str) -> TrackQuery {
    let stem = strip_extension(filename);
    let guess = ARTIST_TITLE.captures(stem).and_then(|caps| {
        let artist = caps.get(1)?.as_str().trim();
        let raw_title = caps.get(2)?.as_str().trim();
        if artist.is_empty() || raw_title.is_empty() {
            return None;
        }
        let title = match clean_title(raw_title) {
            t if t.is_empty() => WHITESPACE.replace_all(raw_title, " ").into_owned(),
            t => t,
        };
        Some((artist.to_string(), title))
    });

    match guess {
        Some((artist, title)) => TrackQuery {
            raw_filename: filename.to_string(),
            guessed_artist: Some(artist),
            guessed_title: title,
        },
        None => TrackQuery {
            raw_filename: filename.to_string(),
            guessed_artist: None,
            guessed_title: stem.trim().to_string(),
        },
    }
}
