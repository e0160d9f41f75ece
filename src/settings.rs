use async_once_cell::OnceCell;
use directories::ProjectDirs;
use eyre::{bail, eyre, Result};
use lazy_static::lazy_static;
use log::trace;
use serde_derive::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::CLI_NAME;

pub const LYRICLABEL_API_KEY: &str = "LYRICLABEL_API_KEY";

lazy_static! {
    pub static ref SETTINGS: Arc<OnceCell<Settings>> = Arc::new(OnceCell::new());
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_extension")]
    pub extension: String,
    #[serde(default = "default_sentinel")]
    pub sentinel: String,
    // tables go last so the TOML output stays valid
    #[serde(default)]
    pub lastfm: LastFm,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            extension: default_extension(),
            sentinel: default_sentinel(),
            lastfm: LastFm::default(),
        }
    }
}

fn default_extension() -> String {
    "mp3".to_string()
}

fn default_sentinel() -> String {
    "Unknown".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastFm {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_lastfm_url")]
    pub url: url::Url,
    #[serde(default)]
    pub search_limit: Option<u32>,
}

fn default_lastfm_url() -> url::Url {
    url::Url::parse("https://ws.audioscrobbler.com/2.0/").unwrap()
}

impl Default for LastFm {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            url: default_lastfm_url(),
            search_limit: None,
        }
    }
}

fn default_path() -> Result<PathBuf> {
    let dirs = ProjectDirs::from("com", "github", CLI_NAME)
        .ok_or(eyre!("Could not locate program directories"))?;
    Ok(dirs.config_dir().join("config.toml"))
}

pub fn parse(content: &str) -> Result<Settings> {
    toml::from_str(content).map_err(|e| eyre!(e))
}

pub fn load(path: Option<&Path>) -> Result<Settings> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => default_path()?,
    };
    trace!("Loading config file: {:?}", path);
    let content = fs::read_to_string(&path).unwrap_or_default();
    let mut set = parse(content.as_str())?;
    if let Ok(key) = env::var(LYRICLABEL_API_KEY) {
        set.lastfm.api_key = key;
    }
    trace!("Loaded settings: {:?}", set);
    Ok(set)
}

pub fn get_settings() -> Result<&'static Settings> {
    SETTINGS.get().ok_or(eyre!("Could not read settings"))
}

/// Settings good enough to talk to the remote service.
pub fn validate(settings: &Settings) -> Result<()> {
    if settings.lastfm.api_key.trim().is_empty() {
        bail!(
            "Missing Last.fm API key: set lastfm.api_key in the config file or the {} environment variable",
            LYRICLABEL_API_KEY
        );
    }
    if settings.extension.is_empty() {
        bail!("The audio extension cannot be empty");
    }
    Ok(())
}

pub fn print() -> Result<()> {
    let settings = get_settings()?;
    print!("{}", toml::to_string(settings)?);
    Ok(())
}
