mod format;
#[cfg(feature = "id3")]
mod id3;
mod key;

use log::debug;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub use format::Format;
pub use key::TagKey;

#[derive(Debug, Error)]
pub enum TagError {
    #[error("invalid or unsupported audio file {path:?}: {reason}")]
    UnsupportedOrCorruptContainer { path: PathBuf, reason: String },
    #[error("could not write tags to {path:?}: {reason}")]
    WriteFailure { path: PathBuf, reason: String },
}

pub trait TagFrom {
    fn from_path<P>(path: P) -> Result<Box<dyn Tag>, TagError>
    where
        P: AsRef<Path>;
}

pub trait Tag: Send {
    fn get_str(&self, key: &str) -> Option<String>;
    fn set_str(&mut self, key: &str, value: String);
    fn remove(&mut self, key: &str);
    fn frame_count(&self, key: &str) -> usize;

    fn key_to_str(&self, key: TagKey) -> Option<&'static str>;

    fn write_to_path(&mut self, path: &Path) -> Result<(), TagError>;
}

pub struct TrackFile {
    pub path: PathBuf,
    pub format: Format,
    tag: Box<dyn Tag>,
}

impl TrackFile {
    pub fn open<P>(path: P) -> Result<TrackFile, TagError>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let format = Format::from_path(path)?;
        let tag = match format {
            #[cfg(feature = "id3")]
            Format::Id3 => <crate::id3::Tag as TagFrom>::from_path(path)?,
            #[allow(unreachable_patterns)]
            _ => {
                return Err(TagError::UnsupportedOrCorruptContainer {
                    path: path.to_path_buf(),
                    reason: format!("support for {} was not compiled in", String::from(format)),
                })
            }
        };
        Ok(TrackFile {
            path: path.to_path_buf(),
            format,
            tag,
        })
    }

    pub fn get_tag(&self, key: TagKey) -> Option<String> {
        match self.tag.key_to_str(key) {
            Some(keystr) => self.tag.get_str(keystr),
            None => {
                debug!(
                    "The {:?} key is not supported in the output format {:?}",
                    key, self.format
                );
                None
            }
        }
    }

    /// Sets a single field. An empty value removes the field instead of
    /// storing an empty frame.
    pub fn set_tag(&mut self, key: TagKey, value: String) {
        let keystr = match self.tag.key_to_str(key) {
            Some(k) => k,
            None => {
                debug!(
                    "Skipping {:?}, not supported in the output format {:?}",
                    key, self.format
                );
                return;
            }
        };
        if value.is_empty() {
            self.tag.remove(keystr);
        } else {
            self.tag.set_str(keystr, value);
        }
    }

    pub fn frame_count(&self, key: TagKey) -> usize {
        self.tag
            .key_to_str(key)
            .map(|k| self.tag.frame_count(k))
            .unwrap_or(0)
    }

    pub fn apply(&mut self, tags: HashMap<TagKey, String>) {
        for (k, v) in tags.into_iter() {
            self.set_tag(k, v);
        }
    }

    pub fn write(&mut self) -> Result<(), TagError> {
        self.tag.write_to_path(&self.path)
    }
}
