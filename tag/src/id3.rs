extern crate id3;

use id3::{ErrorKind, Frame, TagLike, Version};
use log::trace;
use std::path::Path;

use crate::{TagError, TagKey};

#[derive(Clone)]
pub struct Tag {
    tag: id3::Tag,
}

impl crate::TagFrom for Tag {
    fn from_path<P>(path: P) -> Result<Box<dyn crate::Tag>, TagError>
    where
        P: AsRef<Path>,
    {
        let tag = match id3::Tag::read_from_path(path.as_ref()) {
            Ok(tag) => tag,
            Err(e) if matches!(e.kind, ErrorKind::NoTag) => {
                trace!("No ID3 tag in {:?}, starting from an empty one", path.as_ref());
                id3::Tag::new()
            }
            Err(e) => {
                return Err(TagError::UnsupportedOrCorruptContainer {
                    path: path.as_ref().to_path_buf(),
                    reason: e.to_string(),
                })
            }
        };
        Ok(Box::new(Tag { tag }))
    }
}

impl crate::Tag for Tag {
    fn get_str(&self, key: &str) -> Option<String> {
        self.tag
            .get(key)
            .and_then(|frame| frame.content().text())
            .map(String::from)
    }

    fn set_str(&mut self, key: &str, value: String) {
        // add_frame replaces any frame with the same id
        self.tag.add_frame(Frame::text(key, value));
    }

    fn remove(&mut self, key: &str) {
        self.tag.remove(key);
    }

    fn frame_count(&self, key: &str) -> usize {
        self.tag.frames().filter(|f| f.id() == key).count()
    }

    fn key_to_str(&self, key: TagKey) -> Option<&'static str> {
        match key {
            TagKey::TrackTitle => Some("TIT2"),
            TagKey::Artist => Some("TPE1"),
            TagKey::Album => Some("TALB"),
            TagKey::Genre => Some("TCON"),
            TagKey::ReleaseYear => Some("TDRC"),
        }
    }

    fn write_to_path(&mut self, path: &Path) -> Result<(), TagError> {
        self.tag
            .write_to_path(path, Version::Id3v24)
            .map_err(|e| TagError::WriteFailure {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })
    }
}
