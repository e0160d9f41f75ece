use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use crate::TagError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    Id3,
}

impl Format {
    pub fn from_path<P>(path: P) -> Result<Format, TagError>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let kind = infer::get_from_path(path).map_err(|e| unreadable(path, e))?;
        if let Some(format) = kind.and_then(|k| Self::from_mime(k.mime_type())) {
            return Ok(format);
        }
        // infer only knows the `FF FB` mpeg header
        if has_frame_sync(path)? {
            return Ok(Format::Id3);
        }
        Err(TagError::UnsupportedOrCorruptContainer {
            path: path.to_path_buf(),
            reason: match kind {
                Some(k) => format!(
                    "either not an audio file or not a supported format: {}",
                    k.mime_type()
                ),
                None => "could not identify file format from magic number".to_string(),
            },
        })
    }

    pub fn from_mime(mime: &str) -> Option<Format> {
        // Complete list here:
        // https://crates.io/crates/infer#audio
        match mime {
            "audio/mpeg" => Some(Format::Id3),
            _ => None,
        }
    }
}

fn unreadable(path: &Path, e: io::Error) -> TagError {
    TagError::UnsupportedOrCorruptContainer {
        path: path.to_path_buf(),
        reason: format!("could not read file for magic number analysis: {}", e),
    }
}

/// Eleven set bits at the start of an untagged MPEG audio frame, followed
/// by a non-reserved layer. ADTS (AAC) headers carry layer `00`.
fn frame_sync(buf: &[u8]) -> bool {
    buf.len() >= 2 && buf[0] == 0xFF && buf[1] & 0xE0 == 0xE0 && buf[1] & 0x06 != 0
}

fn has_frame_sync(path: &Path) -> Result<bool, TagError> {
    let mut buf = Vec::with_capacity(2);
    File::open(path)
        .and_then(|f| f.take(2).read_to_end(&mut buf))
        .map_err(|e| unreadable(path, e))?;
    Ok(frame_sync(buf.as_slice()))
}

impl From<Format> for String {
    fn from(f: Format) -> Self {
        match f {
            Format::Id3 => "id3".to_string(),
        }
    }
}
