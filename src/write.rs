use std::collections::HashMap;
use std::path::Path;
use tag::{TagError, TagKey, TrackFile};

use crate::resolve::ResolvedMetadata;

pub trait TagSink: Send + Sync {
    fn write_tags(&self, path: &Path, metadata: &ResolvedMetadata) -> Result<(), TagError>;
}

impl From<&ResolvedMetadata> for HashMap<TagKey, String> {
    fn from(meta: &ResolvedMetadata) -> Self {
        HashMap::from([
            (TagKey::TrackTitle, meta.track.clone()),
            (TagKey::Artist, meta.artist.clone()),
            (TagKey::Album, meta.album.clone()),
            (TagKey::Genre, meta.genre.clone()),
            (TagKey::ReleaseYear, meta.year.clone()),
        ])
    }
}

/// Writes straight into the file's own tag container.
pub struct FileTagSink;

impl TagSink for FileTagSink {
    fn write_tags(&self, path: &Path, metadata: &ResolvedMetadata) -> Result<(), TagError> {
        let mut file = TrackFile::open(path)?;
        file.apply(metadata.into());
        file.write()
    }
}
