/// The subset of tag fields this tool knows how to fill in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TagKey {
    TrackTitle,
    Artist,
    Album,
    Genre,
    ReleaseYear,
}

impl TagKey {
    pub fn all() -> [TagKey; 5] {
        [
            TagKey::TrackTitle,
            TagKey::Artist,
            TagKey::Album,
            TagKey::Genre,
            TagKey::ReleaseYear,
        ]
    }
}
