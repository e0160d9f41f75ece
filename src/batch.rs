use log::{debug, info, warn};
use scan_dir::ScanDir;
use std::fmt::{Display, Formatter, Result as FormatResult};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::parse::parse;
use crate::resolve::Resolver;
use crate::util::{file_name, has_extension};
use crate::write::TagSink;

#[derive(Debug, Error)]
pub enum PathError {
    #[error("path not found, or not a file or directory: {0:?}")]
    NotFound(PathBuf),
    #[error("could not walk directory {path:?}: {reason}")]
    Walk { path: PathBuf, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub path: PathBuf,
    pub reason: String,
}

/// Per-file failures, in the order they happened.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorLog(Vec<LogEntry>);

impl ErrorLog {
    pub fn push(&mut self, path: &Path, reason: String) {
        self.0.push(LogEntry {
            path: path.to_path_buf(),
            reason,
        });
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Display for ErrorLog {
    fn fmt(&self, f: &mut Formatter<'_>) -> FormatResult {
        for entry in self.0.iter() {
            writeln!(f, "{}: {}", entry.path.display(), entry.reason)?;
        }
        Ok(())
    }
}

/// Where a single file ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemState {
    Tagged,
    TagFailed,
    Unresolved,
    Skipped,
}

#[derive(Debug, Default)]
pub struct Report {
    pub log: ErrorLog,
    pub tagged: usize,
    pub skipped: usize,
}

impl Report {
    fn count(&mut self, state: ItemState) {
        match state {
            ItemState::Tagged => self.tagged += 1,
            ItemState::Skipped => self.skipped += 1,
            ItemState::TagFailed | ItemState::Unresolved => {}
        }
    }
}

fn error_path(err: &scan_dir::Error) -> &Path {
    match err {
        scan_dir::Error::Io(_, path) => path.as_path(),
        scan_dir::Error::Decode(path) => path.as_path(),
    }
}

/// Every file below `path`, hidden and backup ones included, and the errors
/// met on the way. Only an unreadable `path` itself fails the walk.
fn all_files(path: &Path) -> Result<(Vec<PathBuf>, Vec<scan_dir::Error>), PathError> {
    let mut files = vec![];
    let errors = ScanDir::files()
        .skip_hidden(false)
        .skip_backup(false)
        .walk(path, |iter| {
            for (entry, _) in iter {
                files.push(entry.path());
            }
        })
        .err()
        .unwrap_or_default();
    if let Some(root) = errors
        .iter()
        .find(|e| matches!(e, scan_dir::Error::Io(_, p) if p == path))
    {
        return Err(PathError::Walk {
            path: path.to_path_buf(),
            reason: root.to_string(),
        });
    }
    Ok((files, errors))
}

pub struct Batch {
    resolver: Resolver,
    sink: Box<dyn TagSink>,
    extension: String,
}

impl Batch {
    pub fn new(resolver: Resolver, sink: Box<dyn TagSink>, extension: String) -> Self {
        Batch {
            resolver,
            sink,
            extension,
        }
    }

    /// Processes a file, or every audio file below a directory. Per-file
    /// failures end up in the report; only an unusable `path` is an error.
    ///
    /// A single file is processed whatever its extension, while directory
    /// mode only picks files with the configured one. Hidden files and
    /// directories are visited too. A subdirectory that cannot be read is
    /// logged and the rest of the tree is still processed.
    pub async fn run(&self, path: &Path) -> Result<Report, PathError> {
        let mut report = Report::default();
        if path.is_file() {
            let state = self.process(path, &mut report.log).await;
            report.count(state);
        } else if path.is_dir() {
            let (files, errors) = all_files(path)?;
            for err in errors {
                warn!("{}", err);
                report.log.push(error_path(&err), err.to_string());
            }
            // walk order, no sorting
            for file in files {
                let state = if has_extension(&file, self.extension.as_str()) {
                    self.process(&file, &mut report.log).await
                } else {
                    debug!("Skipping {:?}", file);
                    ItemState::Skipped
                };
                report.count(state);
            }
        } else {
            return Err(PathError::NotFound(path.to_path_buf()));
        }
        Ok(report)
    }

    async fn process(&self, path: &Path, log: &mut ErrorLog) -> ItemState {
        info!("Processing {}", path.display());
        let query = parse(file_name(path).as_str());
        debug!("Parsed {:?}", query);
        let metadata = match self.resolver.resolve(&query).await {
            Ok(m) => m,
            Err(e) => {
                debug!("Could not resolve {:?} from {:?}", e.query(), path);
                log.push(path, e.to_string());
                return ItemState::Unresolved;
            }
        };
        match self.sink.write_tags(path, &metadata) {
            Ok(()) => {
                info!("Metadata updated for {}", path.display());
                ItemState::Tagged
            }
            Err(e) => {
                log.push(path, e.to_string());
                ItemState::TagFailed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::tests::{candidate, MockProvider};
    use crate::resolve::{Mode, ResolvedMetadata};
    use crate::write::FileTagSink;
    use std::fs;
    use std::sync::{Arc, Mutex};
    use tag::{TagError, TagKey, TrackFile};

    #[derive(Default)]
    struct MockSink {
        written: Mutex<Vec<(PathBuf, ResolvedMetadata)>>,
        fail_on: Option<String>,
    }

    impl TagSink for Arc<MockSink> {
        fn write_tags(&self, path: &Path, metadata: &ResolvedMetadata) -> Result<(), TagError> {
            if self.fail_on.as_deref() == Some(file_name(path).as_str()) {
                return Err(TagError::WriteFailure {
                    path: path.to_path_buf(),
                    reason: "permission denied".to_string(),
                });
            }
            self.written
                .lock()
                .unwrap()
                .push((path.to_path_buf(), metadata.clone()));
            Ok(())
        }
    }

    fn batch(provider: Arc<MockProvider>, sink: Arc<MockSink>) -> Batch {
        let resolver = Resolver::new(Box::new(provider), Mode::Quiet.selector(), "Unknown".to_string());
        Batch::new(resolver, Box::new(sink), "mp3".to_string())
    }

    fn tempdir() -> tempfile::TempDir {
        tempfile::tempdir().unwrap()
    }

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, b"").unwrap();
    }

    fn written_names(sink: &MockSink) -> Vec<String> {
        let mut names: Vec<_> = sink
            .written
            .lock()
            .unwrap()
            .iter()
            .map(|(p, _)| file_name(p))
            .collect();
        names.sort();
        names
    }

    #[tokio::test]
    async fn no_match_is_logged_once_and_never_tagged() {
        let dir = tempdir();
        let path = dir.path().join("Unknown Song.mp3");
        touch(&path);
        let provider = Arc::new(MockProvider::default());
        let sink = Arc::new(MockSink::default());

        let report = batch(provider, sink.clone()).run(&path).await.unwrap();
        assert_eq!(report.log.len(), 1);
        assert_eq!(report.log.entries()[0].path, path);
        assert!(report.log.entries()[0].reason.contains("no matching tracks"));
        assert_eq!(report.tagged, 0);
        assert!(sink.written.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn directory_mode_only_picks_audio_files() {
        let dir = tempdir();
        for name in ["Song A.mp3", "notes.txt", "Artist - Title.mp3"] {
            touch(&dir.path().join(name));
        }
        let provider = Arc::new(
            MockProvider::default()
                .with_track("Song A", "Someone", "Song A")
                .with_track("Title Artist", "Artist", "Title"),
        );
        let sink = Arc::new(MockSink::default());

        let report = batch(provider.clone(), sink.clone())
            .run(dir.path())
            .await
            .unwrap();
        assert!(report.log.is_empty(), "{}", report.log);
        assert_eq!(report.tagged, 2);
        assert_eq!(report.skipped, 1);

        let mut searched = provider.searched.lock().unwrap().clone();
        searched.sort();
        assert_eq!(searched, vec!["Song A", "Title Artist"]);
        assert_eq!(written_names(&sink), vec!["Artist - Title.mp3", "Song A.mp3"]);
    }

    #[tokio::test]
    async fn directory_mode_recurses_and_ignores_extension_case() {
        let dir = tempdir();
        touch(&dir.path().join("a/b/Loud.MP3"));
        touch(&dir.path().join("a/cover.jpg"));
        let provider = Arc::new(MockProvider::default().with_track("Loud", "Band", "Loud"));
        let sink = Arc::new(MockSink::default());

        let report = batch(provider, sink.clone()).run(dir.path()).await.unwrap();
        assert_eq!(report.tagged, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(written_names(&sink), vec!["Loud.MP3"]);
    }

    #[tokio::test]
    async fn a_failing_file_does_not_stop_the_batch() {
        let dir = tempdir();
        for name in ["One.mp3", "Two.mp3", "Three.mp3"] {
            touch(&dir.path().join(name));
        }
        let mut provider = MockProvider::default()
            .with_track("One", "X", "One")
            .with_track("Three", "X", "Three");
        provider
            .searches
            .insert("Two".to_string(), Err("connection reset".to_string()));
        let sink = Arc::new(MockSink::default());

        let report = batch(Arc::new(provider), sink.clone())
            .run(dir.path())
            .await
            .unwrap();
        assert_eq!(report.tagged, 2);
        assert_eq!(report.log.len(), 1);
        let entry = &report.log.entries()[0];
        assert_eq!(file_name(&entry.path), "Two.mp3");
        assert!(entry.reason.contains("network error"));
        assert_eq!(written_names(&sink), vec!["One.mp3", "Three.mp3"]);
    }

    #[tokio::test]
    async fn tag_failures_are_logged() {
        let dir = tempdir();
        touch(&dir.path().join("One.mp3"));
        touch(&dir.path().join("Two.mp3"));
        let provider = MockProvider::default()
            .with_track("One", "X", "One")
            .with_track("Two", "X", "Two");
        let sink = Arc::new(MockSink {
            fail_on: Some("One.mp3".to_string()),
            ..Default::default()
        });

        let report = batch(Arc::new(provider), sink.clone())
            .run(dir.path())
            .await
            .unwrap();
        assert_eq!(report.tagged, 1);
        assert_eq!(report.log.len(), 1);
        assert!(report.log.entries()[0].reason.contains("permission denied"));
        assert_eq!(written_names(&sink), vec!["Two.mp3"]);
    }

    #[tokio::test]
    async fn single_file_is_processed_whatever_its_extension() {
        let dir = tempdir();
        let path = dir.path().join("Voice Memo.m4a");
        touch(&path);
        let provider = Arc::new(MockProvider::default().with_track("Voice Memo", "Me", "Voice Memo"));
        let sink = Arc::new(MockSink::default());

        let report = batch(provider, sink.clone()).run(&path).await.unwrap();
        assert_eq!(report.tagged, 1);
        assert_eq!(report.skipped, 0);
        assert_eq!(written_names(&sink), vec!["Voice Memo.m4a"]);
    }

    #[tokio::test]
    async fn missing_path_is_fatal() {
        let dir = tempdir();
        let path = dir.path().join("nope");
        let res = batch(Arc::new(MockProvider::default()), Arc::new(MockSink::default()))
            .run(&path)
            .await;
        assert!(matches!(res, Err(PathError::NotFound(p)) if p == path));
    }

    #[tokio::test]
    async fn tagging_twice_gives_the_same_container() {
        let dir = tempdir();
        let path = dir.path().join("Cher - Believe.mp3");
        let mut data = vec![0xFF, 0xFB, 0x90, 0x64];
        data.resize(2048, 0);
        fs::write(&path, data).unwrap();

        let mut provider = MockProvider::default();
        provider.searches.insert(
            "Believe Cher".to_string(),
            Ok(vec![candidate("Cher", "Believe")]),
        );
        provider.details.insert(
            ("Cher".to_string(), "Believe".to_string()),
            serde_json::json!({"track": {"name": "Believe", "artist": {"name": "Cher"}}}),
        );
        let resolver = Resolver::new(Box::new(provider), Mode::Quiet.selector(), "Unknown".to_string());
        let batch = Batch::new(resolver, Box::new(FileTagSink), "mp3".to_string());

        let mut snapshots = vec![];
        for _ in 0..2 {
            let report = batch.run(&path).await.unwrap();
            assert!(report.log.is_empty(), "{}", report.log);
            let file = TrackFile::open(&path).unwrap();
            let tags: Vec<_> = TagKey::all()
                .into_iter()
                .map(|k| (file.get_tag(k), file.frame_count(k)))
                .collect();
            snapshots.push(tags);
        }
        assert_eq!(snapshots[0], snapshots[1]);
        assert_eq!(snapshots[0][2], (Some("Unknown".to_string()), 1));
        // no release date: the year frame is never written
        assert_eq!(snapshots[0][4], (None, 0));
    }

    #[tokio::test]
    async fn hidden_files_are_visited() {
        let dir = tempdir();
        touch(&dir.path().join(".Song.mp3"));
        touch(&dir.path().join(".cache/Deep.mp3"));
        let provider = Arc::new(
            MockProvider::default()
                .with_track(".Song", "X", "Song")
                .with_track("Deep", "X", "Deep"),
        );
        let sink = Arc::new(MockSink::default());

        let report = batch(provider.clone(), sink.clone())
            .run(dir.path())
            .await
            .unwrap();
        assert!(report.log.is_empty(), "{}", report.log);
        assert_eq!(report.tagged, 2);
        assert_eq!(written_names(&sink), vec![".Song.mp3", "Deep.mp3"]);
    }

    // Permissions do not apply to root, so these only run as a regular user.
    #[cfg(unix)]
    fn lock(path: &Path) -> bool {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o000)).unwrap();
        fs::read_dir(path).is_err()
    }

    #[cfg(unix)]
    fn unlock(path: &Path) {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn unreadable_subdirectory_is_logged_and_the_rest_processed() {
        let dir = tempdir();
        touch(&dir.path().join("Song.mp3"));
        let locked = dir.path().join("locked");
        touch(&locked.join("Hidden Away.mp3"));
        if !lock(&locked) {
            unlock(&locked);
            return;
        }
        let provider = Arc::new(MockProvider::default().with_track("Song", "X", "Song"));
        let sink = Arc::new(MockSink::default());

        let res = batch(provider, sink.clone()).run(dir.path()).await;
        unlock(&locked);
        let report = res.unwrap();
        assert_eq!(report.tagged, 1);
        assert_eq!(written_names(&sink), vec!["Song.mp3"]);
        assert_eq!(report.log.len(), 1);
        assert_eq!(report.log.entries()[0].path, locked);
        assert!(report.log.entries()[0].reason.contains("error reading directory"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn unreadable_root_is_fatal() {
        let dir = tempdir();
        let root = dir.path().join("music");
        touch(&root.join("Song.mp3"));
        if !lock(&root) {
            unlock(&root);
            return;
        }
        let res = batch(Arc::new(MockProvider::default()), Arc::new(MockSink::default()))
            .run(&root)
            .await;
        unlock(&root);
        assert!(matches!(res, Err(PathError::Walk { path, .. }) if path == root));
    }

    #[test]
    fn error_log_displays_one_line_per_entry() {
        let mut log = ErrorLog::default();
        log.push(Path::new("/a.mp3"), "first".to_string());
        log.push(Path::new("/b.mp3"), "second".to_string());
        assert_eq!(log.to_string(), "/a.mp3: first\n/b.mp3: second\n");
    }
}
