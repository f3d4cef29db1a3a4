//! File provider serving a content root on disk.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use parking_lot::Mutex;

use super::{FileInfo, FileProvider, NotFoundFileInfo, ProviderError, file_name, normalise_segments};
use crate::change_token::ChangeToken;

type PendingTokens = Arc<Mutex<HashMap<PathBuf, ChangeToken>>>;

enum WatcherState {
    Idle,
    Running { _watcher: RecommendedWatcher },
    Unavailable,
}

/// Serves files below a directory and watches them through the platform file watcher.
///
/// The watcher is started on the first call to [`FileProvider::watch`] and covers the whole root
/// recursively. Tokens fire once for the first event touching their path and are then dropped.
pub struct PhysicalFileProvider {
    root: PathBuf,
    pending: PendingTokens,
    watcher: Mutex<WatcherState>,
}

impl PhysicalFileProvider {
    /// Create a provider rooted at `root`, which must be an existing directory.
    pub fn new(root: impl AsRef<Path>) -> Result<Self, ProviderError> {
        let root = root.as_ref();
        let canonical = fs::canonicalize(root).map_err(|source| ProviderError::Root {
            path: root.to_path_buf(),
            source,
        })?;
        if !canonical.is_dir() {
            return Err(ProviderError::NotADirectory { path: canonical });
        }

        Ok(Self {
            root: canonical,
            pending: Arc::new(Mutex::new(HashMap::new())),
            watcher: Mutex::new(WatcherState::Idle),
        })
    }

    /// Canonical content root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, subpath: &str) -> Option<PathBuf> {
        let segments = normalise_segments(subpath)?;
        Some(segments.iter().fold(self.root.clone(), |path, segment| path.join(segment)))
    }

    /// Start the watcher if it is not running yet. Returns `false` when watching is unavailable.
    fn ensure_watcher(&self) -> bool {
        let mut state = self.watcher.lock();
        match *state {
            WatcherState::Running { .. } => return true,
            WatcherState::Unavailable => return false,
            WatcherState::Idle => {}
        }

        match start_watcher(&self.root, Arc::clone(&self.pending)) {
            Ok(watcher) => {
                tracing::debug!(root = %self.root.display(), "started content root watcher");
                *state = WatcherState::Running { _watcher: watcher };
                true
            }
            Err(err) => {
                tracing::warn!(
                    root = %self.root.display(),
                    error = %err,
                    "file watching unavailable; versions will not be invalidated"
                );
                *state = WatcherState::Unavailable;
                false
            }
        }
    }
}

impl FileProvider for PhysicalFileProvider {
    fn file_info(&self, subpath: &str) -> Box<dyn FileInfo> {
        let Some(path) = self.resolve(subpath) else {
            tracing::trace!(subpath, "rejected path outside the content root");
            return Box::new(NotFoundFileInfo::new(subpath));
        };

        match fs::metadata(&path) {
            Ok(metadata) if metadata.is_file() => Box::new(PhysicalFileInfo {
                name: file_name(subpath).to_string(),
                path,
            }),
            _ => Box::new(NotFoundFileInfo::new(subpath)),
        }
    }

    fn watch(&self, filter: &str) -> ChangeToken {
        let Some(path) = self.resolve(filter) else {
            return ChangeToken::never();
        };
        if !self.ensure_watcher() {
            return ChangeToken::never();
        }

        let mut pending = self.pending.lock();
        match pending.get(&path) {
            Some(token) if !token.has_changed() => token.clone(),
            _ => {
                let token = ChangeToken::new();
                pending.insert(path, token.clone());
                token
            }
        }
    }
}

fn start_watcher(root: &Path, pending: PendingTokens) -> notify::Result<RecommendedWatcher> {
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
        match res {
            Ok(event) => fire_matching(&pending, &event),
            Err(err) => tracing::warn!(error = %err, "file watcher error"),
        }
    })?;
    watcher.watch(root, RecursiveMode::Recursive)?;
    Ok(watcher)
}

fn fire_matching(pending: &PendingTokens, event: &notify::Event) {
    // Reads performed while hashing show up as access events.
    if matches!(
        event.kind,
        EventKind::Access(_) | EventKind::Modify(notify::event::ModifyKind::Metadata(_))
    ) {
        return;
    }

    let fired: Vec<(PathBuf, ChangeToken)> = {
        let mut pending = pending.lock();
        let keys: Vec<PathBuf> = pending
            .keys()
            .filter(|key| event.paths.iter().any(|changed| key.starts_with(changed)))
            .cloned()
            .collect();
        keys.into_iter()
            .filter_map(|key| pending.remove(&key).map(|token| (key, token)))
            .collect()
    };

    for (path, token) in fired {
        tracing::debug!(path = %path.display(), "watched file changed");
        token.fire();
    }
}

struct PhysicalFileInfo {
    name: String,
    path: PathBuf,
}

impl FileInfo for PhysicalFileInfo {
    fn exists(&self) -> bool {
        true
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn physical_path(&self) -> Option<&Path> {
        Some(&self.path)
    }

    fn create_read_stream(&self) -> io::Result<Box<dyn Read + Send>> {
        let file = File::open(&self.path)?;
        Ok(Box::new(BufReader::new(file)))
    }
}
