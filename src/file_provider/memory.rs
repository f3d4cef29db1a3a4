//! In-memory file provider for embedded assets and tests.

use std::collections::HashMap;
use std::io::{self, Cursor, Read};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use super::{FileInfo, FileProvider, NotFoundFileInfo, file_name, normalise_segments};
use crate::change_token::ChangeToken;

/// File provider backed by a map of root-relative paths to byte buffers.
///
/// Replacing or removing a file fires the token handed out by [`FileProvider::watch`] for that
/// path, which makes it a convenient stand-in for a watched directory.
#[derive(Default)]
pub struct MemoryFileProvider {
    files: RwLock<HashMap<String, Arc<[u8]>>>,
    watchers: Mutex<HashMap<String, ChangeToken>>,
}

impl MemoryFileProvider {
    /// Create an empty provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the file at `path`.
    pub fn insert(&self, path: &str, contents: impl Into<Vec<u8>>) {
        let Some(key) = normalise_key(path) else {
            return;
        };
        let bytes: Arc<[u8]> = Arc::from(contents.into());
        self.files.write().insert(key.clone(), bytes);
        self.notify(&key);
    }

    /// Remove the file at `path`, returning whether it was present.
    pub fn remove(&self, path: &str) -> bool {
        let Some(key) = normalise_key(path) else {
            return false;
        };
        let removed = self.files.write().remove(&key).is_some();
        if removed {
            self.notify(&key);
        }
        removed
    }

    /// Number of files held by the provider.
    pub fn len(&self) -> usize {
        self.files.read().len()
    }

    /// Returns `true` when the provider holds no files.
    pub fn is_empty(&self) -> bool {
        self.files.read().is_empty()
    }

    fn notify(&self, key: &str) {
        let token = self.watchers.lock().remove(key);
        if let Some(token) = token {
            token.fire();
        }
    }
}

impl FileProvider for MemoryFileProvider {
    fn file_info(&self, subpath: &str) -> Box<dyn FileInfo> {
        let contents = normalise_key(subpath).and_then(|key| self.files.read().get(&key).cloned());
        match contents {
            Some(contents) => Box::new(MemoryFileInfo {
                name: file_name(subpath).to_string(),
                contents,
            }),
            None => Box::new(NotFoundFileInfo::new(subpath)),
        }
    }

    fn watch(&self, filter: &str) -> ChangeToken {
        let Some(key) = normalise_key(filter) else {
            return ChangeToken::never();
        };

        let mut watchers = self.watchers.lock();
        match watchers.get(&key) {
            Some(token) if !token.has_changed() => token.clone(),
            _ => {
                let token = ChangeToken::new();
                watchers.insert(key, token.clone());
                token
            }
        }
    }
}

struct MemoryFileInfo {
    name: String,
    contents: Arc<[u8]>,
}

impl FileInfo for MemoryFileInfo {
    fn exists(&self) -> bool {
        true
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn create_read_stream(&self) -> io::Result<Box<dyn Read + Send>> {
        Ok(Box::new(Cursor::new(Arc::clone(&self.contents))))
    }
}

fn normalise_key(path: &str) -> Option<String> {
    normalise_segments(path).map(|segments| format!("/{}", segments.join("/")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_all(info: &dyn FileInfo) -> Vec<u8> {
        let mut buffer = Vec::new();
        info.create_read_stream()
            .unwrap()
            .read_to_end(&mut buffer)
            .unwrap();
        buffer
    }

    #[test]
    fn serves_inserted_files() {
        let provider = MemoryFileProvider::new();
        provider.insert("/css/site.css", "body {}");

        let info = provider.file_info("css/site.css");
        assert!(info.exists());
        assert_eq!(info.name(), "site.css");
        assert_eq!(read_all(info.as_ref()), b"body {}");
        assert_eq!(provider.len(), 1);
    }

    #[test]
    fn reports_missing_files() {
        let provider = MemoryFileProvider::new();
        assert!(provider.is_empty());
        assert!(!provider.file_info("/missing.js").exists());
        assert!(!provider.file_info("/../escape.js").exists());
    }

    #[test]
    fn replacing_a_file_fires_its_token() {
        let provider = MemoryFileProvider::new();
        provider.insert("/app.js", "one");

        let token = provider.watch("/app.js");
        let other = provider.watch("/other.js");
        assert!(token.same_token(&provider.watch("app.js")));

        provider.insert("/app.js", "two");
        assert!(token.has_changed());
        assert!(!other.has_changed());

        let renewed = provider.watch("/app.js");
        assert!(!renewed.has_changed());
        assert!(!renewed.same_token(&token));
    }

    #[test]
    fn removing_a_file_fires_its_token() {
        let provider = MemoryFileProvider::new();
        provider.insert("/app.js", "one");
        let token = provider.watch("/app.js");

        assert!(provider.remove("/app.js"));
        assert!(token.has_changed());
        assert!(!provider.remove("/app.js"));
    }

    #[test]
    fn watching_a_missing_file_fires_when_created() {
        let provider = MemoryFileProvider::new();
        let token = provider.watch("/later.css");

        provider.insert("/later.css", "h1 {}");
        assert!(token.has_changed());
    }
}
