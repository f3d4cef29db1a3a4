//! File access capability consumed by the version provider.
//!
//! A provider maps root-relative sub-paths (`/css/site.css`) onto files and hands out
//! [`ChangeToken`]s that fire when the file behind a path changes. Two implementations ship with
//! the crate: [`PhysicalFileProvider`] serves a directory on disk and [`MemoryFileProvider`]
//! serves an in-memory set of files.

mod memory;
mod physical;

use std::io::{self, Read};
use std::path::{Component, Path, PathBuf};

use thiserror::Error;

use crate::change_token::ChangeToken;

pub use memory::MemoryFileProvider;
pub use physical::PhysicalFileProvider;

/// Resolves root-relative paths to files and watches them for changes.
pub trait FileProvider: Send + Sync {
    /// Look up the file at `subpath`. Missing files are reported through [`FileInfo::exists`].
    fn file_info(&self, subpath: &str) -> Box<dyn FileInfo>;

    /// Obtain a token that fires once the file at `filter` changes.
    fn watch(&self, filter: &str) -> ChangeToken;
}

/// Handle to a single file returned by a [`FileProvider`].
pub trait FileInfo: Send {
    /// Whether the file exists.
    fn exists(&self) -> bool;

    /// File name without directory components.
    fn name(&self) -> &str;

    /// Location on disk, when the file is backed by one.
    fn physical_path(&self) -> Option<&Path> {
        None
    }

    /// Open the file for reading.
    fn create_read_stream(&self) -> io::Result<Box<dyn Read + Send>>;
}

/// Errors raised while constructing a file provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The content root does not exist or is not a directory.
    #[error("content root {} is not a directory", path.display())]
    NotADirectory {
        /// Offending root.
        path: PathBuf,
    },
    /// The content root could not be canonicalised.
    #[error("failed to resolve content root {}: {source}", path.display())]
    Root {
        /// Offending root.
        path: PathBuf,
        /// Source I/O error.
        source: io::Error,
    },
}

/// Placeholder returned for paths that do not resolve to a file.
#[derive(Debug, Clone)]
pub struct NotFoundFileInfo {
    name: String,
}

impl NotFoundFileInfo {
    /// Describe a missing file by the path it was requested as.
    pub fn new(subpath: &str) -> Self {
        Self {
            name: file_name(subpath).to_string(),
        }
    }
}

impl FileInfo for NotFoundFileInfo {
    fn exists(&self) -> bool {
        false
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn create_read_stream(&self) -> io::Result<Box<dyn Read + Send>> {
        Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("file {} does not exist", self.name),
        ))
    }
}

/// Normalise a root-relative sub-path into its segments.
///
/// Backslashes are treated as separators, empty and `.` segments are dropped. Returns `None` for
/// paths that try to climb out of the root with `..` or carry a segment the platform reads as
/// anything other than a plain name, such as a drive prefix (`C:`) on Windows.
pub(crate) fn normalise_segments(subpath: &str) -> Option<Vec<&str>> {
    let mut segments = Vec::new();
    for segment in subpath.split(['/', '\\']) {
        match segment {
            "" | "." => continue,
            ".." => return None,
            other if is_plain_segment(other) => segments.push(other),
            _ => return None,
        }
    }
    Some(segments)
}

fn is_plain_segment(segment: &str) -> bool {
    let mut components = Path::new(segment).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

/// Last non-empty segment of `subpath`.
pub(crate) fn file_name(subpath: &str) -> &str {
    subpath
        .rsplit(['/', '\\'])
        .find(|segment| !segment.is_empty())
        .unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalises_separators_and_dots() {
        assert_eq!(
            normalise_segments("/css//./site.css").unwrap(),
            vec!["css", "site.css"]
        );
        assert_eq!(
            normalise_segments("\\js\\app.js").unwrap(),
            vec!["js", "app.js"]
        );
        assert!(normalise_segments("/").unwrap().is_empty());
    }

    #[test]
    fn rejects_parent_segments() {
        assert!(normalise_segments("/../secret.txt").is_none());
        assert!(normalise_segments("/css/../../secret.txt").is_none());
    }

    #[cfg(windows)]
    #[test]
    fn rejects_drive_prefixed_segments() {
        assert!(normalise_segments("/C:/Windows/win.ini").is_none());
        assert!(normalise_segments("/css/a:b/site.css").is_none());
    }

    #[test]
    fn accepts_plain_names() {
        assert_eq!(
            normalise_segments("/css/site.min.css").unwrap(),
            vec!["css", "site.min.css"]
        );
        assert!(is_plain_segment("..."));
        assert!(!is_plain_segment(".."));
    }

    #[test]
    fn not_found_info_reports_missing() {
        let info = NotFoundFileInfo::new("/images/logo.png");
        assert!(!info.exists());
        assert_eq!(info.name(), "logo.png");
        assert!(info.physical_path().is_none());
        assert_eq!(
            info.create_read_stream().err().map(|err| err.kind()),
            Some(io::ErrorKind::NotFound)
        );
    }
}
