//! Content-hash versioning of static asset paths.
//!
//! [`FileVersionProvider`] turns `/css/site.css` into `/css/site.css?v=<token>`, where the token
//! is the unpadded base64url SHA-256 of the file. Browsers can then cache the asset forever and
//! still pick up a new copy as soon as its content changes.

use std::io::{self, Read};
use std::sync::Arc;

use base64::{Engine as _, engine::general_purpose};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::asset_paths::{
    append_query_parameter, is_external_path, split_asset_path, strip_app_name,
};
use crate::cache::{CacheEntryContext, VersionCache};
use crate::file_provider::{FileInfo, FileProvider};

/// Query string parameter carrying the version token.
pub const VERSION_KEY: &str = "v";

/// Errors raised while versioning an asset path.
#[derive(Debug, Error)]
pub enum VersionError {
    /// The file exists but could not be read.
    #[error("failed to read {path} while computing its version: {source}")]
    Read {
        /// Path handed to the file provider.
        path: String,
        /// Source I/O error.
        source: io::Error,
    },
}

/// Appends content-derived version tokens to root-relative asset paths.
///
/// The provider keeps no mutable state of its own and can be shared freely between threads.
/// When a cache is configured every computed path is stored under the original path and expires
/// when the file provider reports a change to the underlying file.
#[derive(Clone)]
pub struct FileVersionProvider {
    file_provider: Arc<dyn FileProvider>,
    app_name: Option<String>,
    cache: Option<Arc<dyn VersionCache>>,
}

impl FileVersionProvider {
    /// Create a provider over `file_provider`.
    ///
    /// `app_name` names the virtual sub-path the application is mounted under; asset paths whose
    /// first segment matches it are looked up without that segment.
    pub fn new(
        file_provider: Arc<dyn FileProvider>,
        app_name: Option<String>,
        cache: Option<Arc<dyn VersionCache>>,
    ) -> Self {
        Self {
            file_provider,
            app_name: app_name.filter(|name| !name.trim_matches('/').is_empty()),
            cache,
        }
    }

    /// Use `cache` to memoise computed paths.
    pub fn with_cache(mut self, cache: Arc<dyn VersionCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Strip `app_name` from asset paths before resolving them.
    pub fn with_app_name(mut self, app_name: impl Into<String>) -> Self {
        let app_name = app_name.into();
        self.app_name = (!app_name.trim_matches('/').is_empty()).then_some(app_name);
        self
    }

    /// Configured application name, if any.
    pub fn app_name(&self) -> Option<&str> {
        self.app_name.as_deref()
    }

    /// Append the version of the file behind `path` as a `v` query parameter.
    ///
    /// External references and paths without a backing file are returned unchanged. Read failures
    /// are propagated; nothing is retried or cached for them.
    pub fn add_version_to_file_path(&self, path: &str) -> Result<String, VersionError> {
        let parts = split_asset_path(path);
        if parts.path.is_empty() || is_external_path(parts.path) {
            tracing::trace!(path, "leaving external asset path unversioned");
            return Ok(path.to_string());
        }

        let resolved = self.resolve_lookup_path(parts.path);
        tracing::trace!(
            path,
            resolved,
            query = ?parts.query,
            fragment = ?parts.fragment,
            "versioning local asset path"
        );
        let Some(cache) = &self.cache else {
            return self.compute_versioned_path(path, resolved);
        };

        if let Some(value) = cache.get(path) {
            tracing::trace!(path, "versioned path served from cache");
            return Ok(value);
        }

        cache.set(path, &mut |context: &mut CacheEntryContext| {
            context.add_expiration_trigger(self.file_provider.watch(resolved));
            self.compute_versioned_path(path, resolved)
        })
    }

    fn resolve_lookup_path<'a>(&self, path: &'a str) -> &'a str {
        self.app_name
            .as_deref()
            .and_then(|app_name| strip_app_name(path, app_name))
            .unwrap_or(path)
    }

    fn compute_versioned_path(
        &self,
        original: &str,
        resolved: &str,
    ) -> Result<String, VersionError> {
        let file_info = self.file_provider.file_info(resolved);
        if !file_info.exists() {
            tracing::debug!(path = original, resolved, "no file found; leaving path unversioned");
            return Ok(original.to_string());
        }

        let token = hash_file(file_info.as_ref()).map_err(|source| VersionError::Read {
            path: resolved.to_string(),
            source,
        })?;
        tracing::debug!(
            path = original,
            file = file_info.name(),
            physical_path = ?file_info.physical_path(),
            version = %token,
            "computed asset version"
        );

        Ok(append_query_parameter(original, VERSION_KEY, &token))
    }
}

/// Compute the version token for everything `reader` yields.
pub fn compute_version_token(mut reader: impl Read) -> io::Result<String> {
    let mut hasher = Sha256::new();
    io::copy(&mut reader, &mut hasher)?;
    Ok(general_purpose::URL_SAFE_NO_PAD.encode(hasher.finalize()))
}

fn hash_file(file_info: &dyn FileInfo) -> io::Result<String> {
    let stream = file_info.create_read_stream()?;
    compute_version_token(stream)
}
