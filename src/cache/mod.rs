//! Cache capability used to memoise versioned paths.
//!
//! The version provider talks to the cache through [`VersionCache`] only, so hosts can back it
//! with whatever store they already run. [`MemoryVersionCache`] is the in-process default.

mod memory;

use crate::change_token::ChangeToken;
use crate::version::VersionError;

pub use memory::MemoryVersionCache;

/// Producer invoked by [`VersionCache::set`] to compute a missing value.
pub type CreateValue<'a> =
    &'a mut dyn FnMut(&mut CacheEntryContext) -> Result<String, VersionError>;

/// Keyed store of versioned paths with token-driven expiration.
pub trait VersionCache: Send + Sync {
    /// Look up a live entry.
    fn get(&self, key: &str) -> Option<String>;

    /// Compute a value with `create` and store it under `key`.
    ///
    /// The entry expires as soon as any trigger added through the [`CacheEntryContext`] fires.
    /// Implementations are not required to deduplicate concurrent computations for one key.
    fn set(&self, key: &str, create: CreateValue<'_>) -> Result<String, VersionError>;
}

/// Options collected while a cache entry is being created.
#[derive(Debug, Default)]
pub struct CacheEntryContext {
    triggers: Vec<ChangeToken>,
}

impl CacheEntryContext {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Expire the entry once `token` fires.
    pub fn add_expiration_trigger(&mut self, token: ChangeToken) {
        self.triggers.push(token);
    }

    /// Triggers registered so far.
    pub fn triggers(&self) -> &[ChangeToken] {
        &self.triggers
    }

    /// Consume the context, yielding its triggers.
    pub fn into_triggers(self) -> Vec<ChangeToken> {
        self.triggers
    }
}
