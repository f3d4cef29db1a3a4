//! In-process cache evicting entries when their change tokens fire.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;

use super::{CacheEntryContext, CreateValue, VersionCache};
use crate::change_token::ChangeToken;
use crate::version::VersionError;

struct CacheEntry {
    generation: u64,
    value: String,
    triggers: Vec<ChangeToken>,
}

impl CacheEntry {
    fn is_expired(&self) -> bool {
        self.triggers.iter().any(ChangeToken::has_changed)
    }
}

#[derive(Default)]
struct CacheInner {
    entries: RwLock<HashMap<String, CacheEntry>>,
    next_generation: AtomicU64,
}

impl CacheInner {
    fn evict(&self, key: &str, generation: u64) {
        let mut entries = self.entries.write();
        if entries
            .get(key)
            .is_some_and(|entry| entry.generation == generation)
        {
            entries.remove(key);
            tracing::debug!(key, "evicted versioned path");
        }
    }
}

/// Thread-safe [`VersionCache`] held in memory.
///
/// Values are computed outside the lock, so concurrent misses for one key may each run the
/// producer; the last writer wins. Eviction is tied to the generation of the entry that
/// registered the trigger, so a late token never removes a newer value.
#[derive(Clone, Default)]
pub struct MemoryVersionCache {
    inner: Arc<CacheInner>,
}

impl MemoryVersionCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, including expired ones not yet evicted.
    pub fn len(&self) -> usize {
        self.inner.entries.read().len()
    }

    /// Returns `true` when nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.inner.entries.read().is_empty()
    }

    /// Drop the entry for `key`, returning whether one was present.
    pub fn remove(&self, key: &str) -> bool {
        self.inner.entries.write().remove(key).is_some()
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.inner.entries.write().clear();
    }
}

impl VersionCache for MemoryVersionCache {
    fn get(&self, key: &str) -> Option<String> {
        let generation = {
            let entries = self.inner.entries.read();
            let entry = entries.get(key)?;
            if !entry.is_expired() {
                return Some(entry.value.clone());
            }
            entry.generation
        };

        self.inner.evict(key, generation);
        None
    }

    fn set(&self, key: &str, create: CreateValue<'_>) -> Result<String, VersionError> {
        let mut context = CacheEntryContext::new();
        let value = create(&mut context)?;
        let triggers = context.into_triggers();

        if triggers.iter().any(ChangeToken::has_changed) {
            tracing::trace!(key, "skipping cache insert for already expired entry");
            return Ok(value);
        }

        let generation = self.inner.next_generation.fetch_add(1, Ordering::Relaxed);
        self.inner.entries.write().insert(
            key.to_string(),
            CacheEntry {
                generation,
                value: value.clone(),
                triggers: triggers.clone(),
            },
        );

        // Registered outside the lock: a token that already fired runs its callback inline.
        for trigger in triggers {
            let inner: Weak<CacheInner> = Arc::downgrade(&self.inner);
            let key = key.to_string();
            trigger.register_callback(move || {
                if let Some(inner) = inner.upgrade() {
                    inner.evict(&key, generation);
                }
            });
        }

        Ok(value)
    }
}
