//! Cache of resolved base layout values.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use baselayout_core::{
    walk_chain, BaseLayoutItem, CacheError, Database, ItemRepository, LayoutResult,
};
use tracing::{debug, info};

use crate::key::CacheKey;
use crate::settings::CacheSettings;
use crate::stats::{CacheStats, StatsCounters};

pub(crate) type Entries = BTreeMap<CacheKey, String>;

/// Cache of resolved presentation values, one entry per item per database.
///
/// Every entry operation and every invalidation pass holds the single entry
/// lock for its whole duration, chain walks included, so an invalidation is
/// never lost to a concurrent `put` of the same key.
///
/// # Example
///
/// ```ignore
/// let cache = BaseLayoutValueCache::new(store.clone(), CacheSettings::default());
///
/// let value = match cache.get(&item)? {
///     Some(value) => value,
///     None => {
///         let value = resolve_layout(&item);
///         cache.put(&item, value.clone())?;
///         value
///     }
/// };
///
/// // after saving `base`
/// cache.process_item_update(&base)?;
/// ```
pub struct BaseLayoutValueCache<R: ItemRepository> {
    pub(crate) repository: R,
    settings: CacheSettings,
    enabled: AtomicBool,
    pub(crate) entries: RwLock<Entries>,
    pub(crate) stats: StatsCounters,
}

impl<R: ItemRepository> BaseLayoutValueCache<R> {
    /// Create an empty cache over `repository`.
    pub fn new(repository: R, settings: CacheSettings) -> Self {
        let enabled = AtomicBool::new(settings.enabled);
        Self {
            repository,
            settings,
            enabled,
            entries: RwLock::new(BTreeMap::new()),
            stats: StatsCounters::default(),
        }
    }

    pub fn settings(&self) -> &CacheSettings {
        &self.settings
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    /// Toggle the cache at runtime. Entries are kept while disabled.
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Release);
        info!(enabled, "Base layout cache toggled");
    }

    /// True if the cache is enabled and configured for `database`.
    pub fn is_active(&self, database: &Database) -> bool {
        self.is_enabled() && self.settings.is_active(database)
    }

    /// Compute the cache key of `item`.
    ///
    /// Walks the full base layout chain and fails with a circular reference
    /// error if it revisits an item.
    pub fn compute_key(&self, item: &R::Item) -> LayoutResult<CacheKey> {
        walk_chain(item).into_result().map_err(|err| {
            debug!(item = %item.item_ref(), error = %err, "Cannot key item with cyclic chain");
            err
        })?;
        Ok(CacheKey::new(item.item_ref().clone()))
    }

    /// Look up the cached value of `item`.
    ///
    /// Reports `None` when the cache is disabled or the item's database is
    /// not active.
    pub fn get(&self, item: &R::Item) -> LayoutResult<Option<String>> {
        if !self.is_active(item.item_ref().database()) {
            return Ok(None);
        }

        let entries = self.read()?;
        let key = self.compute_key(item)?;
        let value = entries.get(&key).cloned();
        match value {
            Some(_) => self.stats.record_hit(),
            None => self.stats.record_miss(),
        }
        Ok(value)
    }

    /// Store the value of `item`, replacing any previous value.
    ///
    /// A no-op when the cache is disabled or the item's database is not
    /// active.
    pub fn put(&self, item: &R::Item, value: impl Into<String>) -> LayoutResult<()> {
        if !self.is_active(item.item_ref().database()) {
            return Ok(());
        }

        let mut entries = self.write()?;
        let key = self.compute_key(item)?;
        entries.insert(key, value.into());
        Ok(())
    }

    /// Remove the entry of `item`. Returns true if there was one.
    pub fn remove(&self, item: &R::Item) -> LayoutResult<bool> {
        let key = CacheKey::new(item.item_ref().clone());
        let removed = self.write()?.remove(&key).is_some();
        if removed {
            self.stats.record_removed(1);
            debug!(key = %key, "Removed base layout cache entry");
        }
        Ok(removed)
    }

    /// Remove every entry. Returns the number of entries removed.
    ///
    /// Clearing also recovers a poisoned cache: the entries a panicking
    /// writer may have left behind are dropped with the rest.
    pub fn clear(&self) -> usize {
        let mut entries = self.entries.write().unwrap_or_else(|poisoned| {
            self.entries.clear_poison();
            poisoned.into_inner()
        });
        let removed = entries.len();
        entries.clear();
        drop(entries);

        self.stats.record_removed(removed);
        info!(removed, "Cleared base layout cache");
        removed
    }

    pub fn len(&self) -> usize {
        self.peek().len()
    }

    pub fn is_empty(&self) -> bool {
        self.peek().is_empty()
    }

    /// True if a value is cached for `item`. Does not walk the chain.
    pub fn contains(&self, item: &R::Item) -> bool {
        self.peek()
            .contains_key(&CacheKey::new(item.item_ref().clone()))
    }

    /// Encoded keys starting with `prefix`, in key order.
    ///
    /// Use [`CacheKey::database_prefix`] to list the keys of one database.
    pub fn cache_keys(&self, prefix: &str) -> Vec<String> {
        self.peek()
            .keys()
            .map(CacheKey::encode)
            .filter(|key| key.starts_with(prefix))
            .collect()
    }

    pub fn stats(&self) -> CacheStats {
        let entry_count = self.len();
        self.stats.snapshot(entry_count)
    }

    /// The repository the cache walks chains in.
    pub fn repository(&self) -> &R {
        &self.repository
    }

    pub(crate) fn read(&self) -> LayoutResult<RwLockReadGuard<'_, Entries>> {
        self.entries
            .read()
            .map_err(|_| CacheError::LockPoisoned.into())
    }

    pub(crate) fn write(&self) -> LayoutResult<RwLockWriteGuard<'_, Entries>> {
        self.entries
            .write()
            .map_err(|_| CacheError::LockPoisoned.into())
    }

    // Diagnostics only read, so they look through poisoning.
    fn peek(&self) -> RwLockReadGuard<'_, Entries> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<R: ItemRepository + std::fmt::Debug> std::fmt::Debug for BaseLayoutValueCache<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BaseLayoutValueCache")
            .field("repository", &self.repository)
            .field("settings", &self.settings)
            .field("enabled", &self.is_enabled())
            .field("entries", &self.len())
            .finish()
    }
}
