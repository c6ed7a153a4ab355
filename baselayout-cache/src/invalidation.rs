//! Invalidation driven by item update notifications.
//!
//! An update to a standard values item flushes the item's whole database:
//! items fall back to their template's standard values outside of the base
//! layout chain, so the affected entries cannot be told apart. Any other
//! update removes exactly the entries whose chain, walked against the current
//! graph, passes through the updated item.

use baselayout_core::{walk_chain, BaseLayoutItem, Database, ItemRef, ItemRepository, LayoutResult};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::key::CacheKey;
use crate::value_cache::BaseLayoutValueCache;

/// Outcome of [`BaseLayoutValueCache::process_item_update`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvalidationResult {
    /// The cache is disabled; nothing was touched.
    Disabled,
    /// The updated item's database is not cached.
    InactiveDatabase(Database),
    /// A standard values item changed; every entry of the database was removed.
    DatabaseFlushed { database: Database, removed: usize },
    /// Entries depending on the updated item were removed.
    ///
    /// `orphaned` lists entries dropped during the same sweep because their
    /// own item no longer exists, whether or not it related to the update.
    DependentsRemoved {
        database: Database,
        removed: Vec<ItemRef>,
        orphaned: Vec<ItemRef>,
    },
}

impl InvalidationResult {
    /// Number of entries removed.
    pub fn removed_count(&self) -> usize {
        match self {
            InvalidationResult::Disabled | InvalidationResult::InactiveDatabase(_) => 0,
            InvalidationResult::DatabaseFlushed { removed, .. } => *removed,
            InvalidationResult::DependentsRemoved {
                removed, orphaned, ..
            } => removed.len() + orphaned.len(),
        }
    }
}

impl<R: ItemRepository> BaseLayoutValueCache<R> {
    /// Invalidate the entries affected by a committed change to `item`.
    ///
    /// Call once per change, deletions included; a deleted item still
    /// invalidates the entries whose chains pointed at it. Entries in other
    /// databases are never touched.
    ///
    /// The dependency sweep also drops entries whose own item no longer
    /// resolves. Those are reported as `orphaned`, apart from the entries
    /// that depend on `item`.
    pub fn process_item_update(&self, item: &R::Item) -> LayoutResult<InvalidationResult> {
        let updated = item.item_ref();
        let database = updated.database();

        if !self.is_enabled() {
            return Ok(InvalidationResult::Disabled);
        }
        if !self.settings().is_active(database) {
            return Ok(InvalidationResult::InactiveDatabase(database.clone()));
        }

        if item.is_standard_values() {
            let removed = self.flush_database(database)?;
            return Ok(InvalidationResult::DatabaseFlushed {
                database: database.clone(),
                removed,
            });
        }

        let (removed, orphaned) = self.remove_dependents(updated)?;
        Ok(InvalidationResult::DependentsRemoved {
            database: database.clone(),
            removed,
            orphaned,
        })
    }

    fn flush_database(&self, database: &Database) -> LayoutResult<usize> {
        let mut entries = self.write()?;
        let before = entries.len();
        entries.retain(|key, _| key.database() != database);
        let removed = before - entries.len();
        drop(entries);

        self.stats.record_flush();
        self.stats.record_removed(removed);
        info!(database = %database, removed, "Flushed base layout cache database");
        Ok(removed)
    }

    /// Sweep `updated`'s database. Returns the removed dependents and the
    /// removed orphans.
    fn remove_dependents(&self, updated: &ItemRef) -> LayoutResult<(Vec<ItemRef>, Vec<ItemRef>)> {
        let database = updated.database();
        let mut entries = self.write()?;

        let mut removed = Vec::new();
        let mut orphaned = Vec::new();
        for key in entries
            .keys()
            .skip_while(|key| key.database() < database)
            .take_while(|key| key.database() == database)
        {
            match self.staleness(key, updated) {
                Some(Staleness::Dependent) => removed.push(key.item_ref().clone()),
                Some(Staleness::Orphaned) => orphaned.push(key.item_ref().clone()),
                None => {}
            }
        }
        for item_ref in removed.iter().chain(&orphaned) {
            entries.remove(&CacheKey::new(item_ref.clone()));
        }
        drop(entries);

        self.stats.record_removed(removed.len() + orphaned.len());
        debug!(
            item = %updated,
            removed = removed.len(),
            orphaned = orphaned.len(),
            "Removed base layout cache dependents"
        );
        Ok((removed, orphaned))
    }

    /// Why the entry under `key` has to go, if it does.
    fn staleness(&self, key: &CacheKey, updated: &ItemRef) -> Option<Staleness> {
        if key.item_ref() == updated {
            return Some(Staleness::Dependent);
        }

        let Some(start) = self.repository.item(key.item_ref()) else {
            warn!(key = %key, "Cached item no longer resolves, dropping entry");
            return Some(Staleness::Orphaned);
        };

        let chain = walk_chain(&start);
        if let Some(revisited) = chain.revisited() {
            warn!(
                key = %key,
                revisited = %revisited,
                "Circular base layout reference met during invalidation"
            );
        }
        chain.depends_on(updated).then_some(Staleness::Dependent)
    }
}

enum Staleness {
    /// The entry's chain passes through the updated item.
    Dependent,
    /// The entry's own item no longer exists.
    Orphaned,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::CacheSettings;
    use baselayout_core::{InMemoryItemStore, ItemDefinition, ItemId, StoredItem};

    fn setup() -> (InMemoryItemStore, BaseLayoutValueCache<InMemoryItemStore>) {
        let store = InMemoryItemStore::new();
        let cache = BaseLayoutValueCache::new(store.clone(), CacheSettings::default());
        (store, cache)
    }

    fn derived(store: &InMemoryItemStore, base: &StoredItem) -> StoredItem {
        store.create_item(
            base.item_ref().database(),
            ItemDefinition::new().with_base_layout(base.item_ref().id()),
        )
    }

    #[test]
    fn test_unrelated_update_removes_nothing() {
        let (store, cache) = setup();
        let first = store.create_item(&Database::master(), ItemDefinition::new());
        let second = store.create_item(&Database::master(), ItemDefinition::new());
        let unrelated = store.create_item(&Database::master(), ItemDefinition::new());
        cache.put(&first, "a").expect("put");
        cache.put(&second, "b").expect("put");

        let result = cache.process_item_update(&unrelated).expect("invalidate");

        assert_eq!(result.removed_count(), 0);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_updating_cached_item_removes_its_entry() {
        let (store, cache) = setup();
        let item = store.create_item(&Database::master(), ItemDefinition::new());
        cache.put(&item, "a").expect("put");

        let result = cache.process_item_update(&item).expect("invalidate");

        assert_eq!(
            result,
            InvalidationResult::DependentsRemoved {
                database: Database::master(),
                removed: vec![item.item_ref().clone()],
                orphaned: vec![],
            }
        );
        assert!(cache.is_empty());
    }

    #[test]
    fn test_updating_base_removes_dependent() {
        let (store, cache) = setup();
        let base = store.create_item(&Database::master(), ItemDefinition::new());
        let item = derived(&store, &base);
        cache.put(&item, "a").expect("put");
        cache.put(&base, "b").expect("put");

        let result = cache.process_item_update(&base).expect("invalidate");

        assert_eq!(result.removed_count(), 2);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_updating_dependent_keeps_base() {
        let (store, cache) = setup();
        let base = store.create_item(&Database::master(), ItemDefinition::new());
        let item = derived(&store, &base);
        cache.put(&item, "a").expect("put");
        cache.put(&base, "b").expect("put");

        cache.process_item_update(&item).expect("invalidate");

        assert!(cache.contains(&base));
        assert!(!cache.contains(&item));
    }

    #[test]
    fn test_update_in_other_database_never_removes() {
        let (store, cache) = setup();
        let id = ItemId::now_v7();
        let master = store.add_item(ItemRef::new(Database::master(), id), ItemDefinition::new());
        let web = store.add_item(ItemRef::new(Database::web(), id), ItemDefinition::new());
        cache.put(&master, "a").expect("put");

        let result = cache.process_item_update(&web).expect("invalidate");

        assert_eq!(result.removed_count(), 0);
        assert!(cache.contains(&master));
    }

    #[test]
    fn test_standard_values_flushes_database() {
        let (store, cache) = setup();
        let master = store.create_item(&Database::master(), ItemDefinition::new());
        let web = store.create_item(&Database::web(), ItemDefinition::new());
        let standard_values =
            store.create_item(&Database::master(), ItemDefinition::new().standard_values());
        cache.put(&master, "a").expect("put");
        cache.put(&web, "b").expect("put");

        let result = cache.process_item_update(&standard_values).expect("invalidate");

        assert_eq!(
            result,
            InvalidationResult::DatabaseFlushed {
                database: Database::master(),
                removed: 1,
            }
        );
        assert!(cache.contains(&web));
        assert_eq!(cache.stats().database_flushes, 1);
    }

    #[test]
    fn test_disabled_and_inactive_are_skipped() {
        let store = InMemoryItemStore::new();
        let cache = BaseLayoutValueCache::new(
            store.clone(),
            CacheSettings::default().with_databases([Database::master()]),
        );
        let item = store.create_item(&Database::master(), ItemDefinition::new());
        let web = store.create_item(&Database::web(), ItemDefinition::new().standard_values());
        cache.put(&item, "a").expect("put");

        assert_eq!(
            cache.process_item_update(&web).expect("invalidate"),
            InvalidationResult::InactiveDatabase(Database::web())
        );

        cache.set_enabled(false);
        assert_eq!(
            cache.process_item_update(&item).expect("invalidate"),
            InvalidationResult::Disabled
        );
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_deleted_base_still_invalidates_dependents() {
        let (store, cache) = setup();
        let base = store.create_item(&Database::master(), ItemDefinition::new());
        let item = derived(&store, &base);
        cache.put(&item, "a").expect("put");

        store.remove(base.item_ref());
        cache.process_item_update(&base).expect("invalidate");

        assert!(cache.is_empty());
    }

    #[test]
    fn test_deleted_cached_item_is_dropped_by_any_sweep() {
        let (store, cache) = setup();
        let item = store.create_item(&Database::master(), ItemDefinition::new());
        let unrelated = store.create_item(&Database::master(), ItemDefinition::new());
        cache.put(&item, "a").expect("put");

        store.remove(item.item_ref());
        let result = cache.process_item_update(&unrelated).expect("invalidate");

        assert_eq!(
            result,
            InvalidationResult::DependentsRemoved {
                database: Database::master(),
                removed: vec![],
                orphaned: vec![item.item_ref().clone()],
            }
        );
        assert_eq!(result.removed_count(), 1);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_cycle_during_sweep_does_not_fail() {
        let (store, cache) = setup();
        let base = store.create_item(&Database::master(), ItemDefinition::new());
        let item = derived(&store, &base);
        let other = store.create_item(&Database::master(), ItemDefinition::new());
        cache.put(&item, "a").expect("put");
        cache.put(&other, "b").expect("put");

        // An editor persists a cycle after the entries were cached.
        store
            .set_base_layout(base.item_ref(), Some(item.item_ref().id()))
            .expect("base exists");

        let result = cache.process_item_update(&base).expect("invalidate");

        assert_eq!(result.removed_count(), 1);
        assert!(cache.contains(&other));
    }

    #[test]
    fn test_invalidation_is_not_lost_to_concurrent_put() {
        use std::sync::atomic::{AtomicU64, Ordering};

        const ROUNDS: u64 = 500;

        let (store, cache) = setup();
        let base = store.create_item(&Database::master(), ItemDefinition::new());
        let item = derived(&store, &base);
        let last_put = AtomicU64::new(0);

        std::thread::scope(|scope| {
            scope.spawn(|| {
                for version in 1..=ROUNDS {
                    cache.put(&item, version.to_string()).expect("put");
                    last_put.store(version, Ordering::SeqCst);
                }
            });
            scope.spawn(|| {
                for _ in 0..ROUNDS {
                    // Every put that finished before the sweep started must be gone.
                    let finished = last_put.load(Ordering::SeqCst);
                    cache.process_item_update(&base).expect("invalidate");
                    if let Some(value) = cache.get(&item).expect("get") {
                        let version: u64 = value.parse().expect("numeric version");
                        assert!(
                            version > finished,
                            "version {version} survived an invalidation started after it"
                        );
                    }
                }
            });
        });

        assert_eq!(last_put.load(Ordering::SeqCst), ROUNDS);
        cache.process_item_update(&base).expect("invalidate");
        assert!(cache.is_empty());
    }
}
