//! Base Layout Test Utilities
//!
//! Shared test infrastructure for the base layout workspace:
//! - Proptest generators for identities and link graphs
//! - Fixtures that build chains, cycles and caches in an in-memory store
//! - Custom assertions for layout errors and cache contents

// Re-export the types tests reach for most
pub use baselayout_cache::{
    BaseLayoutValueCache, CacheKey, CacheSettings, CacheStats, InvalidationResult,
};
pub use baselayout_core::{
    BaseLayoutItem, BaseLayoutValidator, CacheError, ConfigError, Database, InMemoryItemStore,
    ItemDefinition, ItemId, ItemRef, LayoutError, LayoutResult, StoredItem, ValidationError,
};

use uuid::Uuid;

/// Cache over an in-memory store, the combination most tests use.
pub type TestCache = BaseLayoutValueCache<InMemoryItemStore>;

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for base layout types.

    use super::*;
    use proptest::prelude::*;

    /// Generate a random UUID.
    pub fn arb_uuid() -> impl Strategy<Value = Uuid> {
        any::<[u8; 16]>().prop_map(Uuid::from_bytes)
    }

    /// Generate a random ItemId.
    pub fn arb_item_id() -> impl Strategy<Value = ItemId> {
        arb_uuid().prop_map(ItemId::new)
    }

    /// Generate a valid database label.
    pub fn arb_database() -> impl Strategy<Value = Database> {
        prop_oneof![
            Just(Database::master()),
            Just(Database::web()),
            "[a-z][a-z0-9_-]{0,7}".prop_map(|label| {
                Database::new(label).expect("generated label is valid")
            }),
        ]
    }

    /// Generate a random ItemRef.
    pub fn arb_item_ref() -> impl Strategy<Value = ItemRef> {
        (arb_database(), arb_item_id()).prop_map(|(database, id)| ItemRef::new(database, id))
    }

    /// Generate a link graph of 1..`max_items` items: entry `i` is the index
    /// of item `i`'s base layout, if any. Cycles are allowed.
    pub fn arb_link_graph(max_items: usize) -> impl Strategy<Value = Vec<Option<usize>>> {
        (1..max_items.max(2))
            .prop_flat_map(|n| prop::collection::vec(prop::option::of(0..n), n))
    }

    /// Generate an acyclic link graph: every item links to a later item or
    /// to nothing.
    pub fn arb_acyclic_link_graph(max_items: usize) -> impl Strategy<Value = Vec<Option<usize>>> {
        arb_link_graph(max_items).prop_map(|links| {
            links
                .into_iter()
                .enumerate()
                .map(|(i, link)| link.filter(|target| *target > i))
                .collect()
        })
    }

    /// Generate valid cache settings.
    pub fn arb_settings() -> impl Strategy<Value = CacheSettings> {
        (
            any::<bool>(),
            prop::collection::btree_set(arb_database(), 1..4),
        )
            .prop_map(|(enabled, databases)| {
                CacheSettings::new()
                    .with_enabled(enabled)
                    .with_databases(databases)
            })
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built test fixtures for common testing scenarios.

    use super::*;

    /// Settings caching only the `master` database.
    pub fn master_only_settings() -> CacheSettings {
        CacheSettings::new().with_databases([Database::master()])
    }

    /// A fresh store and an enabled cache over it with default settings.
    pub fn store_and_cache() -> (InMemoryItemStore, TestCache) {
        store_and_cache_with(CacheSettings::default())
    }

    /// A fresh store and a cache over it.
    pub fn store_and_cache_with(settings: CacheSettings) -> (InMemoryItemStore, TestCache) {
        let store = InMemoryItemStore::new();
        let cache = BaseLayoutValueCache::new(store.clone(), settings);
        (store, cache)
    }

    /// An item without a base layout.
    pub fn plain_item(store: &InMemoryItemStore, database: &Database) -> StoredItem {
        store.create_item(database, ItemDefinition::new())
    }

    /// An item using `base` as its base layout.
    pub fn derived_item(store: &InMemoryItemStore, base: &StoredItem) -> StoredItem {
        store.create_item(
            base.item_ref().database(),
            ItemDefinition::new().with_base_layout(base.item_ref().id()),
        )
    }

    /// A standard values item.
    pub fn standard_values_item(store: &InMemoryItemStore, database: &Database) -> StoredItem {
        store.create_item(database, ItemDefinition::new().standard_values())
    }

    /// A chain of `len` items, root first: every item uses the one before it
    /// as its base layout.
    pub fn base_layout_chain(
        store: &InMemoryItemStore,
        database: &Database,
        len: usize,
    ) -> Vec<StoredItem> {
        let mut chain: Vec<StoredItem> = Vec::with_capacity(len);
        for _ in 0..len {
            let item = match chain.last() {
                Some(base) => derived_item(store, base),
                None => plain_item(store, database),
            };
            chain.push(item);
        }
        chain
    }

    /// `len` items linked in a ring: item `i` uses item `i + 1` as its base
    /// layout and the last one closes the ring.
    pub fn base_layout_cycle(
        store: &InMemoryItemStore,
        database: &Database,
        len: usize,
    ) -> Vec<StoredItem> {
        let refs: Vec<ItemRef> = (0..len)
            .map(|_| ItemRef::new(database.clone(), ItemId::now_v7()))
            .collect();
        refs.iter()
            .enumerate()
            .map(|(i, item_ref)| {
                let base = refs[(i + 1) % len].id();
                store.add_item(item_ref.clone(), ItemDefinition::new().with_base_layout(base))
            })
            .collect()
    }

    /// Items linked as described by a generated link graph.
    pub fn link_graph(
        store: &InMemoryItemStore,
        database: &Database,
        links: &[Option<usize>],
    ) -> Vec<StoredItem> {
        let refs: Vec<ItemRef> = links
            .iter()
            .map(|_| ItemRef::new(database.clone(), ItemId::now_v7()))
            .collect();
        refs.iter()
            .zip(links)
            .map(|(item_ref, link)| {
                let mut definition = ItemDefinition::new();
                if let Some(target) = link {
                    definition = definition.with_base_layout(refs[*target].id());
                }
                store.add_item(item_ref.clone(), definition)
            })
            .collect()
    }

    /// Cache a value for every item, named after the item.
    pub fn cache_all<'a>(cache: &TestCache, items: impl IntoIterator<Item = &'a StoredItem>) {
        for item in items {
            cache
                .put(item, format!("layout of {}", item.item_ref()))
                .expect("fixture items are acyclic");
        }
    }
}

// ============================================================================
// CUSTOM ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Custom assertion functions for base layout validation.

    use super::*;

    /// Assert that a LayoutResult is Ok.
    #[track_caller]
    pub fn assert_ok<T: std::fmt::Debug>(result: &LayoutResult<T>) {
        assert!(result.is_ok(), "Expected Ok, got Err: {:?}", result);
    }

    /// Assert that a LayoutResult is a CircularReference error.
    #[track_caller]
    pub fn assert_circular_reference<T: std::fmt::Debug>(result: &LayoutResult<T>) {
        match result {
            Err(LayoutError::Validation(ValidationError::CircularReference { .. })) => {}
            other => panic!("Expected CircularReference error, got: {:?}", other),
        }
    }

    /// Assert that a LayoutResult is an InvalidArgument error for `argument`.
    #[track_caller]
    pub fn assert_invalid_argument<T: std::fmt::Debug>(result: &LayoutResult<T>, argument: &str) {
        match result {
            Err(LayoutError::Validation(ValidationError::InvalidArgument {
                argument: actual,
                ..
            })) => {
                assert_eq!(actual, argument, "Wrong argument in InvalidArgument error");
            }
            other => panic!("Expected InvalidArgument for {argument}, got: {:?}", other),
        }
    }

    /// Assert that a LayoutResult is a Config error.
    #[track_caller]
    pub fn assert_config_error<T: std::fmt::Debug>(result: &LayoutResult<T>) {
        match result {
            Err(LayoutError::Config(_)) => {}
            other => panic!("Expected Config error, got: {:?}", other),
        }
    }

    /// Assert that `item` has a cached entry.
    #[track_caller]
    pub fn assert_cached(cache: &TestCache, item: &StoredItem) {
        assert!(
            cache.contains(item),
            "Expected {} to be cached, keys: {:?}",
            item.item_ref(),
            cache.cache_keys("")
        );
    }

    /// Assert that `item` has no cached entry.
    #[track_caller]
    pub fn assert_not_cached(cache: &TestCache, item: &StoredItem) {
        assert!(
            !cache.contains(item),
            "Expected {} not to be cached",
            item.item_ref()
        );
    }

    /// Assert the number of cached entries in `database`.
    #[track_caller]
    pub fn assert_database_len(cache: &TestCache, database: &Database, expected: usize) {
        let keys = cache.cache_keys(&CacheKey::database_prefix(database));
        assert_eq!(
            keys.len(),
            expected,
            "Wrong entry count for database {database}: {:?}",
            keys
        );
    }
}

// ============================================================================
// TESTS
// ============================================================================
