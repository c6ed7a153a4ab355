//! Base layout cache - resolved layout values with dependency-aware invalidation.
//!
//! Resolving a layout means walking an item's base layout chain and picking
//! the nearest explicit value. [`BaseLayoutValueCache`] stores the result per
//! item per database and drops it as soon as any item on the chain changes.
//!
//! # Database Isolation
//!
//! A [`CacheKey`] cannot be built without the item's database, and an
//! invalidation only ever sweeps the updated item's own database. The same
//! item id in two databases names two unrelated entries.
//!
//! # Example
//!
//! ```ignore
//! let cache = BaseLayoutValueCache::new(store.clone(), CacheSettings::from_env()?);
//!
//! cache.put(&item, resolved)?;
//! assert_eq!(cache.get(&item)?, Some(resolved));
//!
//! // `base` is on `item`'s chain, so this drops `item`'s entry
//! cache.process_item_update(&base)?;
//! ```

pub mod invalidation;
pub mod key;
pub mod settings;
pub mod stats;
pub mod value_cache;

pub use invalidation::InvalidationResult;
pub use key::CacheKey;
pub use settings::{CacheSettings, ENV_DATABASES, ENV_ENABLED};
pub use stats::CacheStats;
pub use value_cache::BaseLayoutValueCache;
