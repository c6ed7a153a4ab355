//! Database-scoped cache keys.
//!
//! A `CacheKey` cannot be built without a database: the only constructor takes
//! an [`ItemRef`]. Keys order by database first, so all keys of one database
//! form a contiguous range of the entry map.

use std::fmt;

use baselayout_core::{Database, ItemId, ItemRef, REFERENCE_SEPARATOR};

/// Key of a cached layout value.
///
/// # Text Format
///
/// `<database>:<item id>`, e.g. `master:01890a5d-ac96-774b-bcce-b302099a8057`.
/// Database labels cannot contain the separator, so the encoding is
/// collision-free, and `<database>:` is a prefix of exactly the keys of that
/// database.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey {
    item: ItemRef,
}

impl CacheKey {
    /// Key for the value cached for `item`.
    pub fn new(item: ItemRef) -> Self {
        Self { item }
    }

    pub fn database(&self) -> &Database {
        self.item.database()
    }

    pub fn item_id(&self) -> ItemId {
        self.item.id()
    }

    /// The starting item this key caches a value for.
    pub fn item_ref(&self) -> &ItemRef {
        &self.item
    }

    pub fn encode(&self) -> String {
        self.item.to_string()
    }

    /// Decode a key from its text form.
    ///
    /// Returns `None` if the separator is missing, the database label is
    /// invalid, or the id is not a UUID.
    pub fn decode(text: &str) -> Option<Self> {
        text.parse::<ItemRef>().ok().map(Self::new)
    }

    /// Prefix shared by the text form of every key in `database`.
    pub fn database_prefix(database: &Database) -> String {
        format!("{database}{REFERENCE_SEPARATOR}")
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.item, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_starts_with_database() {
        let key = CacheKey::new(ItemRef::new(Database::master(), ItemId::now_v7()));
        assert!(key.encode().starts_with("master"));
        assert!(key.encode().starts_with(&CacheKey::database_prefix(&Database::master())));
    }

    #[test]
    fn test_key_ends_with_item_id() {
        let id = ItemId::now_v7();
        let key = CacheKey::new(ItemRef::new(Database::master(), id));
        assert!(key.encode().ends_with(&id.to_string()));
        assert_eq!(key.item_id(), id);
    }

    #[test]
    fn test_same_id_in_different_databases_different_keys() {
        let id = ItemId::now_v7();
        let master = CacheKey::new(ItemRef::new(Database::master(), id));
        let web = CacheKey::new(ItemRef::new(Database::web(), id));
        assert_ne!(master, web);
        assert_ne!(master.encode(), web.encode());
    }

    #[test]
    fn test_decode_rejects_malformed_keys() {
        assert!(CacheKey::decode("master").is_none());
        assert!(CacheKey::decode(":01890a5d-ac96-774b-bcce-b302099a8057").is_none());
        assert!(CacheKey::decode("master:nope").is_none());
    }

    #[test]
    fn test_decode_accepts_encoded_key() {
        let key = CacheKey::new(ItemRef::new(Database::web(), ItemId::now_v7()));
        assert_eq!(CacheKey::decode(&key.encode()), Some(key));
    }

    #[test]
    fn test_keys_order_by_database_first() {
        let low = ItemId::new(uuid::Uuid::from_u128(1));
        let high = ItemId::new(uuid::Uuid::from_u128(u128::MAX));
        let master_high = CacheKey::new(ItemRef::new(Database::master(), high));
        let web_low = CacheKey::new(ItemRef::new(Database::web(), low));
        assert!(master_high < web_low);
    }
}
