//! In-memory item store.
//!
//! A small repository implementing [`ItemRepository`] with lazily resolved
//! handles. Items are plain records keyed by [`ItemRef`]; links are stored as
//! ids and resolved within the owning database on every access, so editing a
//! link is immediately visible to handles already handed out.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::{LayoutResult, ValidationError};
use crate::fields::LayoutField;
use crate::identity::{Database, ItemId, ItemRef};
use crate::item::{BaseLayoutItem, ItemRepository};

/// Field values of an item as far as base layouts are concerned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemDefinition {
    pub base_layout: Option<ItemId>,
    pub standard_values: bool,
    pub base_layout_field: bool,
    pub layouts: HashMap<LayoutField, String>,
}

impl Default for ItemDefinition {
    fn default() -> Self {
        Self {
            base_layout: None,
            standard_values: false,
            base_layout_field: true,
            layouts: HashMap::new(),
        }
    }
}

impl ItemDefinition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_layout(mut self, base_layout: ItemId) -> Self {
        self.base_layout = Some(base_layout);
        self
    }

    /// Mark the item as a template's standard values item.
    pub fn standard_values(mut self) -> Self {
        self.standard_values = true;
        self
    }

    /// Mark the item's template as lacking the base layout field.
    pub fn without_base_layout_field(mut self) -> Self {
        self.base_layout_field = false;
        self
    }

    pub fn with_layout(mut self, field: LayoutField, value: impl Into<String>) -> Self {
        self.layouts.insert(field, value.into());
        self
    }
}

/// Shared in-memory item store.
///
/// Cloning the store yields another handle onto the same items.
#[derive(Debug, Clone, Default)]
pub struct InMemoryItemStore {
    items: Arc<RwLock<HashMap<ItemRef, ItemDefinition>>>,
}

impl InMemoryItemStore {
    pub fn new() -> Self {
        Self::default()
    }

    // Store operations cannot leave a record half-written, so a poisoned lock
    // still guards consistent data.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<ItemRef, ItemDefinition>> {
        self.items.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<ItemRef, ItemDefinition>> {
        self.items.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert or replace an item.
    pub fn add_item(&self, item_ref: ItemRef, definition: ItemDefinition) -> StoredItem {
        self.write().insert(item_ref.clone(), definition);
        self.handle(item_ref)
    }

    /// Insert an item under a freshly generated id.
    pub fn create_item(&self, database: &Database, definition: ItemDefinition) -> StoredItem {
        self.add_item(ItemRef::new(database.clone(), ItemId::now_v7()), definition)
    }

    /// Get a handle onto an existing item.
    pub fn get(&self, item_ref: &ItemRef) -> Option<StoredItem> {
        let exists = self.read().contains_key(item_ref);
        exists.then(|| self.handle(item_ref.clone()))
    }

    /// Set or clear the base layout of an item.
    ///
    /// The store does not check for cycles; run the validator first.
    pub fn set_base_layout(&self, item_ref: &ItemRef, base_layout: Option<ItemId>) -> LayoutResult<()> {
        self.update(item_ref, |definition| definition.base_layout = base_layout)
    }

    pub fn set_layout_value(
        &self,
        item_ref: &ItemRef,
        field: LayoutField,
        value: Option<String>,
    ) -> LayoutResult<()> {
        self.update(item_ref, |definition| match value {
            Some(value) => {
                definition.layouts.insert(field, value);
            }
            None => {
                definition.layouts.remove(&field);
            }
        })
    }

    /// Delete an item. Returns false if it did not exist.
    pub fn remove(&self, item_ref: &ItemRef) -> bool {
        self.write().remove(item_ref).is_some()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn update(&self, item_ref: &ItemRef, f: impl FnOnce(&mut ItemDefinition)) -> LayoutResult<()> {
        let mut items = self.write();
        let definition = items.get_mut(item_ref).ok_or_else(|| ValidationError::ItemNotFound {
            item: item_ref.clone(),
        })?;
        f(definition);
        Ok(())
    }

    fn handle(&self, item_ref: ItemRef) -> StoredItem {
        let standard_values = self
            .with_definition(&item_ref, |definition| definition.standard_values)
            .unwrap_or(false);
        StoredItem {
            store: self.clone(),
            item_ref,
            standard_values,
        }
    }

    fn with_definition<T>(&self, item_ref: &ItemRef, f: impl FnOnce(&ItemDefinition) -> T) -> Option<T> {
        self.read().get(item_ref).map(f)
    }
}

impl ItemRepository for InMemoryItemStore {
    type Item = StoredItem;

    fn item(&self, item_ref: &ItemRef) -> Option<StoredItem> {
        self.get(item_ref)
    }
}

/// Handle onto an item in an [`InMemoryItemStore`].
///
/// A handle whose item has been removed behaves like an item with no base
/// layout and no fields, except that it still reports the standard values
/// flag the item had when the handle was created.
#[derive(Debug, Clone)]
pub struct StoredItem {
    store: InMemoryItemStore,
    item_ref: ItemRef,
    standard_values: bool,
}

impl BaseLayoutItem for StoredItem {
    fn item_ref(&self) -> &ItemRef {
        &self.item_ref
    }

    fn base_layout_id(&self) -> Option<ItemId> {
        self.store
            .with_definition(&self.item_ref, |definition| definition.base_layout)
            .flatten()
    }

    fn base_layout(&self) -> Option<Self> {
        let base = self.base_layout_id()?;
        self.store.get(&self.item_ref.sibling(base))
    }

    fn is_standard_values(&self) -> bool {
        self.store
            .with_definition(&self.item_ref, |definition| definition.standard_values)
            .unwrap_or(self.standard_values)
    }

    fn has_base_layout_field(&self) -> bool {
        self.store
            .with_definition(&self.item_ref, |definition| definition.base_layout_field)
            .unwrap_or(false)
    }

    fn layout_value(&self, field: LayoutField) -> Option<String> {
        self.store
            .with_definition(&self.item_ref, |definition| definition.layouts.get(&field).cloned())
            .flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn master() -> Database {
        Database::new("master").expect("valid database")
    }

    #[test]
    fn test_base_layout_resolves_lazily() {
        let store = InMemoryItemStore::new();
        let base = store.create_item(&master(), ItemDefinition::new());
        let item = store.create_item(&master(), ItemDefinition::new());
        assert!(item.base_layout().is_none());

        store
            .set_base_layout(item.item_ref(), Some(base.item_ref().id()))
            .expect("item exists");

        let resolved = item.base_layout().expect("base layout set");
        assert_eq!(resolved.item_ref(), base.item_ref());
    }

    #[test]
    fn test_base_layout_stays_in_database() {
        let store = InMemoryItemStore::new();
        let web = Database::new("web").expect("valid database");
        let base = store.create_item(&web, ItemDefinition::new());
        let item = store.create_item(
            &master(),
            ItemDefinition::new().with_base_layout(base.item_ref().id()),
        );

        assert!(item.base_layout().is_none());
    }

    #[test]
    fn test_removed_item_has_no_fields_but_keeps_standard_values_flag() {
        let store = InMemoryItemStore::new();
        let item = store.create_item(
            &master(),
            ItemDefinition::new()
                .standard_values()
                .with_layout(LayoutField::Shared, "<r />"),
        );
        assert!(item.is_standard_values());
        assert_eq!(item.layout_value(LayoutField::Shared).as_deref(), Some("<r />"));

        assert!(store.remove(item.item_ref()));

        assert!(item.is_standard_values());
        assert!(!item.has_base_layout_field());
        assert!(item.layout_value(LayoutField::Shared).is_none());
        assert!(store.item(item.item_ref()).is_none());
    }

    #[test]
    fn test_removed_plain_item_is_not_standard_values() {
        let store = InMemoryItemStore::new();
        let item = store.create_item(&master(), ItemDefinition::new());

        assert!(store.remove(item.item_ref()));

        assert!(!item.is_standard_values());
    }

    #[test]
    fn test_update_unknown_item_fails() {
        let store = InMemoryItemStore::new();
        let missing = ItemRef::new(master(), ItemId::now_v7());

        let err = store.set_base_layout(&missing, None).unwrap_err();

        assert!(err.to_string().contains("Item not found"));
    }

    #[test]
    fn test_set_layout_value_and_clear() {
        let store = InMemoryItemStore::new();
        let item = store.create_item(&master(), ItemDefinition::new());

        store
            .set_layout_value(item.item_ref(), LayoutField::Final, Some("<final />".to_string()))
            .expect("item exists");
        assert_eq!(item.layout_value(LayoutField::Final).as_deref(), Some("<final />"));

        store
            .set_layout_value(item.item_ref(), LayoutField::Final, None)
            .expect("item exists");
        assert!(item.layout_value(LayoutField::Final).is_none());
        assert_eq!(store.len(), 1);
    }
}
