//! Item and repository contracts.
//!
//! The repository is an external collaborator: these traits describe only what
//! chain walking, validation and the layout cache need from it.

use crate::fields::LayoutField;
use crate::identity::{ItemId, ItemRef};

/// An item that may designate another item as its base layout.
///
/// Implementations are handles onto a live repository. The base layout link is
/// resolved lazily on every call, so walking a chain always observes the
/// current graph, including any cycles an editor managed to persist.
pub trait BaseLayoutItem: Sized {
    /// Reference of this item.
    fn item_ref(&self) -> &ItemRef;

    /// Id of the base layout this item points at, as stored, whether or not
    /// it resolves. Links never cross databases.
    fn base_layout_id(&self) -> Option<ItemId>;

    /// Resolve the base layout of this item.
    ///
    /// Returns `None` when no base layout is set or the referenced item does
    /// not exist. The returned item lives in the same database.
    fn base_layout(&self) -> Option<Self>;

    /// True if this item holds the default field values of a template.
    ///
    /// Must keep answering for a handle whose item was just deleted: the
    /// cache relies on it when processing the deletion.
    fn is_standard_values(&self) -> bool;

    /// True if the item's template carries the base layout field, i.e. the
    /// item can legally hold a base layout reference.
    fn has_base_layout_field(&self) -> bool;

    /// Raw value of a layout field on this item, if set.
    ///
    /// Only the presentation resolver reads this; chain walking never does.
    fn layout_value(&self, field: LayoutField) -> Option<String>;
}

/// Resolves item references back to live items.
pub trait ItemRepository: Send + Sync {
    type Item: BaseLayoutItem;

    /// Look up an item; `None` if it does not exist (e.g. it was deleted).
    fn item(&self, item_ref: &ItemRef) -> Option<Self::Item>;
}

impl<R: ItemRepository> ItemRepository for std::sync::Arc<R> {
    type Item = R::Item;

    fn item(&self, item_ref: &ItemRef) -> Option<Self::Item> {
        (**self).item(item_ref)
    }
}
