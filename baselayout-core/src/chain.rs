//! Base layout chain walking with cycle detection.
//!
//! A chain is the sequence of items reached by following base layout links
//! from a starting item. The link graph is external and may be malformed, so
//! the walk is iterative and bounded by a visited set: every item is entered
//! at most once, and re-entering one ends the walk as a cycle.

use std::collections::HashSet;

use crate::error::{LayoutResult, ValidationError};
use crate::identity::ItemRef;
use crate::item::BaseLayoutItem;

/// Result of walking a base layout chain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Chain {
    /// References in walk order, starting item first. For a cyclic walk this
    /// is the known-good prefix up to (not including) the revisit.
    items: Vec<ItemRef>,
    /// The reference that was visited a second time, if any.
    revisited: Option<ItemRef>,
    /// A base layout link at the end of the chain that did not resolve.
    dangling: Option<ItemRef>,
}

impl Chain {
    /// References in walk order.
    pub fn items(&self) -> &[ItemRef] {
        &self.items
    }

    /// The reference at which a cycle was detected.
    pub fn revisited(&self) -> Option<&ItemRef> {
        self.revisited.as_ref()
    }

    /// The unresolved base layout link the walk stopped at, if any.
    ///
    /// Set when the last item points at an item that does not exist, e.g.
    /// because it was just deleted.
    pub fn dangling(&self) -> Option<&ItemRef> {
        self.dangling.as_ref()
    }

    pub fn is_cyclic(&self) -> bool {
        self.revisited.is_some()
    }

    /// True if `item_ref` was walked (the revisited reference included).
    pub fn contains(&self, item_ref: &ItemRef) -> bool {
        self.revisited.as_ref() == Some(item_ref) || self.items.contains(item_ref)
    }

    /// True if the starting item's inherited value may depend on `item_ref`:
    /// it was walked, or it is the unresolved link the walk stopped at.
    pub fn depends_on(&self, item_ref: &ItemRef) -> bool {
        self.contains(item_ref) || self.dangling.as_ref() == Some(item_ref)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Turn a cyclic walk into a [`ValidationError::CircularReference`].
    pub fn into_result(self) -> LayoutResult<Chain> {
        match self.revisited {
            None => Ok(self),
            Some(revisited) => Err(ValidationError::CircularReference {
                database: revisited.database().clone(),
                item: revisited.id(),
                chain: self.items.iter().map(ItemRef::id).collect(),
            }
            .into()),
        }
    }
}

/// Walks base layout chains.
///
/// A walker is consumed by [`ChainWalker::walk`]; seed it to ask whether a
/// chain would run back into references that are not part of it yet.
#[derive(Debug, Default)]
pub struct ChainWalker {
    visited: HashSet<ItemRef>,
}

impl ChainWalker {
    /// A walker with an empty visited set.
    pub fn new() -> Self {
        Self::default()
    }

    /// A walker that treats `refs` as already visited.
    pub fn seeded(refs: impl IntoIterator<Item = ItemRef>) -> Self {
        Self {
            visited: refs.into_iter().collect(),
        }
    }

    /// Walk from `start` until an item has no base layout or a cycle is found.
    pub fn walk<I: BaseLayoutItem>(mut self, start: &I) -> Chain {
        let mut chain = Chain::default();
        if !self.enter(start.item_ref(), &mut chain.items) {
            chain.revisited = Some(start.item_ref().clone());
            return chain;
        }

        let mut current = follow(start, &mut chain);
        while let Some(item) = current {
            if !self.enter(item.item_ref(), &mut chain.items) {
                chain.revisited = Some(item.item_ref().clone());
                return chain;
            }
            current = follow(&item, &mut chain);
        }
        chain
    }

    fn enter(&mut self, item_ref: &ItemRef, items: &mut Vec<ItemRef>) -> bool {
        if self.visited.insert(item_ref.clone()) {
            items.push(item_ref.clone());
            true
        } else {
            false
        }
    }
}

/// Resolve the base layout of `item`, recording a link that does not resolve.
fn follow<I: BaseLayoutItem>(item: &I, chain: &mut Chain) -> Option<I> {
    let next = item.base_layout();
    if next.is_none() {
        chain.dangling = item.base_layout_id().map(|id| item.item_ref().sibling(id));
    }
    next
}

/// Walk the chain of `start` with an empty visited set.
pub fn walk_chain<I: BaseLayoutItem>(start: &I) -> Chain {
    ChainWalker::new().walk(start)
}
