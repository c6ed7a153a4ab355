//! Fuzz test for base layout chain walking
//!
//! Every input byte is one item; its value picks the item's base layout
//! (or none, or a missing item). The walk must terminate on every graph,
//! visit each item at most once, and agree with the validator.
//!
//! Run with: cargo +nightly fuzz run chain_walk_fuzz -- -max_total_time=60

#![no_main]

use std::collections::HashSet;

use baselayout_core::{
    walk_chain, BaseLayoutItem, BaseLayoutValidator, Database, InMemoryItemStore, ItemDefinition,
    ItemId, ItemRef,
};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.is_empty() || data.len() > 64 {
        return;
    }

    let store = InMemoryItemStore::new();
    let refs: Vec<ItemRef> = data
        .iter()
        .map(|_| ItemRef::new(Database::master(), ItemId::now_v7()))
        .collect();
    for (item_ref, byte) in refs.iter().zip(data) {
        let target = usize::from(*byte);
        let definition = if target < refs.len() {
            ItemDefinition::new().with_base_layout(refs[target].id())
        } else if target % 2 == 0 {
            ItemDefinition::new()
        } else {
            ItemDefinition::new().with_base_layout(ItemId::now_v7())
        };
        store.add_item(item_ref.clone(), definition);
    }

    let validator = BaseLayoutValidator::new();
    for item_ref in &refs {
        let Some(item) = store.get(item_ref) else {
            continue;
        };
        let chain = walk_chain(&item);

        let unique: HashSet<&ItemRef> = chain.items().iter().collect();
        assert_eq!(unique.len(), chain.len(), "Chain visited an item twice");
        assert!(chain.len() <= refs.len());
        assert_eq!(chain.items().first(), Some(item.item_ref()));
        assert_eq!(validator.has_circular_reference(&item), chain.is_cyclic());
    }
});
