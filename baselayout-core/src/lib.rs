//! Base layout core - identity, chain walking and validation.
//!
//! Any item may designate another item in the same database as its base
//! layout and inherit presentation configuration from it, transitively. This
//! crate provides the pieces every consumer of that relation needs:
//!
//! - [`ItemRef`], [`ItemId`] and [`Database`] identity types
//! - the [`BaseLayoutItem`] and [`ItemRepository`] contracts for the external
//!   item repository
//! - [`ChainWalker`], a cycle-safe walk of base layout chains
//! - [`BaseLayoutValidator`], used by editors before persisting a reference
//! - [`InMemoryItemStore`], an in-memory repository

pub mod chain;
pub mod error;
pub mod fields;
pub mod identity;
pub mod item;
pub mod repository;
pub mod validator;

pub use chain::{walk_chain, Chain, ChainWalker};
pub use error::{CacheError, ConfigError, LayoutError, LayoutResult, ValidationError};
pub use fields::{is_layout_field, FieldId, LayoutField, FINAL_LAYOUT_FIELD, LAYOUT_FIELD};
pub use identity::{Database, ItemId, ItemRef, REFERENCE_SEPARATOR};
pub use item::{BaseLayoutItem, ItemRepository};
pub use repository::{InMemoryItemStore, ItemDefinition, StoredItem};
pub use validator::BaseLayoutValidator;
