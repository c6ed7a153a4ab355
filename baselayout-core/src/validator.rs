//! Circular base layout reference validation.
//!
//! Editing workflows call the validator before persisting a base layout
//! reference. The query forms answer with a bool for reporting and repair
//! tooling; the `ensure_*` forms fail with a circular reference error so they
//! can guard a mutation with `?`.

use tracing::debug;

use crate::chain::{walk_chain, Chain, ChainWalker};
use crate::error::{LayoutResult, ValidationError};
use crate::item::BaseLayoutItem;

/// Validator for base layout chains.
#[derive(Debug, Clone, Copy, Default)]
pub struct BaseLayoutValidator;

impl BaseLayoutValidator {
    pub fn new() -> Self {
        Self
    }

    /// True if the chain starting at `item` contains a circular reference.
    pub fn has_circular_reference<I: BaseLayoutItem>(&self, item: &I) -> bool {
        walk_chain(item).is_cyclic()
    }

    /// True if setting `candidate` as the base layout of `item` would create a
    /// circular reference.
    ///
    /// Nothing is mutated. Fails with an invalid-argument error if `item`
    /// cannot hold a base layout, or if `candidate` lives in another database.
    pub fn would_create_circular_reference<I: BaseLayoutItem>(
        &self,
        item: &I,
        candidate: &I,
    ) -> LayoutResult<bool> {
        Ok(self.candidate_chain(item, candidate)?.is_cyclic())
    }

    /// Fail with a circular reference error if the chain of `item` is cyclic.
    ///
    /// Returns the walked chain on success.
    pub fn ensure_acyclic<I: BaseLayoutItem>(&self, item: &I) -> LayoutResult<Chain> {
        walk_chain(item).into_result()
    }

    /// Fail with a circular reference error if setting `candidate` as the base
    /// layout of `item` would create a cycle.
    pub fn ensure_no_circular_reference<I: BaseLayoutItem>(
        &self,
        item: &I,
        candidate: &I,
    ) -> LayoutResult<()> {
        self.candidate_chain(item, candidate)?.into_result().map(|_| ())
    }

    fn candidate_chain<I: BaseLayoutItem>(&self, item: &I, candidate: &I) -> LayoutResult<Chain> {
        if !item.has_base_layout_field() {
            return Err(ValidationError::InvalidArgument {
                argument: "item".to_string(),
                reason: format!("{} does not have a base layout field", item.item_ref()),
            }
            .into());
        }
        if item.item_ref().database() != candidate.item_ref().database() {
            return Err(ValidationError::InvalidArgument {
                argument: "candidate".to_string(),
                reason: format!(
                    "{} is not in database {}",
                    candidate.item_ref(),
                    item.item_ref().database()
                ),
            }
            .into());
        }

        let chain = ChainWalker::seeded([item.item_ref().clone()]).walk(candidate);
        if let Some(revisited) = chain.revisited() {
            debug!(
                item = %item.item_ref(),
                candidate = %candidate.item_ref(),
                revisited = %revisited,
                "candidate base layout would close a cycle"
            );
        }
        Ok(chain)
    }
}
