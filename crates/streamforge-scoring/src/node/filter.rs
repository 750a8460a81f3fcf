//! Filter node. Passes tuple ids through unchanged.

use std::collections::HashMap;

use streamforge_core::Result;

use super::violation;
use crate::graph::{DynTuplePredicate, NodeLabel};
use crate::tuple::{Delta, Tuple, TupleId};

/// Every tuple id seen on the input, with the tuple kept only if it passed.
#[derive(Default)]
pub(crate) struct FilterState {
    seen: HashMap<TupleId, Option<Tuple>>,
}

impl FilterState {
    pub(crate) fn apply(
        &mut self,
        node: NodeLabel<'_>,
        predicate: &DynTuplePredicate,
        delta: Delta,
        out: &mut Vec<Delta>,
    ) -> Result<()> {
        match delta {
            Delta::Insert(id, tuple) => {
                if self.seen.contains_key(&id) {
                    return Err(violation(node, format!("tuple {} inserted twice", id)));
                }
                if predicate(&tuple) {
                    self.seen.insert(id, Some(tuple.clone()));
                    out.push(Delta::Insert(id, tuple));
                } else {
                    self.seen.insert(id, None);
                }
            }
            Delta::Retract(id) => match self.seen.remove(&id) {
                Some(Some(_)) => out.push(Delta::Retract(id)),
                Some(None) => {}
                None => {
                    return Err(violation(node, format!("retract of unknown tuple {}", id)));
                }
            },
        }
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn outputs(&self) -> Vec<Tuple> {
        self.seen.values().flatten().cloned().collect()
    }
}
