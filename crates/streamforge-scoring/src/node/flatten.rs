//! Flatten-last node.

use std::collections::HashMap;

use streamforge_core::Result;

use super::violation;
use crate::graph::{DynFlatten, NodeLabel};
use crate::tuple::{Delta, Tuple, TupleId, TupleIds};

#[derive(Default)]
pub(crate) struct FlattenState {
    expanded: HashMap<TupleId, Vec<(TupleId, Tuple)>>,
}

impl FlattenState {
    pub(crate) fn apply(
        &mut self,
        node: NodeLabel<'_>,
        expand: &DynFlatten,
        delta: Delta,
        ids: &mut TupleIds,
        out: &mut Vec<Delta>,
    ) -> Result<()> {
        match delta {
            Delta::Insert(id, tuple) => {
                if self.expanded.contains_key(&id) {
                    return Err(violation(node, format!("tuple {} inserted twice", id)));
                }
                let items = expand(tuple.last());
                let mut emitted = Vec::with_capacity(items.len());
                for item in items {
                    let item_id = ids.next();
                    let expanded = tuple.with_last(item);
                    out.push(Delta::Insert(item_id, expanded.clone()));
                    emitted.push((item_id, expanded));
                }
                // Tuples that expand to nothing are still tracked so their
                // retraction is recognized.
                self.expanded.insert(id, emitted);
            }
            Delta::Retract(id) => {
                let emitted = self
                    .expanded
                    .remove(&id)
                    .ok_or_else(|| violation(node, format!("retract of unknown tuple {}", id)))?;
                out.extend(emitted.into_iter().map(|(item_id, _)| Delta::Retract(item_id)));
            }
        }
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn outputs(&self) -> Vec<Tuple> {
        self.expanded
            .values()
            .flat_map(|emitted| emitted.iter().map(|(_, tuple)| tuple.clone()))
            .collect()
    }
}
