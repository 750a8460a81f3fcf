//! Distinct node.
//!
//! Structurally equal tuples share one output tuple, reference counted by the
//! number of live upstream tuples equal to it.

use std::collections::HashMap;

use streamforge_core::Result;

use super::violation;
use crate::graph::NodeLabel;
use crate::tuple::{Delta, Tuple, TupleId, TupleIds};

#[derive(Default)]
pub(crate) struct DistinctState {
    members: HashMap<TupleId, Tuple>,
    /// Distinct tuple to its emitted id and reference count.
    counts: HashMap<Tuple, (TupleId, usize)>,
}

impl DistinctState {
    pub(crate) fn apply(
        &mut self,
        node: NodeLabel<'_>,
        delta: Delta,
        ids: &mut TupleIds,
        out: &mut Vec<Delta>,
    ) -> Result<()> {
        match delta {
            Delta::Insert(id, tuple) => {
                if self.members.contains_key(&id) {
                    return Err(violation(node, format!("tuple {} inserted twice", id)));
                }
                let entry = self.counts.entry(tuple.clone()).or_insert_with(|| {
                    let distinct_id = ids.next();
                    out.push(Delta::Insert(distinct_id, tuple.clone()));
                    (distinct_id, 0)
                });
                entry.1 += 1;
                self.members.insert(id, tuple);
            }
            Delta::Retract(id) => {
                let tuple = self
                    .members
                    .remove(&id)
                    .ok_or_else(|| violation(node, format!("retract of unknown tuple {}", id)))?;
                let (distinct_id, count) = self.counts.get_mut(&tuple).ok_or_else(|| {
                    violation(node, format!("no reference count for tuple {:?}", tuple))
                })?;
                *count -= 1;
                if *count == 0 {
                    out.push(Delta::Retract(*distinct_id));
                    self.counts.remove(&tuple);
                }
            }
        }
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn outputs(&self) -> Vec<Tuple> {
        self.counts.keys().cloned().collect()
    }
}
