//! Map node: one derived tuple per input tuple.

use std::collections::HashMap;

use smallvec::SmallVec;
use streamforge_core::Result;

use super::violation;
use crate::graph::{DynMapper, NodeLabel};
use crate::tuple::{Delta, Tuple, TupleId, TupleIds};

#[derive(Default)]
pub(crate) struct MapState {
    /// Upstream id to the id and tuple emitted for it.
    mapped: HashMap<TupleId, (TupleId, Tuple)>,
}

impl MapState {
    pub(crate) fn apply(
        &mut self,
        node: NodeLabel<'_>,
        mappers: &[DynMapper],
        delta: Delta,
        ids: &mut TupleIds,
        out: &mut Vec<Delta>,
    ) -> Result<()> {
        match delta {
            Delta::Insert(id, tuple) => {
                if self.mapped.contains_key(&id) {
                    return Err(violation(node, format!("tuple {} inserted twice", id)));
                }
                let mapped = Tuple::of(mappers.iter().map(|m| m(&tuple)).collect::<SmallVec<_>>());
                let mapped_id = ids.next();
                self.mapped.insert(id, (mapped_id, mapped.clone()));
                out.push(Delta::Insert(mapped_id, mapped));
            }
            Delta::Retract(id) => {
                let (mapped_id, _) = self
                    .mapped
                    .remove(&id)
                    .ok_or_else(|| violation(node, format!("retract of unknown tuple {}", id)))?;
                out.push(Delta::Retract(mapped_id));
            }
        }
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn outputs(&self) -> Vec<Tuple> {
        self.mapped.values().map(|(_, tuple)| tuple.clone()).collect()
    }
}
