//! Source node: turns session facts into uni tuples.

use std::collections::HashMap;

use streamforge_core::Result;

use super::violation;
use crate::fact::{Fact, FactId};
use crate::graph::{NodeLabel, SourceSpec};
use crate::tuple::{Delta, Tuple, TupleId, TupleIds};

#[derive(Default)]
pub(crate) struct SourceState {
    emitted: HashMap<FactId, (TupleId, Fact)>,
}

impl SourceState {
    /// Emits the fact unless the source skips unassigned facts and this one is.
    pub(crate) fn insert(
        &mut self,
        node: NodeLabel<'_>,
        spec: &SourceSpec,
        fact: &Fact,
        ids: &mut TupleIds,
    ) -> Result<Option<Delta>> {
        let Some(id) = fact.id() else {
            return Err(violation(node, "source received a fact without identity"));
        };
        if self.emitted.contains_key(&id) {
            return Err(violation(node, format!("fact {} inserted twice", id)));
        }
        let assigned = spec
            .is_assigned
            .as_ref()
            .map_or(true, |is_assigned| is_assigned(fact));
        if !assigned {
            return Ok(None);
        }
        let tuple_id = ids.next();
        self.emitted.insert(id, (tuple_id, fact.clone()));
        Ok(Some(Delta::Insert(tuple_id, Tuple::single(fact.clone()))))
    }

    /// Retracts the tuple of a fact, if one was emitted.
    pub(crate) fn retract(&mut self, id: FactId) -> Option<Delta> {
        self.emitted
            .remove(&id)
            .map(|(tuple_id, _)| Delta::Retract(tuple_id))
    }

    #[cfg(test)]
    pub(crate) fn outputs(&self) -> Vec<Tuple> {
        self.emitted
            .values()
            .map(|(_, fact)| Tuple::single(fact.clone()))
            .collect()
    }
}
