//! Group-by node.
//!
//! Each group owns one accumulation container per collector. Accumulating a
//! tuple yields one undo token per collector, stored under the upstream tuple
//! id; retracting the tuple consumes exactly those tokens. A group whose last
//! contributor leaves is removed and its result tuple retracted.

use std::collections::{BTreeSet, HashMap};

use smallvec::SmallVec;
use streamforge_core::Result;

use super::violation;
use crate::fact::Fact;
use crate::graph::{DynMapper, NodeLabel};
use crate::stream::collector::{Container, GroupCollector, Undo};
use crate::tuple::{Delta, Tuple, TupleId, TupleIds, MAX_ARITY};

type GroupKey = SmallVec<[Fact; 3]>;

struct GroupRecord {
    containers: Vec<Box<dyn Container>>,
    contributors: BTreeSet<TupleId>,
    emitted: Option<(TupleId, Tuple)>,
}

#[derive(Default)]
pub(crate) struct GroupState {
    groups: HashMap<GroupKey, GroupRecord>,
    insertions: HashMap<TupleId, (GroupKey, Vec<Undo>)>,
}

impl GroupState {
    pub(crate) fn apply(
        &mut self,
        node: NodeLabel<'_>,
        keys: &[DynMapper],
        collectors: &[GroupCollector],
        delta: Delta,
        ids: &mut TupleIds,
        out: &mut Vec<Delta>,
    ) -> Result<()> {
        match delta {
            Delta::Insert(id, tuple) => self.insert(node, keys, collectors, id, &tuple, ids, out),
            Delta::Retract(id) => self.retract(node, id, ids, out),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn insert(
        &mut self,
        node: NodeLabel<'_>,
        keys: &[DynMapper],
        collectors: &[GroupCollector],
        id: TupleId,
        tuple: &Tuple,
        ids: &mut TupleIds,
        out: &mut Vec<Delta>,
    ) -> Result<()> {
        if self.insertions.contains_key(&id) {
            return Err(violation(node, format!("tuple {} inserted twice", id)));
        }
        // User code runs before any state changes.
        let key: GroupKey = keys.iter().map(|k| k(tuple)).collect();
        let extracted: Vec<_> = collectors.iter().map(|c| c.0.extract(tuple)).collect();

        let group = self
            .groups
            .entry(key.clone())
            .or_insert_with(|| GroupRecord {
                containers: collectors.iter().map(|c| c.0.supply()).collect(),
                contributors: BTreeSet::new(),
                emitted: None,
            });
        let mut undos = Vec::with_capacity(extracted.len());
        for (container, value) in group.containers.iter_mut().zip(extracted) {
            undos.push(container.accumulate(value)?);
        }
        group.contributors.insert(id);
        refresh(&key, group, ids, out);
        self.insertions.insert(id, (key, undos));
        Ok(())
    }

    fn retract(
        &mut self,
        node: NodeLabel<'_>,
        id: TupleId,
        ids: &mut TupleIds,
        out: &mut Vec<Delta>,
    ) -> Result<()> {
        let (key, undos) = self
            .insertions
            .remove(&id)
            .ok_or_else(|| violation(node, format!("no undo registered for tuple {}", id)))?;
        let group = self.groups.get_mut(&key).ok_or_else(|| {
            violation(node, format!("tuple {} belongs to a group that no longer exists", id))
        })?;
        for (container, undo) in group.containers.iter_mut().zip(undos) {
            container.undo(undo)?;
        }
        group.contributors.remove(&id);
        if group.contributors.is_empty() {
            if let Some((emitted_id, _)) = group.emitted.take() {
                out.push(Delta::Retract(emitted_id));
            }
            self.groups.remove(&key);
        } else {
            refresh(&key, group, ids, out);
        }
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn outputs(&self) -> Vec<Tuple> {
        self.groups
            .values()
            .filter_map(|group| group.emitted.as_ref().map(|(_, tuple)| tuple.clone()))
            .collect()
    }
}

/// Re-emits the group's result tuple if it changed.
fn refresh(key: &GroupKey, group: &mut GroupRecord, ids: &mut TupleIds, out: &mut Vec<Delta>) {
    let mut facts: SmallVec<[Fact; MAX_ARITY]> = key.iter().cloned().collect();
    facts.extend(group.containers.iter().filter_map(|c| c.finish()));
    let result = Tuple::of(facts);

    if let Some((_, previous)) = &group.emitted {
        if *previous == result {
            return;
        }
    }
    if let Some((previous_id, _)) = group.emitted.take() {
        out.push(Delta::Retract(previous_id));
    }
    let result_id = ids.next();
    out.push(Delta::Insert(result_id, result.clone()));
    group.emitted = Some((result_id, result));
}
