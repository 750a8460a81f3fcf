//! Incremental indexed hash join.
//!
//! Both sides are indexed by their composite joiner key. Each live left tuple
//! remembers the joined tuple it produced with every matching right tuple, and
//! each right tuple remembers which left tuples it matched, so a retraction on
//! either side retracts exactly the joined tuples that depended on it.
//!
//! With no indexing joiner every key is empty and one bucket holds the whole
//! side: a cartesian join costs O(live left × live right).

use std::collections::{BTreeMap, BTreeSet, HashMap};

use streamforge_core::Result;

use super::violation;
use crate::graph::{NodeLabel, Port};
use crate::stream::joiner::{CompiledJoiners, JoinKey};
use crate::tuple::{Delta, Tuple, TupleId, TupleIds};

struct LeftEntry {
    tuple: Tuple,
    key: JoinKey,
    /// Right tuple id to the joined tuple id it produced.
    matches: BTreeMap<TupleId, TupleId>,
}

struct RightEntry {
    tuple: Tuple,
    key: JoinKey,
    matches: BTreeSet<TupleId>,
}

#[derive(Default)]
pub(crate) struct JoinState {
    left: HashMap<TupleId, LeftEntry>,
    right: HashMap<TupleId, RightEntry>,
    left_index: HashMap<JoinKey, BTreeSet<TupleId>>,
    right_index: HashMap<JoinKey, BTreeSet<TupleId>>,
    /// Joined tuple id to the joined tuple.
    joined: HashMap<TupleId, Tuple>,
}

impl JoinState {
    pub(crate) fn apply(
        &mut self,
        node: NodeLabel<'_>,
        joiners: &CompiledJoiners,
        port: Port,
        delta: Delta,
        ids: &mut TupleIds,
        out: &mut Vec<Delta>,
    ) -> Result<()> {
        match (port, delta) {
            (Port::Left, Delta::Insert(id, tuple)) => {
                self.insert_left(node, joiners, id, tuple, ids, out)
            }
            (Port::Left, Delta::Retract(id)) => self.retract_left(node, id, out),
            (Port::Right, Delta::Insert(id, tuple)) => {
                self.insert_right(node, joiners, id, tuple, ids, out)
            }
            (Port::Right, Delta::Retract(id)) => self.retract_right(node, id, out),
        }
    }

    fn insert_left(
        &mut self,
        node: NodeLabel<'_>,
        joiners: &CompiledJoiners,
        id: TupleId,
        tuple: Tuple,
        ids: &mut TupleIds,
        out: &mut Vec<Delta>,
    ) -> Result<()> {
        if self.left.contains_key(&id) {
            return Err(violation(node, format!("left tuple {} inserted twice", id)));
        }
        let key = joiners.left_key(&tuple);
        let mut matches = BTreeMap::new();
        if let Some(bucket) = self.right_index.get(&key) {
            for &right_id in bucket {
                let right = self.right.get_mut(&right_id).ok_or_else(|| {
                    violation(node, format!("index holds unknown right tuple {}", right_id))
                })?;
                if joiners.accepts(&tuple, &right.tuple) {
                    let joined_id = ids.next();
                    let joined = tuple.extended(right.tuple.fact(0));
                    self.joined.insert(joined_id, joined.clone());
                    out.push(Delta::Insert(joined_id, joined));
                    matches.insert(right_id, joined_id);
                    right.matches.insert(id);
                }
            }
        }
        self.left_index.entry(key.clone()).or_default().insert(id);
        self.left.insert(id, LeftEntry { tuple, key, matches });
        Ok(())
    }

    fn insert_right(
        &mut self,
        node: NodeLabel<'_>,
        joiners: &CompiledJoiners,
        id: TupleId,
        tuple: Tuple,
        ids: &mut TupleIds,
        out: &mut Vec<Delta>,
    ) -> Result<()> {
        if self.right.contains_key(&id) {
            return Err(violation(node, format!("right tuple {} inserted twice", id)));
        }
        let key = joiners.right_key(&tuple);
        let mut matches = BTreeSet::new();
        if let Some(bucket) = self.left_index.get(&key) {
            for &left_id in bucket {
                let left = self.left.get_mut(&left_id).ok_or_else(|| {
                    violation(node, format!("index holds unknown left tuple {}", left_id))
                })?;
                if joiners.accepts(&left.tuple, &tuple) {
                    let joined_id = ids.next();
                    let joined = left.tuple.extended(tuple.fact(0));
                    self.joined.insert(joined_id, joined.clone());
                    out.push(Delta::Insert(joined_id, joined));
                    left.matches.insert(id, joined_id);
                    matches.insert(left_id);
                }
            }
        }
        self.right_index.entry(key.clone()).or_default().insert(id);
        self.right.insert(id, RightEntry { tuple, key, matches });
        Ok(())
    }

    fn retract_left(&mut self, node: NodeLabel<'_>, id: TupleId, out: &mut Vec<Delta>) -> Result<()> {
        let entry = self
            .left
            .remove(&id)
            .ok_or_else(|| violation(node, format!("retract of unknown left tuple {}", id)))?;
        unindex(&mut self.left_index, &entry.key, id);
        for (right_id, joined_id) in entry.matches {
            let right = self.right.get_mut(&right_id).ok_or_else(|| {
                violation(node, format!("left tuple {} matched unknown right tuple {}", id, right_id))
            })?;
            right.matches.remove(&id);
            self.joined.remove(&joined_id);
            out.push(Delta::Retract(joined_id));
        }
        Ok(())
    }

    fn retract_right(&mut self, node: NodeLabel<'_>, id: TupleId, out: &mut Vec<Delta>) -> Result<()> {
        let entry = self
            .right
            .remove(&id)
            .ok_or_else(|| violation(node, format!("retract of unknown right tuple {}", id)))?;
        unindex(&mut self.right_index, &entry.key, id);
        for left_id in entry.matches {
            let joined_id = self
                .left
                .get_mut(&left_id)
                .and_then(|left| left.matches.remove(&id))
                .ok_or_else(|| {
                    violation(node, format!("no joined tuple for left {} and right {}", left_id, id))
                })?;
            self.joined.remove(&joined_id);
            out.push(Delta::Retract(joined_id));
        }
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn outputs(&self) -> Vec<Tuple> {
        self.joined.values().cloned().collect()
    }
}

/// Removes `id` from its index bucket, dropping the bucket once empty.
pub(super) fn unindex(index: &mut HashMap<JoinKey, BTreeSet<TupleId>>, key: &JoinKey, id: TupleId) {
    if let Some(bucket) = index.get_mut(key) {
        bucket.remove(&id);
        if bucket.is_empty() {
            index.remove(key);
        }
    }
}
