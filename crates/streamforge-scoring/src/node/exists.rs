//! Exists / not-exists node.
//!
//! Every left tuple keeps the set of right tuples currently matching it. A
//! left tuple is emitted, under its own id, while that set is non-empty
//! (exists) or empty (not exists); emission only changes on the 0 to 1 and
//! 1 to 0 transitions.

use std::collections::{BTreeSet, HashMap};

use streamforge_core::Result;

use super::join::unindex;
use super::violation;
use crate::graph::{NodeLabel, Port};
use crate::stream::joiner::{CompiledJoiners, JoinKey};
use crate::tuple::{Delta, Tuple, TupleId};

struct LeftEntry {
    tuple: Tuple,
    key: JoinKey,
    matches: BTreeSet<TupleId>,
    emitted: bool,
}

struct RightEntry {
    tuple: Tuple,
    key: JoinKey,
    matches: BTreeSet<TupleId>,
}

#[derive(Default)]
pub(crate) struct ExistsState {
    left: HashMap<TupleId, LeftEntry>,
    right: HashMap<TupleId, RightEntry>,
    left_index: HashMap<JoinKey, BTreeSet<TupleId>>,
    right_index: HashMap<JoinKey, BTreeSet<TupleId>>,
}

impl ExistsState {
    pub(crate) fn apply(
        &mut self,
        node: NodeLabel<'_>,
        joiners: &CompiledJoiners,
        should_exist: bool,
        port: Port,
        delta: Delta,
        out: &mut Vec<Delta>,
    ) -> Result<()> {
        match (port, delta) {
            (Port::Left, Delta::Insert(id, tuple)) => {
                self.insert_left(node, joiners, should_exist, id, tuple, out)
            }
            (Port::Left, Delta::Retract(id)) => self.retract_left(node, id, out),
            (Port::Right, Delta::Insert(id, tuple)) => {
                self.insert_right(node, joiners, should_exist, id, tuple, out)
            }
            (Port::Right, Delta::Retract(id)) => {
                self.retract_right(node, should_exist, id, out)
            }
        }
    }

    fn insert_left(
        &mut self,
        node: NodeLabel<'_>,
        joiners: &CompiledJoiners,
        should_exist: bool,
        id: TupleId,
        tuple: Tuple,
        out: &mut Vec<Delta>,
    ) -> Result<()> {
        if self.left.contains_key(&id) {
            return Err(violation(node, format!("left tuple {} inserted twice", id)));
        }
        let key = joiners.left_key(&tuple);
        let mut matches = BTreeSet::new();
        if let Some(bucket) = self.right_index.get(&key) {
            for &right_id in bucket {
                let right = self.right.get_mut(&right_id).ok_or_else(|| {
                    violation(node, format!("index holds unknown right tuple {}", right_id))
                })?;
                if joiners.accepts(&tuple, &right.tuple) {
                    matches.insert(right_id);
                    right.matches.insert(id);
                }
            }
        }
        let emitted = matches.is_empty() != should_exist;
        if emitted {
            out.push(Delta::Insert(id, tuple.clone()));
        }
        self.left_index.entry(key.clone()).or_default().insert(id);
        self.left.insert(
            id,
            LeftEntry {
                tuple,
                key,
                matches,
                emitted,
            },
        );
        Ok(())
    }

    fn retract_left(&mut self, node: NodeLabel<'_>, id: TupleId, out: &mut Vec<Delta>) -> Result<()> {
        let entry = self
            .left
            .remove(&id)
            .ok_or_else(|| violation(node, format!("retract of unknown left tuple {}", id)))?;
        unindex(&mut self.left_index, &entry.key, id);
        for right_id in &entry.matches {
            if let Some(right) = self.right.get_mut(right_id) {
                right.matches.remove(&id);
            }
        }
        if entry.emitted {
            out.push(Delta::Retract(id));
        }
        Ok(())
    }

    fn insert_right(
        &mut self,
        node: NodeLabel<'_>,
        joiners: &CompiledJoiners,
        should_exist: bool,
        id: TupleId,
        tuple: Tuple,
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
                if !joiners.accepts(&left.tuple, &tuple) {
                    continue;
                }
                matches.insert(left_id);
                left.matches.insert(id);
                if left.matches.len() == 1 {
                    flip(left_id, left, should_exist, out);
                }
            }
        }
        self.right_index.entry(key.clone()).or_default().insert(id);
        self.right.insert(id, RightEntry { tuple, key, matches });
        Ok(())
    }

    fn retract_right(
        &mut self,
        node: NodeLabel<'_>,
        should_exist: bool,
        id: TupleId,
        out: &mut Vec<Delta>,
    ) -> Result<()> {
        let entry = self
            .right
            .remove(&id)
            .ok_or_else(|| violation(node, format!("retract of unknown right tuple {}", id)))?;
        unindex(&mut self.right_index, &entry.key, id);
        for left_id in entry.matches {
            let left = self.left.get_mut(&left_id).ok_or_else(|| {
                violation(node, format!("right tuple {} matched unknown left tuple {}", id, left_id))
            })?;
            left.matches.remove(&id);
            if left.matches.is_empty() {
                flip(left_id, left, should_exist, out);
            }
        }
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn outputs(&self) -> Vec<Tuple> {
        self.left
            .values()
            .filter(|entry| entry.emitted)
            .map(|entry| entry.tuple.clone())
            .collect()
    }
}

/// Re-evaluates emission after the match count crossed zero.
fn flip(id: TupleId, left: &mut LeftEntry, should_exist: bool, out: &mut Vec<Delta>) {
    let emit = left.matches.is_empty() != should_exist;
    if emit && !left.emitted {
        out.push(Delta::Insert(id, left.tuple.clone()));
    } else if !emit && left.emitted {
        out.push(Delta::Retract(id));
    }
    left.emitted = emit;
}
