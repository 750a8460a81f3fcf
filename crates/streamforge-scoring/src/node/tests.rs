// Tests for the per-node state machines, driven one delta at a time.

use streamforge_core::{ImpactType, SimpleScore, StreamForgeError};

use super::*;
use crate::api::weight::{ConstraintWeight, MatchWeigher};
use crate::fact::{Fact, FactId};
use crate::graph::{ConstraintSpec, DynMapper, NodeKind, Port};
use crate::stream::collector::{count, sum, GroupCollector};
use crate::stream::joiner::{equal_by, filtering, none, CompiledJoiners};
use crate::tuple::{Delta, Tuple, TupleId, TupleIds};
use streamforge_core::ConstraintRef;

fn uni<T: crate::fact::FactValue>(value: T) -> Tuple {
    Tuple::from_facts([Fact::new(value)])
}

fn pair<A: crate::fact::FactValue, B: crate::fact::FactValue>(a: A, b: B) -> Tuple {
    Tuple::from_facts([Fact::new(a), Fact::new(b)])
}

/// Tuples of the inserts among `out`.
fn inserted(out: &[Delta]) -> Vec<Tuple> {
    out.iter()
        .filter_map(|d| match d {
            Delta::Insert(_, t) => Some(t.clone()),
            Delta::Retract(_) => None,
        })
        .collect()
}

fn retracted(out: &[Delta]) -> Vec<TupleId> {
    out.iter()
        .filter_map(|d| match d {
            Delta::Retract(id) => Some(*id),
            Delta::Insert(..) => None,
        })
        .collect()
}

fn inserted_ids(out: &[Delta]) -> Vec<TupleId> {
    out.iter()
        .filter_map(|d| match d {
            Delta::Insert(id, _) => Some(*id),
            Delta::Retract(_) => None,
        })
        .collect()
}

// ============================================================================
// Filter
// ============================================================================

#[test]
fn test_filter_passes_ids_through() {
    let kind = NodeKind::Distinct;
    let node = NodeLabel(1, &kind);
    let predicate: crate::graph::DynTuplePredicate = Box::new(|t: &Tuple| *t.a::<i32>() > 0);
    let mut ids = TupleIds::default();
    let mut state = FilterState::default();
    let mut out = Vec::new();

    let keep = ids.next();
    let drop = ids.next();
    state.apply(node, &predicate, Delta::Insert(keep, uni(5)), &mut out).unwrap();
    state.apply(node, &predicate, Delta::Insert(drop, uni(-5)), &mut out).unwrap();
    assert_eq!(inserted_ids(&out), vec![keep]);

    out.clear();
    state.apply(node, &predicate, Delta::Retract(drop), &mut out).unwrap();
    assert!(out.is_empty());
    state.apply(node, &predicate, Delta::Retract(keep), &mut out).unwrap();
    assert_eq!(retracted(&out), vec![keep]);
    assert!(state.outputs().is_empty());
}

#[test]
fn test_filter_tracks_rejected_tuples() {
    let kind = NodeKind::Distinct;
    let node = NodeLabel(1, &kind);
    let predicate: crate::graph::DynTuplePredicate = Box::new(|t: &Tuple| *t.a::<i32>() > 0);
    let mut ids = TupleIds::default();
    let mut state = FilterState::default();
    let mut out = Vec::new();

    let rejected = ids.next();
    state.apply(node, &predicate, Delta::Insert(rejected, uni(-1)), &mut out).unwrap();
    let twice = state.apply(node, &predicate, Delta::Insert(rejected, uni(-1)), &mut out);
    assert!(matches!(twice, Err(StreamForgeError::ProtocolViolation { .. })));

    let unknown = ids.next();
    let result = state.apply(node, &predicate, Delta::Retract(unknown), &mut out);
    assert!(matches!(result, Err(StreamForgeError::ProtocolViolation { .. })));

    state.apply(node, &predicate, Delta::Retract(rejected), &mut out).unwrap();
    let again = state.apply(node, &predicate, Delta::Retract(rejected), &mut out);
    assert!(matches!(again, Err(StreamForgeError::ProtocolViolation { .. })));
    assert!(out.is_empty());
}

// ============================================================================
// Join
// ============================================================================

fn join_kind() -> NodeKind {
    NodeKind::Join(
        CompiledJoiners::compile([equal_by(|t: &Tuple| *t.a::<i32>() % 10)]).unwrap(),
    )
}

#[test]
fn test_join_matches_both_arrival_orders() {
    let kind = join_kind();
    let NodeKind::Join(joiners) = &kind else { unreachable!() };
    let node = NodeLabel(2, &kind);
    let mut ids = TupleIds::default();
    let mut state = JoinState::default();
    let mut out = Vec::new();

    let l1 = ids.next();
    let r1 = ids.next();
    let r2 = ids.next();
    state.apply(node, joiners, Port::Right, Delta::Insert(r1, uni(11)), &mut ids, &mut out).unwrap();
    assert!(out.is_empty());

    state.apply(node, joiners, Port::Left, Delta::Insert(l1, uni(1)), &mut ids, &mut out).unwrap();
    assert_eq!(inserted(&out), vec![pair(1, 11)]);

    out.clear();
    state.apply(node, joiners, Port::Right, Delta::Insert(r2, uni(21)), &mut ids, &mut out).unwrap();
    assert_eq!(inserted(&out), vec![pair(1, 21)]);

    let mut outputs = state.outputs();
    outputs.sort_by_key(|t| *t.b::<i32>());
    assert_eq!(outputs, vec![pair(1, 11), pair(1, 21)]);
}

#[test]
fn test_join_retract_left_retracts_every_pair() {
    let kind = join_kind();
    let NodeKind::Join(joiners) = &kind else { unreachable!() };
    let node = NodeLabel(2, &kind);
    let mut ids = TupleIds::default();
    let mut state = JoinState::default();
    let mut out = Vec::new();

    let l = ids.next();
    let r1 = ids.next();
    let r2 = ids.next();
    let r3 = ids.next();
    state.apply(node, joiners, Port::Left, Delta::Insert(l, uni(3)), &mut ids, &mut out).unwrap();
    state.apply(node, joiners, Port::Right, Delta::Insert(r1, uni(13)), &mut ids, &mut out).unwrap();
    state.apply(node, joiners, Port::Right, Delta::Insert(r2, uni(23)), &mut ids, &mut out).unwrap();
    state.apply(node, joiners, Port::Right, Delta::Insert(r3, uni(4)), &mut ids, &mut out).unwrap();
    let joined = inserted_ids(&out);
    assert_eq!(joined.len(), 2);

    out.clear();
    state.apply(node, joiners, Port::Left, Delta::Retract(l), &mut ids, &mut out).unwrap();
    let mut gone = retracted(&out);
    gone.sort();
    assert_eq!(gone, joined);

    // The right side no longer remembers the left tuple.
    out.clear();
    state.apply(node, joiners, Port::Right, Delta::Retract(r1), &mut ids, &mut out).unwrap();
    assert!(out.is_empty());
    assert!(state.outputs().is_empty());
}

#[test]
fn test_join_filtering_joiner_applies_after_index() {
    let kind = NodeKind::Join(
        CompiledJoiners::compile([
            equal_by(|t: &Tuple| *t.a::<i32>() % 10),
            filtering(|l: &Tuple, r: &Tuple| l.a::<i32>() < r.a::<i32>()),
        ])
        .unwrap(),
    );
    let NodeKind::Join(joiners) = &kind else { unreachable!() };
    let node = NodeLabel(2, &kind);
    let mut ids = TupleIds::default();
    let mut state = JoinState::default();
    let mut out = Vec::new();

    for (port, value) in [(Port::Left, 15), (Port::Right, 5), (Port::Right, 25)] {
        let id = ids.next();
        state.apply(node, joiners, port, Delta::Insert(id, uni(value)), &mut ids, &mut out).unwrap();
    }
    assert_eq!(inserted(&out), vec![pair(15, 25)]);
}

#[test]
fn test_join_double_insert_is_protocol_violation() {
    let kind = join_kind();
    let NodeKind::Join(joiners) = &kind else { unreachable!() };
    let node = NodeLabel(7, &kind);
    let mut ids = TupleIds::default();
    let mut state = JoinState::default();
    let mut out = Vec::new();

    let l = ids.next();
    state.apply(node, joiners, Port::Left, Delta::Insert(l, uni(1)), &mut ids, &mut out).unwrap();
    let err = state
        .apply(node, joiners, Port::Left, Delta::Insert(l, uni(1)), &mut ids, &mut out)
        .unwrap_err();
    match err {
        StreamForgeError::ProtocolViolation { node, .. } => assert_eq!(node, "Join#7"),
        other => panic!("expected ProtocolViolation, got {:?}", other),
    }

    let never_inserted = ids.next();
    let err = state
        .apply(node, joiners, Port::Right, Delta::Retract(never_inserted), &mut ids, &mut out)
        .unwrap_err();
    assert!(err.is_fatal());
}

// ============================================================================
// Exists
// ============================================================================

fn exists_kind(should_exist: bool) -> NodeKind {
    NodeKind::Exists {
        joiners: CompiledJoiners::compile([none()]).unwrap(),
        should_exist,
    }
}

#[test]
fn test_exists_counter_example() {
    // Left A, right B1 and B2, cartesian: A appears with the first B, stays
    // while either B remains and disappears with the last.
    let kind = exists_kind(true);
    let NodeKind::Exists { joiners, should_exist } = &kind else { unreachable!() };
    let node = NodeLabel(3, &kind);
    let mut ids = TupleIds::default();
    let mut state = ExistsState::default();
    let mut out = Vec::new();

    let a = ids.next();
    let b1 = ids.next();
    let b2 = ids.next();
    state.apply(node, joiners, *should_exist, Port::Left, Delta::Insert(a, uni("A")), &mut out).unwrap();
    assert!(out.is_empty());

    state.apply(node, joiners, *should_exist, Port::Right, Delta::Insert(b1, uni("B1")), &mut out).unwrap();
    assert_eq!(inserted_ids(&out), vec![a]);

    out.clear();
    state.apply(node, joiners, *should_exist, Port::Right, Delta::Insert(b2, uni("B2")), &mut out).unwrap();
    assert!(out.is_empty());

    state.apply(node, joiners, *should_exist, Port::Right, Delta::Retract(b1), &mut out).unwrap();
    assert!(out.is_empty());
    assert_eq!(state.outputs(), vec![uni("A")]);

    state.apply(node, joiners, *should_exist, Port::Right, Delta::Retract(b2), &mut out).unwrap();
    assert_eq!(retracted(&out), vec![a]);
    assert!(state.outputs().is_empty());
}

#[test]
fn test_not_exists_emits_until_first_match() {
    let kind = exists_kind(false);
    let NodeKind::Exists { joiners, should_exist } = &kind else { unreachable!() };
    let node = NodeLabel(3, &kind);
    let mut ids = TupleIds::default();
    let mut state = ExistsState::default();
    let mut out = Vec::new();

    let a = ids.next();
    let b = ids.next();
    state.apply(node, joiners, *should_exist, Port::Left, Delta::Insert(a, uni("A")), &mut out).unwrap();
    assert_eq!(inserted_ids(&out), vec![a]);

    out.clear();
    state.apply(node, joiners, *should_exist, Port::Right, Delta::Insert(b, uni("B")), &mut out).unwrap();
    assert_eq!(retracted(&out), vec![a]);

    // Retracting the left tuple while suppressed emits nothing.
    out.clear();
    state.apply(node, joiners, *should_exist, Port::Left, Delta::Retract(a), &mut out).unwrap();
    assert!(out.is_empty());
}

// ============================================================================
// Group
// ============================================================================

fn group_parts() -> (Vec<DynMapper>, Vec<GroupCollector>) {
    let key: DynMapper = Box::new(|t: &Tuple| Fact::new(*t.a::<&str>()));
    let total = GroupCollector::from(sum(|t: &Tuple| *t.b::<i64>()));
    (vec![key], vec![total])
}

#[test]
fn test_group_by_sum_example() {
    let (keys, collectors) = group_parts();
    let kind = NodeKind::Distinct;
    let node = NodeLabel(4, &kind);
    let mut ids = TupleIds::default();
    let mut state = GroupState::default();
    let mut out = Vec::new();

    let a1 = ids.next();
    let a2 = ids.next();
    let b5 = ids.next();
    for (id, tuple) in [(a1, pair("A", 1i64)), (a2, pair("A", 2i64)), (b5, pair("B", 5i64))] {
        state.apply(node, &keys, &collectors, Delta::Insert(id, tuple), &mut ids, &mut out).unwrap();
    }
    let mut outputs = state.outputs();
    outputs.sort_by_key(|t| *t.a::<&str>());
    assert_eq!(outputs, vec![pair("A", 3i64), pair("B", 5i64)]);

    state.apply(node, &keys, &collectors, Delta::Retract(a2), &mut ids, &mut out).unwrap();
    let mut outputs = state.outputs();
    outputs.sort_by_key(|t| *t.a::<&str>());
    assert_eq!(outputs, vec![pair("A", 1i64), pair("B", 5i64)]);

    // The last contributor leaving removes the group.
    out.clear();
    state.apply(node, &keys, &collectors, Delta::Retract(b5), &mut ids, &mut out).unwrap();
    assert_eq!(retracted(&out).len(), 1);
    assert!(inserted(&out).is_empty());
    assert_eq!(state.outputs(), vec![pair("A", 1i64)]);
}

#[test]
fn test_group_unchanged_result_is_not_reemitted() {
    let key: DynMapper = Box::new(|t: &Tuple| Fact::new(*t.a::<i32>() % 2));
    let keys = vec![key];
    let collectors = vec![GroupCollector::noop()];
    let kind = NodeKind::Distinct;
    let node = NodeLabel(4, &kind);
    let mut ids = TupleIds::default();
    let mut state = GroupState::default();
    let mut out = Vec::new();

    let first = ids.next();
    let second = ids.next();
    state.apply(node, &keys, &collectors, Delta::Insert(first, uni(1)), &mut ids, &mut out).unwrap();
    state.apply(node, &keys, &collectors, Delta::Insert(second, uni(3)), &mut ids, &mut out).unwrap();
    assert_eq!(inserted(&out), vec![uni(1)]);

    out.clear();
    state.apply(node, &keys, &collectors, Delta::Retract(first), &mut ids, &mut out).unwrap();
    assert!(out.is_empty());
}

#[test]
fn test_group_retract_without_undo_is_protocol_violation() {
    let (keys, collectors) = group_parts();
    let kind = NodeKind::Distinct;
    let node = NodeLabel(4, &kind);
    let mut ids = TupleIds::default();
    let mut state = GroupState::default();
    let mut out = Vec::new();

    let never_inserted = ids.next();
    let err = state
        .apply(node, &keys, &collectors, Delta::Retract(never_inserted), &mut ids, &mut out)
        .unwrap_err();
    assert!(err.to_string().contains("no undo registered"), "{}", err);
}

#[test]
fn test_group_without_keys_aggregates_whole_stream() {
    let keys: Vec<DynMapper> = Vec::new();
    let collectors = vec![GroupCollector::from(count())];
    let kind = NodeKind::Distinct;
    let node = NodeLabel(4, &kind);
    let mut ids = TupleIds::default();
    let mut state = GroupState::default();
    let mut out = Vec::new();

    let mut inputs = Vec::new();
    for value in 0..3 {
        let id = ids.next();
        inputs.push(id);
        state.apply(node, &keys, &collectors, Delta::Insert(id, uni(value)), &mut ids, &mut out).unwrap();
    }
    assert_eq!(state.outputs(), vec![uni(3usize)]);

    for id in inputs {
        state.apply(node, &keys, &collectors, Delta::Retract(id), &mut ids, &mut out).unwrap();
    }
    assert!(state.outputs().is_empty());
}

// ============================================================================
// Map, flatten, distinct
// ============================================================================

#[test]
fn test_map_allocates_fresh_ids() {
    let mapper: DynMapper = Box::new(|t: &Tuple| Fact::new(t.a::<i32>() * 10));
    let mappers = vec![mapper];
    let kind = NodeKind::Distinct;
    let node = NodeLabel(5, &kind);
    let mut ids = TupleIds::default();
    let mut state = MapState::default();
    let mut out = Vec::new();

    let input = ids.next();
    state.apply(node, &mappers, Delta::Insert(input, uni(4)), &mut ids, &mut out).unwrap();
    assert_eq!(inserted(&out), vec![uni(40)]);
    let mapped = inserted_ids(&out)[0];
    assert_ne!(mapped, input);

    out.clear();
    state.apply(node, &mappers, Delta::Retract(input), &mut ids, &mut out).unwrap();
    assert_eq!(retracted(&out), vec![mapped]);
}

#[test]
fn test_flatten_last_expands_and_retracts() {
    let expand: crate::graph::DynFlatten = Box::new(|last: &Fact| {
        last.value::<Vec<i32>>().iter().map(|v| Fact::new(*v)).collect()
    });
    let kind = NodeKind::Distinct;
    let node = NodeLabel(6, &kind);
    let mut ids = TupleIds::default();
    let mut state = FlattenState::default();
    let mut out = Vec::new();

    let full = ids.next();
    let empty = ids.next();
    state
        .apply(node, &expand, Delta::Insert(full, pair("x", vec![1, 2])), &mut ids, &mut out)
        .unwrap();
    state
        .apply(node, &expand, Delta::Insert(empty, pair("y", Vec::<i32>::new())), &mut ids, &mut out)
        .unwrap();
    assert_eq!(inserted(&out), vec![pair("x", 1), pair("x", 2)]);

    out.clear();
    state.apply(node, &expand, Delta::Retract(empty), &mut ids, &mut out).unwrap();
    assert!(out.is_empty());
    state.apply(node, &expand, Delta::Retract(full), &mut ids, &mut out).unwrap();
    assert_eq!(retracted(&out).len(), 2);
}

#[test]
fn test_distinct_example() {
    // Two equal tuples collapse into one; it disappears only with the second.
    let kind = NodeKind::Distinct;
    let node = NodeLabel(7, &kind);
    let mut ids = TupleIds::default();
    let mut state = DistinctState::default();
    let mut out = Vec::new();

    let first = ids.next();
    let second = ids.next();
    state.apply(node, Delta::Insert(first, uni("X")), &mut ids, &mut out).unwrap();
    state.apply(node, Delta::Insert(second, uni("X")), &mut ids, &mut out).unwrap();
    assert_eq!(inserted(&out), vec![uni("X")]);

    out.clear();
    state.apply(node, Delta::Retract(first), &mut ids, &mut out).unwrap();
    assert!(out.is_empty());
    assert_eq!(state.outputs(), vec![uni("X")]);

    state.apply(node, Delta::Retract(second), &mut ids, &mut out).unwrap();
    assert_eq!(retracted(&out).len(), 1);
    assert!(state.outputs().is_empty());
}

// ============================================================================
// Source and scorer
// ============================================================================

#[test]
fn test_source_skips_unassigned_facts() {
    let is_assigned: crate::graph::DynAssigned =
        std::sync::Arc::new(|f: &Fact| f.value::<Option<u32>>().is_some());
    let kind = NodeKind::Source(crate::graph::SourceSpec {
        type_id: std::any::TypeId::of::<Option<u32>>(),
        include_unassigned: false,
        is_assigned: Some(is_assigned),
    });
    let NodeKind::Source(spec) = &kind else { unreachable!() };
    let node = NodeLabel(0, &kind);
    let mut ids = TupleIds::default();
    let mut state = SourceState::default();

    let assigned = Fact::with_id(FactId(1), Some(3u32));
    let unassigned = Fact::with_id(FactId(2), None::<u32>);
    assert!(state.insert(node, spec, &assigned, &mut ids).unwrap().is_some());
    assert!(state.insert(node, spec, &unassigned, &mut ids).unwrap().is_none());
    assert!(state.insert(node, spec, &assigned, &mut ids).is_err());

    assert!(state.retract(FactId(2)).is_none());
    assert!(matches!(state.retract(FactId(1)), Some(Delta::Retract(_))));
}

fn constraint(impact: ImpactType, weigher: MatchWeigher) -> ConstraintSpec<SimpleScore> {
    ConstraintSpec {
        constraint_ref: ConstraintRef::new("", "test"),
        impact,
        weight: ConstraintWeight::Fixed(SimpleScore::of(2)),
        weigher,
        scorer: 0,
    }
}

#[test]
fn test_scorer_subtracts_stored_contribution() {
    let spec = constraint(
        ImpactType::Penalty,
        MatchWeigher::Int(Box::new(|t: &Tuple| *t.a::<i32>())),
    );
    let kind = NodeKind::Scorer(0);
    let node = NodeLabel(8, &kind);
    let mut ids = TupleIds::default();
    let mut state = ScorerState::new(SimpleScore::of(2));

    let three = ids.next();
    let four = ids.next();
    state.apply(node, &spec, Delta::Insert(three, uni(3))).unwrap();
    state.apply(node, &spec, Delta::Insert(four, uni(4))).unwrap();
    assert_eq!(state.total(), SimpleScore::of(-14));
    assert_eq!(state.match_count(), 2);

    state.apply(node, &spec, Delta::Retract(three)).unwrap();
    assert_eq!(state.total(), SimpleScore::of(-8));
    let scores: Vec<_> = state.matches().map(|m| m.score).collect();
    assert_eq!(scores, vec![SimpleScore::of(-8)]);
}

#[test]
fn test_scorer_reward_is_positive() {
    let spec = constraint(ImpactType::Reward, MatchWeigher::unit());
    let kind = NodeKind::Scorer(0);
    let node = NodeLabel(8, &kind);
    let mut ids = TupleIds::default();
    let mut state = ScorerState::new(SimpleScore::of(2));

    state.apply(node, &spec, Delta::Insert(ids.next(), uni(()))).unwrap();
    assert_eq!(state.total(), SimpleScore::of(2));
}

#[test]
fn test_node_state_rejects_delta_into_source() {
    let kind = NodeKind::Source(crate::graph::SourceSpec {
        type_id: std::any::TypeId::of::<u8>(),
        include_unassigned: true,
        is_assigned: None,
    });
    let spec = crate::graph::NodeSpec {
        kind,
        arity: 1,
        children: Vec::new(),
    };
    let mut state: NodeState<SimpleScore> = NodeState::empty(&spec.kind, &[]);
    let mut ids = TupleIds::default();
    let mut out = Vec::new();
    let id = ids.next();
    let err = state
        .apply(0, &spec, &[], Port::Left, Delta::Insert(id, uni(1u8)), &mut ids, &mut out)
        .unwrap_err();
    assert!(matches!(err, StreamForgeError::ProtocolViolation { .. }));
}
