// Tests for pipeline layout: source sharing, wiring and branch activity.

use std::any::TypeId;

use streamforge_core::SimpleScore;

use super::*;
use crate::api::weight::ConstraintWeight;
use crate::stream::joiner::equal;
use crate::stream::ConstraintFactory;

#[derive(Debug, PartialEq, Eq, Hash)]
struct Lesson {
    room: u8,
}

#[derive(Debug, PartialEq, Eq, Hash)]
struct Room {
    id: u8,
}

fn lesson_pipeline() -> ConstraintPipeline<SimpleScore> {
    let factory = ConstraintFactory::new();
    factory
        .for_each::<Lesson>()
        .join_each::<Lesson>([equal(|l: &Tuple| l.a::<Lesson>().room, |r: &Tuple| r.a::<Lesson>().room)])
        .penalize(SimpleScore::ONE)
        .as_constraint("Room conflict");
    factory
        .for_each::<Lesson>()
        .if_not_exists::<Room>([equal(|l: &Tuple| l.a::<Lesson>().room, |r: &Tuple| r.a::<Room>().id)])
        .penalize_configurable(SimpleScore::of(5))
        .as_constraint_in("rooms", "Missing room");
    factory.build().unwrap()
}

#[test]
fn test_sources_are_shared_per_type() {
    let pipeline = lesson_pipeline();
    assert_eq!(pipeline.sources_of(TypeId::of::<Lesson>()).len(), 1);
    assert_eq!(pipeline.sources_of(TypeId::of::<Room>()).len(), 1);
    assert!(pipeline.sources_of(TypeId::of::<u64>()).is_empty());

    // The self-join reads both ports from the one lesson source.
    let source = pipeline.sources_of(TypeId::of::<Lesson>())[0];
    let ports: Vec<Port> = pipeline.nodes[source]
        .children
        .iter()
        .filter(|(child, _)| matches!(pipeline.nodes[*child].kind, NodeKind::Join(_)))
        .map(|(_, port)| *port)
        .collect();
    assert_eq!(ports, vec![Port::Left, Port::Right]);
}

#[test]
fn test_unassigned_variant_gets_its_own_source() {
    let factory = ConstraintFactory::<SimpleScore>::new();
    factory.planning_entity::<Lesson>(|l| l.room > 0);
    factory
        .for_each::<Lesson>()
        .penalize(SimpleScore::ONE)
        .as_constraint("Assigned");
    factory
        .for_each_including_unassigned::<Lesson>()
        .penalize(SimpleScore::ONE)
        .as_constraint("Any");
    let pipeline = factory.build().unwrap();

    let sources = pipeline.sources_of(TypeId::of::<Lesson>());
    assert_eq!(sources.len(), 2);
    let filtered: Vec<bool> = sources
        .iter()
        .map(|&id| match &pipeline.nodes[id].kind {
            NodeKind::Source(spec) => spec.is_assigned.is_some(),
            _ => unreachable!(),
        })
        .collect();
    assert_eq!(filtered, vec![true, false]);
}

#[test]
fn test_children_follow_parents_in_arena_order() {
    let pipeline = lesson_pipeline();
    for (id, node) in pipeline.nodes.iter().enumerate() {
        for (child, _) in &node.children {
            assert!(*child > id, "{} feeds {}", id, child);
        }
    }
}

#[test]
fn test_feeding_nodes_skip_inactive_branches() {
    let pipeline = lesson_pipeline();
    let all = pipeline.feeding_nodes(&[true, true]);
    assert!(all.iter().all(|feeding| *feeding));

    let only_conflicts = pipeline.feeding_nodes(&[true, false]);
    let room_source = pipeline.sources_of(TypeId::of::<Room>())[0];
    let lesson_source = pipeline.sources_of(TypeId::of::<Lesson>())[0];
    assert!(!only_conflicts[room_source]);
    assert!(only_conflicts[lesson_source]);
    assert!(!only_conflicts[pipeline.constraints[1].scorer]);

    let none = pipeline.feeding_nodes(&[false, false]);
    assert!(none.iter().all(|feeding| !feeding));
}

#[test]
fn test_constraint_lookup_by_full_name() {
    let pipeline = lesson_pipeline();
    assert_eq!(pipeline.constraint_count(), 2);
    assert_eq!(pipeline.constraint_index("rooms/Missing room"), Some(1));
    assert_eq!(pipeline.constraint_index("Missing room"), None);
    assert_eq!(
        pipeline.constraint_weight("rooms/Missing room"),
        Some(ConstraintWeight::Configurable(SimpleScore::of(5)))
    );
    assert_eq!(
        pipeline.constraint_weight("Room conflict"),
        Some(ConstraintWeight::Fixed(SimpleScore::ONE))
    );
    let names: Vec<String> = pipeline.constraint_refs().map(|r| r.full_name()).collect();
    assert_eq!(names, vec!["Room conflict", "rooms/Missing room"]);
}

#[test]
fn test_node_labels() {
    let pipeline = lesson_pipeline();
    let labels: Vec<String> = pipeline
        .nodes
        .iter()
        .enumerate()
        .map(|(id, node)| NodeLabel(id, &node.kind).to_string())
        .collect();
    assert_eq!(labels[0], "Source#0");
    assert!(labels.contains(&"Join#1".to_string()));
    assert!(labels.iter().any(|l| l.starts_with("IfNotExists#")));
    assert_eq!(labels.iter().filter(|l| l.starts_with("Scorer#")).count(), 2);

    let debug = format!("{:?}", pipeline);
    assert!(debug.contains("Join#1/2"));
    assert!(debug.contains("rooms/Missing room"));
}
