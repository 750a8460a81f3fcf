//! Integration tests: incremental scores against brute-force evaluation.
//!
//! Every test drives a session through random changes and compares the
//! running score with a recomputation over the mirrored fact set.

use std::sync::Arc;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use streamforge_config::{EngineConfig, EnvironmentMode};
use streamforge_core::{HardSoftScore, SimpleScore};
use streamforge_scoring::stream::collector::sum;
use streamforge_scoring::stream::joiner::{equal, filtering};
use streamforge_scoring::{
    ConstraintFactory, ConstraintPipeline, ConstraintWeightOverrides, FactHandle, ScoringSession,
    Tuple,
};
use streamforge_test::nqueens::{self, NQueensBoard, Queen};
use streamforge_test::scheduling::{self, random_shift, Employee, Schedule, Shift};

const OVERTIME_LIMIT: i64 = 10;

fn queen(t: &Tuple) -> &Queen {
    t.a::<Queen>()
}

fn shift(t: &Tuple) -> &Shift {
    t.a::<Shift>()
}

fn nqueens_pipeline() -> ConstraintPipeline<SimpleScore> {
    let factory = ConstraintFactory::new();
    factory.planning_entity::<Queen>(|q| q.row.is_some());
    let lines: [(&str, fn(&Queen) -> Option<i64>); 3] = [
        ("Row conflict", |q| q.row),
        ("Ascending diagonal conflict", Queen::ascending_diagonal),
        ("Descending diagonal conflict", Queen::descending_diagonal),
    ];
    for (name, line) in lines {
        factory
            .for_each_unique_pair::<Queen>([equal(
                move |l: &Tuple| line(queen(l)),
                move |r: &Tuple| line(queen(r)),
            )])
            .penalize(SimpleScore::ONE)
            .as_constraint_in("nqueens", name);
    }
    factory.build().unwrap()
}

fn scheduling_pipeline() -> ConstraintPipeline<HardSoftScore> {
    let factory = ConstraintFactory::new();
    factory.planning_entity::<Shift>(|s| s.employee.is_some());
    factory
        .for_each_unique_pair::<Shift>([
            equal(|l: &Tuple| shift(l).employee, |r: &Tuple| shift(r).employee),
            filtering(|l: &Tuple, r: &Tuple| shift(l).overlaps(shift(r))),
        ])
        .penalize(HardSoftScore::ONE_HARD)
        .as_constraint("Overlapping shifts");
    factory
        .for_each_including_unassigned::<Shift>()
        .filter(|t: &Tuple| shift(t).employee.is_none())
        .penalize(HardSoftScore::ONE_HARD)
        .as_constraint("Unassigned shift");
    factory
        .for_each::<Shift>()
        .group_by_key_with(|t: &Tuple| shift(t).employee, sum(|t: &Tuple| shift(t).hours()))
        .filter(|t: &Tuple| *t.b::<i64>() > OVERTIME_LIMIT)
        .penalize_long(HardSoftScore::ONE_SOFT, |t: &Tuple| *t.b::<i64>() - OVERTIME_LIMIT)
        .as_constraint("Overtime");
    factory
        .for_each::<Employee>()
        .if_not_exists::<Shift>([equal(
            |e: &Tuple| Some(e.a::<Employee>().id),
            |s: &Tuple| shift(s).employee,
        )])
        .penalize_configurable(HardSoftScore::ONE_SOFT)
        .as_constraint("Idle employee");
    factory.build().unwrap()
}

// ============================================================================
// N-Queens
// ============================================================================

#[test]
fn test_nqueens_matches_brute_force() {
    let mut rng = ChaCha8Rng::seed_from_u64(8);
    let n = 8;
    let mut board = NQueensBoard::random(n, &mut rng);
    let mut session = ScoringSession::new(Arc::new(nqueens_pipeline()));
    let handles: Vec<FactHandle> = board
        .queens
        .iter()
        .map(|q| session.insert(q.clone()).unwrap())
        .collect();
    assert_eq!(session.score(), nqueens::calculate_score(&board.queens));

    for _ in 0..500 {
        let index = rng.random_range(0..n);
        let row = if rng.random_bool(0.1) {
            None
        } else {
            Some(rng.random_range(0..n as i64))
        };
        board.queens[index].row = row;
        session
            .update(handles[index], board.queens[index].clone())
            .unwrap();
        assert_eq!(session.score(), nqueens::calculate_score(&board.queens));
    }
    assert_eq!(session.calculate_from_scratch().unwrap(), session.score());
}

#[test]
fn test_nqueens_solution_has_no_matches() {
    let board = NQueensBoard::with_rows(&[1, 3, 0, 2]);
    let mut session = ScoringSession::new(Arc::new(nqueens_pipeline()));
    for q in &board.queens {
        session.insert(q.clone()).unwrap();
    }
    assert_eq!(session.score(), SimpleScore::ZERO);
    assert!(session.constraint_matches().is_empty());
    assert!(session.indictments().is_empty());
}

// ============================================================================
// Scheduling
// ============================================================================

#[test]
fn test_scheduling_matches_brute_force() {
    let mut rng = ChaCha8Rng::seed_from_u64(2024);
    let mut schedule = Schedule::random(5, 12, &mut rng);
    let mut session = ScoringSession::new(Arc::new(scheduling_pipeline()));
    for employee in &schedule.employees {
        session.insert(employee.clone()).unwrap();
    }
    let mut handles: Vec<FactHandle> = schedule
        .shifts
        .iter()
        .map(|s| session.insert(s.clone()).unwrap())
        .collect();
    let mut next_id = schedule.shifts.len() as u32;

    for step in 0..400 {
        match rng.random_range(0..3) {
            0 => {
                let shift = random_shift(next_id, 5, &mut rng);
                next_id += 1;
                handles.push(session.insert(shift.clone()).unwrap());
                schedule.shifts.push(shift);
            }
            1 if !handles.is_empty() => {
                let index = rng.random_range(0..handles.len());
                session.retract(handles.swap_remove(index)).unwrap();
                schedule.shifts.swap_remove(index);
            }
            _ if !handles.is_empty() => {
                let index = rng.random_range(0..handles.len());
                let moved = random_shift(schedule.shifts[index].id, 5, &mut rng);
                session.update(handles[index], moved.clone()).unwrap();
                schedule.shifts[index] = moved;
            }
            _ => {}
        }

        let expected = scheduling::calculate_score(&schedule, OVERTIME_LIMIT);
        assert_eq!(session.score(), expected, "diverged at step {}", step);
    }

    let explanation = session.explain();
    assert_eq!(
        explanation
            .constraint("Overlapping shifts")
            .map(|a| a.match_count() as i64),
        Some(scheduling::overlapping_pairs(&schedule.shifts))
    );
    assert_eq!(
        explanation
            .constraint("Idle employee")
            .map(|a| a.match_count() as i64),
        Some(scheduling::idle_employees(&schedule))
    );
}

#[test]
fn test_full_assert_session_follows_brute_force() {
    let mut rng = ChaCha8Rng::seed_from_u64(99);
    let schedule = Schedule::random(3, 8, &mut rng);
    let config = EngineConfig::new().with_environment_mode(EnvironmentMode::FullAssert);
    let mut session = ScoringSession::with_config(
        Arc::new(scheduling_pipeline()),
        &ConstraintWeightOverrides::new(),
        &config,
    )
    .unwrap();
    for employee in &schedule.employees {
        session.insert(employee.clone()).unwrap();
    }
    for shift in &schedule.shifts {
        session.insert(shift.clone()).unwrap();
    }
    assert!(!session.is_poisoned());
    assert_eq!(
        session.score(),
        scheduling::calculate_score(&schedule, OVERTIME_LIMIT)
    );
}

#[test]
fn test_idle_weight_override_from_config() {
    let schedule = Schedule::new(
        (0..3).map(Employee::new).collect(),
        vec![Shift::assigned(0, 0, 0, 8)],
    );
    let config = EngineConfig::from_toml_str(
        r#"
        prune_inactive_branches = true

        [constraint_weights]
        "Idle employee" = "0hard/0soft"
        "#,
    )
    .unwrap();
    let mut session = ScoringSession::with_config(
        Arc::new(scheduling_pipeline()),
        &ConstraintWeightOverrides::new(),
        &config,
    )
    .unwrap();
    for employee in &schedule.employees {
        session.insert(employee.clone()).unwrap();
    }
    session.insert(schedule.shifts[0].clone()).unwrap();

    assert_eq!(session.constraint_weight("Idle employee"), Some(HardSoftScore::ZERO));
    assert_eq!(session.score(), HardSoftScore::ZERO);
    let idle = session
        .constraint_results()
        .into_iter()
        .find(|r| r.name() == "Idle employee")
        .unwrap();
    assert_eq!(idle.match_count, 0);
}

// ============================================================================
// Sharing
// ============================================================================

#[test]
fn test_one_pipeline_backs_sessions_on_many_threads() {
    let pipeline = Arc::new(nqueens_pipeline());
    let boards: [[i64; 4]; 3] = [[0, 0, 0, 0], [1, 3, 0, 2], [0, 1, 2, 3]];

    let scores: Vec<SimpleScore> = std::thread::scope(|scope| {
        let workers: Vec<_> = boards
            .iter()
            .map(|rows| {
                let pipeline = Arc::clone(&pipeline);
                scope.spawn(move || {
                    let mut session = ScoringSession::new(pipeline);
                    for q in NQueensBoard::with_rows(rows).queens {
                        session.insert(q).unwrap();
                    }
                    session.score()
                })
            })
            .collect();
        workers.into_iter().map(|w| w.join().unwrap()).collect()
    });

    let expected: Vec<SimpleScore> = boards
        .iter()
        .map(|rows| nqueens::calculate_score(&NQueensBoard::with_rows(rows).queens))
        .collect();
    assert_eq!(scores, expected);
}
