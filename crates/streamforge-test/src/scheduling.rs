//! Employee scheduling test fixtures.
//!
//! Shifts are assigned to employees; a shift without an employee is not
//! planned yet. The evaluators below recompute the usual scheduling
//! constraints by brute force over the whole schedule.
//!
//! # Example
//!
//! ```
//! use streamforge_test::scheduling::{overlapping_pairs, Employee, Schedule, Shift};
//!
//! let schedule = Schedule::new(
//!     vec![Employee::new(1), Employee::new(2)],
//!     vec![Shift::assigned(0, 1, 0, 8), Shift::assigned(1, 1, 4, 12), Shift::unassigned(2, 0, 8)],
//! );
//! assert_eq!(overlapping_pairs(&schedule.shifts), 1);
//! ```

use std::collections::BTreeMap;

use rand::Rng;
use streamforge_core::HardSoftScore;

/// An employee that shifts can be assigned to.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Employee {
    pub id: u32,
}

impl Employee {
    pub fn new(id: u32) -> Self {
        Self { id }
    }
}

/// A shift spanning `[start, end)` hours.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Shift {
    pub id: u32,
    pub employee: Option<u32>,
    pub start: i64,
    pub end: i64,
}

impl Shift {
    /// Creates a shift assigned to `employee`.
    pub fn assigned(id: u32, employee: u32, start: i64, end: i64) -> Self {
        Self {
            id,
            employee: Some(employee),
            start,
            end,
        }
    }

    /// Creates a shift with no employee.
    pub fn unassigned(id: u32, start: i64, end: i64) -> Self {
        Self {
            id,
            employee: None,
            start,
            end,
        }
    }

    pub fn hours(&self) -> i64 {
        self.end - self.start
    }

    /// Returns true if both shifts have the same employee and their spans intersect.
    pub fn overlaps(&self, other: &Shift) -> bool {
        self.employee.is_some()
            && self.employee == other.employee
            && self.start < other.end
            && other.start < self.end
    }
}

/// Employees and shifts of one planning window.
#[derive(Clone, Debug, Default)]
pub struct Schedule {
    pub employees: Vec<Employee>,
    pub shifts: Vec<Shift>,
}

impl Schedule {
    pub fn new(employees: Vec<Employee>, shifts: Vec<Shift>) -> Self {
        Self { employees, shifts }
    }

    /// Creates a schedule of `employees` employees and `shifts` random shifts
    /// within a 24-hour window. About one shift in eight stays unassigned.
    pub fn random<R: Rng>(employees: u32, shifts: u32, rng: &mut R) -> Self {
        let staff = (0..employees).map(Employee::new).collect();
        let shifts = (0..shifts)
            .map(|id| random_shift(id, employees, rng))
            .collect();
        Self::new(staff, shifts)
    }
}

/// A shift with a random span and, usually, a random employee.
pub fn random_shift<R: Rng>(id: u32, employees: u32, rng: &mut R) -> Shift {
    let start = rng.random_range(0..20);
    let end = start + rng.random_range(1..=8);
    if employees == 0 || rng.random_bool(0.125) {
        Shift::unassigned(id, start, end)
    } else {
        Shift::assigned(id, rng.random_range(0..employees), start, end)
    }
}

/// Counts unordered pairs of overlapping shifts.
pub fn overlapping_pairs(shifts: &[Shift]) -> i64 {
    let mut pairs = 0;
    for i in 0..shifts.len() {
        for j in (i + 1)..shifts.len() {
            if shifts[i].overlaps(&shifts[j]) {
                pairs += 1;
            }
        }
    }
    pairs
}

/// Total assigned hours per employee; employees without shifts are absent.
pub fn hours_by_employee(shifts: &[Shift]) -> BTreeMap<u32, i64> {
    let mut hours = BTreeMap::new();
    for shift in shifts {
        if let Some(employee) = shift.employee {
            *hours.entry(employee).or_insert(0) += shift.hours();
        }
    }
    hours
}

/// Hours above `limit`, summed over employees.
pub fn overtime(shifts: &[Shift], limit: i64) -> i64 {
    hours_by_employee(shifts)
        .values()
        .map(|&hours| (hours - limit).max(0))
        .sum()
}

/// Counts employees with no assigned shift.
pub fn idle_employees(schedule: &Schedule) -> i64 {
    let hours = hours_by_employee(&schedule.shifts);
    schedule
        .employees
        .iter()
        .filter(|e| !hours.contains_key(&e.id))
        .count() as i64
}

/// Counts shifts with no employee.
pub fn unassigned_shifts(shifts: &[Shift]) -> i64 {
    shifts.iter().filter(|s| s.employee.is_none()).count() as i64
}

/// Reference score of a schedule.
///
/// Hard: one per overlapping pair and one per unassigned shift.
/// Soft: one per overtime hour above `limit` and one per idle employee.
pub fn calculate_score(schedule: &Schedule, limit: i64) -> HardSoftScore {
    HardSoftScore::of(
        -(overlapping_pairs(&schedule.shifts) + unassigned_shifts(&schedule.shifts)),
        -(overtime(&schedule.shifts, limit) + idle_employees(schedule)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn sample() -> Schedule {
        Schedule::new(
            (1..=3).map(Employee::new).collect(),
            vec![
                Shift::assigned(0, 1, 0, 8),
                Shift::assigned(1, 1, 6, 14),
                Shift::assigned(2, 2, 0, 4),
                Shift::unassigned(3, 4, 8),
            ],
        )
    }

    #[test]
    fn test_overlap_requires_same_employee() {
        let a = Shift::assigned(0, 1, 0, 8);
        assert!(a.overlaps(&Shift::assigned(1, 1, 7, 9)));
        assert!(!a.overlaps(&Shift::assigned(1, 1, 8, 9)));
        assert!(!a.overlaps(&Shift::assigned(1, 2, 0, 8)));
        assert!(!Shift::unassigned(0, 0, 8).overlaps(&Shift::unassigned(1, 0, 8)));
    }

    #[test]
    fn test_workload() {
        let schedule = sample();
        assert_eq!(hours_by_employee(&schedule.shifts).get(&1), Some(&16));
        assert_eq!(overtime(&schedule.shifts, 10), 6);
        assert_eq!(idle_employees(&schedule), 1);
        assert_eq!(unassigned_shifts(&schedule.shifts), 1);
    }

    #[test]
    fn test_reference_score() {
        assert_eq!(calculate_score(&sample(), 10), HardSoftScore::of(-2, -7));
    }

    #[test]
    fn test_random_schedule() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(11);
        let schedule = Schedule::random(4, 30, &mut rng);
        assert_eq!(schedule.employees.len(), 4);
        assert_eq!(schedule.shifts.len(), 30);
        assert!(schedule.shifts.iter().all(|s| s.hours() > 0));
        assert!(schedule
            .shifts
            .iter()
            .all(|s| s.employee.map_or(true, |e| e < 4)));
    }
}
