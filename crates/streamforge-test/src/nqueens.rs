//! N-Queens problem test fixtures.
//!
//! The N-Queens problem places N queens on an N×N chessboard such that no two
//! queens threaten each other. Each queen owns one column; its row is the
//! value that changes, and `None` means the queen is not placed yet.
//!
//! # Example
//!
//! ```
//! use streamforge_core::SimpleScore;
//! use streamforge_test::nqueens::{calculate_score, NQueensBoard};
//!
//! // Queens at rows [0, 1, 3, 2]: two pairs share a diagonal.
//! let board = NQueensBoard::with_rows(&[0, 1, 3, 2]);
//! assert_eq!(calculate_score(&board.queens), SimpleScore::of(-2));
//! ```

use rand::Rng;
use streamforge_core::SimpleScore;

/// A queen in the N-Queens problem.
///
/// Each queen has:
/// - `id`: Unique identifier (typically the column index)
/// - `column`: The column position on the board
/// - `row`: The row position (None if unassigned)
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Queen {
    pub id: i64,
    pub column: i64,
    pub row: Option<i64>,
}

impl Queen {
    /// Creates a new queen at the given column with an optional row.
    pub fn new(id: i64, column: i64, row: Option<i64>) -> Self {
        Self { id, column, row }
    }

    /// Creates a queen with an assigned row.
    pub fn assigned(id: i64, column: i64, row: i64) -> Self {
        Self {
            id,
            column,
            row: Some(row),
        }
    }

    /// Creates a queen with no row assigned.
    pub fn unassigned(id: i64, column: i64) -> Self {
        Self {
            id,
            column,
            row: None,
        }
    }

    /// Index of the `/` diagonal, if placed.
    pub fn ascending_diagonal(&self) -> Option<i64> {
        self.row.map(|row| row - self.column)
    }

    /// Index of the `\` diagonal, if placed.
    pub fn descending_diagonal(&self) -> Option<i64> {
        self.row.map(|row| row + self.column)
    }
}

/// A board of queens, one per column.
#[derive(Clone, Debug)]
pub struct NQueensBoard {
    pub queens: Vec<Queen>,
}

impl NQueensBoard {
    /// Creates a board with n unplaced queens in columns 0..n.
    pub fn uninitialized(n: usize) -> Self {
        let queens = (0..n)
            .map(|i| Queen::unassigned(i as i64, i as i64))
            .collect();
        Self { queens }
    }

    /// Creates a board with queens at the given rows, in columns 0..n.
    pub fn with_rows(rows: &[i64]) -> Self {
        let queens = rows
            .iter()
            .enumerate()
            .map(|(i, &row)| Queen::assigned(i as i64, i as i64, row))
            .collect();
        Self { queens }
    }

    /// Creates a board with optional rows.
    pub fn with_optional_rows(rows: &[Option<i64>]) -> Self {
        let queens = rows
            .iter()
            .enumerate()
            .map(|(i, &row)| Queen::new(i as i64, i as i64, row))
            .collect();
        Self { queens }
    }

    /// Creates an n×n board with every queen on a random row.
    pub fn random<R: Rng>(n: usize, rng: &mut R) -> Self {
        let rows: Vec<i64> = (0..n).map(|_| rng.random_range(0..n as i64)).collect();
        Self::with_rows(&rows)
    }
}

/// Counts conflicting queen pairs.
///
/// A pair sharing a row counts once; a pair sharing a diagonal counts once.
/// Unplaced queens never conflict.
pub fn calculate_conflicts(queens: &[Queen]) -> i64 {
    let mut conflicts = 0i64;

    for i in 0..queens.len() {
        for j in (i + 1)..queens.len() {
            if let (Some(row_i), Some(row_j)) = (queens[i].row, queens[j].row) {
                if row_i == row_j {
                    conflicts += 1;
                }
                let col_diff = (queens[j].column - queens[i].column).abs();
                if (row_i - row_j).abs() == col_diff {
                    conflicts += 1;
                }
            }
        }
    }

    conflicts
}

/// Negated conflict count; 0 means a valid placement.
pub fn calculate_score(queens: &[Queen]) -> SimpleScore {
    SimpleScore::of(-calculate_conflicts(queens))
}
