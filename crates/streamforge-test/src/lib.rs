//! Shared test fixtures for streamforge crates.
//!
//! This crate provides plain domain types and brute-force evaluators to check
//! incremental scores against. It does NOT depend on `streamforge-scoring`,
//! so the scoring crate can use it as a dev-dependency.
//!
//! - [`nqueens`] - N-Queens board and conflict counting
//! - [`scheduling`] - Employees and shifts with overlap and workload checks
//!
//! # Usage
//!
//! Add as a dev-dependency in your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! streamforge-test = { workspace = true }
//! ```
//!
//! Then import the fixtures you need:
//!
//! ```
//! use streamforge_test::nqueens::{calculate_conflicts, NQueensBoard};
//!
//! let board = NQueensBoard::with_rows(&[1, 3, 0, 2]);
//! assert_eq!(calculate_conflicts(&board.queens), 0);
//! ```

pub mod nqueens;
pub mod scheduling;

// Re-export commonly used types at crate root for convenience
pub use nqueens::{NQueensBoard, Queen};
pub use scheduling::{Employee, Schedule, Shift};
