//! Reference problem modules for HyperForge
//!
//! Each module implements [`hyperforge_core::Problem`] and ships a pool of
//! named heuristics:
//! - [`tsp`]: travelling salesman, tour construction and 2-opt
//! - [`mkp`]: multidimensional knapsack, greedy construction and swaps

pub mod mkp;
pub mod tsp;

pub use mkp::{MkpOperator, MkpProblem, MkpState, Selection};
pub use tsp::{Tour, TspOperator, TspProblem, TspState};
