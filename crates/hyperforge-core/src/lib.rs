//! HyperForge Core - environment engine for stepwise combinatorial search
//!
//! This crate provides the fundamental abstractions for HyperForge:
//! - Domain traits for plugging in a problem (solution, operators, state data)
//! - The heuristic contract and named heuristic pools
//! - The [`Env`] state machine that applies heuristics step by step
//! - Trajectory recording, snapshots for forking, and the result artifact

pub mod env;
pub mod error;
pub mod heuristic;
pub mod problem;
pub mod trajectory;

#[cfg(test)]
mod test_utils;

pub use env::{mix_seed, Env, EnvOptions, EnvSnapshot, RunSummary, SnapshotOf, StepOutcome};
pub use error::{EnvError, HeuristicError, HeuristicFailure, Result};
pub use heuristic::{
    param_f64, param_usize, AlgorithmData, FnHeuristic, Heuristic, HeuristicContext,
    HeuristicPool, HeuristicResult, Parameters, Proposal,
};
pub use problem::{Direction, LoadProblem, Operator, Problem, Solution};
pub use trajectory::{parse_trajectory, Trajectory, TrajectoryEntry};
