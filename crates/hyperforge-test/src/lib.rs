//! Shared test fixtures for HyperForge crates.
//!
//! - [`selection`] - a toy "pick the cheapest items" problem
//! - [`heuristics`] - scripted heuristics for it (greedy, stalling,
//!   declining, failing, counting wrappers)
//!
//! # Usage
//!
//! Add as a dev-dependency in your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! hyperforge-test = { workspace = true }
//! ```
//!
//! ```ignore
//! use hyperforge_test::selection::{selection_env, SelectionProblem};
//! use hyperforge_test::heuristics::{greedy, Counting};
//! ```

pub mod heuristics;
pub mod selection;

pub use heuristics::Counting;
pub use selection::{selection_env, Picks, SelectionOperator, SelectionProblem, SelectionState};
