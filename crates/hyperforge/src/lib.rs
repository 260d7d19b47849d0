//! HyperForge - LLM-guided hyper-heuristic search in Rust
//!
//! A problem module supplies instance loading, state data and a pool of
//! named heuristics; a hyper-heuristic policy decides which heuristic the
//! environment runs at every step.
//!
//! # Example
//!
//! ```no_run
//! use hyperforge::prelude::*;
//!
//! let config = RunConfig::load("run.toml").unwrap_or_default();
//! let summary = ProblemRegistry::builtin()
//!     .run("tsp", "data/kroA100.tsp", &config, Some("baseline"), None)
//!     .unwrap();
//! println!("{} = {}", summary.key_item, summary.key_value);
//! ```

pub use hyperforge_config as config;
pub use hyperforge_core as core;
pub use hyperforge_problems as problems;
pub use hyperforge_solver as solver;

pub use hyperforge_config::{ConfigError, HyperHeuristicConfig, RunConfig};
pub use hyperforge_core::{
    Env, EnvError, EnvOptions, FnHeuristic, Heuristic, HeuristicPool, LoadProblem, Problem,
    RunSummary,
};
pub use hyperforge_solver::{HyperHeuristic, LlmClient};

mod registry;
pub use registry::{build_hyper_heuristic, DriverError, Module, ProblemModule, ProblemRegistry};

#[cfg(feature = "console")]
pub mod console;

pub mod prelude {
    pub use super::{
        build_hyper_heuristic, DriverError, Env, EnvOptions, FnHeuristic, Heuristic,
        HeuristicPool, HyperHeuristic, HyperHeuristicConfig, LlmClient, LoadProblem, Problem,
        ProblemRegistry, RunConfig, RunSummary,
    };
    pub use hyperforge_core::{Parameters, Proposal};
}
