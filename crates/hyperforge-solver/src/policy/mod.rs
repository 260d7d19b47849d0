//! Hyper-heuristic policies
//!
//! A policy decides which heuristic the environment runs at every step:
//! - RandomHyperHeuristic: uniformly random heuristic, fixed step count
//! - SingleHyperHeuristic: one heuristic under a wall-clock budget
//! - SingleConstructiveSingleImproveHyperHeuristic: construction then improvement
//! - PerturbationHyperHeuristic: main heuristic with random perturbations
//! - GptSelectionHyperHeuristic, GptDeepSelectionHyperHeuristic,
//!   LlmSelectionHyperHeuristic: LLM-guided selection

mod gpt_deep_selection;
mod gpt_selection;
mod llm_selection;
mod perturbation;
mod random;
mod scsi;
mod single;


use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use hyperforge_core::{mix_seed, Env, Problem};

pub use gpt_deep_selection::{GptDeepSelectionHyperHeuristic, OTHER_CATEGORY};
pub use gpt_selection::{GptSelectionHyperHeuristic, SelectionSettings};
pub use llm_selection::LlmSelectionHyperHeuristic;
pub use perturbation::PerturbationHyperHeuristic;
pub use random::RandomHyperHeuristic;
pub use scsi::SingleConstructiveSingleImproveHyperHeuristic;
pub use single::SingleHyperHeuristic;

/// Default multiple of `construction_steps` used as a step budget.
pub const DEFAULT_ITERATIONS_SCALE_FACTOR: f64 = 2.0;

/// A policy driving an environment to a solution.
///
/// Policies keep no per-environment state and can be reused across runs.
pub trait HyperHeuristic<P: Problem>: Send {
    /// Runs the policy on `env`.
    ///
    /// Returns true iff the environment ends with a complete and valid
    /// solution. `max_steps` caps heuristic invocations; each policy has its
    /// own default when absent.
    fn run(&mut self, env: &mut Env<P>, max_steps: Option<usize>) -> bool;

    /// Returns the name of this policy.
    fn name(&self) -> &'static str;
}

impl<P: Problem> HyperHeuristic<P> for Box<dyn HyperHeuristic<P>> {
    fn run(&mut self, env: &mut Env<P>, max_steps: Option<usize>) -> bool {
        (**self).run(env, max_steps)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

/// `construction_steps * scale`, rounded up.
pub fn step_budget<P: Problem>(env: &Env<P>, scale: f64) -> usize {
    (env.construction_steps() as f64 * scale).ceil().max(0.0) as usize
}

/// Stream index of the environment seed derived from a policy seed.
const HEURISTIC_STREAM: u64 = 0x4845_5552;

/// Hands a seeded policy's randomness down to the heuristics it runs.
pub(crate) fn reseed_env<P: Problem>(env: &mut Env<P>, seed: Option<u64>) {
    if let Some(seed) = seed {
        env.reseed(mix_seed(seed, HEURISTIC_STREAM));
    }
}

pub(crate) fn seeded_rng(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_os_rng(),
    }
}

pub(crate) fn log_run_start<P: Problem>(policy: &str, env: &Env<P>, max_steps: usize) {
    debug!(
        event = "run_start",
        policy = policy,
        problem = P::NAME,
        instance = env.instance_name(),
        max_steps = max_steps,
    );
}

/// Logs the end of a run and reports whether it succeeded.
pub(crate) fn finish<P: Problem>(policy: &str, env: &Env<P>) -> bool {
    let complete = env.is_complete_solution();
    let valid = env.is_valid_solution();
    debug!(
        event = "run_end",
        policy = policy,
        steps = env.step_count(),
        duration_ms = env.elapsed().as_millis() as u64,
        complete = complete,
        valid = valid,
        key_item = env.key_item(),
        key_value = env.key_value(),
    );
    complete && valid
}
