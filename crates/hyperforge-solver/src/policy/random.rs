//! Uniformly random heuristic selection.

use std::fmt;

use rand_chacha::ChaCha8Rng;
use tracing::trace;

use hyperforge_core::{Env, HeuristicPool, Parameters, Problem};

use super::{finish, log_run_start, reseed_env, seeded_rng, step_budget, HyperHeuristic, DEFAULT_ITERATIONS_SCALE_FACTOR};

/// Runs a uniformly sampled heuristic at every step.
///
/// Makes exactly `max_steps` invocations, counting declined and failed
/// calls; it never stops early. The default budget is
/// `construction_steps * iterations_scale_factor`.
pub struct RandomHyperHeuristic<P: Problem> {
    pool: HeuristicPool<P>,
    iterations_scale_factor: f64,
    seed: Option<u64>,
    rng: ChaCha8Rng,
}

impl<P: Problem> RandomHyperHeuristic<P> {
    pub fn new(pool: HeuristicPool<P>) -> Self {
        Self {
            pool,
            iterations_scale_factor: DEFAULT_ITERATIONS_SCALE_FACTOR,
            seed: None,
            rng: seeded_rng(None),
        }
    }

    /// Seeds the heuristic choice and, through the environment, the
    /// heuristics themselves.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self.rng = seeded_rng(Some(seed));
        self
    }

    pub fn with_iterations_scale_factor(mut self, factor: f64) -> Self {
        self.iterations_scale_factor = factor;
        self
    }

    pub fn pool(&self) -> &HeuristicPool<P> {
        &self.pool
    }
}

impl<P: Problem> HyperHeuristic<P> for RandomHyperHeuristic<P> {
    fn run(&mut self, env: &mut Env<P>, max_steps: Option<usize>) -> bool {
        let max_steps = max_steps.unwrap_or_else(|| step_budget(env, self.iterations_scale_factor));
        log_run_start(self.name(), env, max_steps);
        reseed_env(env, self.seed);

        let params = Parameters::new();
        for step in 0..max_steps {
            let Some(heuristic) = self.pool.choose(&mut self.rng) else {
                break;
            };
            let outcome = env.run_heuristic(heuristic.as_ref(), &params);
            trace!(
                event = "decision",
                step = step,
                heuristic = heuristic.name(),
                applied = outcome.is_applied(),
            );
        }
        finish(self.name(), env)
    }

    fn name(&self) -> &'static str {
        "random"
    }
}

impl<P: Problem> fmt::Debug for RandomHyperHeuristic<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RandomHyperHeuristic")
            .field("pool", &self.pool)
            .field("iterations_scale_factor", &self.iterations_scale_factor)
            .finish()
    }
}
