//! Main heuristic with random perturbation steps.

use std::fmt;
use std::sync::Arc;

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use tracing::trace;

use hyperforge_core::{Env, Heuristic, Parameters, Problem};

use super::{finish, log_run_start, reseed_env, seeded_rng, step_budget, HyperHeuristic, DEFAULT_ITERATIONS_SCALE_FACTOR};

/// Picks the perturbation heuristic with probability `perturbation_ratio`
/// at every step, the main heuristic otherwise.
///
/// A uniform `u` in `[0, 1)` is drawn per step and the perturbation runs iff
/// `u < perturbation_ratio`, so a ratio of 1.0 always perturbs and 0.0 never
/// does.
pub struct PerturbationHyperHeuristic<P: Problem> {
    main: Arc<dyn Heuristic<P>>,
    perturbation: Arc<dyn Heuristic<P>>,
    perturbation_ratio: f64,
    iterations_scale_factor: f64,
    seed: Option<u64>,
    rng: ChaCha8Rng,
}

impl<P: Problem> PerturbationHyperHeuristic<P> {
    pub fn new(
        main: Arc<dyn Heuristic<P>>,
        perturbation: Arc<dyn Heuristic<P>>,
        perturbation_ratio: f64,
    ) -> Self {
        Self {
            main,
            perturbation,
            perturbation_ratio,
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
}

impl<P: Problem> HyperHeuristic<P> for PerturbationHyperHeuristic<P> {
    fn run(&mut self, env: &mut Env<P>, max_steps: Option<usize>) -> bool {
        let max_steps = max_steps.unwrap_or_else(|| step_budget(env, self.iterations_scale_factor));
        log_run_start(self.name(), env, max_steps);
        reseed_env(env, self.seed);
        let params = Parameters::new();

        let mut steps = 0;
        while steps < max_steps && env.continue_run() {
            let u: f64 = self.rng.random();
            let perturb = u < self.perturbation_ratio;
            let heuristic = if perturb { &self.perturbation } else { &self.main };
            let outcome = env.run_heuristic(heuristic.as_ref(), &params);
            trace!(
                event = "decision",
                step = steps,
                heuristic = heuristic.name(),
                perturbation = perturb,
                applied = outcome.is_applied(),
            );
            steps += 1;
        }
        finish(self.name(), env)
    }

    fn name(&self) -> &'static str {
        "perturbation"
    }
}

impl<P: Problem> fmt::Debug for PerturbationHyperHeuristic<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PerturbationHyperHeuristic")
            .field("main", &self.main.name())
            .field("perturbation", &self.perturbation.name())
            .field("perturbation_ratio", &self.perturbation_ratio)
            .finish()
    }
}
