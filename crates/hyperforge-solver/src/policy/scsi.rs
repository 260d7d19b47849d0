//! Single constructive heuristic followed by a single improvement heuristic.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use hyperforge_core::{Env, Heuristic, Parameters, Problem};

use super::{finish, log_run_start, step_budget, HyperHeuristic, DEFAULT_ITERATIONS_SCALE_FACTOR};

/// Runs the constructive heuristic to exhaustion, then the improvement
/// heuristic for `max_steps - construction_steps` steps or until it stops
/// applying operators.
pub struct SingleConstructiveSingleImproveHyperHeuristic<P: Problem> {
    constructive: Arc<dyn Heuristic<P>>,
    improve: Arc<dyn Heuristic<P>>,
    iterations_scale_factor: f64,
}

impl<P: Problem> SingleConstructiveSingleImproveHyperHeuristic<P> {
    pub fn new(constructive: Arc<dyn Heuristic<P>>, improve: Arc<dyn Heuristic<P>>) -> Self {
        Self {
            constructive,
            improve,
            iterations_scale_factor: DEFAULT_ITERATIONS_SCALE_FACTOR,
        }
    }

    pub fn with_iterations_scale_factor(mut self, factor: f64) -> Self {
        self.iterations_scale_factor = factor;
        self
    }
}

impl<P: Problem> HyperHeuristic<P> for SingleConstructiveSingleImproveHyperHeuristic<P> {
    fn run(&mut self, env: &mut Env<P>, max_steps: Option<usize>) -> bool {
        let max_steps = max_steps.unwrap_or_else(|| step_budget(env, self.iterations_scale_factor));
        log_run_start(self.name(), env, max_steps);
        let params = Parameters::new();

        let mut calls = 0;
        while calls < max_steps {
            env.run_heuristic(self.constructive.as_ref(), &params);
            calls += 1;
            if !env.continue_run() {
                break;
            }
        }
        debug!(
            event = "construction_end",
            heuristic = self.constructive.name(),
            steps = env.step_count(),
            key_value = env.key_value(),
        );

        let improve_steps = max_steps.saturating_sub(env.construction_steps());
        for _ in 0..improve_steps {
            env.run_heuristic(self.improve.as_ref(), &params);
            if !env.continue_run() {
                break;
            }
        }
        finish(self.name(), env)
    }

    fn name(&self) -> &'static str {
        "single_constructive_single_improve"
    }
}

impl<P: Problem> fmt::Debug for SingleConstructiveSingleImproveHyperHeuristic<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SingleConstructiveSingleImproveHyperHeuristic")
            .field("constructive", &self.constructive.name())
            .field("improve", &self.improve.name())
            .finish()
    }
}
