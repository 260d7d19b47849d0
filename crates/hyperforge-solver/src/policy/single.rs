//! One heuristic under a wall-clock budget.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::info;

use hyperforge_core::{Env, Heuristic, Parameters, Problem};

use super::{finish, log_run_start, HyperHeuristic};

/// Applies a single heuristic until it declines; failed calls are retried.
///
/// Returns false as soon as elapsed time exceeds
/// `time_limitation * construction_steps` seconds, or once `max_steps`
/// invocations were made.
pub struct SingleHyperHeuristic<P: Problem> {
    heuristic: Arc<dyn Heuristic<P>>,
    time_limitation: f64,
    parameters: Parameters,
}

impl<P: Problem> SingleHyperHeuristic<P> {
    pub fn new(heuristic: Arc<dyn Heuristic<P>>) -> Self {
        Self {
            heuristic,
            time_limitation: 10.0,
            parameters: Parameters::new(),
        }
    }

    /// Seconds allowed per construction step.
    pub fn with_time_limitation(mut self, seconds: f64) -> Self {
        self.time_limitation = seconds;
        self
    }

    pub fn with_parameters(mut self, parameters: Parameters) -> Self {
        self.parameters = parameters;
        self
    }

    fn budget(&self, env: &Env<P>) -> Duration {
        let seconds = self.time_limitation * env.construction_steps() as f64;
        Duration::try_from_secs_f64(seconds).unwrap_or(Duration::MAX)
    }
}

impl<P: Problem> HyperHeuristic<P> for SingleHyperHeuristic<P> {
    fn run(&mut self, env: &mut Env<P>, max_steps: Option<usize>) -> bool {
        let budget = self.budget(env);
        let started = Instant::now();
        log_run_start(self.name(), env, max_steps.unwrap_or(usize::MAX));

        let mut calls = 0usize;
        loop {
            if started.elapsed() > budget {
                info!(
                    event = "budget_exhausted",
                    policy = self.name(),
                    heuristic = self.heuristic.name(),
                    budget_ms = budget.as_millis() as u64,
                    steps = env.step_count(),
                );
                return false;
            }
            if max_steps.is_some_and(|max| calls >= max) {
                return false;
            }
            env.run_heuristic(self.heuristic.as_ref(), &self.parameters);
            calls += 1;
            if !env.continue_run() {
                break;
            }
        }
        finish(self.name(), env)
    }

    fn name(&self) -> &'static str {
        "single"
    }
}

impl<P: Problem> fmt::Debug for SingleHyperHeuristic<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SingleHyperHeuristic")
            .field("heuristic", &self.heuristic.name())
            .field("time_limitation", &self.time_limitation)
            .finish()
    }
}
