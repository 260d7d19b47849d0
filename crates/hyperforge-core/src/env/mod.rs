//! The environment engine.
//!
//! [`Env`] holds one run over one problem instance: the current solution,
//! its state data, the running heuristic's algorithm data and the trajectory.
//! It only moves forward through [`Env::run_heuristic`] and
//! [`Env::run_operator`]; [`Env::reset`] returns it to the empty solution.

mod artifact;
mod outcome;
mod snapshot;

#[cfg(test)]
mod tests;

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::error::{EnvError, HeuristicFailure, Result};
use crate::heuristic::{AlgorithmData, Heuristic, HeuristicContext, Parameters, Proposal};
use crate::problem::{LoadProblem, Operator, Problem};
use crate::trajectory::{Trajectory, TrajectoryEntry};

pub use artifact::RunSummary;
pub use outcome::StepOutcome;
pub use snapshot::{EnvSnapshot, SnapshotOf};

/// Trajectory name used when an operator is applied directly.
pub const DEFAULT_OPERATOR_NAME: &str = "operator";

/// Environment behaviour switches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvOptions {
    /// Root directory for result artifacts.
    pub output_root: PathBuf,

    /// Reject operators whose result fails `validation_solution`.
    pub validate_operators: bool,

    /// Seed of the random stream handed to heuristics; drawn from the OS
    /// when absent.
    pub seed: Option<u64>,
}

impl Default for EnvOptions {
    fn default() -> Self {
        Self {
            output_root: PathBuf::from("output"),
            validate_operators: false,
            seed: None,
        }
    }
}

impl EnvOptions {
    pub fn with_output_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.output_root = root.into();
        self
    }

    pub fn with_validate_operators(mut self, validate: bool) -> Self {
        self.validate_operators = validate;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// Derives an independent seed for stream `index` (splitmix64 finaliser).
pub fn mix_seed(seed: u64, index: u64) -> u64 {
    let mut z = seed.wrapping_add(index.wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15));
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// One run over one problem instance.
pub struct Env<P: Problem> {
    problem: Arc<P>,
    instance_name: String,
    options: EnvOptions,
    current_solution: P::Solution,
    state_data: P::State,
    algorithm_data: AlgorithmData,
    trajectory: Trajectory<P::Operator>,
    step_count: usize,
    started: Instant,
    continue_run: bool,
    output_dir: Option<PathBuf>,
    seed: u64,
    rng: ChaCha8Rng,
}

impl<P: Problem> Env<P> {
    /// Creates an environment positioned at the initial solution.
    pub fn new(problem: P, instance_name: impl Into<String>, options: EnvOptions) -> Result<Self> {
        Self::from_shared(Arc::new(problem), instance_name, options)
    }

    /// Creates an environment over instance data shared with other forks.
    pub fn from_shared(
        problem: Arc<P>,
        instance_name: impl Into<String>,
        options: EnvOptions,
    ) -> Result<Self> {
        let current_solution = problem.init_solution();
        let state_data = problem
            .state_data(&current_solution)
            .ok_or(EnvError::UnreachableInitialState { problem: P::NAME })?;
        let seed = options.seed.unwrap_or_else(|| rand::rng().random());
        Ok(Self {
            problem,
            instance_name: instance_name.into(),
            options,
            current_solution,
            state_data,
            algorithm_data: AlgorithmData::new(),
            trajectory: Trajectory::new(),
            step_count: 0,
            started: Instant::now(),
            continue_run: true,
            output_dir: None,
            seed,
            rng: ChaCha8Rng::seed_from_u64(seed),
        })
    }

    /// Returns the environment to the initial solution and restarts the
    /// heuristic random stream from its seed.
    ///
    /// With a `run_label` the output directory becomes
    /// `<output_root>/<problem>/<instance>/<label>`. It is created lazily by
    /// [`dump_result`](Self::dump_result).
    pub fn reset(&mut self, run_label: Option<&str>) {
        self.current_solution = self.problem.init_solution();
        if let Some(state) = self.problem.state_data(&self.current_solution) {
            self.state_data = state;
        }
        self.algorithm_data.clear();
        self.trajectory.clear();
        self.step_count = 0;
        self.started = Instant::now();
        self.continue_run = true;
        self.rng = ChaCha8Rng::seed_from_u64(self.seed);
        if let Some(label) = run_label {
            self.output_dir = Some(self.run_dir(label));
        }
    }

    /// Restarts the heuristic random stream from `seed`.
    pub fn reseed(&mut self, seed: u64) {
        self.seed = seed;
        self.rng = ChaCha8Rng::seed_from_u64(seed);
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    fn run_dir(&self, label: &str) -> PathBuf {
        self.options
            .output_root
            .join(P::NAME)
            .join(&self.instance_name)
            .join(label)
    }

    /// Runs one heuristic call and applies the operator it proposes.
    ///
    /// Never propagates errors or panics raised by the heuristic: they are
    /// reported as [`StepOutcome::Failed`] with the environment untouched
    /// and `continue_run` left set. A [`StepOutcome::Declined`] clears it.
    pub fn run_heuristic<H>(&mut self, heuristic: &H, parameters: &Parameters) -> StepOutcome<P::Operator>
    where
        H: Heuristic<P> + ?Sized,
    {
        let name = heuristic.name().to_string();
        let proposal = {
            let ctx = HeuristicContext::new(
                self.problem.as_ref(),
                &self.current_solution,
                &self.state_data,
                &self.algorithm_data,
                &mut self.rng,
            );
            panic::catch_unwind(AssertUnwindSafe(|| heuristic.propose(&ctx, parameters)))
        };

        let outcome = match proposal {
            Err(payload) => self.failure(name, panic_message(payload.as_ref())),
            Ok(Err(e)) => self.failure(name, e.to_string()),
            Ok(Ok(Proposal { operator: None, .. })) => {
                trace!(event = "declined", heuristic = %name, step = self.step_count);
                StepOutcome::Declined
            }
            Ok(Ok(Proposal {
                operator: Some(operator),
                delta,
            })) => match self.run_operator(operator.clone(), Some(&name)) {
                Ok(()) => {
                    self.algorithm_data.extend(delta);
                    StepOutcome::Applied(operator)
                }
                Err(e) => self.failure(name, e.to_string()),
            },
        };
        // A failed call is a no-op; only a decline ends the current run.
        self.continue_run = !matches!(outcome, StepOutcome::Declined);
        outcome
    }

    fn failure(&self, heuristic: String, message: String) -> StepOutcome<P::Operator> {
        warn!(
            event = "heuristic_failed",
            heuristic = %heuristic,
            step = self.step_count,
            error = %message,
        );
        StepOutcome::Failed(HeuristicFailure { heuristic, message })
    }

    /// Applies `operator` to the current solution.
    ///
    /// The candidate is rejected, leaving the environment unchanged, when it
    /// has no state data or, with `validate_operators` set, when it is
    /// infeasible.
    pub fn run_operator(&mut self, operator: P::Operator, heuristic_name: Option<&str>) -> Result<()> {
        let candidate = panic::catch_unwind(AssertUnwindSafe(|| operator.apply(&self.current_solution)))
            .map_err(|payload| EnvError::OperatorPanicked {
                operator: operator.to_string(),
                message: panic_message(payload.as_ref()),
            })?;

        if self.options.validate_operators && !self.problem.validation_solution(&candidate) {
            return Err(EnvError::InfeasibleOperator {
                operator: operator.to_string(),
            });
        }
        let state = self
            .problem
            .state_data(&candidate)
            .ok_or_else(|| EnvError::UnreachableState {
                operator: operator.to_string(),
            })?;

        let heuristic = heuristic_name.unwrap_or(DEFAULT_OPERATOR_NAME);
        trace!(
            event = "step",
            step = self.step_count,
            heuristic = heuristic,
            operator = %operator,
        );
        self.trajectory.record(heuristic, operator, candidate.to_string());
        self.current_solution = candidate;
        self.state_data = state;
        self.step_count += 1;
        Ok(())
    }

    /// Re-applies recorded operators in order.
    pub fn replay(&mut self, entries: &[TrajectoryEntry<P::Operator>]) -> Result<()> {
        for entry in entries {
            self.run_operator(entry.operator.clone(), Some(&entry.heuristic))?;
        }
        debug!(event = "replay", steps = entries.len(), key_value = self.key_value());
        Ok(())
    }

    pub fn is_complete_solution(&self) -> bool {
        self.problem.is_complete(&self.state_data)
    }

    pub fn is_valid_solution(&self) -> bool {
        self.problem.validation_solution(&self.current_solution)
    }

    /// Validates an arbitrary solution against this instance.
    pub fn validation_solution(&self, solution: &P::Solution) -> bool {
        self.problem.validation_solution(solution)
    }

    pub fn key_item(&self) -> &'static str {
        self.problem.key_item()
    }

    pub fn key_value(&self) -> f64 {
        self.problem.key_value(&self.state_data)
    }

    /// Signed improvement of key value `a` over `b`; positive means `a` is better.
    pub fn compare(&self, a: f64, b: f64) -> f64 {
        self.problem.direction().compare(a, b)
    }

    /// State data of a hypothetical solution. Pure.
    pub fn get_state_data(&self, solution: &P::Solution) -> Option<P::State> {
        self.problem.state_data(solution)
    }

    pub fn problem(&self) -> &Arc<P> {
        &self.problem
    }

    pub fn instance_name(&self) -> &str {
        &self.instance_name
    }

    pub fn options(&self) -> &EnvOptions {
        &self.options
    }

    pub fn current_solution(&self) -> &P::Solution {
        &self.current_solution
    }

    pub fn state_data(&self) -> &P::State {
        &self.state_data
    }

    pub fn algorithm_data(&self) -> &AlgorithmData {
        &self.algorithm_data
    }

    pub fn trajectory(&self) -> &Trajectory<P::Operator> {
        &self.trajectory
    }

    pub fn construction_steps(&self) -> usize {
        self.problem.construction_steps()
    }

    pub fn step_count(&self) -> usize {
        self.step_count
    }

    pub fn continue_run(&self) -> bool {
        self.continue_run
    }

    /// Wall-clock time since the last reset.
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn output_dir(&self) -> Option<&Path> {
        self.output_dir.as_deref()
    }
}

impl<P: LoadProblem> Env<P> {
    /// Loads instance data from `path`; the file stem names the instance.
    pub fn load(path: impl AsRef<Path>, options: EnvOptions) -> Result<Self> {
        let path = path.as_ref();
        let problem = P::load_data(path)?;
        let instance_name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "instance".to_string());
        Self::new(problem, instance_name, options)
    }
}

impl<P: Problem> Clone for Env<P> {
    fn clone(&self) -> Self {
        Self {
            problem: Arc::clone(&self.problem),
            instance_name: self.instance_name.clone(),
            options: self.options.clone(),
            current_solution: self.current_solution.clone(),
            state_data: self.state_data.clone(),
            algorithm_data: self.algorithm_data.clone(),
            trajectory: self.trajectory.clone(),
            step_count: self.step_count,
            started: self.started,
            continue_run: self.continue_run,
            output_dir: self.output_dir.clone(),
            seed: self.seed,
            rng: self.rng.clone(),
        }
    }
}

impl<P: Problem> fmt::Debug for Env<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Env")
            .field("problem", &P::NAME)
            .field("instance", &self.instance_name)
            .field("current_solution", &self.current_solution)
            .field("step_count", &self.step_count)
            .field("continue_run", &self.continue_run)
            .finish()
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic with non-string payload".to_string()
    }
}
