//! Problem registry and run driver.
//!
//! Maps problem names to their loader and default heuristic pool, builds the
//! configured policy and runs it on one instance.

#[cfg(test)]
mod tests;

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use hyperforge_config::{ConfigError, HyperHeuristicConfig, RunConfig};
use hyperforge_core::{Env, EnvError, Heuristic, HeuristicPool, LoadProblem, Problem, RunSummary};
use hyperforge_problems::{MkpProblem, TspProblem};
use hyperforge_solver::{
    GptDeepSelectionHyperHeuristic, GptSelectionHyperHeuristic, HyperHeuristic, LlmClient,
    LlmSelectionHyperHeuristic, PerturbationHyperHeuristic, RandomHyperHeuristic,
    SelectionSettings, SingleConstructiveSingleImproveHyperHeuristic, SingleHyperHeuristic,
};

/// Errors surfaced by the driver.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("unknown problem `{name}` (available: {available})")]
    UnknownProblem { name: String, available: String },

    #[error("problem `{problem}` has no heuristic named `{name}`")]
    UnknownHeuristic { problem: &'static str, name: String },

    #[error("policy `{policy}` needs an LLM client")]
    MissingLlmClient { policy: &'static str },

    #[error(transparent)]
    Env(#[from] EnvError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// One problem type, with its concrete types erased.
pub trait ProblemModule: Send + Sync {
    fn name(&self) -> &'static str;

    /// Names of the default heuristics, in pool order.
    fn heuristic_names(&self) -> Vec<String>;

    /// Loads `data_path`, runs the configured policy and dumps the result.
    fn run(
        &self,
        data_path: &Path,
        config: &RunConfig,
        label: Option<&str>,
        llm: Option<Arc<dyn LlmClient>>,
    ) -> Result<RunSummary, DriverError>;
}

/// [`ProblemModule`] for a loadable problem and its heuristic pool.
pub struct Module<P: LoadProblem> {
    pool: HeuristicPool<P>,
}

impl<P: LoadProblem> Module<P> {
    pub fn new(pool: HeuristicPool<P>) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &HeuristicPool<P> {
        &self.pool
    }
}

impl<P: LoadProblem> ProblemModule for Module<P> {
    fn name(&self) -> &'static str {
        P::NAME
    }

    fn heuristic_names(&self) -> Vec<String> {
        self.pool.names().into_iter().map(str::to_string).collect()
    }

    fn run(
        &self,
        data_path: &Path,
        config: &RunConfig,
        label: Option<&str>,
        llm: Option<Arc<dyn LlmClient>>,
    ) -> Result<RunSummary, DriverError> {
        let mut env = Env::<P>::load(data_path, config.env_options())?;
        env.reset(label);
        let mut policy = build_hyper_heuristic(&self.pool, config, llm)?;

        info!(
            event = "launch",
            problem = P::NAME,
            instance = env.instance_name(),
            policy = policy.name(),
        );
        let success = policy.run(&mut env, max_steps(&config.hyper_heuristic));

        let path = env.dump_result(
            config.environment.dump_trajectory,
            &config.environment.result_file,
        )?;
        let mut summary = env.summary();
        summary.result_file = Some(path);
        info!(
            event = "finished",
            problem = P::NAME,
            instance = env.instance_name(),
            success = success,
            steps = summary.steps,
            key_item = env.key_item(),
            key_value = summary.key_value,
        );
        Ok(summary)
    }
}

impl<P: LoadProblem> fmt::Debug for Module<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Module")
            .field("problem", &P::NAME)
            .field("heuristics", &self.pool.names())
            .finish()
    }
}

/// Problem modules by name.
#[derive(Default)]
pub struct ProblemRegistry {
    modules: BTreeMap<&'static str, Box<dyn ProblemModule>>,
}

impl ProblemRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the bundled TSP and MKP modules.
    pub fn builtin() -> Self {
        Self::new()
            .with(Module::new(TspProblem::heuristic_pool()))
            .with(Module::new(MkpProblem::heuristic_pool()))
    }

    pub fn with(mut self, module: impl ProblemModule + 'static) -> Self {
        self.register(module);
        self
    }

    /// Adds `module`, replacing any module registered under the same name.
    pub fn register(&mut self, module: impl ProblemModule + 'static) {
        self.modules.insert(module.name(), Box::new(module));
    }

    pub fn get(&self, name: &str) -> Option<&dyn ProblemModule> {
        self.modules.get(name).map(|m| m.as_ref())
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&'static str> {
        self.modules.keys().copied().collect()
    }

    /// Runs the module registered as `name` on the instance at `data_path`.
    pub fn run(
        &self,
        name: &str,
        data_path: impl AsRef<Path>,
        config: &RunConfig,
        label: Option<&str>,
        llm: Option<Arc<dyn LlmClient>>,
    ) -> Result<RunSummary, DriverError> {
        let module = self.get(name).ok_or_else(|| DriverError::UnknownProblem {
            name: name.to_string(),
            available: self.names().join(", "),
        })?;
        module.run(data_path.as_ref(), config, label, llm)
    }
}

impl fmt::Debug for ProblemRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProblemRegistry")
            .field("modules", &self.names())
            .finish()
    }
}

/// Builds the policy described by `config.hyper_heuristic` over `pool`.
///
/// `config.random_seed` seeds the random policies and, unless the rollout
/// section sets its own seed, the rollout engine.
pub fn build_hyper_heuristic<P: Problem>(
    pool: &HeuristicPool<P>,
    config: &RunConfig,
    llm: Option<Arc<dyn LlmClient>>,
) -> Result<Box<dyn HyperHeuristic<P>>, DriverError> {
    let seed = config.random_seed;
    let policy: Box<dyn HyperHeuristic<P>> = match &config.hyper_heuristic {
        HyperHeuristicConfig::Random(c) => {
            let mut policy = RandomHyperHeuristic::new(restrict(pool, c.heuristics.as_deref())?)
                .with_iterations_scale_factor(c.iterations_scale_factor);
            if let Some(seed) = seed {
                policy = policy.with_seed(seed);
            }
            Box::new(policy)
        }
        HyperHeuristicConfig::Single(c) => Box::new(
            SingleHyperHeuristic::new(lookup(pool, &c.heuristic)?)
                .with_time_limitation(c.time_limitation),
        ),
        HyperHeuristicConfig::SingleConstructiveSingleImprove(c) => Box::new(
            SingleConstructiveSingleImproveHyperHeuristic::new(
                lookup(pool, &c.constructive_heuristic)?,
                lookup(pool, &c.improve_heuristic)?,
            )
            .with_iterations_scale_factor(c.iterations_scale_factor),
        ),
        HyperHeuristicConfig::Perturbation(c) => {
            let mut policy = PerturbationHyperHeuristic::new(
                lookup(pool, &c.main_heuristic)?,
                lookup(pool, &c.perturbation_heuristic)?,
                c.perturbation_ratio,
            )
            .with_iterations_scale_factor(c.iterations_scale_factor);
            if let Some(seed) = seed {
                policy = policy.with_seed(seed);
            }
            Box::new(policy)
        }
        HyperHeuristicConfig::GptSelection(c) => Box::new(
            GptSelectionHyperHeuristic::new(
                restrict(pool, c.heuristics.as_deref())?,
                require_llm(&config.hyper_heuristic, llm)?,
            )
            .with_settings(SelectionSettings::from_config(&config.llm, c)),
        ),
        HyperHeuristicConfig::GptDeepSelection(c) => Box::new(
            GptDeepSelectionHyperHeuristic::new(
                restrict(pool, c.heuristics.as_deref())?,
                require_llm(&config.hyper_heuristic, llm)?,
            )
            .with_settings(SelectionSettings::from_config(&config.llm, c)),
        ),
        HyperHeuristicConfig::LlmSelection(c) => {
            let mut rollout = config.rollout.clone();
            if rollout.seed.is_none() {
                rollout.seed = seed;
            }
            Box::new(
                LlmSelectionHyperHeuristic::new(
                    restrict(pool, c.heuristics.as_deref())?,
                    require_llm(&config.hyper_heuristic, llm)?,
                )
                .with_settings(SelectionSettings::from_config(&config.llm, c))
                .with_rollout(rollout),
            )
        }
    };
    Ok(policy)
}

/// Explicit step cap of the configured policy, if any.
fn max_steps(config: &HyperHeuristicConfig) -> Option<usize> {
    match config {
        HyperHeuristicConfig::Random(c) => c.max_steps,
        HyperHeuristicConfig::Single(c) => c.max_steps,
        HyperHeuristicConfig::SingleConstructiveSingleImprove(c) => c.max_steps,
        HyperHeuristicConfig::Perturbation(c) => c.max_steps,
        HyperHeuristicConfig::GptSelection(c)
        | HyperHeuristicConfig::GptDeepSelection(c)
        | HyperHeuristicConfig::LlmSelection(c) => c.max_steps,
    }
}

fn lookup<P: Problem>(pool: &HeuristicPool<P>, name: &str) -> Result<Arc<dyn Heuristic<P>>, DriverError> {
    pool.get(name)
        .cloned()
        .ok_or_else(|| DriverError::UnknownHeuristic {
            problem: P::NAME,
            name: name.to_string(),
        })
}

fn restrict<P: Problem>(
    pool: &HeuristicPool<P>,
    names: Option<&[String]>,
) -> Result<HeuristicPool<P>, DriverError> {
    match names {
        Some(names) => pool.subset(names).map_err(|name| DriverError::UnknownHeuristic {
            problem: P::NAME,
            name,
        }),
        None => Ok(pool.clone()),
    }
}

fn require_llm(
    config: &HyperHeuristicConfig,
    llm: Option<Arc<dyn LlmClient>>,
) -> Result<Arc<dyn LlmClient>, DriverError> {
    llm.ok_or(DriverError::MissingLlmClient {
        policy: config.name(),
    })
}
