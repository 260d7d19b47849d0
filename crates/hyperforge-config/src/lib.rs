//! Configuration system for HyperForge.
//!
//! Load run configuration from TOML or YAML files to choose the
//! hyper-heuristic, its budget, and the rollout engine settings without
//! code changes.
//!
//! # Examples
//!
//! ```
//! use hyperforge_config::{HyperHeuristicConfig, RunConfig};
//!
//! let config = RunConfig::from_toml_str(r#"
//!     random_seed = 7
//!
//!     [hyper_heuristic]
//!     type = "perturbation"
//!     main_heuristic = "two_opt"
//!     perturbation_heuristic = "random_swap"
//!     perturbation_ratio = 0.2
//!
//!     [rollout]
//!     search_time = 20
//! "#).unwrap();
//!
//! assert_eq!(config.random_seed, Some(7));
//! assert!(matches!(config.hyper_heuristic, HyperHeuristicConfig::Perturbation(_)));
//! assert_eq!(config.rollout.search_time, 20);
//! ```
//!
//! Use the default config when the file is missing:
//!
//! ```
//! use hyperforge_config::RunConfig;
//!
//! let config = RunConfig::load("run.toml").unwrap_or_default();
//! ```

use std::path::{Path, PathBuf};

use hyperforge_core::EnvOptions;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[cfg(test)]
mod tests;

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Main run configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct RunConfig {
    /// Random seed for reproducible runs.
    #[serde(default)]
    pub random_seed: Option<u64>,

    #[serde(default)]
    pub environment: EnvironmentConfig,

    /// Policy driving heuristic selection.
    #[serde(default)]
    pub hyper_heuristic: HyperHeuristicConfig,

    /// Monte-Carlo rollout settings used by candidate comparison.
    #[serde(default)]
    pub rollout: RolloutConfig,

    #[serde(default)]
    pub llm: LlmConfig,
}

impl RunConfig {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a file.
    ///
    /// `.yaml` and `.yml` files are read as YAML, everything else as TOML.
    ///
    /// # Errors
    ///
    /// Returns error if the file doesn't exist, doesn't parse, or fails
    /// [`validate`](Self::validate).
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml_file(path),
            _ => Self::from_toml_file(path),
        }
    }

    /// Loads configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    /// Parses configuration from a YAML string.
    pub fn from_yaml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks value ranges that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.hyper_heuristic.validate()?;
        if self.rollout.search_time == 0 {
            return Err(ConfigError::Invalid(
                "rollout.search_time must be at least 1".to_string(),
            ));
        }
        if self.llm.max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "llm.max_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Sets the random seed.
    pub fn with_random_seed(mut self, seed: u64) -> Self {
        self.random_seed = Some(seed);
        self
    }

    /// Sets the hyper-heuristic policy.
    pub fn with_hyper_heuristic(mut self, hyper_heuristic: HyperHeuristicConfig) -> Self {
        self.hyper_heuristic = hyper_heuristic;
        self
    }

    /// Sets the root directory for result artifacts.
    pub fn with_output_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.environment.output_root = root.into();
        self
    }

    /// Sets the rollout configuration.
    pub fn with_rollout(mut self, rollout: RolloutConfig) -> Self {
        self.rollout = rollout;
        self
    }

    /// Options for environments built from this configuration.
    ///
    /// `random_seed`, when set, seeds the heuristics' random stream.
    pub fn env_options(&self) -> EnvOptions {
        let options = EnvOptions::default()
            .with_output_root(self.environment.output_root.clone())
            .with_validate_operators(self.environment.validate_operators);
        match self.random_seed {
            Some(seed) => options.with_seed(seed),
            None => options,
        }
    }
}

/// Environment and artifact settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "snake_case")]
pub struct EnvironmentConfig {
    /// Root directory for result artifacts.
    pub output_root: PathBuf,

    /// Reject infeasible operators instead of applying them.
    pub validate_operators: bool,

    /// Write the trajectory table into the result artifact.
    pub dump_trajectory: bool,

    /// File name of the result artifact.
    pub result_file: String,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            output_root: PathBuf::from("output"),
            validate_operators: false,
            dump_trajectory: true,
            result_file: "result.txt".to_string(),
        }
    }
}

/// Hyper-heuristic policy configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HyperHeuristicConfig {
    /// Uniformly random heuristic per step.
    Random(RandomConfig),

    /// One heuristic until it stops proposing.
    Single(SingleConfig),

    /// One constructive heuristic, then one improvement heuristic.
    #[serde(alias = "scsi")]
    SingleConstructiveSingleImprove(ScsiConfig),

    /// Main heuristic with random perturbation steps.
    Perturbation(PerturbationConfig),

    /// LLM picks heuristic and running steps.
    GptSelection(SelectionConfig),

    /// LLM picks a heuristic category, then a heuristic in it.
    GptDeepSelection(SelectionConfig),

    /// LLM proposes candidates, rollouts pick the best.
    LlmSelection(SelectionConfig),
}

impl Default for HyperHeuristicConfig {
    fn default() -> Self {
        HyperHeuristicConfig::Random(RandomConfig::default())
    }
}

impl HyperHeuristicConfig {
    /// Policy name as used in the `type` tag.
    pub fn name(&self) -> &'static str {
        match self {
            HyperHeuristicConfig::Random(_) => "random",
            HyperHeuristicConfig::Single(_) => "single",
            HyperHeuristicConfig::SingleConstructiveSingleImprove(_) => {
                "single_constructive_single_improve"
            }
            HyperHeuristicConfig::Perturbation(_) => "perturbation",
            HyperHeuristicConfig::GptSelection(_) => "gpt_selection",
            HyperHeuristicConfig::GptDeepSelection(_) => "gpt_deep_selection",
            HyperHeuristicConfig::LlmSelection(_) => "llm_selection",
        }
    }

    /// Returns true for the policies that need an LLM client.
    pub fn needs_llm(&self) -> bool {
        matches!(
            self,
            HyperHeuristicConfig::GptSelection(_)
                | HyperHeuristicConfig::GptDeepSelection(_)
                | HyperHeuristicConfig::LlmSelection(_)
        )
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let scale = match self {
            HyperHeuristicConfig::Random(c) => c.iterations_scale_factor,
            HyperHeuristicConfig::Single(c) => {
                if c.time_limitation <= 0.0 {
                    return Err(ConfigError::Invalid(
                        "single.time_limitation must be positive".to_string(),
                    ));
                }
                1.0
            }
            HyperHeuristicConfig::SingleConstructiveSingleImprove(c) => c.iterations_scale_factor,
            HyperHeuristicConfig::Perturbation(c) => {
                if !(0.0..=1.0).contains(&c.perturbation_ratio) {
                    return Err(ConfigError::Invalid(format!(
                        "perturbation_ratio must be within [0, 1], got {}",
                        c.perturbation_ratio
                    )));
                }
                c.iterations_scale_factor
            }
            HyperHeuristicConfig::GptSelection(c)
            | HyperHeuristicConfig::GptDeepSelection(c)
            | HyperHeuristicConfig::LlmSelection(c) => {
                if c.candidate_count == 0 {
                    return Err(ConfigError::Invalid(
                        "candidate_count must be at least 1".to_string(),
                    ));
                }
                c.iterations_scale_factor
            }
        };
        if scale < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "iterations_scale_factor must not be negative, got {scale}"
            )));
        }
        Ok(())
    }
}

/// Random hyper-heuristic configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "snake_case")]
pub struct RandomConfig {
    /// Restrict the pool to these heuristics; all when absent.
    pub heuristics: Option<Vec<String>>,

    /// Default budget is `construction_steps * iterations_scale_factor`.
    pub iterations_scale_factor: f64,

    /// Explicit step budget, overriding the scale factor.
    pub max_steps: Option<usize>,
}

impl Default for RandomConfig {
    fn default() -> Self {
        Self {
            heuristics: None,
            iterations_scale_factor: 2.0,
            max_steps: None,
        }
    }
}

/// Single hyper-heuristic configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "snake_case")]
pub struct SingleConfig {
    pub heuristic: String,

    /// Seconds allowed per construction step.
    pub time_limitation: f64,

    pub max_steps: Option<usize>,
}

impl Default for SingleConfig {
    fn default() -> Self {
        Self {
            heuristic: String::new(),
            time_limitation: 10.0,
            max_steps: None,
        }
    }
}

/// Single constructive, single improvement configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "snake_case")]
pub struct ScsiConfig {
    pub constructive_heuristic: String,
    pub improve_heuristic: String,
    pub iterations_scale_factor: f64,
    pub max_steps: Option<usize>,
}

impl Default for ScsiConfig {
    fn default() -> Self {
        Self {
            constructive_heuristic: String::new(),
            improve_heuristic: String::new(),
            iterations_scale_factor: 2.0,
            max_steps: None,
        }
    }
}

/// Perturbation hyper-heuristic configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "snake_case")]
pub struct PerturbationConfig {
    pub main_heuristic: String,
    pub perturbation_heuristic: String,

    /// Probability of running the perturbation heuristic on a step.
    pub perturbation_ratio: f64,

    pub iterations_scale_factor: f64,
    pub max_steps: Option<usize>,
}

impl Default for PerturbationConfig {
    fn default() -> Self {
        Self {
            main_heuristic: String::new(),
            perturbation_heuristic: String::new(),
            perturbation_ratio: 0.1,
            iterations_scale_factor: 2.0,
            max_steps: None,
        }
    }
}

/// Shared configuration of the LLM-driven selection policies.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "snake_case")]
pub struct SelectionConfig {
    /// Restrict the pool to these heuristics; all when absent.
    pub heuristics: Option<Vec<String>>,

    pub iterations_scale_factor: f64,
    pub max_steps: Option<usize>,

    /// Upper bound on the running steps the LLM may request per decision.
    pub max_running_steps: usize,

    /// Candidates requested per decision by `llm_selection`.
    pub candidate_count: usize,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            heuristics: None,
            iterations_scale_factor: 2.0,
            max_steps: None,
            max_running_steps: 5,
            candidate_count: 3,
        }
    }
}

/// Monte-Carlo rollout configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "snake_case")]
pub struct RolloutConfig {
    /// Steps the candidate heuristic runs before rollouts start.
    pub search_interval: usize,

    /// Number of rollouts per candidate.
    pub search_time: usize,

    /// Step cap of each rollout; `construction_steps * 2` when absent.
    pub max_steps: Option<usize>,

    /// Worker threads for candidate evaluation; 0 lets rayon decide.
    pub threads: usize,

    /// Base seed of the rollout RNGs; each rollout derives its own stream.
    pub seed: Option<u64>,

    /// Directory receiving the best solution found during comparisons.
    pub persist_dir: Option<PathBuf>,
}

impl Default for RolloutConfig {
    fn default() -> Self {
        Self {
            search_interval: 1,
            search_time: 10,
            max_steps: None,
            threads: 0,
            seed: None,
            persist_dir: None,
        }
    }
}

/// LLM collaboration settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "snake_case")]
pub struct LlmConfig {
    /// Calls per decision before the attempt counts as failed.
    pub max_attempts: usize,

    /// Recent trajectory entries included in prompts.
    pub history_length: usize,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            history_length: 5,
        }
    }
}
