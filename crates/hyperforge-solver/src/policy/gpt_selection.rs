//! LLM-guided selection of one heuristic and its running steps.

use std::fmt;
use std::sync::Arc;

use tracing::{info, warn};

use hyperforge_config::{LlmConfig, SelectionConfig};
use hyperforge_core::{Env, Heuristic, HeuristicPool, Parameters, Problem};

use super::{finish, log_run_start, step_budget, HyperHeuristic, DEFAULT_ITERATIONS_SCALE_FACTOR};
use crate::error::SelectionParseError;
use crate::llm::{ask, parse_block, LlmClient, SelectionPrompt};

/// Knobs shared by the LLM-driven policies.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionSettings {
    /// Calls per decision before it counts as failed.
    pub max_attempts: usize,
    /// Trajectory entries shown in prompts.
    pub history_length: usize,
    /// Upper bound on running steps per decision.
    pub max_running_steps: usize,
    pub iterations_scale_factor: f64,
    /// Candidates requested per decision, where applicable.
    pub candidate_count: usize,
}

impl Default for SelectionSettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            history_length: 5,
            max_running_steps: 5,
            iterations_scale_factor: DEFAULT_ITERATIONS_SCALE_FACTOR,
            candidate_count: 3,
        }
    }
}

impl SelectionSettings {
    pub fn from_config(llm: &LlmConfig, selection: &SelectionConfig) -> Self {
        Self {
            max_attempts: llm.max_attempts,
            history_length: llm.history_length,
            max_running_steps: selection.max_running_steps,
            iterations_scale_factor: selection.iterations_scale_factor,
            candidate_count: selection.candidate_count,
        }
    }
}

/// One LLM decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Decision {
    Run { heuristic: String, running_steps: usize },
    Stop,
}

const REQUEST: &str = "Choose the heuristic to run next and for how many steps \
(at most {max}). Answer in this format:\n\
***\n\
selected_heuristic: <heuristic name>\n\
running_steps: <number of steps>\n\
explanation: <one sentence>\n\
***\n\
Answer `selected_heuristic: stop` if the solution should not change any more.";

pub(crate) fn parse_decision<P: Problem>(
    text: &str,
    pool: &HeuristicPool<P>,
    max_running_steps: usize,
) -> Result<Decision, SelectionParseError> {
    let block = parse_block(text)?;
    if block.is_stop("selected_heuristic") {
        return Ok(Decision::Stop);
    }
    let heuristic = block.require("selected_heuristic")?;
    if !pool.contains(heuristic) {
        return Err(SelectionParseError::UnknownHeuristic(heuristic.to_string()));
    }
    let running_steps = block
        .usize_field("running_steps")?
        .unwrap_or(1)
        .clamp(1, max_running_steps.max(1));
    Ok(Decision::Run {
        heuristic: heuristic.to_string(),
        running_steps,
    })
}

/// Runs `heuristic` up to `running_steps` times within the remaining budget.
///
/// A decline ends this decision early; the caller asks again. Returns the
/// number of invocations made.
pub(crate) fn run_for<P: Problem>(
    env: &mut Env<P>,
    heuristic: &dyn Heuristic<P>,
    running_steps: usize,
    remaining: usize,
) -> usize {
    let params = Parameters::new();
    let mut calls = 0;
    while calls < running_steps.min(remaining) {
        env.run_heuristic(heuristic, &params);
        calls += 1;
        if !env.continue_run() {
            break;
        }
    }
    calls
}

/// Asks the LLM for a heuristic and a number of running steps per decision.
///
/// Client errors and unusable answers are retried up to `max_attempts`
/// times; a decision that still fails costs one step of the budget. The run
/// ends on a stop answer or once the budget is spent.
pub struct GptSelectionHyperHeuristic<P: Problem> {
    pool: HeuristicPool<P>,
    client: Arc<dyn LlmClient>,
    settings: SelectionSettings,
}

impl<P: Problem> GptSelectionHyperHeuristic<P> {
    pub fn new(pool: HeuristicPool<P>, client: Arc<dyn LlmClient>) -> Self {
        Self {
            pool,
            client,
            settings: SelectionSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: SelectionSettings) -> Self {
        self.settings = settings;
        self
    }
}

impl<P: Problem> HyperHeuristic<P> for GptSelectionHyperHeuristic<P> {
    fn run(&mut self, env: &mut Env<P>, max_steps: Option<usize>) -> bool {
        let max_steps =
            max_steps.unwrap_or_else(|| step_budget(env, self.settings.iterations_scale_factor));
        log_run_start(self.name(), env, max_steps);
        let request = REQUEST.replace("{max}", &self.settings.max_running_steps.to_string());

        let mut steps = 0;
        while steps < max_steps {
            let messages = SelectionPrompt::for_env(env, &self.pool, self.settings.history_length)
                .messages(&request);
            let decision = ask(
                self.client.as_ref(),
                &messages,
                self.settings.max_attempts,
                |text| parse_decision(text, &self.pool, self.settings.max_running_steps),
            );
            match decision {
                Ok(Decision::Stop) => {
                    info!(event = "decision", policy = self.name(), stop = true, step = steps);
                    break;
                }
                Ok(Decision::Run {
                    heuristic,
                    running_steps,
                }) => {
                    info!(
                        event = "decision",
                        policy = self.name(),
                        heuristic = %heuristic,
                        running_steps = running_steps,
                        step = steps,
                    );
                    let Some(h) = self.pool.get(&heuristic).cloned() else {
                        steps += 1;
                        continue;
                    };
                    steps += run_for(env, h.as_ref(), running_steps, max_steps - steps);
                }
                Err(e) => {
                    warn!(event = "decision_failed", policy = self.name(), error = %e, step = steps);
                    steps += 1;
                }
            }
        }
        finish(self.name(), env)
    }

    fn name(&self) -> &'static str {
        "gpt_selection"
    }
}

impl<P: Problem> fmt::Debug for GptSelectionHyperHeuristic<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GptSelectionHyperHeuristic")
            .field("pool", &self.pool)
            .field("settings", &self.settings)
            .finish()
    }
}
