//! LLM proposes candidates, rollouts pick the winner.

use std::fmt;
use std::sync::Arc;

use tracing::{info, warn};

use hyperforge_config::RolloutConfig;
use hyperforge_core::{Env, Heuristic, HeuristicPool, Problem};

use super::gpt_selection::{run_for, SelectionSettings};
use super::{finish, log_run_start, step_budget, HyperHeuristic};
use crate::comparison::tts_bon;
use crate::error::SelectionParseError;
use crate::llm::{ask, parse_block, parse_list, LlmClient, SelectionPrompt};

const REQUEST: &str = "Propose up to {count} heuristics worth trying next, most promising \
first. Answer in this format:\n\
***\n\
candidate_heuristics: <heuristic name>, <heuristic name>\n\
***\n\
Answer `candidate_heuristics: stop` if the solution should not change any more.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum CandidateDecision {
    Candidates(Vec<String>),
    Stop,
}

/// Reads the candidate list, dropping duplicates and keeping at most `count`.
pub(crate) fn parse_candidates<P: Problem>(
    text: &str,
    pool: &HeuristicPool<P>,
    count: usize,
) -> Result<CandidateDecision, SelectionParseError> {
    let block = parse_block(text)?;
    if block.is_stop("candidate_heuristics") {
        return Ok(CandidateDecision::Stop);
    }
    let mut candidates: Vec<String> = Vec::new();
    for name in parse_list(block.require("candidate_heuristics")?) {
        if !pool.contains(&name) {
            return Err(SelectionParseError::UnknownHeuristic(name));
        }
        if !candidates.contains(&name) {
            candidates.push(name);
        }
    }
    if candidates.is_empty() {
        return Err(SelectionParseError::MissingField(
            "candidate_heuristics".to_string(),
        ));
    }
    candidates.truncate(count.max(1));
    Ok(CandidateDecision::Candidates(candidates))
}

/// Asks the LLM for a short list of candidate heuristics per decision and
/// lets [`tts_bon`] choose among them by Monte-Carlo rollouts.
///
/// The winner runs for `search_interval` steps. A single candidate runs
/// without rollouts; if the comparison fails, the first candidate runs.
pub struct LlmSelectionHyperHeuristic<P: Problem> {
    pool: HeuristicPool<P>,
    client: Arc<dyn LlmClient>,
    settings: SelectionSettings,
    rollout: RolloutConfig,
}

impl<P: Problem> LlmSelectionHyperHeuristic<P> {
    pub fn new(pool: HeuristicPool<P>, client: Arc<dyn LlmClient>) -> Self {
        Self {
            pool,
            client,
            settings: SelectionSettings::default(),
            rollout: RolloutConfig::default(),
        }
    }

    pub fn with_settings(mut self, settings: SelectionSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_rollout(mut self, rollout: RolloutConfig) -> Self {
        self.rollout = rollout;
        self
    }

    fn pick(&self, env: &Env<P>, names: &[String]) -> String {
        if names.len() == 1 {
            return names[0].clone();
        }
        let candidates: Vec<Arc<dyn Heuristic<P>>> = names
            .iter()
            .filter_map(|name| self.pool.get(name).cloned())
            .collect();
        match tts_bon(env, &candidates, &self.pool, &self.rollout) {
            Ok(Some(best)) => best,
            Ok(None) => names[0].clone(),
            Err(e) => {
                warn!(event = "comparison_failed", policy = self.name(), error = %e);
                names[0].clone()
            }
        }
    }
}

impl<P: Problem> HyperHeuristic<P> for LlmSelectionHyperHeuristic<P> {
    fn run(&mut self, env: &mut Env<P>, max_steps: Option<usize>) -> bool {
        let max_steps =
            max_steps.unwrap_or_else(|| step_budget(env, self.settings.iterations_scale_factor));
        log_run_start(self.name(), env, max_steps);
        let request = REQUEST.replace("{count}", &self.settings.candidate_count.to_string());
        let interval = self.rollout.search_interval.max(1);

        let mut steps = 0;
        while steps < max_steps {
            let messages = SelectionPrompt::for_env(env, &self.pool, self.settings.history_length)
                .messages(&request);
            let decision = ask(
                self.client.as_ref(),
                &messages,
                self.settings.max_attempts,
                |text| parse_candidates(text, &self.pool, self.settings.candidate_count),
            );
            match decision {
                Ok(CandidateDecision::Stop) => {
                    info!(event = "decision", policy = self.name(), stop = true, step = steps);
                    break;
                }
                Ok(CandidateDecision::Candidates(names)) => {
                    let chosen = self.pick(env, &names);
                    info!(
                        event = "decision",
                        policy = self.name(),
                        candidates = ?names,
                        heuristic = %chosen,
                        step = steps,
                    );
                    match self.pool.get(&chosen).cloned() {
                        Some(h) => steps += run_for(env, h.as_ref(), interval, max_steps - steps),
                        None => steps += 1,
                    }
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
        "llm_selection"
    }
}

impl<P: Problem> fmt::Debug for LlmSelectionHyperHeuristic<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmSelectionHyperHeuristic")
            .field("pool", &self.pool)
            .field("settings", &self.settings)
            .field("rollout", &self.rollout)
            .finish()
    }
}
