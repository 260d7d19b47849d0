//! Two-level LLM selection: heuristic category first, heuristic second.

use std::fmt;
use std::sync::Arc;

use tracing::{info, warn};

use hyperforge_core::{Env, HeuristicPool, Problem};

use super::gpt_selection::{run_for, SelectionSettings};
use super::{finish, log_run_start, step_budget, HyperHeuristic};
use crate::error::{LlmError, SelectionParseError};
use crate::llm::{ask, parse_block, parse_list, LlmClient, SelectionPrompt};

/// Category collecting heuristics the model left unclassified.
pub const OTHER_CATEGORY: &str = "other";

const CLASSIFY_REQUEST: &str = "Group the available heuristics into categories by their role \
in the search, for example construction, improvement or perturbation. \
Answer with one line per category:\n\
***\n\
<category name>: <heuristic name>, <heuristic name>\n\
***";

const CATEGORY_REQUEST: &str = "Choose the category of heuristics to run next and for how many \
steps (at most {max}). Answer in this format:\n\
***\n\
selected_category: <category name>\n\
running_steps: <number of steps>\n\
***\n\
Answer `selected_category: stop` if the solution should not change any more.";

const HEURISTIC_REQUEST: &str = "Choose one heuristic of category `{category}` to run next. \
Answer in this format:\n\
***\n\
selected_heuristic: <heuristic name>\n\
***";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Category {
    pub name: String,
    pub heuristics: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum CategoryDecision {
    Run { category: usize, running_steps: usize },
    Stop,
}

/// Reads a classification block; unclassified heuristics go to `other`.
pub(crate) fn parse_categories<P: Problem>(
    text: &str,
    pool: &HeuristicPool<P>,
) -> Result<Vec<Category>, SelectionParseError> {
    let block = parse_block(text)?;
    let mut categories: Vec<Category> = Vec::new();
    let mut classified: Vec<String> = Vec::new();
    for (name, value) in block.iter() {
        let mut heuristics = Vec::new();
        for heuristic in parse_list(value) {
            if !pool.contains(&heuristic) {
                return Err(SelectionParseError::UnknownHeuristic(heuristic));
            }
            if !classified.contains(&heuristic) {
                classified.push(heuristic.clone());
                heuristics.push(heuristic);
            }
        }
        if !heuristics.is_empty() {
            categories.push(Category {
                name: name.to_string(),
                heuristics,
            });
        }
    }
    let rest: Vec<String> = pool
        .names()
        .into_iter()
        .filter(|h| !classified.iter().any(|c| c == h))
        .map(str::to_string)
        .collect();
    if !rest.is_empty() {
        match categories.iter_mut().find(|c| c.name == OTHER_CATEGORY) {
            Some(other) => other.heuristics.extend(rest),
            None => categories.push(Category {
                name: OTHER_CATEGORY.to_string(),
                heuristics: rest,
            }),
        }
    }
    Ok(categories)
}

pub(crate) fn parse_category_decision(
    text: &str,
    categories: &[Category],
    max_running_steps: usize,
) -> Result<CategoryDecision, SelectionParseError> {
    let block = parse_block(text)?;
    if block.is_stop("selected_category") {
        return Ok(CategoryDecision::Stop);
    }
    let name = block.require("selected_category")?;
    let category = categories
        .iter()
        .position(|c| c.name.eq_ignore_ascii_case(name))
        .ok_or_else(|| SelectionParseError::UnknownCategory(name.to_string()))?;
    let running_steps = block
        .usize_field("running_steps")?
        .unwrap_or(1)
        .clamp(1, max_running_steps.max(1));
    Ok(CategoryDecision::Run {
        category,
        running_steps,
    })
}

fn parse_member(text: &str, category: &Category) -> Result<String, SelectionParseError> {
    let block = parse_block(text)?;
    let heuristic = block.require("selected_heuristic")?;
    if category.heuristics.iter().any(|h| h == heuristic) {
        Ok(heuristic.to_string())
    } else {
        Err(SelectionParseError::UnknownHeuristic(heuristic.to_string()))
    }
}

/// Asks the LLM to classify the pool once, then per decision for a category
/// and running steps, and finally for a heuristic inside that category.
///
/// Single-member categories resolve without the second call. If the
/// classification fails, every heuristic lands in one category.
pub struct GptDeepSelectionHyperHeuristic<P: Problem> {
    pool: HeuristicPool<P>,
    client: Arc<dyn LlmClient>,
    settings: SelectionSettings,
    categories: Option<Vec<Category>>,
}

impl<P: Problem> GptDeepSelectionHyperHeuristic<P> {
    pub fn new(pool: HeuristicPool<P>, client: Arc<dyn LlmClient>) -> Self {
        Self {
            pool,
            client,
            settings: SelectionSettings::default(),
            categories: None,
        }
    }

    pub fn with_settings(mut self, settings: SelectionSettings) -> Self {
        self.settings = settings;
        self
    }

    fn classify(&self, env: &Env<P>) -> Vec<Category> {
        let messages = SelectionPrompt::for_env(env, &self.pool, 0).messages(CLASSIFY_REQUEST);
        match ask(
            self.client.as_ref(),
            &messages,
            self.settings.max_attempts,
            |text| parse_categories(text, &self.pool),
        ) {
            Ok(categories) => {
                info!(
                    event = "classification",
                    policy = self.name(),
                    categories = categories.len(),
                );
                categories
            }
            Err(e) => {
                warn!(event = "classification_failed", policy = self.name(), error = %e);
                vec![Category {
                    name: OTHER_CATEGORY.to_string(),
                    heuristics: self.pool.names().into_iter().map(str::to_string).collect(),
                }]
            }
        }
    }

    /// Resolves one decision to a heuristic name and running steps.
    fn decide(
        &self,
        env: &Env<P>,
        categories: &[Category],
    ) -> Result<Option<(String, usize)>, LlmError> {
        let prompt = SelectionPrompt::for_env(env, &self.pool, self.settings.history_length);
        let listing: String = categories
            .iter()
            .map(|c| format!("- {}: {}\n", c.name, c.heuristics.join(", ")))
            .collect();
        let request = format!(
            "Heuristic categories:\n{listing}\n{}",
            CATEGORY_REQUEST.replace("{max}", &self.settings.max_running_steps.to_string())
        );
        let decision = ask(
            self.client.as_ref(),
            &prompt.messages(&request),
            self.settings.max_attempts,
            |text| parse_category_decision(text, categories, self.settings.max_running_steps),
        )?;
        let (category, running_steps) = match decision {
            CategoryDecision::Stop => return Ok(None),
            CategoryDecision::Run {
                category,
                running_steps,
            } => (&categories[category], running_steps),
        };

        if let [only] = category.heuristics.as_slice() {
            return Ok(Some((only.clone(), running_steps)));
        }
        let members = self
            .pool
            .subset(&category.heuristics)
            .map_err(SelectionParseError::UnknownHeuristic)?;
        let request = HEURISTIC_REQUEST.replace("{category}", &category.name);
        let heuristic = ask(
            self.client.as_ref(),
            &prompt.with_heuristics(members.documentation()).messages(&request),
            self.settings.max_attempts,
            |text| parse_member(text, category),
        )?;
        Ok(Some((heuristic, running_steps)))
    }
}

impl<P: Problem> HyperHeuristic<P> for GptDeepSelectionHyperHeuristic<P> {
    fn run(&mut self, env: &mut Env<P>, max_steps: Option<usize>) -> bool {
        let max_steps =
            max_steps.unwrap_or_else(|| step_budget(env, self.settings.iterations_scale_factor));
        log_run_start(self.name(), env, max_steps);
        let categories = match self.categories.take() {
            Some(categories) => categories,
            None => self.classify(env),
        };

        let mut steps = 0;
        while steps < max_steps {
            match self.decide(env, &categories) {
                Ok(None) => {
                    info!(event = "decision", policy = self.name(), stop = true, step = steps);
                    break;
                }
                Ok(Some((heuristic, running_steps))) => {
                    info!(
                        event = "decision",
                        policy = self.name(),
                        heuristic = %heuristic,
                        running_steps = running_steps,
                        step = steps,
                    );
                    match self.pool.get(&heuristic).cloned() {
                        Some(h) => steps += run_for(env, h.as_ref(), running_steps, max_steps - steps),
                        None => steps += 1,
                    }
                }
                Err(e) => {
                    warn!(event = "decision_failed", policy = self.name(), error = %e, step = steps);
                    steps += 1;
                }
            }
        }
        self.categories = Some(categories);
        finish(self.name(), env)
    }

    fn name(&self) -> &'static str {
        "gpt_deep_selection"
    }
}

impl<P: Problem> fmt::Debug for GptDeepSelectionHyperHeuristic<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GptDeepSelectionHyperHeuristic")
            .field("pool", &self.pool)
            .field("settings", &self.settings)
            .field("categories", &self.categories)
            .finish()
    }
}
