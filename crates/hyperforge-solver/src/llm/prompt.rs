//! Prompt rendering for selection policies.

use serde_json::Value;

use hyperforge_core::{Env, HeuristicPool, Problem};

use super::ChatMessage;

const SYSTEM_PROMPT: &str = "You are an expert in combinatorial optimisation. \
You steer a search by choosing which heuristic to run next. \
Always answer with a block that starts and ends with a line containing only ***, \
holding one `key: value` pair per line.";

/// Everything a selection request shows the model.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionPrompt {
    pub problem: String,
    pub description: String,
    pub global_features: Value,
    pub state_features: Value,
    pub heuristics: String,
    pub history: Vec<String>,
}

impl SelectionPrompt {
    /// Captures the current state of `env` and the heuristics of `pool`.
    ///
    /// `history_length` bounds the number of recent trajectory steps shown.
    pub fn for_env<P: Problem>(env: &Env<P>, pool: &HeuristicPool<P>, history_length: usize) -> Self {
        let problem = env.problem();
        let history = env
            .trajectory()
            .recent(history_length)
            .iter()
            .map(|entry| format!("{}: {} -> {}", entry.operation_id, entry.heuristic, entry.operator))
            .collect();
        Self {
            problem: P::NAME.to_string(),
            description: problem.description().to_string(),
            global_features: problem.global_features(),
            state_features: problem.state_features(env.state_data()),
            heuristics: pool.documentation(),
            history,
        }
    }

    pub fn with_heuristics(mut self, heuristics: String) -> Self {
        self.heuristics = heuristics;
        self
    }

    /// Renders the context followed by `request`.
    pub fn render(&self, request: &str) -> String {
        let mut text = format!("Problem: {}\n", self.problem);
        if !self.description.is_empty() {
            text.push_str(&self.description);
            text.push('\n');
        }
        text.push_str("\nInstance features:\n");
        text.push_str(&render_json(&self.global_features));
        text.push_str("\n\nCurrent state:\n");
        text.push_str(&render_json(&self.state_features));
        text.push_str("\n\nAvailable heuristics:\n");
        text.push_str(&self.heuristics);
        text.push_str("\nRecent steps:\n");
        if self.history.is_empty() {
            text.push_str("none\n");
        } else {
            for line in &self.history {
                text.push_str(line);
                text.push('\n');
            }
        }
        text.push('\n');
        text.push_str(request);
        text
    }

    /// System and user messages for `request`.
    pub fn messages(&self, request: &str) -> Vec<ChatMessage> {
        vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(self.render(request))]
    }
}

fn render_json(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}
