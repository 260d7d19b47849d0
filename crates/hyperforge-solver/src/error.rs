//! Error types for policies, LLM collaboration and candidate comparison.

use hyperforge_core::EnvError;
use thiserror::Error;

/// Failure of one LLM exchange.
#[derive(Debug, Error)]
pub enum LlmError {
    /// The client could not produce a response
    #[error("LLM request failed: {0}")]
    Request(String),

    /// The response could not be interpreted
    #[error("LLM response rejected: {0}")]
    Parse(#[from] SelectionParseError),

    /// Every attempt of a decision failed
    #[error("No usable LLM response after {attempts} attempts")]
    AttemptsExhausted { attempts: usize },
}

/// A response that does not follow the `***` block protocol.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionParseError {
    #[error("response has no ***-delimited block")]
    MissingBlock,

    #[error("missing field `{0}`")]
    MissingField(String),

    #[error("invalid value `{value}` for field `{field}`")]
    InvalidValue { field: String, value: String },

    #[error("unknown heuristic `{0}`")]
    UnknownHeuristic(String),

    #[error("unknown category `{0}`")]
    UnknownCategory(String),
}

/// Failure of the comparison engine.
#[derive(Debug, Error)]
pub enum ComparisonError {
    #[error("Environment error: {0}")]
    Env(#[from] EnvError),

    #[error("Failed to build thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("No candidates to compare")]
    NoCandidates,
}
