//! Error types for HyperForge

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Main error type for environment operations.
///
/// Errors raised *inside* a heuristic never surface as `EnvError`; they are
/// absorbed by [`Env::run_heuristic`](crate::Env::run_heuristic) and reported
/// as a [`HeuristicFailure`].
#[derive(Debug, Error)]
pub enum EnvError {
    /// Instance data could not be read or parsed
    #[error("Failed to load instance data from {path}: {message}")]
    Load { path: PathBuf, message: String },

    /// The initial solution has no state data
    #[error("Initial solution of {problem} is structurally unreachable")]
    UnreachableInitialState { problem: &'static str },

    /// An operator produced a solution with no state data
    #[error("Operator {operator} leads to an unreachable state")]
    UnreachableState { operator: String },

    /// An operator produced an invalid solution while validation was enabled
    #[error("Operator {operator} produces an infeasible solution")]
    InfeasibleOperator { operator: String },

    /// Applying the operator panicked
    #[error("Operator {operator} panicked: {message}")]
    OperatorPanicked { operator: String, message: String },

    /// Malformed trajectory or snapshot text
    #[error("Parse error: {0}")]
    Parse(String),

    /// IO error while writing artifacts
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl EnvError {
    /// Creates a load error for `path`.
    pub fn load(path: impl Into<PathBuf>, message: impl fmt::Display) -> Self {
        EnvError::Load {
            path: path.into(),
            message: message.to_string(),
        }
    }
}

/// Error a heuristic returns instead of proposing an operator.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum HeuristicError {
    /// A parameter was missing or had the wrong type
    #[error("Invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: String, reason: String },

    /// Algorithm data carried over from a previous call is malformed
    #[error("Invalid algorithm data `{key}`: {reason}")]
    InvalidAlgorithmData { key: String, reason: String },

    /// Any other failure
    #[error("{0}")]
    Failed(String),
}

impl From<String> for HeuristicError {
    fn from(value: String) -> Self {
        HeuristicError::Failed(value)
    }
}

impl From<&str> for HeuristicError {
    fn from(value: &str) -> Self {
        HeuristicError::Failed(value.to_string())
    }
}

/// Opaque marker for a heuristic call that errored or panicked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeuristicFailure {
    pub heuristic: String,
    pub message: String,
}

impl fmt::Display for HeuristicFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "heuristic `{}` failed: {}", self.heuristic, self.message)
    }
}

/// Result type alias for environment operations
pub type Result<T> = std::result::Result<T, EnvError>;
