//! Heuristic contract
//!
//! A heuristic inspects the current state of an environment and proposes at
//! most one operator per call. It never mutates the environment; all mutation
//! happens in [`Env::run_heuristic`](crate::Env::run_heuristic).

mod context;
mod pool;

#[cfg(test)]
mod tests;

use std::fmt;
use std::marker::PhantomData;

use serde_json::{Map, Value};

use crate::error::HeuristicError;
use crate::problem::Problem;

pub use context::HeuristicContext;
pub use pool::HeuristicPool;

/// Private scratch data of the running heuristic.
pub type AlgorithmData = Map<String, Value>;

/// Keyword parameters passed to a heuristic call.
pub type Parameters = Map<String, Value>;

/// Result of a heuristic call.
pub type HeuristicResult<O> = Result<Proposal<O>, HeuristicError>;

/// What a heuristic returns: an optional operator plus an algorithm data delta.
///
/// A proposal without an operator is a declination and leaves the
/// environment untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct Proposal<O> {
    pub operator: Option<O>,
    pub delta: AlgorithmData,
}

impl<O> Proposal<O> {
    pub fn apply(operator: O) -> Self {
        Self {
            operator: Some(operator),
            delta: AlgorithmData::new(),
        }
    }

    pub fn decline() -> Self {
        Self {
            operator: None,
            delta: AlgorithmData::new(),
        }
    }

    /// Adds one key to the algorithm data delta.
    pub fn with_delta(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.delta.insert(key.into(), value.into());
        self
    }

    pub fn is_declined(&self) -> bool {
        self.operator.is_none()
    }
}

/// A named function proposing operators for problem `P`.
pub trait Heuristic<P: Problem>: Send + Sync {
    fn name(&self) -> &str;

    /// Documentation shown to LLM selection policies.
    fn description(&self) -> &str {
        ""
    }

    fn propose(&self, ctx: &HeuristicContext<'_, P>, params: &Parameters) -> HeuristicResult<P::Operator>;
}

/// Adapts a plain function or closure into a [`Heuristic`].
///
/// ```ignore
/// let pool = HeuristicPool::new()
///     .with(FnHeuristic::new("nearest_neighbor", nearest_neighbor));
/// ```
pub struct FnHeuristic<P, F> {
    name: String,
    description: String,
    f: F,
    _phantom: PhantomData<fn() -> P>,
}

impl<P, F> FnHeuristic<P, F>
where
    P: Problem,
    F: Fn(&HeuristicContext<'_, P>, &Parameters) -> HeuristicResult<P::Operator> + Send + Sync,
{
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            f,
            _phantom: PhantomData,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

impl<P, F> Heuristic<P> for FnHeuristic<P, F>
where
    P: Problem,
    F: Fn(&HeuristicContext<'_, P>, &Parameters) -> HeuristicResult<P::Operator> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn propose(&self, ctx: &HeuristicContext<'_, P>, params: &Parameters) -> HeuristicResult<P::Operator> {
        (self.f)(ctx, params)
    }
}

impl<P, F> fmt::Debug for FnHeuristic<P, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnHeuristic").field("name", &self.name).finish()
    }
}

/// Reads an optional unsigned integer parameter.
pub fn param_usize(params: &Parameters, name: &str) -> Result<Option<usize>, HeuristicError> {
    match params.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value
            .as_u64()
            .map(|v| Some(v as usize))
            .ok_or_else(|| HeuristicError::InvalidParameter {
                name: name.to_string(),
                reason: format!("expected unsigned integer, got {value}"),
            }),
    }
}

/// Reads an optional float parameter.
pub fn param_f64(params: &Parameters, name: &str) -> Result<Option<f64>, HeuristicError> {
    match params.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value
            .as_f64()
            .map(Some)
            .ok_or_else(|| HeuristicError::InvalidParameter {
                name: name.to_string(),
                reason: format!("expected number, got {value}"),
            }),
    }
}
