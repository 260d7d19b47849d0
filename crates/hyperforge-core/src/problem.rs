//! Problem module contract
//!
//! A problem module plugs a combinatorial optimisation family into the
//! environment. The [`Problem`] value itself is the immutable instance data;
//! it owns the derivation of state data from a solution, validation, and the
//! key value used to compare solutions.

use std::fmt::{Debug, Display};
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::EnvError;

/// Marker trait for solution values.
///
/// Solutions are plain values. The engine never mutates one in place; every
/// step replaces the current solution with the value an operator returns.
/// `Display` is used as the solution summary in trajectories and artifacts.
pub trait Solution:
    Clone + PartialEq + Debug + Display + Serialize + DeserializeOwned + Send + Sync + 'static
{
}

impl<T> Solution for T where
    T: Clone + PartialEq + Debug + Display + Serialize + DeserializeOwned + Send + Sync + 'static
{
}

/// An atomic transformation from one solution to another.
///
/// `apply` receives the input by shared reference and returns a new value,
/// so an operator cannot mutate the solution it is applied to.
///
/// Operators serialize as tagged values (`{"type": "Insert", "node": 3, ...}`)
/// so a logged trajectory can be replayed.
pub trait Operator<S>:
    Clone + PartialEq + Debug + Display + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Returns the solution produced by applying this operator to `solution`.
    fn apply(&self, solution: &S) -> S;
}

/// Optimisation direction of a problem's key value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Minimize,
    Maximize,
}

impl Direction {
    /// Signed improvement of `a` over `b`.
    ///
    /// Positive when `a` is better than `b`, zero when equal.
    ///
    /// ```
    /// use hyperforge_core::Direction;
    ///
    /// assert_eq!(Direction::Minimize.compare(3.0, 5.0), 2.0);
    /// assert_eq!(Direction::Maximize.compare(3.0, 5.0), -2.0);
    /// ```
    pub fn compare(self, a: f64, b: f64) -> f64 {
        match self {
            Direction::Minimize => b - a,
            Direction::Maximize => a - b,
        }
    }

    /// Returns true if `a` is strictly better than `b`.
    pub fn is_better(self, a: f64, b: f64) -> bool {
        self.compare(a, b) > 0.0
    }
}

/// A problem family together with one loaded instance.
///
/// Implementations are shared read-only between environment forks (behind an
/// `Arc`), so every method takes `&self` and must be pure.
pub trait Problem: Debug + Send + Sync + 'static {
    /// Problem name used in output paths and the registry.
    const NAME: &'static str;

    type Solution: Solution;
    type Operator: Operator<Self::Solution>;
    type State: Clone + PartialEq + Debug + Send + Sync + 'static;

    /// The empty starting solution.
    fn init_solution(&self) -> Self::Solution;

    /// Derives state data from `solution`.
    ///
    /// Returns `None` if the solution is structurally unreachable.
    fn state_data(&self, solution: &Self::Solution) -> Option<Self::State>;

    /// Checks feasibility. Partial solutions are accepted.
    fn validation_solution(&self, solution: &Self::Solution) -> bool;

    /// Returns true once construction is finished.
    fn is_complete(&self, state: &Self::State) -> bool;

    /// Name of the objective, e.g. `tour_cost`.
    fn key_item(&self) -> &'static str;

    fn key_value(&self, state: &Self::State) -> f64;

    fn direction(&self) -> Direction;

    /// Number of steps a constructive heuristic needs to finish a solution.
    fn construction_steps(&self) -> usize;

    /// Instance-level features shown to selection policies.
    fn global_features(&self) -> Value {
        Value::Object(Map::new())
    }

    /// Solution-level features shown to selection policies.
    fn state_features(&self, state: &Self::State) -> Value {
        let _ = state;
        Value::Object(Map::new())
    }

    /// Human readable description of the problem.
    fn description(&self) -> &str {
        ""
    }
}

/// A problem whose instance data can be read from a file.
pub trait LoadProblem: Problem + Sized {
    fn load_data(path: &Path) -> Result<Self, EnvError>;
}
