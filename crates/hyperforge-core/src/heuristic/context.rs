//! Read-only view of the environment handed to heuristics.

use std::cell::{RefCell, RefMut};
use std::fmt;

use rand_chacha::ChaCha8Rng;

use crate::problem::{Direction, Problem};

use super::AlgorithmData;

/// Everything a heuristic may look at during one call.
///
/// The context borrows the environment immutably; heuristics express intent
/// only through the [`Proposal`](super::Proposal) they return.
pub struct HeuristicContext<'a, P: Problem> {
    problem: &'a P,
    solution: &'a P::Solution,
    state: &'a P::State,
    algorithm_data: &'a AlgorithmData,
    rng: RefCell<&'a mut ChaCha8Rng>,
}

impl<'a, P: Problem> HeuristicContext<'a, P> {
    pub fn new(
        problem: &'a P,
        solution: &'a P::Solution,
        state: &'a P::State,
        algorithm_data: &'a AlgorithmData,
        rng: &'a mut ChaCha8Rng,
    ) -> Self {
        Self {
            problem,
            solution,
            state,
            algorithm_data,
            rng: RefCell::new(rng),
        }
    }

    /// Instance data.
    pub fn global_data(&self) -> &'a P {
        self.problem
    }

    pub fn current_solution(&self) -> &'a P::Solution {
        self.solution
    }

    pub fn state_data(&self) -> &'a P::State {
        self.state
    }

    pub fn algorithm_data(&self) -> &'a AlgorithmData {
        self.algorithm_data
    }

    /// State data of a hypothetical solution, `None` if unreachable.
    pub fn get_state_data(&self, solution: &P::Solution) -> Option<P::State> {
        self.problem.state_data(solution)
    }

    pub fn validation_solution(&self, solution: &P::Solution) -> bool {
        self.problem.validation_solution(solution)
    }

    /// Key value of a hypothetical solution, `None` if unreachable.
    pub fn evaluate(&self, solution: &P::Solution) -> Option<f64> {
        self.problem
            .state_data(solution)
            .map(|state| self.problem.key_value(&state))
    }

    pub fn direction(&self) -> Direction {
        self.problem.direction()
    }

    /// The environment's seeded random stream.
    ///
    /// Randomised heuristics draw from here so that a seeded run replays
    /// the same choices.
    ///
    /// # Panics
    ///
    /// If the returned guard is still alive at the next call.
    pub fn rng(&self) -> RefMut<'_, ChaCha8Rng> {
        RefMut::map(self.rng.borrow_mut(), |rng| &mut **rng)
    }
}

impl<P: Problem> fmt::Debug for HeuristicContext<'_, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeuristicContext")
            .field("solution", self.solution)
            .field("state", self.state)
            .finish()
    }
}
