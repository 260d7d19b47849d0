//! Test utilities for hyperforge-core

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::env::{Env, EnvOptions};
use crate::error::HeuristicError;
use crate::heuristic::{
    FnHeuristic, Heuristic, HeuristicContext, HeuristicResult, Parameters, Proposal,
};
use crate::problem::{Direction, Operator, Problem};

/// Picks `size` distinct tokens out of `costs.len()`, minimising total cost.
#[derive(Debug, Clone)]
pub struct TokenProblem {
    pub size: usize,
    pub costs: Vec<f64>,
}

impl TokenProblem {
    pub fn new(size: usize, costs: Vec<f64>) -> Self {
        Self { size, costs }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tokens(pub Vec<usize>);

impl fmt::Display for Tokens {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TokenOperator {
    Push { token: usize },
    Pop,
    #[serde(skip)]
    Explode,
}

impl fmt::Display for TokenOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenOperator::Push { token } => write!(f, "Push({token})"),
            TokenOperator::Pop => write!(f, "Pop"),
            TokenOperator::Explode => write!(f, "Explode"),
        }
    }
}

impl Operator<Tokens> for TokenOperator {
    fn apply(&self, solution: &Tokens) -> Tokens {
        let mut next = solution.clone();
        match self {
            TokenOperator::Push { token } => next.0.push(*token),
            TokenOperator::Pop => {
                next.0.pop();
            }
            TokenOperator::Explode => panic!("explode operator"),
        }
        next
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TokenState {
    pub placed: usize,
    pub cost: f64,
}

impl Problem for TokenProblem {
    const NAME: &'static str = "tokens";

    type Solution = Tokens;
    type Operator = TokenOperator;
    type State = TokenState;

    fn init_solution(&self) -> Tokens {
        Tokens(Vec::new())
    }

    fn state_data(&self, solution: &Tokens) -> Option<TokenState> {
        let mut cost = 0.0;
        for &token in &solution.0 {
            cost += self.costs.get(token)?;
        }
        Some(TokenState {
            placed: solution.0.len(),
            cost,
        })
    }

    fn validation_solution(&self, solution: &Tokens) -> bool {
        let mut seen = vec![false; self.costs.len()];
        for &token in &solution.0 {
            if token >= seen.len() || seen[token] {
                return false;
            }
            seen[token] = true;
        }
        solution.0.len() <= self.size
    }

    fn is_complete(&self, state: &TokenState) -> bool {
        state.placed >= self.size
    }

    fn key_item(&self) -> &'static str {
        "cost"
    }

    fn key_value(&self, state: &TokenState) -> f64 {
        state.cost
    }

    fn direction(&self) -> Direction {
        Direction::Minimize
    }

    fn construction_steps(&self) -> usize {
        self.size
    }

    fn state_features(&self, state: &TokenState) -> Value {
        serde_json::json!({ "placed": state.placed, "cost": state.cost })
    }
}

fn push_cheapest(ctx: &HeuristicContext<'_, TokenProblem>, _: &Parameters) -> HeuristicResult<TokenOperator> {
    let problem = ctx.global_data();
    if problem.is_complete(ctx.state_data()) {
        return Ok(Proposal::decline());
    }
    let used = &ctx.current_solution().0;
    let next = (0..problem.costs.len())
        .filter(|t| !used.contains(t))
        .min_by(|a, b| problem.costs[*a].total_cmp(&problem.costs[*b]));
    let calls = ctx
        .algorithm_data()
        .get("calls")
        .and_then(Value::as_u64)
        .unwrap_or(0);
    Ok(match next {
        Some(token) => Proposal::apply(TokenOperator::Push { token }).with_delta("calls", calls + 1),
        None => Proposal::decline(),
    })
}

pub fn cheapest() -> impl Heuristic<TokenProblem> {
    FnHeuristic::new("push_cheapest", push_cheapest).with_description("push the cheapest unused token")
}

pub fn declining() -> impl Heuristic<TokenProblem> {
    FnHeuristic::new("decline", |_: &HeuristicContext<'_, TokenProblem>, _: &Parameters| {
        Ok(Proposal::decline())
    })
}

pub fn failing() -> impl Heuristic<TokenProblem> {
    FnHeuristic::new("fail", |_: &HeuristicContext<'_, TokenProblem>, _: &Parameters| {
        Err(HeuristicError::Failed("no luck".to_string()))
    })
}

pub fn panicking() -> impl Heuristic<TokenProblem> {
    FnHeuristic::new("panic", |_: &HeuristicContext<'_, TokenProblem>, _: &Parameters| -> HeuristicResult<TokenOperator> {
        panic!("heuristic blew up")
    })
}
/// Pushes an unused token drawn from the environment's random stream.
pub fn random_push() -> impl Heuristic<TokenProblem> {
    FnHeuristic::new("random_push", |ctx: &HeuristicContext<'_, TokenProblem>, _: &Parameters| {
        let problem = ctx.global_data();
        if problem.is_complete(ctx.state_data()) {
            return Ok(Proposal::decline());
        }
        let used = &ctx.current_solution().0;
        let free: Vec<usize> = (0..problem.costs.len()).filter(|t| !used.contains(t)).collect();
        if free.is_empty() {
            return Ok(Proposal::decline());
        }
        let token = free[ctx.rng().random_range(0..free.len())];
        Ok(Proposal::apply(TokenOperator::Push { token }))
    })
}

/// Proposes an operator whose result has no state data.
pub fn unreachable_push() -> impl Heuristic<TokenProblem> {
    FnHeuristic::new("unreachable", |ctx: &HeuristicContext<'_, TokenProblem>, _: &Parameters| {
        let token = ctx.global_data().costs.len() + 1;
        Ok(Proposal::apply(TokenOperator::Push { token }))
    })
}

pub fn env(size: usize) -> Env<TokenProblem> {
    Env::new(
        TokenProblem::new(size, vec![4.0, 1.0, 3.0, 2.0, 5.0]),
        "five",
        EnvOptions::default(),
    )
    .expect("initial state is reachable")
}
