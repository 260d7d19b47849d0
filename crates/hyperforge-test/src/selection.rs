//! Toy problem: pick `size` distinct items, minimising their total cost.

use std::fmt;

use hyperforge_core::{Direction, Env, EnvOptions, Operator, Problem};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Clone, PartialEq)]
pub struct SelectionProblem {
    pub size: usize,
    pub costs: Vec<f64>,
}

impl SelectionProblem {
    pub fn new(size: usize, costs: Vec<f64>) -> Self {
        Self { size, costs }
    }
}

/// Picked item indices in pick order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Picks(pub Vec<usize>);

impl fmt::Display for Picks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let items: Vec<String> = self.0.iter().map(usize::to_string).collect();
        write!(f, "picks: {}", items.join("->"))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SelectionOperator {
    /// Appends an item.
    Pick { item: usize },
    /// Removes the last item.
    Unpick,
    /// Rotates the picks left by one.
    Rotate,
    /// Appends unpicked items in index order up to `size`.
    Fill { size: usize },
}

impl fmt::Display for SelectionOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectionOperator::Pick { item } => write!(f, "Pick(item={item})"),
            SelectionOperator::Unpick => write!(f, "Unpick()"),
            SelectionOperator::Rotate => write!(f, "Rotate()"),
            SelectionOperator::Fill { size } => write!(f, "Fill(size={size})"),
        }
    }
}

impl Operator<Picks> for SelectionOperator {
    fn apply(&self, solution: &Picks) -> Picks {
        let mut picks = solution.0.clone();
        match self {
            SelectionOperator::Pick { item } => picks.push(*item),
            SelectionOperator::Unpick => {
                picks.pop();
            }
            SelectionOperator::Rotate => {
                if !picks.is_empty() {
                    picks.rotate_left(1);
                }
            }
            SelectionOperator::Fill { size } => {
                let mut item = 0;
                while picks.len() < *size {
                    if !picks.contains(&item) {
                        picks.push(item);
                    }
                    item += 1;
                }
            }
        }
        Picks(picks)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectionState {
    pub picked: usize,
    pub total_cost: f64,
    pub unpicked: Vec<usize>,
}

impl Problem for SelectionProblem {
    const NAME: &'static str = "selection";

    type Solution = Picks;
    type Operator = SelectionOperator;
    type State = SelectionState;

    fn init_solution(&self) -> Picks {
        Picks(Vec::new())
    }

    fn state_data(&self, solution: &Picks) -> Option<SelectionState> {
        let mut total_cost = 0.0;
        for &item in &solution.0 {
            total_cost += self.costs.get(item)?;
        }
        let unpicked = (0..self.costs.len())
            .filter(|i| !solution.0.contains(i))
            .collect();
        Some(SelectionState {
            picked: solution.0.len(),
            total_cost,
            unpicked,
        })
    }

    fn validation_solution(&self, solution: &Picks) -> bool {
        let mut seen = vec![false; self.costs.len()];
        for &item in &solution.0 {
            match seen.get_mut(item) {
                Some(flag) if !*flag => *flag = true,
                _ => return false,
            }
        }
        solution.0.len() <= self.size
    }

    fn is_complete(&self, state: &SelectionState) -> bool {
        state.picked >= self.size
    }

    fn key_item(&self) -> &'static str {
        "total_cost"
    }

    fn key_value(&self, state: &SelectionState) -> f64 {
        state.total_cost
    }

    fn direction(&self) -> Direction {
        Direction::Minimize
    }

    fn construction_steps(&self) -> usize {
        self.size
    }

    fn global_features(&self) -> Value {
        json!({ "item_count": self.costs.len(), "size": self.size })
    }

    fn state_features(&self, state: &SelectionState) -> Value {
        json!({ "picked": state.picked, "total_cost": state.total_cost })
    }

    fn description(&self) -> &str {
        "Pick a fixed number of distinct items with the lowest total cost."
    }
}

/// Environment over `[5, 1, 4, 2, 3]` asking for `size` picks.
///
/// The optimum for size 3 is items 1, 3, 4 with cost 6.
pub fn selection_env(size: usize) -> Env<SelectionProblem> {
    Env::new(
        SelectionProblem::new(size, vec![5.0, 1.0, 4.0, 2.0, 3.0]),
        "five_items",
        EnvOptions::default(),
    )
    .expect("empty selection is reachable")
}
