//! Multidimensional knapsack problem.
//!
//! Items carry a profit and one weight per resource. A selection is feasible
//! while every resource load stays within its capacity; construction adds
//! items until none fits any more. Total profit is maximised.

mod heuristics;
mod load;

#[cfg(test)]
mod tests;

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use hyperforge_core::{Direction, HeuristicPool, Operator, Problem};

pub use heuristics::{greedy_by_profit, greedy_by_profit_density, random_add, swap_improve};
pub use load::parse_orlib;

/// An MKP instance. `weights[resource][item]`.
#[derive(Debug, Clone, PartialEq)]
pub struct MkpProblem {
    profits: Vec<f64>,
    weights: Vec<Vec<f64>>,
    capacities: Vec<f64>,
}

impl MkpProblem {
    /// Builds an instance, checking that dimensions agree.
    pub fn new(profits: Vec<f64>, weights: Vec<Vec<f64>>, capacities: Vec<f64>) -> Result<Self, String> {
        if profits.is_empty() {
            return Err("instance has no items".to_string());
        }
        if weights.len() != capacities.len() {
            return Err(format!(
                "{} weight rows for {} capacities",
                weights.len(),
                capacities.len()
            ));
        }
        if let Some(row) = weights.iter().position(|row| row.len() != profits.len()) {
            return Err(format!(
                "weight row {row} has {} entries for {} items",
                weights[row].len(),
                profits.len()
            ));
        }
        Ok(Self {
            profits,
            weights,
            capacities,
        })
    }

    pub fn item_num(&self) -> usize {
        self.profits.len()
    }

    pub fn resource_num(&self) -> usize {
        self.capacities.len()
    }

    pub fn profits(&self) -> &[f64] {
        &self.profits
    }

    pub fn weights(&self) -> &[Vec<f64>] {
        &self.weights
    }

    pub fn capacities(&self) -> &[f64] {
        &self.capacities
    }

    pub fn weight(&self, resource: usize, item: usize) -> f64 {
        self.weights[resource][item]
    }

    /// True if `item` fits into `remaining` on every resource.
    pub fn fits(&self, item: usize, remaining: &[f64]) -> bool {
        remaining
            .iter()
            .enumerate()
            .all(|(r, &left)| self.weight(r, item) <= left)
    }

    /// All four MKP heuristics.
    pub fn heuristic_pool() -> HeuristicPool<Self> {
        HeuristicPool::new()
            .with(greedy_by_profit_density())
            .with(greedy_by_profit())
            .with(random_add())
            .with(swap_improve())
    }
}

/// Inclusion flag per item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection(pub Vec<bool>);

impl Selection {
    pub fn empty(item_num: usize) -> Self {
        Self(vec![false; item_num])
    }

    pub fn contains(&self, item: usize) -> bool {
        self.0.get(item).copied().unwrap_or(false)
    }

    pub fn items(&self) -> impl Iterator<Item = usize> + '_ {
        self.0.iter().enumerate().filter(|&(_, &x)| x).map(|(i, _)| i)
    }

    /// Out-of-range items grow the vector by one, leaving a selection no
    /// instance accepts.
    fn set(&mut self, item: usize, value: bool) {
        match self.0.get_mut(item) {
            Some(flag) => *flag = value,
            None => self.0.push(value),
        }
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let items: Vec<String> = self.items().map(|i| i.to_string()).collect();
        write!(f, "selected: [{}]", items.join(", "))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum MkpOperator {
    Add { item: usize },
    Remove { item: usize },
    Swap { removed_item: usize, added_item: usize },
    Flip { item: usize },
}

impl fmt::Display for MkpOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MkpOperator::Add { item } => write!(f, "Add(item={item})"),
            MkpOperator::Remove { item } => write!(f, "Remove(item={item})"),
            MkpOperator::Swap {
                removed_item,
                added_item,
            } => write!(f, "Swap(removed_item={removed_item}, added_item={added_item})"),
            MkpOperator::Flip { item } => write!(f, "Flip(item={item})"),
        }
    }
}

impl Operator<Selection> for MkpOperator {
    fn apply(&self, solution: &Selection) -> Selection {
        let mut selection = solution.clone();
        match *self {
            MkpOperator::Add { item } => selection.set(item, true),
            MkpOperator::Remove { item } => selection.set(item, false),
            MkpOperator::Swap {
                removed_item,
                added_item,
            } => {
                selection.set(removed_item, false);
                selection.set(added_item, true);
            }
            MkpOperator::Flip { item } => {
                let flipped = !selection.contains(item);
                selection.set(item, flipped);
            }
        }
        selection
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MkpState {
    pub current_profit: f64,
    /// Load per resource.
    pub current_weights: Vec<f64>,
    /// Capacity left per resource; negative when overloaded.
    pub remaining_capacity: Vec<f64>,
    pub items_in_knapsack: Vec<usize>,
    pub items_not_in_knapsack: Vec<usize>,
    /// Unselected items that fit into the remaining capacity.
    pub feasible_items_to_add: Vec<usize>,
}

impl Problem for MkpProblem {
    const NAME: &'static str = "mkp";

    type Solution = Selection;
    type Operator = MkpOperator;
    type State = MkpState;

    fn init_solution(&self) -> Selection {
        Selection::empty(self.item_num())
    }

    fn state_data(&self, solution: &Selection) -> Option<MkpState> {
        if solution.0.len() != self.item_num() {
            return None;
        }
        let (items_in_knapsack, items_not_in_knapsack): (Vec<usize>, Vec<usize>) =
            (0..self.item_num()).partition(|&i| solution.0[i]);
        let current_profit = items_in_knapsack.iter().map(|&i| self.profits[i]).sum();
        let current_weights: Vec<f64> = self
            .weights
            .iter()
            .map(|row| items_in_knapsack.iter().map(|&i| row[i]).sum())
            .collect();
        let remaining_capacity: Vec<f64> = self
            .capacities
            .iter()
            .zip(&current_weights)
            .map(|(capacity, load)| capacity - load)
            .collect();
        let feasible_items_to_add = items_not_in_knapsack
            .iter()
            .copied()
            .filter(|&i| self.fits(i, &remaining_capacity))
            .collect();
        Some(MkpState {
            current_profit,
            current_weights,
            remaining_capacity,
            items_in_knapsack,
            items_not_in_knapsack,
            feasible_items_to_add,
        })
    }

    fn validation_solution(&self, solution: &Selection) -> bool {
        match self.state_data(solution) {
            Some(state) => state.remaining_capacity.iter().all(|&left| left >= 0.0),
            None => false,
        }
    }

    fn is_complete(&self, state: &MkpState) -> bool {
        state.feasible_items_to_add.is_empty()
    }

    fn key_item(&self) -> &'static str {
        "current_profit"
    }

    fn key_value(&self, state: &MkpState) -> f64 {
        state.current_profit
    }

    fn direction(&self) -> Direction {
        Direction::Maximize
    }

    fn construction_steps(&self) -> usize {
        self.item_num()
    }

    fn global_features(&self) -> Value {
        let total_profit: f64 = self.profits.iter().sum();
        let tightness: Vec<f64> = self
            .weights
            .iter()
            .zip(&self.capacities)
            .map(|(row, &capacity)| {
                let total: f64 = row.iter().sum();
                if total > 0.0 {
                    capacity / total
                } else {
                    1.0
                }
            })
            .collect();
        json!({
            "item_num": self.item_num(),
            "resource_num": self.resource_num(),
            "total_profit": total_profit,
            "average_profit": total_profit / self.item_num() as f64,
            "capacity_tightness": tightness,
        })
    }

    fn state_features(&self, state: &MkpState) -> Value {
        let utilization: Vec<f64> = state
            .current_weights
            .iter()
            .zip(&self.capacities)
            .map(|(&load, &capacity)| if capacity > 0.0 { load / capacity } else { 0.0 })
            .collect();
        json!({
            "current_profit": state.current_profit,
            "items_in_knapsack": state.items_in_knapsack.len(),
            "feasible_items_to_add": state.feasible_items_to_add.len(),
            "resource_utilization": utilization,
        })
    }

    fn description(&self) -> &str {
        "Multidimensional Knapsack Problem: choose items maximising total profit while the \
         load on every resource stays within its capacity."
    }
}
