//! Travelling salesman problem.
//!
//! A solution is a tour visiting a subset of nodes in order. Construction
//! grows the tour until every node appears; the objective is the length of
//! the closed tour, minimised.

mod heuristics;
mod load;


use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use hyperforge_core::{Direction, HeuristicPool, Operator, Problem};

pub use heuristics::{
    cheapest_insertion, farthest_insertion, nearest_neighbor, random_append, random_swap, two_opt,
};
pub use load::{parse_matrix, parse_tsplib};

/// A TSP instance as a square distance matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct TspProblem {
    distances: Vec<Vec<f64>>,
}

impl TspProblem {
    /// Builds an instance from a square matrix.
    ///
    /// Returns `None` if the matrix is empty or not square.
    pub fn new(distances: Vec<Vec<f64>>) -> Option<Self> {
        let n = distances.len();
        if n == 0 || distances.iter().any(|row| row.len() != n) {
            return None;
        }
        Some(Self { distances })
    }

    /// Euclidean distances between `points`.
    pub fn from_coordinates(points: &[(f64, f64)]) -> Option<Self> {
        let distances = points
            .iter()
            .map(|&(x1, y1)| {
                points
                    .iter()
                    .map(|&(x2, y2)| ((x1 - x2).powi(2) + (y1 - y2).powi(2)).sqrt())
                    .collect()
            })
            .collect();
        Self::new(distances)
    }

    pub fn node_num(&self) -> usize {
        self.distances.len()
    }

    pub fn distance(&self, from: usize, to: usize) -> f64 {
        self.distances[from][to]
    }

    pub fn distances(&self) -> &[Vec<f64>] {
        &self.distances
    }

    /// Length of the open path through `nodes`.
    pub fn path_cost(&self, nodes: &[usize]) -> f64 {
        nodes.windows(2).map(|w| self.distance(w[0], w[1])).sum()
    }

    /// Length of the closed tour through `nodes`.
    pub fn tour_cost(&self, nodes: &[usize]) -> f64 {
        match (nodes.first(), nodes.last()) {
            (Some(&first), Some(&last)) if nodes.len() > 1 => {
                self.path_cost(nodes) + self.distance(last, first)
            }
            _ => 0.0,
        }
    }

    /// All six TSP heuristics.
    pub fn heuristic_pool() -> HeuristicPool<Self> {
        HeuristicPool::new()
            .with(nearest_neighbor())
            .with(cheapest_insertion())
            .with(farthest_insertion())
            .with(random_append())
            .with(two_opt())
            .with(random_swap())
    }
}

/// Node indices in visiting order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tour(pub Vec<usize>);

impl fmt::Display for Tour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let nodes: Vec<String> = self.0.iter().map(usize::to_string).collect();
        write!(f, "tour: {}", nodes.join("->"))
    }
}

/// Tour edits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TspOperator {
    /// Appends `node` at the end of the tour.
    Append { node: usize },
    /// Inserts `node` before `position`; past the end it appends.
    Insert { node: usize, position: usize },
    /// Exchanges the positions of each pair of nodes.
    Swap { swap_node_pairs: Vec<(usize, usize)> },
    /// Reverses each inclusive position range, in order.
    ReverseSegment { segments: Vec<(usize, usize)> },
    /// Moves an already visited `node` to `position`.
    Relocate { node: usize, position: usize },
}

impl fmt::Display for TspOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TspOperator::Append { node } => write!(f, "Append(node={node})"),
            TspOperator::Insert { node, position } => {
                write!(f, "Insert(node={node}, position={position})")
            }
            TspOperator::Swap { swap_node_pairs } => write!(f, "Swap(pairs={swap_node_pairs:?})"),
            TspOperator::ReverseSegment { segments } => {
                write!(f, "ReverseSegment(segments={segments:?})")
            }
            TspOperator::Relocate { node, position } => {
                write!(f, "Relocate(node={node}, position={position})")
            }
        }
    }
}

impl Operator<Tour> for TspOperator {
    fn apply(&self, solution: &Tour) -> Tour {
        let mut tour = solution.0.clone();
        match self {
            TspOperator::Append { node } => tour.push(*node),
            TspOperator::Insert { node, position } => {
                let position = (*position).min(tour.len());
                tour.insert(position, *node);
            }
            TspOperator::Swap { swap_node_pairs } => {
                for &(a, b) in swap_node_pairs {
                    let pa = tour.iter().position(|&n| n == a);
                    let pb = tour.iter().position(|&n| n == b);
                    if let (Some(pa), Some(pb)) = (pa, pb) {
                        tour.swap(pa, pb);
                    }
                }
            }
            TspOperator::ReverseSegment { segments } => {
                for &(i, j) in segments {
                    let (start, end) = (i.min(j), i.max(j));
                    if end < tour.len() {
                        tour[start..=end].reverse();
                    }
                }
            }
            TspOperator::Relocate { node, position } => {
                if let Some(current) = tour.iter().position(|n| n == node) {
                    tour.remove(current);
                    let position = (*position).min(tour.len());
                    tour.insert(position, *node);
                }
            }
        }
        Tour(tour)
    }
}

/// Incremental view of a tour.
#[derive(Debug, Clone, PartialEq)]
pub struct TspState {
    pub visited_nodes: Vec<usize>,
    pub unvisited_nodes: Vec<usize>,
    pub visited_num: usize,
    pub unvisited_num: usize,
    /// Open path length, without the closing edge.
    pub current_cost: f64,
    /// Closed tour length.
    pub tour_cost: f64,
    pub last_visited: Option<usize>,
}

impl Problem for TspProblem {
    const NAME: &'static str = "tsp";

    type Solution = Tour;
    type Operator = TspOperator;
    type State = TspState;

    fn init_solution(&self) -> Tour {
        Tour::default()
    }

    fn state_data(&self, solution: &Tour) -> Option<TspState> {
        let n = self.node_num();
        let mut seen = vec![false; n];
        for &node in &solution.0 {
            *seen.get_mut(node)? = true;
        }
        let unvisited_nodes: Vec<usize> = (0..n).filter(|&i| !seen[i]).collect();
        Some(TspState {
            visited_nodes: solution.0.clone(),
            visited_num: solution.0.len(),
            unvisited_num: unvisited_nodes.len(),
            unvisited_nodes,
            current_cost: self.path_cost(&solution.0),
            tour_cost: self.tour_cost(&solution.0),
            last_visited: solution.0.last().copied(),
        })
    }

    fn validation_solution(&self, solution: &Tour) -> bool {
        let mut seen = vec![false; self.node_num()];
        solution.0.iter().all(|&node| match seen.get_mut(node) {
            Some(flag) if !*flag => {
                *flag = true;
                true
            }
            _ => false,
        })
    }

    fn is_complete(&self, state: &TspState) -> bool {
        state.unvisited_num == 0
    }

    fn key_item(&self) -> &'static str {
        "tour_cost"
    }

    fn key_value(&self, state: &TspState) -> f64 {
        state.tour_cost
    }

    fn direction(&self) -> Direction {
        Direction::Minimize
    }

    fn construction_steps(&self) -> usize {
        self.node_num()
    }

    fn global_features(&self) -> Value {
        let n = self.node_num();
        let off_diagonal: Vec<f64> = (0..n)
            .flat_map(|i| (0..n).filter(move |&j| j != i).map(move |j| (i, j)))
            .map(|(i, j)| self.distance(i, j))
            .collect();
        let (min, max, mean) = summary(&off_diagonal);
        json!({
            "node_num": n,
            "min_distance": min,
            "max_distance": max,
            "average_distance": mean,
        })
    }

    fn state_features(&self, state: &TspState) -> Value {
        json!({
            "visited_num": state.visited_num,
            "unvisited_num": state.unvisited_num,
            "current_cost": state.current_cost,
            "tour_cost": state.tour_cost,
            "last_visited": state.last_visited,
        })
    }

    fn description(&self) -> &str {
        "Traveling Salesman Problem: visit every node exactly once and return to the start, \
         minimising the total travelled distance."
    }
}

fn summary(values: &[f64]) -> (f64, f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0, 0.0);
    }
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    (min, max, mean)
}
