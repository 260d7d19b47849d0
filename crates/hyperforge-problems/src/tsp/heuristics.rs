//! Construction, improvement and perturbation heuristics for the TSP.

use rand::Rng;

use hyperforge_core::{
    param_usize, FnHeuristic, Heuristic, HeuristicContext, HeuristicError, HeuristicResult,
    Operator, Parameters, Proposal,
};

use super::{TspOperator, TspProblem};

type Ctx<'a> = HeuristicContext<'a, TspProblem>;

const EPSILON: f64 = 1e-9;

/// Appends the unvisited node closest to the last visited one.
///
/// An empty tour starts at `start_node` (default 0).
pub fn nearest_neighbor() -> impl Heuristic<TspProblem> {
    FnHeuristic::new("nearest_neighbor", propose_nearest_neighbor).with_description(
        "append the unvisited node nearest to the last visited node (construction)",
    )
}

/// Inserts the unvisited node and position that lengthen the tour least.
pub fn cheapest_insertion() -> impl Heuristic<TspProblem> {
    FnHeuristic::new("cheapest_insertion", propose_cheapest_insertion).with_description(
        "insert the unvisited node at the position that increases the tour cost least (construction)",
    )
}

/// Inserts the unvisited node farthest from the tour at its cheapest position.
pub fn farthest_insertion() -> impl Heuristic<TspProblem> {
    FnHeuristic::new("farthest_insertion", propose_farthest_insertion).with_description(
        "insert the unvisited node farthest from the tour at its cheapest position (construction)",
    )
}

pub fn random_append() -> impl Heuristic<TspProblem> {
    FnHeuristic::new("random_append", propose_random_append)
        .with_description("append a random unvisited node (perturbation)")
}

/// Reverses the segment with the best 2-opt gain on a complete tour.
pub fn two_opt() -> impl Heuristic<TspProblem> {
    FnHeuristic::new("two_opt", propose_two_opt).with_description(
        "reverse the tour segment that shortens the complete tour most (improvement)",
    )
}

pub fn random_swap() -> impl Heuristic<TspProblem> {
    FnHeuristic::new("random_swap", propose_random_swap)
        .with_description("swap two random nodes of the tour (perturbation)")
}

fn start(ctx: &Ctx<'_>, params: &Parameters) -> HeuristicResult<TspOperator> {
    let node = param_usize(params, "start_node")?.unwrap_or(0);
    if node >= ctx.global_data().node_num() {
        return Err(HeuristicError::InvalidParameter {
            name: "start_node".to_string(),
            reason: format!("node {node} out of range"),
        });
    }
    Ok(Proposal::apply(TspOperator::Append { node }))
}

fn propose_nearest_neighbor(ctx: &Ctx<'_>, params: &Parameters) -> HeuristicResult<TspOperator> {
    let problem = ctx.global_data();
    let state = ctx.state_data();
    let Some(last) = state.last_visited else {
        return start(ctx, params);
    };
    let nearest = state
        .unvisited_nodes
        .iter()
        .copied()
        .min_by(|&a, &b| problem.distance(last, a).total_cmp(&problem.distance(last, b)));
    Ok(match nearest {
        Some(node) => Proposal::apply(TspOperator::Append { node }),
        None => Proposal::decline(),
    })
}

/// Cheapest position for `node` in the closed tour, with its added cost.
fn best_position(problem: &TspProblem, tour: &[usize], node: usize) -> (usize, f64) {
    let len = tour.len();
    let mut best = (len, f64::INFINITY);
    for position in 0..len {
        let prev = tour[(position + len - 1) % len];
        let next = tour[position];
        let delta = problem.distance(prev, node) + problem.distance(node, next)
            - problem.distance(prev, next);
        if delta < best.1 {
            best = (position, delta);
        }
    }
    best
}

fn propose_cheapest_insertion(ctx: &Ctx<'_>, params: &Parameters) -> HeuristicResult<TspOperator> {
    let problem = ctx.global_data();
    let state = ctx.state_data();
    if state.visited_nodes.is_empty() {
        return start(ctx, params);
    }
    let mut best: Option<(usize, usize, f64)> = None;
    for &node in &state.unvisited_nodes {
        let (position, delta) = best_position(problem, &state.visited_nodes, node);
        if best.map_or(true, |(_, _, d)| delta < d) {
            best = Some((node, position, delta));
        }
    }
    Ok(match best {
        Some((node, position, _)) => Proposal::apply(TspOperator::Insert { node, position }),
        None => Proposal::decline(),
    })
}

fn propose_farthest_insertion(ctx: &Ctx<'_>, params: &Parameters) -> HeuristicResult<TspOperator> {
    let problem = ctx.global_data();
    let state = ctx.state_data();
    if state.visited_nodes.is_empty() {
        return start(ctx, params);
    }
    let distance_to_tour = |node: usize| {
        state
            .visited_nodes
            .iter()
            .map(|&v| problem.distance(v, node))
            .fold(f64::INFINITY, f64::min)
    };
    let farthest = state
        .unvisited_nodes
        .iter()
        .copied()
        .max_by(|&a, &b| distance_to_tour(a).total_cmp(&distance_to_tour(b)));
    Ok(match farthest {
        Some(node) => {
            let (position, _) = best_position(problem, &state.visited_nodes, node);
            Proposal::apply(TspOperator::Insert { node, position })
        }
        None => Proposal::decline(),
    })
}

fn propose_random_append(ctx: &Ctx<'_>, _: &Parameters) -> HeuristicResult<TspOperator> {
    let unvisited = &ctx.state_data().unvisited_nodes;
    if unvisited.is_empty() {
        return Ok(Proposal::decline());
    }
    let node = unvisited[ctx.rng().random_range(0..unvisited.len())];
    Ok(Proposal::apply(TspOperator::Append { node }))
}

fn propose_two_opt(ctx: &Ctx<'_>, _: &Parameters) -> HeuristicResult<TspOperator> {
    let problem = ctx.global_data();
    let state = ctx.state_data();
    let tour = &state.visited_nodes;
    let n = tour.len();
    if state.unvisited_num > 0 || n < 4 {
        return Ok(Proposal::decline());
    }

    let d = |a: usize, b: usize| problem.distance(tour[a], tour[b]);
    let mut best: Option<(usize, usize, f64)> = None;
    for i in 1..n - 1 {
        for j in i + 1..n {
            let next = (j + 1) % n;
            let delta = d(i - 1, j) + d(i, next) - d(i - 1, i) - d(j, next);
            if delta < -EPSILON && best.map_or(true, |(_, _, b)| delta < b) {
                best = Some((i, j, delta));
            }
        }
    }
    let Some((i, j, _)) = best else {
        return Ok(Proposal::decline());
    };

    // The gain assumes symmetric distances; confirm it on the real tour.
    let operator = TspOperator::ReverseSegment {
        segments: vec![(i, j)],
    };
    let candidate = operator.apply(ctx.current_solution());
    match ctx.evaluate(&candidate) {
        Some(cost) if cost < state.tour_cost - EPSILON => Ok(Proposal::apply(operator)),
        _ => Ok(Proposal::decline()),
    }
}

fn propose_random_swap(ctx: &Ctx<'_>, _: &Parameters) -> HeuristicResult<TspOperator> {
    let tour = &ctx.state_data().visited_nodes;
    if tour.len() < 2 {
        return Ok(Proposal::decline());
    }
    let mut rng = ctx.rng();
    let a = rng.random_range(0..tour.len());
    let mut b = rng.random_range(0..tour.len() - 1);
    if b >= a {
        b += 1;
    }
    Ok(Proposal::apply(TspOperator::Swap {
        swap_node_pairs: vec![(tour[a], tour[b])],
    }))
}
