//! Greedy construction, random perturbation and swap improvement for the MKP.

use rand::Rng;

use hyperforge_core::{FnHeuristic, Heuristic, HeuristicContext, HeuristicResult, Parameters, Proposal};

use super::{MkpOperator, MkpProblem};

type Ctx<'a> = HeuristicContext<'a, MkpProblem>;

/// Adds the feasible item with the best profit per unit of scaled weight.
///
/// Weights are scaled by the remaining capacity of their resource, so
/// scarce resources count more.
pub fn greedy_by_profit_density() -> impl Heuristic<MkpProblem> {
    FnHeuristic::new("greedy_by_profit_density", propose_by_density).with_description(
        "add the feasible item with the highest profit per remaining-capacity-weighted weight (construction)",
    )
}

pub fn greedy_by_profit() -> impl Heuristic<MkpProblem> {
    FnHeuristic::new("greedy_by_profit", propose_by_profit)
        .with_description("add the feasible item with the highest profit (construction)")
}

pub fn random_add() -> impl Heuristic<MkpProblem> {
    FnHeuristic::new("random_add", propose_random_add)
        .with_description("add a random feasible item (perturbation)")
}

/// Swaps one selected item for an unselected one, taking the most
/// profitable feasible exchange.
pub fn swap_improve() -> impl Heuristic<MkpProblem> {
    FnHeuristic::new("swap_improve", propose_swap_improve).with_description(
        "exchange a selected item for an unselected one when it raises the profit (improvement)",
    )
}

fn density(problem: &MkpProblem, item: usize, remaining: &[f64]) -> f64 {
    let scaled: f64 = remaining
        .iter()
        .enumerate()
        .map(|(r, &left)| problem.weight(r, item) / left.max(f64::EPSILON))
        .sum();
    if scaled > 0.0 {
        problem.profits()[item] / scaled
    } else {
        f64::INFINITY
    }
}

fn add_best<K>(ctx: &Ctx<'_>, key: K) -> HeuristicResult<MkpOperator>
where
    K: Fn(usize) -> f64,
{
    let best = ctx
        .state_data()
        .feasible_items_to_add
        .iter()
        .copied()
        .max_by(|&a, &b| key(a).total_cmp(&key(b)).then(b.cmp(&a)));
    Ok(match best {
        Some(item) => Proposal::apply(MkpOperator::Add { item }),
        None => Proposal::decline(),
    })
}

fn propose_by_density(ctx: &Ctx<'_>, _: &Parameters) -> HeuristicResult<MkpOperator> {
    let problem = ctx.global_data();
    let remaining = &ctx.state_data().remaining_capacity;
    add_best(ctx, |item| density(problem, item, remaining))
}

fn propose_by_profit(ctx: &Ctx<'_>, _: &Parameters) -> HeuristicResult<MkpOperator> {
    let problem = ctx.global_data();
    add_best(ctx, |item| problem.profits()[item])
}

fn propose_random_add(ctx: &Ctx<'_>, _: &Parameters) -> HeuristicResult<MkpOperator> {
    let feasible = &ctx.state_data().feasible_items_to_add;
    if feasible.is_empty() {
        return Ok(Proposal::decline());
    }
    let item = feasible[ctx.rng().random_range(0..feasible.len())];
    Ok(Proposal::apply(MkpOperator::Add { item }))
}

fn propose_swap_improve(ctx: &Ctx<'_>, _: &Parameters) -> HeuristicResult<MkpOperator> {
    let problem = ctx.global_data();
    let state = ctx.state_data();
    let profits = problem.profits();

    let mut best: Option<(usize, usize, f64)> = None;
    for &removed in &state.items_in_knapsack {
        let freed: Vec<f64> = state
            .remaining_capacity
            .iter()
            .enumerate()
            .map(|(r, &left)| left + problem.weight(r, removed))
            .collect();
        for &added in &state.items_not_in_knapsack {
            let gain = profits[added] - profits[removed];
            if gain <= 0.0 || !problem.fits(added, &freed) {
                continue;
            }
            if best.map_or(true, |(_, _, g)| gain > g) {
                best = Some((removed, added, gain));
            }
        }
    }
    Ok(match best {
        Some((removed_item, added_item, _)) => Proposal::apply(MkpOperator::Swap {
            removed_item,
            added_item,
        }),
        None => Proposal::decline(),
    })
}
