//! Scripted heuristics for [`SelectionProblem`].

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use hyperforge_core::{
    FnHeuristic, Heuristic, HeuristicContext, HeuristicError, HeuristicResult, Parameters,
    Problem, Proposal,
};

use crate::selection::{SelectionOperator, SelectionProblem};

type Ctx<'a> = HeuristicContext<'a, SelectionProblem>;

/// Picks the cheapest unpicked item; declines once complete.
pub fn greedy() -> impl Heuristic<SelectionProblem> {
    FnHeuristic::new("greedy", |ctx: &Ctx<'_>, _: &Parameters| {
        let problem = ctx.global_data();
        if problem.is_complete(ctx.state_data()) {
            return Ok(Proposal::decline());
        }
        let item = ctx
            .state_data()
            .unpicked
            .iter()
            .copied()
            .min_by(|a, b| problem.costs[*a].total_cmp(&problem.costs[*b]));
        Ok(match item {
            Some(item) => Proposal::apply(SelectionOperator::Pick { item }),
            None => Proposal::decline(),
        })
    })
    .with_description("pick the cheapest unpicked item")
}

/// Picks the first unpicked item by index; declines once complete.
pub fn first_fit() -> impl Heuristic<SelectionProblem> {
    FnHeuristic::new("first_fit", |ctx: &Ctx<'_>, _: &Parameters| {
        if ctx.global_data().is_complete(ctx.state_data()) {
            return Ok(Proposal::decline());
        }
        Ok(match ctx.state_data().unpicked.first() {
            Some(&item) => Proposal::apply(SelectionOperator::Pick { item }),
            None => Proposal::decline(),
        })
    })
    .with_description("pick the lowest-index unpicked item")
}

/// Removes the last pick; declines when nothing is picked.
pub fn unpick() -> impl Heuristic<SelectionProblem> {
    FnHeuristic::new("unpick", |ctx: &Ctx<'_>, _: &Parameters| {
        Ok(if ctx.current_solution().0.is_empty() {
            Proposal::decline()
        } else {
            Proposal::apply(SelectionOperator::Unpick)
        })
    })
    .with_description("drop the last picked item")
}

/// Always proposes a rotation; never declines and never completes.
pub fn stall() -> impl Heuristic<SelectionProblem> {
    FnHeuristic::new("stall", |_: &Ctx<'_>, _: &Parameters| {
        Ok(Proposal::apply(SelectionOperator::Rotate))
    })
}

pub fn decline() -> impl Heuristic<SelectionProblem> {
    FnHeuristic::new("decline", |_: &Ctx<'_>, _: &Parameters| Ok(Proposal::decline()))
}

pub fn fail() -> impl Heuristic<SelectionProblem> {
    FnHeuristic::new("fail", |_: &Ctx<'_>, _: &Parameters| {
        Err(HeuristicError::Failed("scripted failure".to_string()))
    })
}

pub fn explode() -> impl Heuristic<SelectionProblem> {
    FnHeuristic::new(
        "explode",
        |_: &Ctx<'_>, _: &Parameters| -> HeuristicResult<SelectionOperator> {
            panic!("scripted panic")
        },
    )
}

/// Fills the selection on even global calls and declines on odd ones.
///
/// Calls are counted in `calls`, shared across clones and threads.
pub fn alternating_fill(calls: Arc<AtomicUsize>) -> impl Heuristic<SelectionProblem> {
    FnHeuristic::new("alternating_fill", move |ctx: &Ctx<'_>, _: &Parameters| {
        let call = calls.fetch_add(1, Ordering::SeqCst);
        Ok(if call % 2 == 0 {
            Proposal::apply(SelectionOperator::Fill {
                size: ctx.global_data().size,
            })
        } else {
            Proposal::decline()
        })
    })
}

/// Wraps a heuristic and counts its invocations.
pub struct Counting {
    inner: Arc<dyn Heuristic<SelectionProblem>>,
    calls: Arc<AtomicUsize>,
}

impl Counting {
    pub fn new<H: Heuristic<SelectionProblem> + 'static>(inner: H) -> Self {
        Self {
            inner: Arc::new(inner),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Shared handle to the call counter.
    pub fn counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Heuristic<SelectionProblem> for Counting {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn description(&self) -> &str {
        self.inner.description()
    }

    fn propose(&self, ctx: &Ctx<'_>, params: &Parameters) -> HeuristicResult<SelectionOperator> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.propose(ctx, params)
    }
}
