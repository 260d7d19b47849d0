//! Monte-Carlo rollout comparison of candidate heuristics.
//!
//! Every candidate runs on its own fork of the environment for a short
//! interval, then a batch of random rollouts estimates how good the
//! resulting state is. Candidates are evaluated in parallel; results flow
//! back over a channel to the calling thread, which alone updates the
//! [`BestResultTracker`].

mod best;


use std::fmt;
use std::sync::Arc;

use crossbeam::channel;
use rand::Rng;
use rayon::prelude::*;
use tracing::debug;

use hyperforge_config::RolloutConfig;
use hyperforge_core::{
    mix_seed, Env, Heuristic, HeuristicPool, Parameters, Problem, SnapshotOf, StepOutcome,
};

use crate::error::ComparisonError;
use crate::policy::{HyperHeuristic, RandomHyperHeuristic};

pub use best::{BestResult, BestResultTracker, BEST_RESULT_FILE};

/// Outcome of evaluating one candidate heuristic.
pub struct Evaluation<P: Problem> {
    pub heuristic: String,
    /// Key values of the rollouts that ended complete and valid.
    pub scores: Vec<f64>,
    /// Number of rollouts started.
    pub rollouts: usize,
    /// Environment right after the candidate's interval.
    pub env: Env<P>,
    /// Operators the candidate applied during its interval.
    pub operators: Vec<P::Operator>,
    /// Best complete rollout, by the problem's direction.
    pub best: Option<(f64, P::Solution)>,
}

impl<P: Problem> Evaluation<P> {
    /// Mean rollout score, `None` without samples.
    pub fn mean_score(&self) -> Option<f64> {
        if self.scores.is_empty() {
            None
        } else {
            Some(self.scores.iter().sum::<f64>() / self.scores.len() as f64)
        }
    }

    pub fn completed(&self) -> usize {
        self.scores.len()
    }
}

impl<P: Problem> fmt::Debug for Evaluation<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Evaluation")
            .field("heuristic", &self.heuristic)
            .field("scores", &self.scores)
            .field("rollouts", &self.rollouts)
            .field("operators", &self.operators)
            .finish()
    }
}

/// Evaluates `heuristic` from `snapshot`.
///
/// The candidate runs for `search_interval` steps, or until it stops
/// applying operators. Then `search_time` rollouts, each driven by a
/// [`RandomHyperHeuristic`] over `running_pool` with its own seed, continue
/// from copies of the resulting state. Only rollouts ending complete and
/// valid contribute a score. `seed` drives the candidate's interval and,
/// mixed per rollout, every rollout.
pub fn evaluate_heuristic<P: Problem>(
    template: &Env<P>,
    snapshot: &SnapshotOf<P>,
    heuristic: &dyn Heuristic<P>,
    running_pool: &HeuristicPool<P>,
    config: &RolloutConfig,
    seed: u64,
) -> Result<Evaluation<P>, ComparisonError> {
    let mut env = template.fork(snapshot)?;
    env.reseed(seed);
    let params = Parameters::new();
    let mut operators = Vec::new();
    for _ in 0..config.search_interval {
        if let StepOutcome::Applied(op) = env.run_heuristic(heuristic, &params) {
            operators.push(op);
        }
        if !env.continue_run() {
            break;
        }
    }

    let start = &env;
    let samples: Vec<Option<(f64, P::Solution)>> = (0..config.search_time)
        .into_par_iter()
        .map(|i| {
            let mut rollout = start.clone();
            let mut policy =
                RandomHyperHeuristic::new(running_pool.clone()).with_seed(mix_seed(seed, i as u64));
            if policy.run(&mut rollout, config.max_steps) {
                Some((rollout.key_value(), rollout.current_solution().clone()))
            } else {
                None
            }
        })
        .collect();

    let direction = template.problem().direction();
    let mut scores = Vec::with_capacity(samples.len());
    let mut best: Option<(f64, P::Solution)> = None;
    for (value, solution) in samples.into_iter().flatten() {
        scores.push(value);
        let improves = match &best {
            None => true,
            Some((b, _)) => direction.is_better(value, *b),
        };
        if improves {
            best = Some((value, solution));
        }
    }

    let evaluation = Evaluation {
        heuristic: heuristic.name().to_string(),
        scores,
        rollouts: config.search_time,
        env,
        operators,
        best,
    };
    debug!(
        event = "evaluation",
        heuristic = %evaluation.heuristic,
        rollouts = evaluation.rollouts,
        completed = evaluation.completed(),
        mean = ?evaluation.mean_score(),
    );
    Ok(evaluation)
}

/// Evaluates every candidate in parallel from the current state of `env`.
///
/// Runs on a rayon pool of `config.threads` workers (0 picks the default).
/// Evaluations are returned in completion order; `tracker` is offered each
/// candidate's best rollout as it arrives. Every submitted evaluation runs
/// to completion; the first error, if any, is returned afterwards.
pub fn compare_heuristics<P: Problem>(
    env: &Env<P>,
    candidates: &[Arc<dyn Heuristic<P>>],
    running_pool: &HeuristicPool<P>,
    config: &RolloutConfig,
    tracker: &mut BestResultTracker<P::Solution>,
) -> Result<Vec<Evaluation<P>>, ComparisonError> {
    if candidates.is_empty() {
        return Err(ComparisonError::NoCandidates);
    }
    let snapshot = env.snapshot();
    let base_seed = config.seed.unwrap_or_else(|| rand::rng().random());
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.threads)
        .build()?;

    let (sender, receiver) = channel::unbounded();
    let mut evaluations = Vec::with_capacity(candidates.len());
    let mut first_error = None;

    pool.in_place_scope(|scope| {
        for (index, candidate) in candidates.iter().enumerate() {
            let sender = sender.clone();
            let snapshot = &snapshot;
            scope.spawn(move |_| {
                let seed = mix_seed(base_seed, index as u64);
                let result =
                    evaluate_heuristic(env, snapshot, candidate.as_ref(), running_pool, config, seed);
                let _ = sender.send(result);
            });
        }
        drop(sender);

        for result in receiver.iter() {
            match result {
                Ok(evaluation) => {
                    if let Some((value, solution)) = &evaluation.best {
                        tracker.offer(*value, solution, &evaluation.heuristic);
                    }
                    evaluations.push(evaluation);
                }
                Err(e) => {
                    first_error.get_or_insert(e);
                }
            }
        }
    });

    match first_error {
        Some(e) => Err(e),
        None => Ok(evaluations),
    }
}

/// Picks the candidate with the best mean rollout score.
///
/// Candidates without samples rank last; ties go to the earlier candidate.
/// Returns `None` only for an empty candidate list.
pub fn tts_bon<P: Problem>(
    env: &Env<P>,
    candidates: &[Arc<dyn Heuristic<P>>],
    running_pool: &HeuristicPool<P>,
    config: &RolloutConfig,
) -> Result<Option<String>, ComparisonError> {
    if candidates.is_empty() {
        return Ok(None);
    }
    let mut tracker = BestResultTracker::from(env);
    if let Some(dir) = &config.persist_dir {
        tracker = tracker.with_persist_dir(dir);
    }
    let evaluations = compare_heuristics(env, candidates, running_pool, config, &mut tracker)?;

    let names: Vec<&str> = candidates.iter().map(|c| c.name()).collect();
    Ok(rank_by_mean(env, &names, &evaluations).map(str::to_string))
}

fn rank_by_mean<'a, P: Problem>(
    env: &Env<P>,
    names: &[&'a str],
    evaluations: &[Evaluation<P>],
) -> Option<&'a str> {
    let mut best: Option<(&str, f64)> = None;
    for &name in names {
        let mean = evaluations
            .iter()
            .find(|e| e.heuristic == name)
            .and_then(Evaluation::mean_score);
        let Some(mean) = mean else {
            continue;
        };
        let improves = match best {
            None => true,
            Some((_, b)) => env.compare(mean, b) > 0.0,
        };
        if improves {
            best = Some((name, mean));
        }
    }
    best.map(|(name, _)| name).or_else(|| names.first().copied())
}
