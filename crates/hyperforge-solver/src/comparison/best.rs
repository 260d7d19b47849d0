//! Best result bookkeeping for candidate comparison.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use hyperforge_core::{Direction, Env, Problem};

/// File written into the persistence directory on every improvement.
pub const BEST_RESULT_FILE: &str = "best_result.json";

/// The best complete solution seen so far and where it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestResult<S> {
    pub value: f64,
    pub solution: S,
    pub heuristic: String,
}

/// Tracks the best rollout result across comparisons.
///
/// Owned by a single aggregator; workers never touch it. Improvements are
/// judged with the problem's [`Direction`], which is what `Env::compare`
/// uses.
#[derive(Debug, Clone)]
pub struct BestResultTracker<S> {
    direction: Direction,
    best: Option<BestResult<S>>,
    persist_dir: Option<PathBuf>,
}

impl<S> BestResultTracker<S> {
    pub fn new(direction: Direction) -> Self {
        Self {
            direction,
            best: None,
            persist_dir: None,
        }
    }

    /// Also writes every improvement to `<dir>/best_result.json`.
    pub fn with_persist_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.persist_dir = Some(dir.into());
        self
    }

    pub fn best(&self) -> Option<&BestResult<S>> {
        self.best.as_ref()
    }

    pub fn best_value(&self) -> Option<f64> {
        self.best.as_ref().map(|b| b.value)
    }

    pub fn into_best(self) -> Option<BestResult<S>> {
        self.best
    }
}

impl<P: Problem> From<&Env<P>> for BestResultTracker<P::Solution> {
    fn from(env: &Env<P>) -> Self {
        Self::new(env.problem().direction())
    }
}

impl<S: Clone + Serialize> BestResultTracker<S> {
    /// Records `value` if it beats the current best. Returns whether it did.
    ///
    /// Persistence failures are logged and do not affect the result.
    pub fn offer(&mut self, value: f64, solution: &S, heuristic: &str) -> bool {
        let improved = match &self.best {
            None => true,
            Some(best) => self.direction.is_better(value, best.value),
        };
        if !improved {
            return false;
        }

        info!(
            event = "new_best",
            heuristic = heuristic,
            value = value,
            previous = ?self.best_value(),
        );
        let best = BestResult {
            value,
            solution: solution.clone(),
            heuristic: heuristic.to_string(),
        };
        if let Some(dir) = &self.persist_dir {
            if let Err(e) = persist(dir, &best) {
                warn!(event = "persist_failed", dir = %dir.display(), error = %e);
            }
        }
        self.best = Some(best);
        true
    }
}

fn persist<S: Serialize>(dir: &Path, best: &BestResult<S>) -> std::io::Result<()> {
    fs::create_dir_all(dir)?;
    let json = serde_json::to_string_pretty(best)?;
    fs::write(dir.join(BEST_RESULT_FILE), json)
}
