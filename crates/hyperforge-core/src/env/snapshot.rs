//! Serializable environment snapshots used to fork and roll back runs.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::{Env, EnvOptions};
use crate::error::{EnvError, Result};
use crate::heuristic::AlgorithmData;
use crate::problem::Problem;
use crate::trajectory::{Trajectory, TrajectoryEntry};

/// The mutable part of an environment as a plain value.
///
/// Instance data is not included; forks share it through `Arc`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvSnapshot<S, O> {
    pub solution: S,
    pub algorithm_data: AlgorithmData,
    pub trajectory: Vec<TrajectoryEntry<O>>,
    pub step_count: usize,
    pub continue_run: bool,
}

/// Snapshot type of problem `P`.
pub type SnapshotOf<P> = EnvSnapshot<<P as Problem>::Solution, <P as Problem>::Operator>;

impl<S, O> EnvSnapshot<S, O>
where
    S: Serialize + DeserializeOwned,
    O: Serialize + DeserializeOwned,
{
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl<P: Problem> Env<P> {
    /// Captures the current run state.
    pub fn snapshot(&self) -> SnapshotOf<P> {
        EnvSnapshot {
            solution: self.current_solution.clone(),
            algorithm_data: self.algorithm_data.clone(),
            trajectory: self.trajectory.entries().to_vec(),
            step_count: self.step_count,
            continue_run: self.continue_run,
        }
    }

    /// Builds an independent environment positioned at `snapshot`.
    pub fn from_snapshot(
        problem: Arc<P>,
        instance_name: impl Into<String>,
        options: EnvOptions,
        snapshot: &SnapshotOf<P>,
    ) -> Result<Self> {
        let mut env = Self::from_shared(problem, instance_name, options)?;
        env.restore(snapshot)?;
        Ok(env)
    }

    /// A fork of this environment at `snapshot`, sharing instance data.
    pub fn fork(&self, snapshot: &SnapshotOf<P>) -> Result<Self> {
        let mut env = self.clone();
        env.restore(snapshot)?;
        Ok(env)
    }

    /// Moves this environment to `snapshot`.
    ///
    /// The start instant and the heuristic random stream are kept, so
    /// elapsed time still counts from the start of the run.
    ///
    /// Fails with [`EnvError::UnreachableState`] if the snapshot's solution
    /// has no state data; the environment is unchanged in that case.
    pub fn restore(&mut self, snapshot: &SnapshotOf<P>) -> Result<()> {
        let state = self
            .problem
            .state_data(&snapshot.solution)
            .ok_or_else(|| EnvError::UnreachableState {
                operator: "restore".to_string(),
            })?;
        self.current_solution = snapshot.solution.clone();
        self.state_data = state;
        self.algorithm_data = snapshot.algorithm_data.clone();
        self.trajectory = Trajectory::from_entries(snapshot.trajectory.clone());
        self.step_count = snapshot.step_count;
        self.continue_run = snapshot.continue_run;
        Ok(())
    }
}
