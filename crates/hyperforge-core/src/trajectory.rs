//! Trajectory recording and the tab-separated trajectory table.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{EnvError, Result};

/// Header line of the trajectory table in the result artifact.
pub const TRAJECTORY_HEADER: &str = "operation_id\theuristic\toperator\tsolution";

/// Marker line introducing the trajectory section of a result artifact.
pub const TRAJECTORY_MARKER: &str = "-trajectory:";

/// One applied step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryEntry<O> {
    pub operation_id: usize,
    pub heuristic: String,
    pub operator: O,
    /// `Display` of the solution after the step.
    pub solution: String,
}

/// Append-only log of applied steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Trajectory<O> {
    entries: Vec<TrajectoryEntry<O>>,
}

impl<O> Trajectory<O> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn from_entries(entries: Vec<TrajectoryEntry<O>>) -> Self {
        Self { entries }
    }

    /// Appends an entry, numbering it after the current last one.
    pub fn record(&mut self, heuristic: &str, operator: O, solution: String) {
        let operation_id = self.entries.len();
        self.entries.push(TrajectoryEntry {
            operation_id,
            heuristic: heuristic.to_string(),
            operator,
            solution,
        });
    }

    pub fn entries(&self) -> &[TrajectoryEntry<O>] {
        &self.entries
    }

    /// The last `n` entries, oldest first.
    pub fn recent(&self, n: usize) -> &[TrajectoryEntry<O>] {
        let start = self.entries.len().saturating_sub(n);
        &self.entries[start..]
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TrajectoryEntry<O>> {
        self.entries.iter()
    }
}

impl<O> Default for Trajectory<O> {
    fn default() -> Self {
        Self::new()
    }
}

impl<O: Serialize> Trajectory<O> {
    /// Renders the header and one row per entry, operators as JSON.
    pub fn to_table(&self) -> Result<String> {
        let mut table = String::from(TRAJECTORY_HEADER);
        table.push('\n');
        for entry in &self.entries {
            let operator = serde_json::to_string(&entry.operator)?;
            table.push_str(&format!(
                "{}\t{}\t{}\t{}\n",
                entry.operation_id,
                single_line(&entry.heuristic),
                operator,
                single_line(&entry.solution)
            ));
        }
        Ok(table)
    }
}

fn single_line(text: &str) -> String {
    text.replace(['\t', '\n', '\r'], " ")
}

/// Reads trajectory rows back from a result artifact or a bare table.
///
/// Everything before the header line (and the `-trajectory:` marker) is
/// skipped, so the full artifact text can be passed in.
pub fn parse_trajectory<O: DeserializeOwned>(text: &str) -> Result<Vec<TrajectoryEntry<O>>> {
    let mut lines = text.lines();
    if !lines.by_ref().any(|line| line.trim_end() == TRAJECTORY_HEADER) {
        return Err(EnvError::Parse("missing trajectory header".to_string()));
    }

    let mut entries = Vec::new();
    for (row, line) in lines.enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let mut fields = line.splitn(4, '\t');
        let (Some(id), Some(heuristic), Some(operator), Some(solution)) =
            (fields.next(), fields.next(), fields.next(), fields.next())
        else {
            return Err(EnvError::Parse(format!(
                "trajectory row {row} has fewer than 4 columns"
            )));
        };
        let operation_id = id
            .trim()
            .parse()
            .map_err(|e| EnvError::Parse(format!("trajectory row {row}: bad operation_id: {e}")))?;
        entries.push(TrajectoryEntry {
            operation_id,
            heuristic: heuristic.to_string(),
            operator: serde_json::from_str(operator)?,
            solution: solution.to_string(),
        });
    }
    Ok(entries)
}
