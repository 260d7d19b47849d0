//! Result artifact and run summary.

use std::fmt::Write as _;
use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::Env;
use crate::error::Result;
use crate::problem::Problem;
use crate::trajectory::TRAJECTORY_MARKER;

/// Outcome of one run, as reported by drivers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub problem: String,
    pub instance: String,
    pub is_complete_solution: bool,
    pub is_valid_solution: bool,
    pub key_item: String,
    pub key_value: f64,
    pub steps: usize,
    pub elapsed_ms: u64,
    pub result_file: Option<PathBuf>,
}

impl<P: Problem> Env<P> {
    pub fn summary(&self) -> RunSummary {
        RunSummary {
            problem: P::NAME.to_string(),
            instance: self.instance_name.clone(),
            is_complete_solution: self.is_complete_solution(),
            is_valid_solution: self.is_valid_solution(),
            key_item: self.key_item().to_string(),
            key_value: self.key_value(),
            steps: self.step_count,
            elapsed_ms: self.elapsed().as_millis() as u64,
            result_file: None,
        }
    }

    /// Renders the result artifact text.
    pub fn render_result(&self, dump_trajectory: bool) -> Result<String> {
        let mut text = String::new();
        // Writing to a String cannot fail.
        let _ = writeln!(text, "-problem: {}", P::NAME);
        let _ = writeln!(text, "-instance: {}", self.instance_name);
        let _ = writeln!(text, "-is_complete_solution: {}", self.is_complete_solution());
        let _ = writeln!(text, "-is_valid_solution: {}", self.is_valid_solution());
        let _ = writeln!(text, "-{}: {}", self.key_item(), self.key_value());
        let _ = writeln!(text, "-current_solution:");
        let _ = writeln!(text, "{}", self.current_solution);
        if dump_trajectory {
            text.push_str(TRAJECTORY_MARKER);
            text.push('\n');
            text.push_str(&self.trajectory.to_table()?);
        }
        Ok(text)
    }

    /// Writes the result artifact to `<output dir>/<result_file>`.
    ///
    /// Without a run label the output directory is
    /// `<output_root>/<problem>/<instance>/result`.
    pub fn dump_result(&self, dump_trajectory: bool, result_file: &str) -> Result<PathBuf> {
        let dir = self
            .output_dir
            .clone()
            .unwrap_or_else(|| self.run_dir("result"));
        fs::create_dir_all(&dir)?;
        let path = dir.join(result_file);
        fs::write(&path, self.render_result(dump_trajectory)?)?;
        info!(
            event = "result_dumped",
            path = %path.display(),
            key_item = self.key_item(),
            key_value = self.key_value(),
        );
        Ok(path)
    }
}
