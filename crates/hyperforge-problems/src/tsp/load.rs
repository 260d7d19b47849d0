//! TSP instance files: TSPLIB or a plain whitespace matrix.

use std::fs;
use std::path::Path;

use tracing::debug;

use hyperforge_core::{EnvError, LoadProblem};

use super::TspProblem;

impl LoadProblem for TspProblem {
    fn load_data(path: &Path) -> Result<Self, EnvError> {
        let text = fs::read_to_string(path).map_err(|e| EnvError::load(path, e))?;
        let is_tsplib = text
            .lines()
            .any(|l| matches!(l.trim(), "NODE_COORD_SECTION" | "EDGE_WEIGHT_SECTION"));
        let problem = if is_tsplib {
            parse_tsplib(&text)
        } else {
            parse_matrix(&text)
        }
        .map_err(|message| EnvError::load(path, message))?;
        debug!(
            event = "instance_loaded",
            problem = "tsp",
            path = %path.display(),
            node_num = problem.node_num(),
            tsplib = is_tsplib,
        );
        Ok(problem)
    }
}

/// Parses a TSPLIB file with `NODE_COORD_SECTION` coordinates or a
/// `FULL_MATRIX` `EDGE_WEIGHT_SECTION`.
///
/// Coordinates give exact Euclidean distances.
pub fn parse_tsplib(text: &str) -> Result<TspProblem, String> {
    let mut dimension: Option<usize> = None;
    let mut format = String::from("FULL_MATRIX");
    let mut lines = text.lines().map(str::trim).filter(|l| !l.is_empty());

    while let Some(line) = lines.next() {
        if line == "EOF" {
            break;
        }
        if line == "NODE_COORD_SECTION" {
            let n = dimension.ok_or("DIMENSION must precede NODE_COORD_SECTION")?;
            let mut points = Vec::with_capacity(n);
            for _ in 0..n {
                let line = lines.next().ok_or("truncated NODE_COORD_SECTION")?;
                let fields = numbers(line)?;
                match fields.as_slice() {
                    [_, x, y, ..] => points.push((*x, *y)),
                    _ => return Err(format!("bad coordinate line `{line}`")),
                }
            }
            return TspProblem::from_coordinates(&points).ok_or_else(|| "no nodes".to_string());
        }
        if line == "EDGE_WEIGHT_SECTION" {
            let n = dimension.ok_or("DIMENSION must precede EDGE_WEIGHT_SECTION")?;
            if n == 0 {
                return Err("DIMENSION must be positive".to_string());
            }
            if format != "FULL_MATRIX" {
                return Err(format!("unsupported EDGE_WEIGHT_FORMAT `{format}`"));
            }
            let mut values = Vec::with_capacity(n * n);
            while values.len() < n * n {
                let line = lines.next().ok_or("truncated EDGE_WEIGHT_SECTION")?;
                values.extend(numbers(line)?);
            }
            let distances = values.chunks(n).take(n).map(<[f64]>::to_vec).collect();
            return TspProblem::new(distances).ok_or_else(|| "malformed matrix".to_string());
        }
        if let Some((key, value)) = line.split_once(':') {
            match key.trim() {
                "DIMENSION" => {
                    dimension = Some(
                        value
                            .trim()
                            .parse()
                            .map_err(|_| format!("bad DIMENSION `{}`", value.trim()))?,
                    );
                }
                "EDGE_WEIGHT_FORMAT" => format = value.trim().to_string(),
                _ => {}
            }
        }
    }
    Err("no NODE_COORD_SECTION or EDGE_WEIGHT_SECTION".to_string())
}

/// Parses one matrix row per line. Blank lines and `#` comments are skipped.
pub fn parse_matrix(text: &str) -> Result<TspProblem, String> {
    let rows = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(numbers)
        .collect::<Result<Vec<_>, _>>()?;
    let n = rows.len();
    TspProblem::new(rows).ok_or_else(|| format!("distance matrix must be square with {n} columns"))
}

fn numbers(line: &str) -> Result<Vec<f64>, String> {
    line.split_whitespace()
        .map(|token| {
            token
                .parse::<f64>()
                .map_err(|_| format!("not a number: `{token}`"))
        })
        .collect()
}
