//! MKP instance files: OR-Library numbers or JSON.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use hyperforge_core::{EnvError, LoadProblem};

use super::MkpProblem;

#[derive(Debug, Deserialize)]
struct JsonInstance {
    profits: Vec<f64>,
    weights: Vec<Vec<f64>>,
    capacities: Vec<f64>,
}

impl LoadProblem for MkpProblem {
    /// `.json` files hold `profits`, `weights` and `capacities`; anything
    /// else is read as an OR-Library instance.
    fn load_data(path: &Path) -> Result<Self, EnvError> {
        let text = fs::read_to_string(path).map_err(|e| EnvError::load(path, e))?;
        let is_json = path.extension().is_some_and(|ext| ext == "json");
        let problem = if is_json {
            serde_json::from_str::<JsonInstance>(&text)
                .map_err(|e| e.to_string())
                .and_then(|raw| MkpProblem::new(raw.profits, raw.weights, raw.capacities))
        } else {
            parse_orlib(&text)
        }
        .map_err(|message| EnvError::load(path, message))?;
        debug!(
            event = "instance_loaded",
            problem = "mkp",
            path = %path.display(),
            item_num = problem.item_num(),
            resource_num = problem.resource_num(),
        );
        Ok(problem)
    }
}

/// Parses `n m [optimum]`, then `n` profits, `m` rows of `n` weights and
/// `m` capacities, all whitespace separated.
pub fn parse_orlib(text: &str) -> Result<MkpProblem, String> {
    let tokens = text
        .split_whitespace()
        .map(|t| t.parse::<f64>().map_err(|_| format!("not a number: `{t}`")))
        .collect::<Result<Vec<_>, _>>()?;
    let (n, m) = match tokens.as_slice() {
        [n, m, ..] if n.fract() == 0.0 && m.fract() == 0.0 && *n >= 1.0 && *m >= 0.0 => {
            (*n as usize, *m as usize)
        }
        _ => return Err("header must start with item and resource counts".to_string()),
    };

    let body = n
        .checked_mul(m)
        .and_then(|weights| weights.checked_add(n))
        .and_then(|body| body.checked_add(m))
        .filter(|body| body.checked_add(3).is_some())
        .ok_or_else(|| format!("{n} items and {m} resources overflow the instance size"))?;
    let start = if tokens.len() == 2 + body {
        2
    } else if tokens.len() == 3 + body {
        3
    } else {
        return Err(format!(
            "expected {} numbers for {n} items and {m} resources, found {}",
            2 + body,
            tokens.len()
        ));
    };

    let data = &tokens[start..];
    let profits = data[..n].to_vec();
    let weights = data[n..n + n * m].chunks(n).map(<[f64]>::to_vec).collect();
    let capacities = data[n + n * m..].to_vec();
    MkpProblem::new(profits, weights, capacities)
}
