//! Command-line arguments.


use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "hyperforge")]
#[command(author, version, about = "Run hyper-heuristics on combinatorial problem instances")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Plain output without the console layer
    #[arg(long, global = true)]
    pub quiet: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Solve one instance with the configured hyper-heuristic
    Run(RunArgs),

    /// List registered problems and their heuristics
    Problems,
}

#[derive(Debug, clap::Args)]
pub struct RunArgs {
    /// Problem name, e.g. tsp or mkp
    #[arg(short, long)]
    pub problem: String,

    /// Instance data file
    #[arg(short, long, value_name = "FILE")]
    pub data: PathBuf,

    /// Run configuration (TOML or YAML); defaults apply when absent
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output subdirectory under `<output_root>/<problem>/<instance>`
    #[arg(short, long)]
    pub label: Option<String>,

    /// Overrides `random_seed` from the configuration
    #[arg(long)]
    pub seed: Option<u64>,

    /// Print the run summary as JSON
    #[arg(long)]
    pub json: bool,
}
