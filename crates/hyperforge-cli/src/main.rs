//! `hyperforge` binary: loads an instance, runs the configured policy and
//! reports where the result artifact went.

mod cli;

use std::error::Error;
use std::process::ExitCode;

use clap::Parser;
use hyperforge::{ProblemRegistry, RunConfig};
use owo_colors::OwoColorize;

use cli::{Cli, Command, RunArgs};

fn main() -> ExitCode {
    let cli = Cli::parse();
    if !cli.quiet {
        hyperforge::console::init();
    }

    match execute(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {e}", "error:".bright_red().bold());
            ExitCode::FAILURE
        }
    }
}

fn execute(command: Command) -> Result<(), Box<dyn Error>> {
    let registry = ProblemRegistry::builtin();
    match command {
        Command::Problems => {
            for name in registry.names() {
                println!("{}", name.bold());
                if let Some(module) = registry.get(name) {
                    for heuristic in module.heuristic_names() {
                        println!("  - {heuristic}");
                    }
                }
            }
            Ok(())
        }
        Command::Run(args) => run(&registry, args),
    }
}

fn run(registry: &ProblemRegistry, args: RunArgs) -> Result<(), Box<dyn Error>> {
    let mut config = match &args.config {
        Some(path) => RunConfig::load(path)?,
        None => RunConfig::default(),
    };
    if let Some(seed) = args.seed {
        config = config.with_random_seed(seed);
    }

    // The CLI has no LLM backend; LLM policies report a missing client.
    let summary = registry.run(&args.problem, &args.data, &config, args.label.as_deref(), None)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("problem:   {}", summary.problem);
        println!("instance:  {}", summary.instance);
        println!("complete:  {}", summary.is_complete_solution);
        println!("valid:     {}", summary.is_valid_solution);
        println!("{}: {}", summary.key_item, summary.key_value);
        if let Some(path) = &summary.result_file {
            println!("result:    {}", path.display());
        }
    }
    Ok(())
}
