use std::path::{Path, PathBuf};
use std::sync::Arc;

use hyperforge_config::{
    HyperHeuristicConfig, PerturbationConfig, RandomConfig, RunConfig, ScsiConfig,
    SelectionConfig, SingleConfig,
};
use hyperforge_core::EnvError;
use hyperforge_solver::ScriptedClient;

use super::*;

const SQUARE: &str = "NAME : square\nTYPE : TSP\nDIMENSION : 4\nNODE_COORD_SECTION\n\
1 0 0\n2 1 0\n3 1 1\n4 0 1\nEOF\n";

const KNAPSACK: &str = "4 2\n10 7 6 1\n6 4 3 1\n2 3 4 1\n9 8\n";

fn write_instance(dir: &Path, file: &str, contents: &str) -> PathBuf {
    let path = dir.join(file);
    std::fs::write(&path, contents).unwrap();
    path
}

fn config(dir: &Path, hyper_heuristic: HyperHeuristicConfig) -> RunConfig {
    RunConfig::new()
        .with_random_seed(11)
        .with_output_root(dir.join("output"))
        .with_hyper_heuristic(hyper_heuristic)
}

fn scsi(constructive: &str, improve: &str) -> HyperHeuristicConfig {
    HyperHeuristicConfig::SingleConstructiveSingleImprove(ScsiConfig {
        constructive_heuristic: constructive.to_string(),
        improve_heuristic: improve.to_string(),
        ..ScsiConfig::default()
    })
}

#[test]
fn test_builtin_registry() {
    let registry = ProblemRegistry::builtin();

    assert_eq!(registry.names(), vec!["mkp", "tsp"]);
    assert_eq!(
        registry.get("mkp").unwrap().heuristic_names(),
        vec!["greedy_by_profit_density", "greedy_by_profit", "random_add", "swap_improve"]
    );
    assert!(registry.get("vrp").is_none());
}

#[test]
fn test_unknown_problem() {
    let dir = tempfile::tempdir().unwrap();
    let config = RunConfig::default();

    let err = ProblemRegistry::builtin()
        .run("vrp", dir.path().join("x.txt"), &config, None, None)
        .unwrap_err();

    match err {
        DriverError::UnknownProblem { name, available } => {
            assert_eq!(name, "vrp");
            assert_eq!(available, "mkp, tsp");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_run_tsp_writes_result() {
    let dir = tempfile::tempdir().unwrap();
    let data = write_instance(dir.path(), "square.tsp", SQUARE);
    let config = config(dir.path(), scsi("farthest_insertion", "two_opt"));

    let summary = ProblemRegistry::builtin()
        .run("tsp", &data, &config, Some("exp"), None)
        .unwrap();

    assert_eq!(summary.problem, "tsp");
    assert_eq!(summary.instance, "square");
    assert!(summary.is_complete_solution);
    assert!(summary.is_valid_solution);
    assert_eq!(summary.key_item, "tour_cost");
    assert!((summary.key_value - 4.0).abs() < 1e-9);

    let result_file = summary.result_file.unwrap();
    assert_eq!(
        result_file,
        dir.path().join("output/tsp/square/exp/result.txt")
    );
    let text = std::fs::read_to_string(result_file).unwrap();
    assert!(text.starts_with("-problem: tsp\n-instance: square\n"));
    assert!(text.contains("-trajectory:"));
}

#[test]
fn test_run_mkp_random_policy() {
    let dir = tempfile::tempdir().unwrap();
    let data = write_instance(dir.path(), "small.txt", KNAPSACK);
    let config = config(
        dir.path(),
        HyperHeuristicConfig::Random(RandomConfig {
            heuristics: Some(vec!["greedy_by_profit".to_string(), "random_add".to_string()]),
            ..RandomConfig::default()
        }),
    );

    let summary = ProblemRegistry::builtin()
        .run("mkp", &data, &config, None, None)
        .unwrap();

    assert_eq!(summary.key_item, "current_profit");
    assert!(summary.is_valid_solution);
    assert!(summary.steps <= 8);
    assert!(summary.result_file.unwrap().exists());
}

#[test]
fn test_random_seed_reproduces_runs() {
    let dir = tempfile::tempdir().unwrap();
    let data = write_instance(dir.path(), "small.txt", KNAPSACK);
    let config = config(
        dir.path(),
        HyperHeuristicConfig::Random(RandomConfig {
            heuristics: Some(vec!["random_add".to_string(), "swap_improve".to_string()]),
            ..RandomConfig::default()
        }),
    );
    let registry = ProblemRegistry::builtin();

    let first = registry.run("mkp", &data, &config, Some("a"), None).unwrap();
    let second = registry.run("mkp", &data, &config, Some("b"), None).unwrap();

    let trajectory = |summary: RunSummary| {
        let text = std::fs::read_to_string(summary.result_file.unwrap()).unwrap();
        text.split("-trajectory:").nth(1).unwrap_or_default().to_string()
    };
    assert_eq!(first.key_value, second.key_value);
    assert_eq!(trajectory(first), trajectory(second));
}

#[test]
fn test_max_steps_caps_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let data = write_instance(dir.path(), "small.txt", KNAPSACK);
    let config = config(
        dir.path(),
        HyperHeuristicConfig::Perturbation(PerturbationConfig {
            main_heuristic: "greedy_by_profit".to_string(),
            perturbation_heuristic: "random_add".to_string(),
            perturbation_ratio: 0.0,
            max_steps: Some(1),
            ..PerturbationConfig::default()
        }),
    );

    let summary = ProblemRegistry::builtin()
        .run("mkp", &data, &config, None, None)
        .unwrap();

    assert_eq!(summary.steps, 1);
    assert_eq!(summary.key_value, 10.0);
    assert!(!summary.is_complete_solution);
}

#[test]
fn test_gpt_selection_with_scripted_client() {
    let dir = tempfile::tempdir().unwrap();
    let data = write_instance(dir.path(), "square.tsp", SQUARE);
    let config = config(
        dir.path(),
        HyperHeuristicConfig::GptSelection(SelectionConfig::default()),
    );
    let client = Arc::new(ScriptedClient::new([
        "***\nselected_heuristic: farthest_insertion\nrunning_steps: 5\n***",
        "***\nselected_heuristic: stop\n***",
    ]));

    let summary = ProblemRegistry::builtin()
        .run("tsp", &data, &config, None, Some(client.clone()))
        .unwrap();

    assert_eq!(client.request_count(), 2);
    assert!(summary.is_complete_solution);
    assert_eq!(summary.steps, 4);
}

#[test]
fn test_llm_policies_need_a_client() {
    let pool = hyperforge_problems::TspProblem::heuristic_pool();
    let selection = SelectionConfig::default();
    for hyper_heuristic in [
        HyperHeuristicConfig::GptSelection(selection.clone()),
        HyperHeuristicConfig::GptDeepSelection(selection.clone()),
        HyperHeuristicConfig::LlmSelection(selection),
    ] {
        let config = RunConfig::new().with_hyper_heuristic(hyper_heuristic);

        let err = build_hyper_heuristic(&pool, &config, None).err().expect("expected an error");

        assert!(matches!(err, DriverError::MissingLlmClient { .. }));
    }
}

#[test]
fn test_builds_every_policy() {
    let pool = hyperforge_problems::TspProblem::heuristic_pool();
    let client: Arc<dyn LlmClient> = Arc::new(ScriptedClient::new(Vec::<String>::new()));
    let cases = [
        (HyperHeuristicConfig::default(), "random"),
        (
            HyperHeuristicConfig::Single(SingleConfig {
                heuristic: "nearest_neighbor".to_string(),
                ..SingleConfig::default()
            }),
            "single",
        ),
        (
            scsi("nearest_neighbor", "two_opt"),
            "single_constructive_single_improve",
        ),
        (
            HyperHeuristicConfig::Perturbation(PerturbationConfig {
                main_heuristic: "two_opt".to_string(),
                perturbation_heuristic: "random_swap".to_string(),
                ..PerturbationConfig::default()
            }),
            "perturbation",
        ),
        (
            HyperHeuristicConfig::GptSelection(SelectionConfig::default()),
            "gpt_selection",
        ),
        (
            HyperHeuristicConfig::GptDeepSelection(SelectionConfig::default()),
            "gpt_deep_selection",
        ),
        (
            HyperHeuristicConfig::LlmSelection(SelectionConfig::default()),
            "llm_selection",
        ),
    ];

    for (hyper_heuristic, expected) in cases {
        let config = RunConfig::new().with_hyper_heuristic(hyper_heuristic);

        let policy = build_hyper_heuristic(&pool, &config, Some(client.clone())).unwrap();

        assert_eq!(policy.name(), expected);
    }
}

#[test]
fn test_unknown_heuristic() {
    let pool = hyperforge_problems::TspProblem::heuristic_pool();
    let config = RunConfig::new().with_hyper_heuristic(scsi("nearest_neighbor", "three_opt"));

    match build_hyper_heuristic(&pool, &config, None) {
        Err(DriverError::UnknownHeuristic { problem, name }) => {
            assert_eq!(problem, "tsp");
            assert_eq!(name, "three_opt");
        }
        Err(other) => panic!("unexpected error: {other}"),
        Ok(policy) => panic!("built {}", policy.name()),
    }

    let restricted = RunConfig::new().with_hyper_heuristic(HyperHeuristicConfig::Random(
        RandomConfig {
            heuristics: Some(vec!["two_opt".to_string(), "or_opt".to_string()]),
            ..RandomConfig::default()
        },
    ));
    assert!(matches!(
        build_hyper_heuristic(&pool, &restricted, None),
        Err(DriverError::UnknownHeuristic { .. })
    ));
}

#[test]
fn test_missing_instance_file() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path(), scsi("nearest_neighbor", "two_opt"));

    let err = ProblemRegistry::builtin()
        .run("tsp", dir.path().join("missing.tsp"), &config, None, None)
        .unwrap_err();

    assert!(matches!(err, DriverError::Env(EnvError::Load { .. })));
}
