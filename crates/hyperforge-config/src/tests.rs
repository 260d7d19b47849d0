//! Tests for run configuration.

use super::*;

#[test]
fn test_toml_parsing() {
    let toml = r#"
        random_seed = 42

        [environment]
        output_root = "runs"
        validate_operators = true

        [hyper_heuristic]
        type = "single_constructive_single_improve"
        constructive_heuristic = "nearest_neighbor"
        improve_heuristic = "two_opt"

        [rollout]
        search_interval = 3
        search_time = 8
        threads = 4

        [llm]
        max_attempts = 5
    "#;

    let config = RunConfig::from_toml_str(toml).unwrap();
    assert_eq!(config.random_seed, Some(42));
    assert_eq!(config.environment.output_root, PathBuf::from("runs"));
    assert!(config.environment.validate_operators);
    assert!(config.environment.dump_trajectory);
    match &config.hyper_heuristic {
        HyperHeuristicConfig::SingleConstructiveSingleImprove(c) => {
            assert_eq!(c.constructive_heuristic, "nearest_neighbor");
            assert_eq!(c.improve_heuristic, "two_opt");
            assert_eq!(c.iterations_scale_factor, 2.0);
        }
        other => panic!("unexpected policy {other:?}"),
    }
    assert_eq!(config.rollout.search_interval, 3);
    assert_eq!(config.rollout.search_time, 8);
    assert_eq!(config.rollout.threads, 4);
    assert_eq!(config.llm.max_attempts, 5);
    assert_eq!(config.llm.history_length, 5);
}

#[test]
fn test_yaml_parsing() {
    let yaml = r#"
        random_seed: 42
        hyper_heuristic:
          type: llm_selection
          heuristics: [nearest_neighbor, cheapest_insertion]
          candidate_count: 2
        rollout:
          search_time: 4
    "#;

    let config = RunConfig::from_yaml_str(yaml).unwrap();
    assert_eq!(config.random_seed, Some(42));
    assert!(config.hyper_heuristic.needs_llm());
    match config.hyper_heuristic {
        HyperHeuristicConfig::LlmSelection(c) => {
            assert_eq!(c.candidate_count, 2);
            assert_eq!(c.heuristics.unwrap().len(), 2);
        }
        other => panic!("unexpected policy {other:?}"),
    }
    assert_eq!(config.rollout.search_time, 4);
}

#[test]
fn test_scsi_alias() {
    let config = RunConfig::from_toml_str(
        r#"
        [hyper_heuristic]
        type = "scsi"
        constructive_heuristic = "a"
        improve_heuristic = "b"
    "#,
    )
    .unwrap();
    assert_eq!(
        config.hyper_heuristic.name(),
        "single_constructive_single_improve"
    );
}

#[test]
fn test_defaults() {
    let config = RunConfig::from_toml_str("").unwrap();
    assert_eq!(config, RunConfig::default());
    assert_eq!(config.hyper_heuristic.name(), "random");
    assert!(!config.hyper_heuristic.needs_llm());
    assert_eq!(config.rollout.search_time, 10);
    assert_eq!(config.environment.result_file, "result.txt");

    let options = config.env_options();
    assert_eq!(options.output_root, PathBuf::from("output"));
    assert!(!options.validate_operators);
    assert_eq!(options.seed, None);
    assert_eq!(config.with_random_seed(4).env_options().seed, Some(4));
}

#[test]
fn test_invalid_ratio_rejected() {
    let err = RunConfig::from_toml_str(
        r#"
        [hyper_heuristic]
        type = "perturbation"
        main_heuristic = "a"
        perturbation_heuristic = "b"
        perturbation_ratio = 1.5
    "#,
    )
    .unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
}

#[test]
fn test_zero_rollouts_rejected() {
    let err = RunConfig::from_toml_str("[rollout]\nsearch_time = 0\n").unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
}

#[test]
fn test_unknown_policy_rejected() {
    let err = RunConfig::from_toml_str("[hyper_heuristic]\ntype = \"annealing\"\n").unwrap_err();
    assert!(matches!(err, ConfigError::Toml(_)));
}

#[test]
fn test_load_dispatches_on_extension() {
    let dir = tempfile::tempdir().unwrap();
    let yaml = dir.path().join("run.yml");
    std::fs::write(&yaml, "random_seed: 3\n").unwrap();
    let toml = dir.path().join("run.toml");
    std::fs::write(&toml, "random_seed = 4\n").unwrap();

    assert_eq!(RunConfig::load(&yaml).unwrap().random_seed, Some(3));
    assert_eq!(RunConfig::load(&toml).unwrap().random_seed, Some(4));
    assert!(matches!(
        RunConfig::load(dir.path().join("missing.toml")),
        Err(ConfigError::Io(_))
    ));
}

#[test]
fn test_builder() {
    let config = RunConfig::new()
        .with_random_seed(123)
        .with_output_root("/tmp/hf")
        .with_hyper_heuristic(HyperHeuristicConfig::Single(SingleConfig {
            heuristic: "nearest_neighbor".to_string(),
            ..SingleConfig::default()
        }))
        .with_rollout(RolloutConfig {
            search_time: 2,
            ..RolloutConfig::default()
        });

    assert_eq!(config.random_seed, Some(123));
    assert_eq!(config.env_options().output_root, PathBuf::from("/tmp/hf"));
    assert_eq!(config.rollout.search_time, 2);
    assert!(config.validate().is_ok());
}
