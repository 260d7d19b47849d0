use std::sync::Arc;

use hyperforge_core::{Env, EnvError, EnvOptions, HeuristicPool, Parameters};
use hyperforge_solver::{
    HyperHeuristic, RandomHyperHeuristic, SingleConstructiveSingleImproveHyperHeuristic,
};

use super::*;

fn pair() -> MkpProblem {
    MkpProblem::new(vec![3.0, 4.0], vec![vec![5.0, 6.0]], vec![10.0]).unwrap()
}

/// Two resources, four items.
fn small() -> MkpProblem {
    MkpProblem::new(
        vec![10.0, 7.0, 6.0, 1.0],
        vec![vec![6.0, 4.0, 3.0, 1.0], vec![2.0, 3.0, 4.0, 1.0]],
        vec![9.0, 8.0],
    )
    .unwrap()
}

fn selection(bits: &[u8]) -> Selection {
    Selection(bits.iter().map(|&b| b == 1).collect())
}

#[test]
fn test_feasibility_scenario() {
    let problem = pair();
    let strict = EnvOptions::default().with_validate_operators(true);
    let mut env = Env::new(problem.clone(), "pair", strict).unwrap();

    env.run_operator(MkpOperator::Add { item: 0 }, None).unwrap();
    assert_eq!(env.key_value(), 3.0);
    assert!(env.is_valid_solution());
    // Item 1 no longer fits, so construction is over.
    assert!(env.is_complete_solution());

    let err = env.run_operator(MkpOperator::Add { item: 1 }, None).unwrap_err();
    assert!(matches!(err, EnvError::InfeasibleOperator { .. }));
    assert_eq!(env.current_solution(), &selection(&[1, 0]));
    assert!(!problem.validation_solution(&selection(&[1, 1])));
}

#[test]
fn test_state_data() {
    let problem = small();

    let state = problem.state_data(&selection(&[0, 1, 0, 0])).unwrap();

    assert_eq!(state.current_profit, 7.0);
    assert_eq!(state.current_weights, vec![4.0, 3.0]);
    assert_eq!(state.remaining_capacity, vec![5.0, 5.0]);
    assert_eq!(state.items_in_knapsack, vec![1]);
    assert_eq!(state.items_not_in_knapsack, vec![0, 2, 3]);
    // Item 0 needs 6 of resource 0.
    assert_eq!(state.feasible_items_to_add, vec![2, 3]);
    assert!(!problem.is_complete(&state));
}

#[test]
fn test_wrong_length_is_unreachable() {
    let problem = pair();

    assert!(problem.state_data(&selection(&[1])).is_none());
    assert!(!problem.validation_solution(&selection(&[1, 0, 0])));

    let grown = MkpOperator::Add { item: 5 }.apply(&Selection::empty(2));
    assert!(problem.state_data(&grown).is_none());
}

#[test]
fn test_operators() {
    let start = selection(&[1, 0, 1]);

    assert_eq!(MkpOperator::Add { item: 1 }.apply(&start), selection(&[1, 1, 1]));
    assert_eq!(MkpOperator::Remove { item: 0 }.apply(&start), selection(&[0, 0, 1]));
    assert_eq!(
        MkpOperator::Swap {
            removed_item: 2,
            added_item: 1,
        }
        .apply(&start),
        selection(&[1, 1, 0])
    );
    assert_eq!(MkpOperator::Flip { item: 2 }.apply(&start), selection(&[1, 0, 0]));
    assert_eq!(MkpOperator::Flip { item: 1 }.apply(&start), selection(&[1, 1, 1]));
    assert_eq!(start, selection(&[1, 0, 1]));
}

#[test]
fn test_display() {
    assert_eq!(selection(&[1, 0, 1]).to_string(), "selected: [0, 2]");
    assert_eq!(
        MkpOperator::Swap {
            removed_item: 0,
            added_item: 3,
        }
        .to_string(),
        "Swap(removed_item=0, added_item=3)"
    );
}

#[test]
fn test_new_checks_dimensions() {
    assert!(MkpProblem::new(vec![], vec![], vec![]).is_err());
    assert!(MkpProblem::new(vec![1.0], vec![vec![1.0]], vec![]).is_err());
    assert!(MkpProblem::new(vec![1.0, 2.0], vec![vec![1.0]], vec![3.0]).is_err());
}

#[test]
fn test_greedy_by_profit() {
    let mut env = Env::new(small(), "small", EnvOptions::default()).unwrap();
    let params = Parameters::new();

    while env.run_heuristic(&greedy_by_profit(), &params).is_applied() {}

    // After item 0, item 1 no longer fits resource 0; item 2 then fills it.
    assert_eq!(env.current_solution(), &selection(&[1, 0, 1, 0]));
    assert_eq!(env.key_value(), 16.0);
    assert!(env.is_complete_solution());
    assert!(env.is_valid_solution());
}

#[test]
fn test_greedy_by_profit_density() {
    let mut env = Env::new(small(), "small", EnvOptions::default()).unwrap();
    let params = Parameters::new();

    while env.run_heuristic(&greedy_by_profit_density(), &params).is_applied() {}

    assert!(env.is_complete_solution());
    assert!(env.is_valid_solution());
    assert_eq!(env.current_solution(), &selection(&[1, 0, 1, 0]));
}

#[test]
fn test_swap_improve() {
    let mut env = Env::new(small(), "small", EnvOptions::default()).unwrap();
    env.run_operator(MkpOperator::Add { item: 3 }, None).unwrap();
    env.run_operator(MkpOperator::Add { item: 2 }, None).unwrap();
    let params = Parameters::new();

    let outcome = env.run_heuristic(&swap_improve(), &params);

    assert_eq!(
        outcome.operator(),
        Some(&MkpOperator::Swap {
            removed_item: 3,
            added_item: 0,
        })
    );
    assert_eq!(env.key_value(), 16.0);
    assert!(env.is_valid_solution());
}

#[test]
fn test_swap_improve_declines_without_gain() {
    let mut env = Env::new(pair(), "pair", EnvOptions::default()).unwrap();
    env.run_operator(MkpOperator::Add { item: 1 }, None).unwrap();

    assert!(!env.run_heuristic(&swap_improve(), &Parameters::new()).is_applied());
}

#[test]
fn test_random_add_stays_feasible() {
    let mut env = Env::new(small(), "small", EnvOptions::default()).unwrap();
    let params = Parameters::new();

    while env.run_heuristic(&random_add(), &params).is_applied() {
        assert!(env.is_valid_solution());
    }

    assert!(env.is_complete_solution());
}

#[test]
fn test_seeded_random_add_repeats() {
    let problem = MkpProblem::new(
        (1..=10).map(f64::from).collect(),
        vec![vec![1.0; 10]],
        vec![5.0],
    )
    .unwrap();
    let run = |env_seed| {
        let options = EnvOptions::default().with_seed(env_seed);
        let mut env = Env::new(problem.clone(), "ten", options).unwrap();
        RandomHyperHeuristic::new(HeuristicPool::new().with(random_add()))
            .with_seed(9)
            .run(&mut env, Some(5));
        env.current_solution().clone()
    };

    // The policy seed decides, whatever the environment was seeded with.
    let chosen = run(1);
    assert_eq!(chosen, run(2));
    assert_eq!(chosen.0.iter().filter(|&&picked| picked).count(), 5);

    let mut env = Env::new(problem.clone(), "ten", EnvOptions::default().with_seed(4)).unwrap();
    let mut again = Env::new(problem, "ten", EnvOptions::default().with_seed(4)).unwrap();
    for _ in 0..5 {
        env.run_heuristic(&random_add(), &Parameters::new());
        again.run_heuristic(&random_add(), &Parameters::new());
    }
    assert_eq!(env.trajectory().entries(), again.trajectory().entries());
}

#[test]
fn test_features() {
    let problem = small();
    let state = problem.state_data(&selection(&[1, 0, 0, 0])).unwrap();

    let global = problem.global_features();
    assert_eq!(global["item_num"], 4);
    assert_eq!(global["resource_num"], 2);
    assert_eq!(global["total_profit"], 24.0);

    let features = problem.state_features(&state);
    assert_eq!(features["current_profit"], 10.0);
    assert_eq!(features["items_in_knapsack"], 1);
}

#[test]
fn test_constructive_then_improve() {
    let mut env = Env::new(small(), "small", EnvOptions::default()).unwrap();
    let mut policy = SingleConstructiveSingleImproveHyperHeuristic::new(
        Arc::new(greedy_by_profit()),
        Arc::new(swap_improve()),
    );

    assert!(policy.run(&mut env, None));
    assert_eq!(env.key_value(), 16.0);
    assert!(env.is_valid_solution());
}

#[test]
fn test_parse_orlib() {
    let problem = parse_orlib("4 2 0\n10 7 6 1\n6 4 3 1\n2 3 4 1\n9 8\n").unwrap();
    assert_eq!(problem, small());

    let without_optimum = parse_orlib("2 1 3 4 5 6 10").unwrap();
    assert_eq!(without_optimum, pair());
}

#[test]
fn test_parse_orlib_errors() {
    assert!(parse_orlib("").is_err());
    assert!(parse_orlib("2 1 3 4 5").is_err());
    assert!(parse_orlib("2 1 3 four 5 6 10").is_err());
    assert!(parse_orlib("0 1 5").is_err());
}

#[test]
fn test_parse_orlib_rejects_huge_header() {
    let err = parse_orlib("1e20 2").unwrap_err();
    assert!(err.contains("overflow"));

    assert!(parse_orlib("4294967296 4294967296 1").is_err());
    assert!(parse_orlib("3 1e30 1 2 3").is_err());
}

#[test]
fn test_load_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pair.json");
    std::fs::write(
        &path,
        r#"{"profits": [3, 4], "weights": [[5, 6]], "capacities": [10]}"#,
    )
    .unwrap();

    let env = Env::<MkpProblem>::load(&path, EnvOptions::default()).unwrap();

    assert_eq!(env.problem().as_ref(), &pair());
    assert_eq!(env.instance_name(), "pair");
}

#[test]
fn test_load_orlib_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("small.txt");
    std::fs::write(&path, "4 2\n10 7 6 1\n6 4 3 1\n2 3 4 1\n9 8\n").unwrap();

    let env = Env::<MkpProblem>::load(&path, EnvOptions::default()).unwrap();

    assert_eq!(env.construction_steps(), 4);
}

#[test]
fn test_load_rejects_bad_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.json");
    std::fs::write(&path, r#"{"profits": [1], "weights": [], "capacities": [1]}"#).unwrap();

    assert!(matches!(
        Env::<MkpProblem>::load(&path, EnvOptions::default()),
        Err(EnvError::Load { .. })
    ));
}
