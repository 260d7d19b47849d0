use std::sync::Arc;

use super::*;
use crate::test_utils::{
    cheapest, declining, env, failing, panicking, random_push, unreachable_push, TokenOperator,
    TokenProblem, Tokens,
};
use crate::trajectory::parse_trajectory;

fn params() -> Parameters {
    Parameters::new()
}

#[test]
fn test_new_env_is_reset() {
    let env = env(3);

    assert_eq!(env.current_solution(), &Tokens(vec![]));
    assert_eq!(env.step_count(), 0);
    assert!(env.continue_run());
    assert!(env.trajectory().is_empty());
    assert!(!env.is_complete_solution());
    assert!(env.is_valid_solution());
    assert_eq!(env.key_item(), "cost");
    assert_eq!(env.key_value(), 0.0);
}

#[test]
fn test_unreachable_initial_state() {
    #[derive(Debug)]
    struct Broken(TokenProblem);

    impl Problem for Broken {
        const NAME: &'static str = "broken";
        type Solution = Tokens;
        type Operator = TokenOperator;
        type State = crate::test_utils::TokenState;

        fn init_solution(&self) -> Tokens {
            Tokens(vec![99])
        }
        fn state_data(&self, solution: &Tokens) -> Option<Self::State> {
            self.0.state_data(solution)
        }
        fn validation_solution(&self, solution: &Tokens) -> bool {
            self.0.validation_solution(solution)
        }
        fn is_complete(&self, state: &Self::State) -> bool {
            self.0.is_complete(state)
        }
        fn key_item(&self) -> &'static str {
            "cost"
        }
        fn key_value(&self, state: &Self::State) -> f64 {
            state.cost
        }
        fn direction(&self) -> crate::Direction {
            crate::Direction::Minimize
        }
        fn construction_steps(&self) -> usize {
            1
        }
    }

    let err = Env::new(Broken(TokenProblem::new(1, vec![1.0])), "x", EnvOptions::default()).unwrap_err();
    assert!(matches!(err, EnvError::UnreachableInitialState { problem: "broken" }));
}

#[test]
fn test_run_heuristic_applies_and_merges_delta() {
    let mut env = env(2);
    let h = cheapest();

    let outcome = env.run_heuristic(&h, &params());

    assert_eq!(outcome, StepOutcome::Applied(TokenOperator::Push { token: 1 }));
    assert_eq!(env.current_solution(), &Tokens(vec![1]));
    assert_eq!(env.algorithm_data().get("calls"), Some(&serde_json::json!(1)));
    assert_eq!(env.step_count(), 1);
    assert!(env.continue_run());

    env.run_heuristic(&h, &params());
    assert_eq!(env.current_solution(), &Tokens(vec![1, 3]));
    assert_eq!(env.algorithm_data().get("calls"), Some(&serde_json::json!(2)));
    assert!(env.is_complete_solution());
    assert_eq!(env.key_value(), 3.0);
}

#[test]
fn test_declined_step_is_noop() {
    let mut env = env(3);
    env.run_heuristic(&cheapest(), &params());
    let solution = env.current_solution().clone();
    let state = env.state_data().clone();
    let data = env.algorithm_data().clone();

    let outcome = env.run_heuristic(&declining(), &params());

    assert_eq!(outcome, StepOutcome::Declined);
    assert_eq!(env.current_solution(), &solution);
    assert_eq!(env.state_data(), &state);
    assert_eq!(env.algorithm_data(), &data);
    assert_eq!(env.trajectory().len(), 1);
    assert!(!env.continue_run());
}

#[test]
fn test_heuristic_error_is_contained() {
    let mut env = env(3);
    env.run_heuristic(&cheapest(), &params());
    let before = env.snapshot();

    let outcome = env.run_heuristic(&failing(), &params());

    match outcome {
        StepOutcome::Failed(failure) => {
            assert_eq!(failure.heuristic, "fail");
            assert!(failure.message.contains("no luck"));
        }
        other => panic!("expected failure, got {other:?}"),
    }
    let after = env.snapshot();
    assert_eq!(after.solution, before.solution);
    assert_eq!(after.trajectory, before.trajectory);
    assert_eq!(after.algorithm_data, before.algorithm_data);
    assert!(env.continue_run());
}

#[test]
fn test_heuristic_panic_is_contained() {
    let mut env = env(3);
    let before = env.snapshot();

    let outcome = env.run_heuristic(&panicking(), &params());

    assert!(outcome.is_failed());
    if let StepOutcome::Failed(failure) = outcome {
        assert!(failure.message.contains("heuristic blew up"));
    }
    assert_eq!(env.current_solution(), &before.solution);
    assert_eq!(env.step_count(), 0);
    assert!(env.continue_run());
}

#[test]
fn test_decline_after_failure_ends_run() {
    let mut env = env(3);

    env.run_heuristic(&failing(), &params());
    assert!(env.continue_run());
    env.run_heuristic(&cheapest(), &params());
    assert!(env.continue_run());
    env.run_heuristic(&declining(), &params());

    assert!(!env.continue_run());
    assert_eq!(env.step_count(), 1);
}

#[test]
fn test_unreachable_operator_is_rejected() {
    let mut env = env(3);

    let outcome = env.run_heuristic(&unreachable_push(), &params());

    assert!(outcome.is_failed());
    assert_eq!(env.current_solution(), &Tokens(vec![]));

    let err = env
        .run_operator(TokenOperator::Push { token: 42 }, None)
        .unwrap_err();
    assert!(matches!(err, EnvError::UnreachableState { .. }));
}

#[test]
fn test_run_operator_records_default_name() {
    let mut env = env(3);
    env.run_operator(TokenOperator::Push { token: 2 }, None).unwrap();

    let entry = &env.trajectory().entries()[0];
    assert_eq!(entry.heuristic, DEFAULT_OPERATOR_NAME);
    assert_eq!(entry.solution, "[2]");
    assert_eq!(env.key_value(), 3.0);
}

#[test]
fn test_operator_panic_is_rejected() {
    let mut env = env(3);
    let err = env.run_operator(TokenOperator::Explode, None).unwrap_err();
    assert!(matches!(err, EnvError::OperatorPanicked { .. }));
    assert_eq!(env.step_count(), 0);
}

#[test]
fn test_validation_is_opt_in() {
    let mut lenient = env(3);
    lenient.run_operator(TokenOperator::Push { token: 0 }, None).unwrap();
    lenient.run_operator(TokenOperator::Push { token: 0 }, None).unwrap();
    assert!(!lenient.is_valid_solution());

    let mut strict = Env::new(
        TokenProblem::new(3, vec![4.0, 1.0, 3.0]),
        "three",
        EnvOptions::default().with_validate_operators(true),
    )
    .unwrap();
    strict.run_operator(TokenOperator::Push { token: 0 }, None).unwrap();
    let err = strict
        .run_operator(TokenOperator::Push { token: 0 }, None)
        .unwrap_err();
    assert!(matches!(err, EnvError::InfeasibleOperator { .. }));
    assert_eq!(strict.current_solution(), &Tokens(vec![0]));
}

#[test]
fn test_operator_apply_is_pure() {
    let solution = Tokens(vec![1, 2]);
    let copy = solution.clone();

    let next = TokenOperator::Push { token: 3 }.apply(&solution);

    assert_eq!(solution, copy);
    assert_eq!(next, Tokens(vec![1, 2, 3]));
}

#[test]
fn test_get_state_data_is_deterministic_and_pure() {
    let mut env = env(3);
    env.run_heuristic(&cheapest(), &params());
    let current = env.current_solution().clone();
    let state = env.state_data().clone();

    let a = env.get_state_data(&Tokens(vec![0, 4]));
    let b = env.get_state_data(&Tokens(vec![0, 4]));

    assert_eq!(a, b);
    assert_eq!(a.map(|s| s.cost), Some(9.0));
    assert_eq!(env.current_solution(), &current);
    assert_eq!(env.state_data(), &state);
    assert_eq!(env.get_state_data(&Tokens(vec![17])), None);
}

#[test]
fn test_compare_follows_direction() {
    let env = env(3);
    assert!(env.compare(1.0, 2.0) > 0.0);
    assert!(env.compare(2.0, 1.0) < 0.0);
    assert_eq!(env.compare(2.0, 2.0), 0.0);
}

#[test]
fn test_reset_clears_run() {
    let mut env = env(3);
    env.run_heuristic(&cheapest(), &params());
    env.run_heuristic(&declining(), &params());

    env.reset(Some("exp"));

    assert_eq!(env.current_solution(), &Tokens(vec![]));
    assert!(env.algorithm_data().is_empty());
    assert!(env.trajectory().is_empty());
    assert_eq!(env.step_count(), 0);
    assert!(env.continue_run());
    assert_eq!(
        env.output_dir(),
        Some(std::path::Path::new("output/tokens/five/exp"))
    );

    env.reset(None);
    assert!(env.output_dir().is_some());
}

#[test]
fn test_fork_isolation() {
    let mut original = env(3);
    original.run_heuristic(&cheapest(), &params());
    let json = original.snapshot().to_json().unwrap();

    let snapshot = EnvSnapshot::from_json(&json).unwrap();
    let problem = Arc::clone(original.problem());
    let mut left = Env::from_snapshot(Arc::clone(&problem), "five", EnvOptions::default(), &snapshot).unwrap();
    let mut right = Env::from_snapshot(problem, "five", EnvOptions::default(), &snapshot).unwrap();

    left.run_operator(TokenOperator::Push { token: 0 }, None).unwrap();
    right.run_operator(TokenOperator::Push { token: 4 }, None).unwrap();

    assert_ne!(left.current_solution(), right.current_solution());
    assert_eq!(original.current_solution(), &Tokens(vec![1]));
    assert_eq!(left.trajectory().len(), 2);
    assert_eq!(original.trajectory().len(), 1);
}

#[test]
fn test_restore_rolls_back() {
    let mut env = env(3);
    env.run_heuristic(&cheapest(), &params());
    let checkpoint = env.snapshot();
    env.run_heuristic(&cheapest(), &params());
    env.run_heuristic(&cheapest(), &params());

    env.restore(&checkpoint).unwrap();

    assert_eq!(env.snapshot(), checkpoint);
    assert_eq!(env.key_value(), 1.0);
}

#[test]
fn test_restore_keeps_run_start() {
    let mut env = env(3);
    let checkpoint = env.snapshot();
    std::thread::sleep(std::time::Duration::from_millis(20));
    env.run_heuristic(&cheapest(), &params());

    env.restore(&checkpoint).unwrap();

    assert!(env.elapsed() >= std::time::Duration::from_millis(20));
}

fn seeded(seed: u64) -> Env<TokenProblem> {
    Env::new(
        TokenProblem::new(4, vec![4.0, 1.0, 3.0, 2.0, 5.0, 6.0, 7.0]),
        "seven",
        EnvOptions::default().with_seed(seed),
    )
    .unwrap()
}

fn fill_randomly(env: &mut Env<TokenProblem>) -> Tokens {
    while env.run_heuristic(&random_push(), &params()).is_applied() {}
    env.current_solution().clone()
}

#[test]
fn test_seeded_heuristics_are_reproducible() {
    let mut a = seeded(8);
    let mut b = seeded(8);

    assert_eq!(a.seed(), 8);
    assert_eq!(fill_randomly(&mut a), fill_randomly(&mut b));
    assert!(a.is_complete_solution());

    a.reseed(21);
    b.reseed(21);
    a.reset(None);
    b.reset(None);
    assert_eq!(a.seed(), 21);
    assert_eq!(fill_randomly(&mut a), fill_randomly(&mut b));
}

#[test]
fn test_reset_restarts_random_stream() {
    let mut env = seeded(3);
    let first = fill_randomly(&mut env);

    env.reset(None);

    assert_eq!(fill_randomly(&mut env), first);
}

#[test]
fn test_restore_rejects_unreachable_snapshot() {
    let mut env = env(3);
    let mut snapshot = env.snapshot();
    snapshot.solution = Tokens(vec![77]);

    assert!(env.restore(&snapshot).is_err());
    assert_eq!(env.current_solution(), &Tokens(vec![]));
}

#[test]
fn test_dump_result_and_replay() {
    let dir = tempfile::tempdir().unwrap();
    let options = EnvOptions::default().with_output_root(dir.path());
    let mut env = Env::new(TokenProblem::new(3, vec![4.0, 1.0, 3.0, 2.0]), "four", options).unwrap();
    env.reset(Some("run1"));
    while env.run_heuristic(&cheapest(), &params()).is_applied() {}

    let path = env.dump_result(true, "result.txt").unwrap();

    assert_eq!(path, dir.path().join("tokens/four/run1/result.txt"));
    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains("-problem: tokens\n"));
    assert!(text.contains("-instance: four\n"));
    assert!(text.contains("-is_complete_solution: true\n"));
    assert!(text.contains("-is_valid_solution: true\n"));
    assert!(text.contains("-cost: 6\n"));
    assert!(text.contains("-current_solution:\n[1, 3, 2]\n"));

    let entries = parse_trajectory::<TokenOperator>(&text).unwrap();
    assert_eq!(entries.len(), 3);

    let mut replayed = env.clone();
    replayed.reset(None);
    replayed.replay(&entries).unwrap();
    assert_eq!(replayed.current_solution(), env.current_solution());
    assert_eq!(replayed.trajectory(), env.trajectory());
}

#[test]
fn test_dump_without_trajectory() {
    let dir = tempfile::tempdir().unwrap();
    let env = Env::new(
        TokenProblem::new(1, vec![1.0]),
        "one",
        EnvOptions::default().with_output_root(dir.path()),
    )
    .unwrap();

    let path = env.dump_result(false, "r.txt").unwrap();

    assert_eq!(path, dir.path().join("tokens/one/result/r.txt"));
    let text = std::fs::read_to_string(path).unwrap();
    assert!(!text.contains("-trajectory:"));
}

#[test]
fn test_summary() {
    let mut env = env(2);
    env.run_heuristic(&cheapest(), &params());
    env.run_heuristic(&cheapest(), &params());

    let summary = env.summary();

    assert_eq!(summary.problem, "tokens");
    assert_eq!(summary.instance, "five");
    assert!(summary.is_complete_solution);
    assert_eq!(summary.key_value, 3.0);
    assert_eq!(summary.steps, 2);
}

#[test]
fn test_mix_seed_separates_streams() {
    assert_ne!(mix_seed(1, 0), mix_seed(1, 1));
    assert_ne!(mix_seed(1, 0), mix_seed(2, 0));
    assert_eq!(mix_seed(9, 4), mix_seed(9, 4));
}
