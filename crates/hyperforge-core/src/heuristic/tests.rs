use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde_json::json;

use super::*;
use crate::test_utils::{cheapest, declining, failing, TokenOperator, TokenProblem, Tokens};

#[test]
fn test_proposal_builders() {
    let p = Proposal::apply(TokenOperator::Pop).with_delta("k", 3);
    assert!(!p.is_declined());
    assert_eq!(p.delta.get("k"), Some(&json!(3)));

    let d: Proposal<TokenOperator> = Proposal::decline();
    assert!(d.is_declined());
    assert!(d.delta.is_empty());
}

#[test]
fn test_context_exposes_environment_view() {
    let problem = TokenProblem::new(2, vec![5.0, 1.0]);
    let solution = Tokens(vec![0]);
    let state = problem.state_data(&solution).unwrap();
    let data = AlgorithmData::new();
    let mut rng = ChaCha8Rng::seed_from_u64(3);
    let ctx = HeuristicContext::new(&problem, &solution, &state, &data, &mut rng);

    assert_eq!(ctx.current_solution(), &solution);
    assert_eq!(ctx.state_data().cost, 5.0);
    assert_eq!(ctx.evaluate(&Tokens(vec![0, 1])), Some(6.0));
    assert_eq!(ctx.evaluate(&Tokens(vec![9])), None);
    assert!(!ctx.validation_solution(&Tokens(vec![0, 0])));

    let drawn: u64 = ctx.rng().random();
    assert_eq!(drawn, ChaCha8Rng::seed_from_u64(3).random::<u64>());
}

#[test]
fn test_pool_lookup_and_order() {
    let pool = HeuristicPool::<TokenProblem>::new()
        .with(cheapest())
        .with(declining())
        .with(failing());

    assert_eq!(pool.names(), vec!["push_cheapest", "decline", "fail"]);
    assert!(pool.contains("decline"));
    assert!(pool.get("missing").is_none());
    assert_eq!(pool.len(), 3);
}

#[test]
fn test_pool_replaces_same_name() {
    let pool = HeuristicPool::<TokenProblem>::new().with(cheapest()).with(declining()).with(cheapest());
    assert_eq!(pool.names(), vec!["push_cheapest", "decline"]);
}

#[test]
fn test_pool_choose_is_seeded() {
    let pool = HeuristicPool::<TokenProblem>::new()
        .with(cheapest())
        .with(declining())
        .with(failing());
    let pick = |seed| {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..8)
            .map(|_| pool.choose(&mut rng).unwrap().name().to_string())
            .collect::<Vec<_>>()
    };

    assert_eq!(pick(7), pick(7));
    assert!(HeuristicPool::<TokenProblem>::new()
        .choose(&mut StdRng::seed_from_u64(0))
        .is_none());
}

#[test]
fn test_pool_subset() {
    let pool = HeuristicPool::<TokenProblem>::new().with(cheapest()).with(declining());

    let subset = pool.subset(&["decline"]).unwrap();
    assert_eq!(subset.names(), vec!["decline"]);
    assert_eq!(pool.subset(&["nope"]).unwrap_err(), "nope");
}

#[test]
fn test_pool_documentation() {
    let pool = HeuristicPool::<TokenProblem>::new().with(cheapest()).with(declining());
    assert_eq!(
        pool.documentation(),
        "- push_cheapest: push the cheapest unused token\n- decline\n"
    );
}

#[test]
fn test_param_readers() {
    let mut params = Parameters::new();
    params.insert("n".into(), json!(4));
    params.insert("ratio".into(), json!(0.5));
    params.insert("bad".into(), json!("x"));

    assert_eq!(param_usize(&params, "n"), Ok(Some(4)));
    assert_eq!(param_usize(&params, "absent"), Ok(None));
    assert!(param_usize(&params, "bad").is_err());
    assert_eq!(param_f64(&params, "ratio"), Ok(Some(0.5)));
}
