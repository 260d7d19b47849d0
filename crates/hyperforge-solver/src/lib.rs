//! HyperForge Solver
//!
//! This crate drives environments with hyper-heuristic policies:
//! - Policies (random, single, constructive/improve, perturbation)
//! - LLM-guided selection (single level, two level, rollout-backed)
//! - Monte-Carlo comparison of candidate heuristics
//! - The LLM client contract and its response protocol

pub mod comparison;
pub mod error;
pub mod llm;
pub mod policy;

pub use comparison::{
    compare_heuristics, evaluate_heuristic, tts_bon, BestResult, BestResultTracker, Evaluation,
    BEST_RESULT_FILE,
};
pub use error::{ComparisonError, LlmError, SelectionParseError};
pub use llm::{ask, ChatMessage, LlmClient, Role, ScriptedClient, SelectionPrompt};
pub use policy::{
    step_budget, GptDeepSelectionHyperHeuristic, GptSelectionHyperHeuristic, HyperHeuristic,
    LlmSelectionHyperHeuristic, PerturbationHyperHeuristic, RandomHyperHeuristic,
    SelectionSettings, SingleConstructiveSingleImproveHyperHeuristic, SingleHyperHeuristic,
    DEFAULT_ITERATIONS_SCALE_FACTOR,
};
