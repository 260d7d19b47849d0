use crate::error::HeuristicFailure;

/// Result of one [`Env::run_heuristic`](super::Env::run_heuristic) call.
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome<O> {
    /// The proposed operator was applied.
    Applied(O),
    /// The heuristic had nothing to propose.
    Declined,
    /// The heuristic errored, panicked, or proposed a rejected operator.
    Failed(HeuristicFailure),
}

impl<O> StepOutcome<O> {
    pub fn is_applied(&self) -> bool {
        matches!(self, StepOutcome::Applied(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, StepOutcome::Failed(_))
    }

    pub fn operator(&self) -> Option<&O> {
        match self {
            StepOutcome::Applied(op) => Some(op),
            _ => None,
        }
    }

    pub fn into_operator(self) -> Option<O> {
        match self {
            StepOutcome::Applied(op) => Some(op),
            _ => None,
        }
    }
}
