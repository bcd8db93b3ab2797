use kernel::{FVarId, MVarId, ReduceError};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MetaError {
    #[error("{tactic} failed, insufficient number of binders (goal {goal})")]
    InsufficientBinders { tactic: &'static str, goal: MVarId },
    #[error("{tactic} failed, metavariable {goal} has already been assigned")]
    AlreadyAssigned { tactic: &'static str, goal: MVarId },
    #[error("Unknown metavariable: {0}")]
    UnknownMVar(MVarId),
    #[error("Metavariable {0} is already declared")]
    MVarAlreadyDeclared(MVarId),
    #[error("Unknown free variable: {0}")]
    UnknownFVar(FVarId),
    #[error(transparent)]
    Reduce(#[from] ReduceError),
}

impl MetaError {
    /// The goal a tactic failure refers to, if any.
    pub fn goal(&self) -> Option<MVarId> {
        match self {
            MetaError::InsufficientBinders { goal, .. } | MetaError::AlreadyAssigned { goal, .. } => {
                Some(*goal)
            }
            MetaError::UnknownMVar(goal) => Some(*goal),
            MetaError::MVarAlreadyDeclared(_) | MetaError::UnknownFVar(_) | MetaError::Reduce(_) => None,
        }
    }
}

pub type MetaResult<T> = Result<T, MetaError>;
