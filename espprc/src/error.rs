use thiserror::Error;

/// Errors surfaced by the solver and its collaborators.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolveError {
    #[error("no elementary path from 0 to 0 respects all resource bounds")]
    Infeasible,

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("lower bound oracle failed: {0}")]
    OracleFailure(String),

    #[error("resource or cost accumulation overflowed")]
    ResourceOverflow,
}

pub type Result<T> = std::result::Result<T, SolveError>;
