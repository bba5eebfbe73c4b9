//! Error types for transactions and commands

use quire_model::ModelError;
use quire_transform::StepError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransactionError {
    #[error("Step failed: {0}")]
    Step(#[from] StepError),

    /// A step failed while the transaction was built
    #[error("Transaction failed: {0}")]
    Failed(StepError),

    #[error("Transaction rejected by plugin '{plugin}'")]
    Rejected { plugin: String },

    #[error("Transaction was built for a different document")]
    Mismatched,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CommandError {
    #[error(transparent)]
    Step(#[from] StepError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Transaction(#[from] TransactionError),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The command found out it does not apply after it started building
    #[error("Not applicable: {0}")]
    NotApplicable(&'static str),
}
