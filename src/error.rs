//! Error types for the arithmetic service.

use crate::tasks::{ExpressionId, TaskId, TaskStatus};

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Decomposition error: {0}")]
    Decomposition(#[from] DecompositionError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),}

impl Error {
    /// Whether the error was caused by the submitted expression text itself.
    pub fn is_invalid_expression(&self) -> bool {
        matches!(self, Self::Parse(_) | Self::Decomposition(_))
    }
}

/// Malformed token stream.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error("expression is empty")]
    Empty,

    #[error("unexpected character '{ch}' at position {position}")]
    UnexpectedCharacter { ch: char, position: usize },

    #[error("invalid number: {0}")]
    InvalidNumber(String),

    #[error("mismatched parentheses")]
    MismatchedParentheses,
}

/// Structurally invalid postfix sequence.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DecompositionError {
    #[error("insufficient operands")]
    InsufficientOperands,

    #[error("malformed expression")]
    MalformedExpression,

    #[error("division by zero")]
    DivisionByZero,
}

/// Task store failures.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoreError {
    #[error("expression {id} not found")]
    ExpressionNotFound { id: ExpressionId },

    #[error("task {id} not found")]
    TaskNotFound { id: TaskId },

    #[error("expression {id} already exists")]
    DuplicateExpression { id: ExpressionId },

    #[error("task {id} already exists")]
    DuplicateTask { id: TaskId },

    #[error("task {id} is {status}, results are only accepted for in_progress tasks")]
    NotInProgress { id: TaskId, status: TaskStatus },
}

impl StoreError {
    /// Unknown expression or task ID.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::ExpressionNotFound { .. } | Self::TaskNotFound { .. }
        )
    }

    /// Operation conflicts with the current state of the store.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::DuplicateExpression { .. } | Self::DuplicateTask { .. } | Self::NotInProgress { .. }
        )
    }
}

/// Failures talking to the orchestrator from a worker.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("Request to {url} failed: {reason}")]
    RequestFailed { url: String, reason: String },

    #[error("Unexpected status {status} from {url}: {body}")]
    UnexpectedStatus { url: String, status: u16, body: String },

    #[error("Invalid response from {url}: {reason}")]
    InvalidResponse { url: String, reason: String },

    #[error("Orchestrator rejected task {id}: {reason}")]
    Rejected { id: TaskId, reason: String },
}

/// Result type alias for the service.
pub type Result<T> = std::result::Result<T, Error>;
