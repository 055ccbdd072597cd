//! Domain-level errors (no external dependencies)

use thiserror::Error;

use crate::domain::entities::Level;

/// Domain errors represent malformed datasets and broken hierarchy invariants.
/// These are independent of infrastructure concerns.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("code too short for {level} prefix: {code:?} (need {required} characters)")]
    CodeTooShort {
        code: String,
        level: Level,
        required: usize,
    },

    #[error("code is not numeric: {0:?}")]
    NonNumericCode(String),

    #[error("{level} {code}: no {parent_level} with code {parent_code}")]
    MissingParent {
        code: String,
        level: Level,
        parent_code: String,
        parent_level: Level,
    },

    #[error("{level} {code}: declared parent {declared} does not match {parent_level} {parent_code}")]
    ParentMismatch {
        code: String,
        level: Level,
        declared: String,
        parent_code: String,
        parent_level: Level,
    },

    #[error("duplicate {level} code: {code}")]
    DuplicateCode { code: String, level: Level },

    #[error("nested-set counter overflow at node {0}")]
    CounterOverflow(String),

    #[error("nested-set invariant violated at {code}: {message}")]
    InvariantViolation { code: String, message: String },

    #[error("stale node handle in forest")]
    StaleNode,
}

impl DomainError {
    /// True for errors caused by the input dataset rather than by a defect.
    pub fn is_malformed_input(&self) -> bool {
        matches!(
            self,
            DomainError::CodeTooShort { .. }
                | DomainError::NonNumericCode(_)
                | DomainError::MissingParent { .. }
                | DomainError::ParentMismatch { .. }
                | DomainError::DuplicateCode { .. }
        )
    }
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
