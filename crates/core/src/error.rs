//! Error taxonomy shared by every command.

use thiserror::Error;

use crate::store::StoreError;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Deterministic business failures only (invariants, malformed identifiers).
/// Storage problems are [`StoreError`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A domain invariant was violated.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),
}

impl DomainError {
    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }
}

/// The caller is authenticated but lacks the right to perform the action.
///
/// Carries no detail on purpose: the HTTP boundary renders every denial the same way.
#[derive(Debug, Error, Clone, Copy, Default, PartialEq, Eq)]
#[error("unauthorized")]
pub struct AuthorizationError;

/// A referenced entity does not exist.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{entity}({key}) is not found")]
pub struct NotFoundError {
    pub entity: &'static str,
    pub key: String,
}

impl NotFoundError {
    pub fn new(entity: &'static str, key: impl ToString) -> Self {
        Self {
            entity,
            key: key.to_string(),
        }
    }
}

/// Every problem found while validating an entity, in check order.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("validation failed: {}", .problems.join(", "))]
pub struct ValidationFailure {
    pub problems: Vec<String>,
}

impl ValidationFailure {
    pub fn new(problems: Vec<String>) -> Self {
        Self { problems }
    }

    pub fn contains(&self, problem: &str) -> bool {
        self.problems.iter().any(|p| p == problem)
    }
}

/// Failure of a command or guarded query.
///
/// Authorization errors pass through untouched; nothing below the guard turns
/// them into another variant.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Unauthorized(#[from] AuthorizationError),

    #[error(transparent)]
    NotFound(#[from] NotFoundError),

    #[error(transparent)]
    Invalid(#[from] ValidationFailure),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for CommandError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(e) => Self::NotFound(e),
            other => Self::Store(other),
        }
    }
}
