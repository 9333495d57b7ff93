//! Unified error types for the domain layer
//!
//! Every combat failure maps onto one of four kinds (validation, not found,
//! invalid state, evaluation) plus parse errors for dice formulas. Errors carry
//! the offending ids so callers can report exactly which combatants failed.

use std::fmt;

use thiserror::Error;

use crate::value_objects::DiceParseError;

/// Coarse classification of a [`DomainError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    NotFound,
    InvalidState,
    Evaluation,
    Parse,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Validation => "ValidationError",
            Self::NotFound => "NotFoundError",
            Self::InvalidState => "InvalidStateError",
            Self::Evaluation => "EvaluationError",
            Self::Parse => "ParseError",
        };
        f.write_str(name)
    }
}

/// Unified error type for domain operations
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    /// Malformed input (settings, duplicate tokens, non-finite initiative)
    #[error("Validation failed: {0}")]
    Validation(String),

    /// One or more referenced entities do not exist
    #[error("{entity_type} not found: {}", .ids.join(", "))]
    NotFound {
        entity_type: &'static str,
        ids: Vec<String>,
    },

    /// Operation not allowed in the encounter's current state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// The dice evaluation collaborator failed for the listed ids
    #[error("Evaluation failed for {}: {message}", .ids.join(", "))]
    Evaluation { ids: Vec<String>, message: String },

    /// Parse error (for value objects)
    #[error("Parse error: {0}")]
    Parse(String),
}

impl DomainError {
    /// Creates a validation error for malformed input.
    ///
    /// # Example
    /// ```ignore
    /// if resource.trim().is_empty() {
    ///     return Err(DomainError::validation("tracked resource path cannot be empty"));
    /// }
    /// ```
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a not found error for a single id
    pub fn not_found(entity_type: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity_type,
            ids: vec![id.to_string()],
        }
    }

    /// Create a not found error covering every missing id of a batch
    pub fn not_found_many<I, T>(entity_type: &'static str, ids: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: ToString,
    {
        Self::NotFound {
            entity_type,
            ids: ids.into_iter().map(|id| id.to_string()).collect(),
        }
    }

    /// Create an invalid state error
    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }

    /// Create an evaluation error for one id
    pub fn evaluation(id: impl ToString, message: impl Into<String>) -> Self {
        Self::Evaluation {
            ids: vec![id.to_string()],
            message: message.into(),
        }
    }

    /// Creates a parse error for string-to-type conversion failures.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::InvalidState(_) => ErrorKind::InvalidState,
            Self::Evaluation { .. } => ErrorKind::Evaluation,
            Self::Parse(_) => ErrorKind::Parse,
        }
    }

    /// Ids carried by the error, empty for kinds that are not id-scoped.
    pub fn offending_ids(&self) -> &[String] {
        match self {
            Self::NotFound { ids, .. } | Self::Evaluation { ids, .. } => ids,
            _ => &[],
        }
    }
}

impl From<DiceParseError> for DomainError {
    fn from(err: DiceParseError) -> Self {
        Self::Parse(err.to_string())
    }
}
