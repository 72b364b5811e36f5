//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic validation failures (form input, value
/// objects). Storage and network concerns belong to the client crate.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (e.g. malformed input).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A required field was missing or blank.
    #[error("{0} is required")]
    Missing(&'static str),

    /// An email address was not well-formed.
    #[error("invalid email address: {0}")]
    InvalidEmail(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn missing(field: &'static str) -> Self {
        Self::Missing(field)
    }

    pub fn invalid_email(value: impl Into<String>) -> Self {
        Self::InvalidEmail(value.into())
    }
}
