//! Domain error types

use thiserror::Error;

/// Domain-level errors that can occur during validation or processing.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A resource name does not satisfy the naming rules.
    #[error("invalid name: {0}")]
    InvalidName(String),

    /// A duration string such as `1h` or `30m` could not be parsed.
    #[error("invalid duration: {0}")]
    InvalidDuration(String),

    /// A time range is malformed (for example `start` after `end`).
    #[error("invalid time range: {0}")]
    InvalidTimeRange(String),

    /// A datasource inventory cannot be used for resolution.
    #[error("invalid datasource: {0}")]
    InvalidDatasource(String),

    /// A variable definition failed validation.
    #[error("invalid variable: {0}")]
    InvalidVariable(String),
}

/// Result type alias for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
