//! Error taxonomy
//!
//! Only malformed input is an error. Numeric anomalies are absorbed by the
//! clamp utilities and an empty match list is a normal outcome.

use thiserror::Error;

/// Malformed or oversized input surfaced to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidInput {
    /// Text longer than the configured character limit.
    #[error("text exceeds maximum length: {length} > {max} characters")]
    TextTooLong { length: usize, max: usize },

    /// An id, name or signal key that is empty after trimming.
    #[error("{field} must be non-empty")]
    EmptyIdentifier { field: String },

    /// Two entries of one catalog share an id.
    #[error("duplicate {kind} id: {id}")]
    DuplicateId { kind: &'static str, id: String },

    /// A collection that must carry at least one entry.
    #[error("{what} must not be empty")]
    EmptyCollection { what: String },
}

pub type InputResult<T> = Result<T, InvalidInput>;
