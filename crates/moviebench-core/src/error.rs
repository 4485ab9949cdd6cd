//! Adapter error types.

use thiserror::Error;

/// Errors surfaced by query adapters.
///
/// Nothing is retried or swallowed at this layer; every failure propagates
/// so the external driver's own retry and measurement policy governs what
/// happens next.
#[derive(Debug, Error)]
pub enum Error {
    /// Backend unreachable or misconfigured.
    #[error("connection error: {0}")]
    Connection(String),

    /// A previously sampled identifier no longer resolves.
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    /// Uniqueness or foreign-key violation.
    #[error("constraint violation: {0}")]
    Constraint(String),

    /// Result could not be rendered to JSON.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Any other backend query failure.
    #[error("query error: {0}")]
    Query(String),
}

impl Error {
    /// Shorthand for a `NotFound` error.
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Error::NotFound {
            entity,
            id: id.into(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}
