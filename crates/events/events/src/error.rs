//! Event error types.

use thiserror::Error;

/// Result type for event operations.
pub type EventResult<T> = Result<T, EventError>;

/// Error type for event storage.
#[derive(Debug, Error)]
pub enum EventError {
    /// No event with the given ID.
    #[error("Event not found: {0}")]
    NotFound(String),

    /// An event with the same ID was already stored.
    #[error("Event already exists: {0}")]
    AlreadyExists(String),

    /// Event serialization/deserialization error.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for EventError {
    fn from(err: serde_json::Error) -> Self {
        EventError::SerializationError(err.to_string())
    }
}
