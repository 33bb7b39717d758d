//! Webhook error types.

use relay_events::EventError;
use thiserror::Error;

/// Result type for webhook operations.
pub type WebhookResult<T> = Result<T, WebhookError>;

/// Error type for webhook operations.
#[derive(Debug, Error)]
pub enum WebhookError {
    // ==================== Validation Errors ====================
    /// Invalid webhook name, URL or other user input.
    #[error("Validation error: {0}")]
    Validation(String),

    // ==================== Lookup Errors ====================
    /// Webhook not found.
    #[error("Webhook not found: {0}")]
    NotFound(String),

    /// A webhook with the same name already exists.
    #[error("Webhook already exists: {0}")]
    AlreadyExists(String),

    /// The event being dispatched could not be resolved.
    #[error("Event not found: {0}")]
    EventNotFound(String),

    /// Storage error.
    #[error("Storage error: {0}")]
    StorageError(String),

    // ==================== Delivery Errors ====================
    /// Transport-level HTTP error.
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// The hook answered with a status outside [200, 400).
    #[error("invalid status code calling hook: {status}: {body}")]
    InvalidStatus { status: u16, body: String },

    /// The call did not complete within the configured timeouts.
    #[error("Request timeout: {0}")]
    Timeout(String),

    /// A configured header name or value cannot be sent.
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// The configured method is not a valid HTTP method.
    #[error("Invalid method: {0}")]
    InvalidMethod(String),

    /// Invalid payload.
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    // ==================== Lifecycle Errors ====================
    /// The dispatcher did not stop before the shutdown deadline.
    #[error("Timed out waiting for the webhook dispatcher to stop")]
    ShutdownTimeout,

    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl WebhookError {
    /// Returns true for errors caused by invalid user input.
    pub fn is_validation(&self) -> bool {
        matches!(self, WebhookError::Validation(_))
    }

    /// Returns true for lookup misses.
    pub fn is_not_found(&self) -> bool {
        matches!(self, WebhookError::NotFound(_) | WebhookError::EventNotFound(_))
    }
}

impl From<serde_json::Error> for WebhookError {
    fn from(err: serde_json::Error) -> Self {
        WebhookError::InvalidPayload(err.to_string())
    }
}

impl From<reqwest::Error> for WebhookError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            WebhookError::Timeout(err.to_string())
        } else {
            WebhookError::HttpError(err.to_string())
        }
    }
}

impl From<url::ParseError> for WebhookError {
    fn from(err: url::ParseError) -> Self {
        WebhookError::Validation(format!("webhook url is not valid: {err}"))
    }
}

impl From<EventError> for WebhookError {
    fn from(err: EventError) -> Self {
        match err {
            EventError::NotFound(id) => WebhookError::EventNotFound(id),
            other => WebhookError::StorageError(other.to_string()),
        }
    }
}

impl From<toml::de::Error> for WebhookError {
    fn from(err: toml::de::Error) -> Self {
        WebhookError::ConfigError(err.to_string())
    }
}
