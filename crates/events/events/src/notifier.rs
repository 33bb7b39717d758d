//! Completion notifications.

use async_trait::async_trait;

/// Receives the ID of every event that finishes.
///
/// Implementations must not block for long: stores call notifiers inline
/// after recording the event's completion.
#[async_trait]
pub trait EventNotifier: Send + Sync {
    /// Returns an identifier for logging.
    fn id(&self) -> &str {
        "anonymous"
    }

    /// Called once the event identified by `event_id` has finished.
    async fn notify(&self, event_id: &str);
}
