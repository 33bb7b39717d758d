use crate::{Event, EventResult};
use async_trait::async_trait;

/// Trait for event storage backends
///
/// Implementations are the source of truth for event records. Consumers such
/// as the webhook dispatcher only hold event IDs and resolve them on demand.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Store a new event
    ///
    /// Fails with `EventError::AlreadyExists` if the ID is taken.
    async fn append(&self, event: &Event) -> EventResult<()>;

    /// Retrieve a single event by ID
    ///
    /// Fails with `EventError::NotFound` when no such event exists.
    async fn get_by_id(&self, id: &str) -> EventResult<Event>;

    /// Mark an event as finished, recording `error` (empty on success)
    ///
    /// Returns the updated event.
    async fn finish(&self, id: &str, error: &str) -> EventResult<Event>;
}
