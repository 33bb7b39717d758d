use super::trait_def::EventStore;
use crate::{Event, EventError, EventNotifier, EventResult};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory implementation of EventStore
///
/// Stores all events in memory in insertion order. Useful for testing and
/// development. Data is lost when the process exits.
#[derive(Clone)]
pub struct MemoryEventStore {
    events: Arc<RwLock<Vec<Event>>>,
    notifiers: Arc<RwLock<Vec<Arc<dyn EventNotifier>>>>,
}

impl MemoryEventStore {
    pub fn new() -> Self {
        Self {
            events: Arc::new(RwLock::new(Vec::new())),
            notifiers: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Registers a notifier called every time an event finishes.
    pub async fn add_notifier(&self, notifier: Arc<dyn EventNotifier>) {
        self.notifiers.write().await.push(notifier);
    }

    /// Returns the number of stored events.
    pub async fn len(&self) -> usize {
        self.events.read().await.len()
    }

    /// Checks if the store is empty.
    pub async fn is_empty(&self) -> bool {
        self.events.read().await.is_empty()
    }

    async fn notify_finished(&self, event_id: &str) {
        let notifiers = self.notifiers.read().await.clone();
        for notifier in &notifiers {
            tracing::trace!(notifier = notifier.id(), event_id, "Notifying finished event");
            notifier.notify(event_id).await;
        }
    }
}

impl Default for MemoryEventStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventStore for MemoryEventStore {
    async fn append(&self, event: &Event) -> EventResult<()> {
        let mut events = self.events.write().await;
        if events.iter().any(|e| e.id == event.id) {
            return Err(EventError::AlreadyExists(event.id.clone()));
        }
        events.push(event.clone());
        Ok(())
    }

    async fn get_by_id(&self, id: &str) -> EventResult<Event> {
        let events = self.events.read().await;
        events
            .iter()
            .find(|e| e.id == id)
            .cloned()
            .ok_or_else(|| EventError::NotFound(id.to_string()))
    }

    async fn finish(&self, id: &str, error: &str) -> EventResult<Event> {
        let finished = {
            let mut events = self.events.write().await;
            let event = events
                .iter_mut()
                .find(|e| e.id == id)
                .ok_or_else(|| EventError::NotFound(id.to_string()))?;
            event.finish(error);
            event.clone()
        };

        self.notify_finished(&finished.id).await;

        Ok(finished)
    }
}
