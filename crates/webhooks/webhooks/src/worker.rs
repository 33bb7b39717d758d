//! Background dispatch loop.

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use relay_events::EventStore;

use crate::delivery::DeliveryEngine;
use crate::error::WebhookResult;
use crate::matcher;
use crate::metrics::WebhookMetrics;
use crate::storage::WebhookStorage;

/// Consumes event IDs one at a time and calls every matching hook.
pub(crate) struct DispatchWorker<S: WebhookStorage, E: EventStore> {
    pub(crate) storage: Arc<S>,
    pub(crate) events: Arc<E>,
    pub(crate) engine: DeliveryEngine,
    pub(crate) receiver: mpsc::Receiver<String>,
    pub(crate) quit: CancellationToken,
    pub(crate) done: CancellationToken,
    pub(crate) metrics: Arc<WebhookMetrics>,
}

impl<S: WebhookStorage, E: EventStore> DispatchWorker<S, E> {
    /// Runs until shutdown is signaled or every sender is gone.
    ///
    /// `done` is cancelled on exit, including on unwind.
    pub(crate) async fn run(mut self) {
        let _done = self.done.clone().drop_guard();
        tracing::info!("Webhook dispatcher started");

        loop {
            tokio::select! {
                biased;
                _ = self.quit.cancelled() => break,
                received = self.receiver.recv() => {
                    let Some(event_id) = received else { break };
                    self.metrics.set_queue_len(self.receiver.len());
                    if let Err(e) = self.handle_event(&event_id).await {
                        tracing::error!(event_id = %event_id, error = %e, "Error handling webhooks for event");
                    }
                }
            }
        }

        tracing::info!(pending = self.receiver.len(), "Webhook dispatcher stopped");
    }

    async fn handle_event(&self, event_id: &str) -> WebhookResult<()> {
        let event = self.events.get_by_id(event_id).await?;
        let hooks = matcher::find_hooks(self.storage.as_ref(), &event).await?;

        tracing::debug!(event_id, hooks = hooks.len(), "Dispatching event");

        for hook in &hooks {
            if let Err(e) = self.engine.deliver(hook, &event).await {
                tracing::warn!(hook = %hook.name, event_id, error = %e, "Error calling webhook");
            }
        }

        Ok(())
    }
}
