//! Webhook service - main entry point.
//!
//! Owns the dispatch queue and its worker, and exposes the subscription
//! management surface on top of a [`WebhookStorage`].

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use relay_events::{EventNotifier, EventStore, MemoryEventStore};

use crate::config::WebhookConfig;
use crate::delivery::DeliveryEngine;
use crate::error::{WebhookError, WebhookResult};
use crate::hook::WebHook;
use crate::metrics::WebhookMetrics;
use crate::storage::{InMemoryWebhookStorage, WebhookStorage};
use crate::validation::{validate_name, validate_url};
use crate::worker::DispatchWorker;

/// Lifecycle state of the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatcherState {
    /// Accepting and dispatching events.
    Running,
    /// Shutdown was requested; the worker is finishing its current event.
    Draining,
    /// The worker has exited.
    Stopped,
}

/// The webhook service.
///
/// Cheap to share behind an `Arc`; every method can be called concurrently.
pub struct WebhookService<S: WebhookStorage = InMemoryWebhookStorage, E: EventStore = MemoryEventStore> {
    config: WebhookConfig,
    storage: Arc<S>,
    sender: mpsc::Sender<String>,
    quit: CancellationToken,
    done: CancellationToken,
    metrics: Arc<WebhookMetrics>,
    _events: std::marker::PhantomData<fn() -> E>,
}

impl<S: WebhookStorage + 'static, E: EventStore + 'static> WebhookService<S, E> {
    /// Creates the service and spawns its dispatch worker.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(storage: Arc<S>, events: Arc<E>, config: WebhookConfig) -> WebhookResult<Self> {
        Self::with_metrics(storage, events, config, WebhookMetrics::new())
    }

    /// Creates the service reporting into an existing set of metrics.
    pub fn with_metrics(
        storage: Arc<S>,
        events: Arc<E>,
        config: WebhookConfig,
        metrics: WebhookMetrics,
    ) -> WebhookResult<Self> {
        config.validate()?;

        let metrics = Arc::new(metrics);
        let engine = DeliveryEngine::new(config.clone(), metrics.clone())?;
        let (sender, receiver) = mpsc::channel(config.queue_capacity);
        let quit = CancellationToken::new();
        let done = CancellationToken::new();

        let worker = DispatchWorker {
            storage: storage.clone(),
            events,
            engine,
            receiver,
            quit: quit.clone(),
            done: done.clone(),
            metrics: metrics.clone(),
        };
        tokio::spawn(worker.run());

        Ok(Self {
            config,
            storage,
            sender,
            quit,
            done,
            metrics,
            _events: std::marker::PhantomData,
        })
    }
}

impl<S: WebhookStorage, E: EventStore> WebhookService<S, E> {
    // ==================== Dispatch ====================

    /// Queues an event for webhook dispatch.
    ///
    /// Waits while the queue is full. The ID is dropped silently if shutdown
    /// has begun or begins while waiting.
    pub async fn notify(&self, event_id: impl Into<String>) {
        let event_id = event_id.into();

        if self.quit.is_cancelled() {
            tracing::debug!(event_id = %event_id, "Webhook dispatcher stopping, dropping event");
        } else {
            tokio::select! {
                biased;
                _ = self.quit.cancelled() => {
                    tracing::debug!("Webhook dispatcher stopping, dropping queued notification");
                }
                result = self.sender.send(event_id) => {
                    if let Err(mpsc::error::SendError(event_id)) = result {
                        tracing::debug!(event_id = %event_id, "Webhook dispatcher gone, dropping event");
                    }
                }
            }
        }

        self.metrics.set_queue_len(self.queue_len());
    }

    /// Signals the worker to stop and waits up to `timeout` for it to exit.
    ///
    /// The worker finishes the event it is dispatching before stopping. On
    /// timeout it keeps running in the background.
    pub async fn shutdown(&self, timeout: Duration) -> WebhookResult<()> {
        self.shutdown_with(tokio::time::sleep(timeout)).await
    }

    /// Like [`shutdown`](Self::shutdown), giving up when `deadline` completes.
    pub async fn shutdown_with<F>(&self, deadline: F) -> WebhookResult<()>
    where
        F: Future<Output = ()>,
    {
        self.quit.cancel();

        tokio::select! {
            biased;
            _ = self.done.cancelled() => {
                tracing::info!("Webhook dispatcher shut down");
                Ok(())
            }
            _ = deadline => Err(WebhookError::ShutdownTimeout),
        }
    }

    /// Returns the lifecycle state.
    pub fn state(&self) -> DispatcherState {
        if self.done.is_cancelled() {
            DispatcherState::Stopped
        } else if self.quit.is_cancelled() {
            DispatcherState::Draining
        } else {
            DispatcherState::Running
        }
    }

    /// Returns true until shutdown is requested.
    pub fn is_running(&self) -> bool {
        self.state() == DispatcherState::Running
    }

    /// Number of event IDs waiting for dispatch.
    pub fn queue_len(&self) -> usize {
        self.sender.max_capacity() - self.sender.capacity()
    }

    // ==================== Subscriptions ====================

    /// Validates and stores a new webhook.
    pub async fn create(&self, hook: WebHook) -> WebhookResult<()> {
        validate_name(&hook.name)?;
        validate_url(&hook.url)?;
        self.storage.insert(&hook).await
    }

    /// Validates the URL and replaces the webhook with the same name.
    pub async fn update(&self, hook: WebHook) -> WebhookResult<()> {
        validate_url(&hook.url)?;
        self.storage.update(&hook).await
    }

    /// Deletes a webhook by name.
    pub async fn delete(&self, name: &str) -> WebhookResult<()> {
        self.storage.delete(name).await
    }

    /// Gets a webhook by name.
    pub async fn find(&self, name: &str) -> WebhookResult<WebHook> {
        self.storage.find_by_name(name).await
    }

    /// Lists webhooks owned by any of `teams`.
    pub async fn list(&self, teams: &[String]) -> WebhookResult<Vec<WebHook>> {
        self.storage.find_all_by_teams(teams).await
    }

    // ==================== Accessors ====================

    /// Gets the metrics.
    pub fn metrics(&self) -> &WebhookMetrics {
        &self.metrics
    }

    /// Gets the configuration.
    pub fn config(&self) -> &WebhookConfig {
        &self.config
    }

    /// Gets the storage.
    pub fn storage(&self) -> &Arc<S> {
        &self.storage
    }
}

#[async_trait::async_trait]
impl<S: WebhookStorage, E: EventStore> EventNotifier for WebhookService<S, E> {
    fn id(&self) -> &str {
        "webhook-service"
    }

    async fn notify(&self, event_id: &str) {
        WebhookService::notify(self, event_id).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hook::WebHookEventFilter;
    use async_trait::async_trait;
    use relay_events::{Event, EventResult, Kind, Target};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Semaphore;

    /// Event store that records lookups and can hold them behind a gate.
    struct TestEvents {
        inner: MemoryEventStore,
        lookups: Mutex<Vec<String>>,
        gate: Option<Semaphore>,
    }

    impl TestEvents {
        fn open() -> Self {
            Self {
                inner: MemoryEventStore::new(),
                lookups: Mutex::new(Vec::new()),
                gate: None,
            }
        }

        fn gated() -> Self {
            Self {
                gate: Some(Semaphore::new(0)),
                ..Self::open()
            }
        }

        fn release(&self, permits: usize) {
            if let Some(gate) = &self.gate {
                gate.add_permits(permits);
            }
        }

        fn lookups(&self) -> Vec<String> {
            self.lookups.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl EventStore for TestEvents {
        async fn append(&self, event: &Event) -> EventResult<()> {
            self.inner.append(event).await
        }

        async fn get_by_id(&self, id: &str) -> EventResult<Event> {
            self.lookups.lock().unwrap().push(id.to_string());
            if let Some(gate) = &self.gate {
                gate.acquire().await.unwrap().forget();
            }
            self.inner.get_by_id(id).await
        }

        async fn finish(&self, id: &str, error: &str) -> EventResult<Event> {
            self.inner.finish(id, error).await
        }
    }

    /// Storage that counts inserts.
    #[derive(Default)]
    struct CountingStorage {
        inner: InMemoryWebhookStorage,
        inserts: AtomicUsize,
    }

    #[async_trait]
    impl WebhookStorage for CountingStorage {
        async fn insert(&self, hook: &WebHook) -> WebhookResult<()> {
            self.inserts.fetch_add(1, Ordering::SeqCst);
            self.inner.insert(hook).await
        }

        async fn update(&self, hook: &WebHook) -> WebhookResult<()> {
            self.inner.update(hook).await
        }

        async fn delete(&self, name: &str) -> WebhookResult<()> {
            self.inner.delete(name).await
        }

        async fn find_by_name(&self, name: &str) -> WebhookResult<WebHook> {
            self.inner.find_by_name(name).await
        }

        async fn find_all_by_teams(&self, teams: &[String]) -> WebhookResult<Vec<WebHook>> {
            self.inner.find_all_by_teams(teams).await
        }

        async fn find_by_event(
            &self,
            filter: &WebHookEventFilter,
            success_only: bool,
        ) -> WebhookResult<Vec<WebHook>> {
            self.inner.find_by_event(filter, success_only).await
        }
    }

    fn service_with(
        events: Arc<TestEvents>,
        config: WebhookConfig,
    ) -> WebhookService<CountingStorage, TestEvents> {
        WebhookService::new(Arc::new(CountingStorage::default()), events, config).unwrap()
    }

    async fn wait_for_lookups(events: &TestEvents, count: usize) {
        for _ in 0..200 {
            if events.lookups().len() >= count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("expected {count} lookups, saw {:?}", events.lookups());
    }

    #[tokio::test]
    async fn test_create_validation_never_inserts() {
        let service = service_with(Arc::new(TestEvents::open()), WebhookConfig::default());

        let invalid = [
            WebHook::new("", "https://example.com"),
            WebHook::new("Invalid_Name", "https://example.com"),
            WebHook::new("valid-name", ""),
            WebHook::new("valid-name", "not a url"),
        ];
        for hook in invalid {
            let err = service.create(hook).await.unwrap_err();
            assert!(err.is_validation(), "unexpected error: {err}");
        }

        assert_eq!(service.storage().inserts.load(Ordering::SeqCst), 0);
        service.shutdown(Duration::from_secs(1)).await.unwrap();
    }

    #[tokio::test]
    async fn test_crud() {
        let service = service_with(Arc::new(TestEvents::open()), WebhookConfig::default());

        service
            .create(WebHook::new("deploys", "https://example.com/a").team_owner("t1"))
            .await
            .unwrap();
        service
            .create(WebHook::new("builds", "https://example.com/b").team_owner("t2"))
            .await
            .unwrap();

        let duplicate = service.create(WebHook::new("deploys", "https://example.com/c")).await;
        assert!(matches!(duplicate, Err(WebhookError::AlreadyExists(_))));

        let hook = service.find("deploys").await.unwrap();
        assert_eq!(hook.url, "https://example.com/a");

        service
            .update(hook.clone().method("GET").team_owner("t1"))
            .await
            .unwrap();
        assert_eq!(service.find("deploys").await.unwrap().method, "GET");

        let bad_update = service.update(WebHook::new("deploys", "")).await;
        assert!(bad_update.unwrap_err().is_validation());

        let listed = service.list(&["t1".to_string()]).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "deploys");
        assert_eq!(service.list(&[]).await.unwrap().len(), 2);

        service.delete("deploys").await.unwrap();
        assert!(service.find("deploys").await.unwrap_err().is_not_found());
        assert!(service.delete("deploys").await.unwrap_err().is_not_found());

        service.shutdown(Duration::from_secs(1)).await.unwrap();
    }

    #[tokio::test]
    async fn test_update_missing_hook() {
        let service = service_with(Arc::new(TestEvents::open()), WebhookConfig::default());
        let result = service.update(WebHook::new("ghost", "https://example.com")).await;
        assert!(matches!(result, Err(WebhookError::NotFound(_))));
        service.shutdown(Duration::from_secs(1)).await.unwrap();
    }

    #[tokio::test]
    async fn test_shutdown_idle() {
        let service = service_with(Arc::new(TestEvents::open()), WebhookConfig::default());
        assert_eq!(service.state(), DispatcherState::Running);

        service.shutdown(Duration::from_secs(1)).await.unwrap();
        assert_eq!(service.state(), DispatcherState::Stopped);
        assert!(!service.is_running());

        // A second call finds the worker already gone.
        service.shutdown(Duration::from_millis(10)).await.unwrap();
    }

    #[tokio::test]
    async fn test_notify_after_shutdown_is_dropped() {
        let events = Arc::new(TestEvents::open());
        let service = service_with(events.clone(), WebhookConfig::default());

        service.shutdown(Duration::from_secs(1)).await.unwrap();

        tokio::time::timeout(Duration::from_secs(1), service.notify("late"))
            .await
            .expect("notify must not block after shutdown");
        assert_eq!(service.queue_len(), 0);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(events.lookups().is_empty());
    }

    #[tokio::test]
    async fn test_full_queue_blocks_producer() {
        let events = Arc::new(TestEvents::gated());
        let service = service_with(events.clone(), WebhookConfig::default().queue_capacity(1));

        // The worker takes e1 and parks on the gate.
        service.notify("e1").await;
        wait_for_lookups(&events, 1).await;

        service.notify("e2").await;
        assert_eq!(service.queue_len(), 1);
        assert_eq!(service.metrics().queue_current.get(), 1);

        let blocked = tokio::time::timeout(Duration::from_millis(100), service.notify("e3")).await;
        assert!(blocked.is_err(), "notify should wait for a free slot");

        // Releasing e1 lets the worker take e2, freeing the slot.
        events.release(1);
        tokio::time::timeout(Duration::from_secs(2), service.notify("e4"))
            .await
            .expect("notify should proceed once the worker drains a slot");

        events.release(10);
        service.shutdown(Duration::from_secs(2)).await.unwrap();
        assert_eq!(events.lookups()[..2], ["e1".to_string(), "e2".to_string()]);
    }

    #[tokio::test]
    async fn test_notify_unblocks_on_shutdown() {
        let events = Arc::new(TestEvents::gated());
        let service = Arc::new(service_with(
            events.clone(),
            WebhookConfig::default().queue_capacity(1),
        ));

        service.notify("e1").await;
        wait_for_lookups(&events, 1).await;
        service.notify("e2").await;

        let producer = {
            let service = service.clone();
            tokio::spawn(async move { service.notify("e3").await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!producer.is_finished());

        let result = service.shutdown(Duration::from_millis(50)).await;
        assert!(matches!(result, Err(WebhookError::ShutdownTimeout)));
        assert_eq!(service.state(), DispatcherState::Draining);

        tokio::time::timeout(Duration::from_secs(1), producer)
            .await
            .expect("blocked producer must return once shutdown begins")
            .unwrap();

        events.release(10);
        service.shutdown(Duration::from_secs(2)).await.unwrap();
        assert_eq!(service.state(), DispatcherState::Stopped);
        assert_eq!(events.lookups(), vec!["e1".to_string()]);
    }

    #[tokio::test]
    async fn test_lookup_failure_does_not_stop_worker() {
        let events = Arc::new(TestEvents::open());
        let service = service_with(events.clone(), WebhookConfig::default());

        let event = Event::new(Target::new("app", "myapp"), Kind::permission("app.deploy"));
        events.append(&event).await.unwrap();

        service.notify("missing").await;
        service.notify(event.id.clone()).await;
        wait_for_lookups(&events, 2).await;

        assert_eq!(events.lookups(), vec!["missing".to_string(), event.id.clone()]);
        assert!(service.is_running());
        service.shutdown(Duration::from_secs(1)).await.unwrap();
    }

    #[tokio::test]
    async fn test_invalid_config_rejected() {
        let result = WebhookService::new(
            Arc::new(CountingStorage::default()),
            Arc::new(TestEvents::open()),
            WebhookConfig::default().queue_capacity(0),
        );
        assert!(matches!(result, Err(WebhookError::ConfigError(_))));
    }
}
