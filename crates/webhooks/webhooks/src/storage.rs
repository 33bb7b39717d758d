//! Webhook storage trait for persistence.

use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use crate::error::{WebhookError, WebhookResult};
use crate::hook::{WebHook, WebHookEventFilter};

/// Trait for webhook storage backends.
///
/// The store is the source of truth for subscriptions; callers never cache
/// what it returns across calls.
#[async_trait]
pub trait WebhookStorage: Send + Sync {
    /// Inserts a new webhook. Fails with `AlreadyExists` on a name clash.
    async fn insert(&self, hook: &WebHook) -> WebhookResult<()>;

    /// Replaces the webhook with the same name. Fails with `NotFound`.
    async fn update(&self, hook: &WebHook) -> WebhookResult<()>;

    /// Deletes a webhook by name. Fails with `NotFound`.
    async fn delete(&self, name: &str) -> WebhookResult<()>;

    /// Gets a webhook by name. Fails with `NotFound`.
    async fn find_by_name(&self, name: &str) -> WebhookResult<WebHook>;

    /// Lists webhooks owned by any of `teams`; every webhook when `teams`
    /// is empty.
    async fn find_all_by_teams(&self, teams: &[String]) -> WebhookResult<Vec<WebHook>>;

    /// Lists webhooks whose filter accepts the event described by `filter`.
    ///
    /// `success_only` is true when the event finished without error, in which
    /// case error-only hooks are skipped; otherwise success-only hooks are.
    async fn find_by_event(
        &self,
        filter: &WebHookEventFilter,
        success_only: bool,
    ) -> WebhookResult<Vec<WebHook>>;
}

/// In-memory webhook storage for testing.
///
/// Results are returned in name order.
pub struct InMemoryWebhookStorage {
    hooks: RwLock<BTreeMap<String, WebHook>>,
}

impl InMemoryWebhookStorage {
    /// Creates a new in-memory storage.
    pub fn new() -> Self {
        Self {
            hooks: RwLock::new(BTreeMap::new()),
        }
    }

    /// Returns the number of stored webhooks.
    pub async fn len(&self) -> usize {
        self.hooks.read().await.len()
    }

    /// Checks if no webhook is stored.
    pub async fn is_empty(&self) -> bool {
        self.hooks.read().await.is_empty()
    }
}

impl Default for InMemoryWebhookStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WebhookStorage for InMemoryWebhookStorage {
    async fn insert(&self, hook: &WebHook) -> WebhookResult<()> {
        let mut hooks = self.hooks.write().await;
        if hooks.contains_key(&hook.name) {
            return Err(WebhookError::AlreadyExists(hook.name.clone()));
        }
        hooks.insert(hook.name.clone(), hook.clone());
        Ok(())
    }

    async fn update(&self, hook: &WebHook) -> WebhookResult<()> {
        let mut hooks = self.hooks.write().await;
        match hooks.get_mut(&hook.name) {
            Some(stored) => {
                *stored = hook.clone();
                Ok(())
            }
            None => Err(WebhookError::NotFound(hook.name.clone())),
        }
    }

    async fn delete(&self, name: &str) -> WebhookResult<()> {
        let mut hooks = self.hooks.write().await;
        hooks
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| WebhookError::NotFound(name.to_string()))
    }

    async fn find_by_name(&self, name: &str) -> WebhookResult<WebHook> {
        let hooks = self.hooks.read().await;
        hooks
            .get(name)
            .cloned()
            .ok_or_else(|| WebhookError::NotFound(name.to_string()))
    }

    async fn find_all_by_teams(&self, teams: &[String]) -> WebhookResult<Vec<WebHook>> {
        let hooks = self.hooks.read().await;
        Ok(hooks
            .values()
            .filter(|h| teams.is_empty() || teams.contains(&h.team_owner))
            .cloned()
            .collect())
    }

    async fn find_by_event(
        &self,
        filter: &WebHookEventFilter,
        success_only: bool,
    ) -> WebhookResult<Vec<WebHook>> {
        let hooks = self.hooks.read().await;
        Ok(hooks
            .values()
            .filter(|h| h.event_filter.accepts(filter, success_only))
            .cloned()
            .collect())
    }
}
