//! Webhook dispatcher configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{WebhookError, WebhookResult};

/// Default capacity of the dispatch queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1000;

/// Default `User-Agent` sent when a hook does not configure one.
pub const DEFAULT_USER_AGENT: &str = "relay-webhook-client/1.0";

/// Webhook dispatcher configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookConfig {
    /// Maximum number of event IDs waiting for dispatch.
    pub queue_capacity: usize,
    /// Connect timeout in milliseconds.
    pub connect_timeout_ms: u64,
    /// Overall request timeout in milliseconds.
    pub request_timeout_ms: u64,
    /// `User-Agent` injected into requests that do not set one.
    pub user_agent: String,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            connect_timeout_ms: 5_000,
            request_timeout_ms: 60_000,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl WebhookConfig {
    /// Creates a new configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the queue capacity.
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// Sets the connect timeout.
    pub fn connect_timeout_ms(mut self, ms: u64) -> Self {
        self.connect_timeout_ms = ms;
        self
    }

    /// Sets the overall request timeout.
    pub fn request_timeout_ms(mut self, ms: u64) -> Self {
        self.request_timeout_ms = ms;
        self
    }

    /// Sets the default user agent.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Returns the connect timeout.
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Returns the overall request timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Parses a configuration from TOML. Missing keys keep their defaults.
    pub fn from_toml_str(content: &str) -> WebhookResult<Self> {
        let config: WebhookConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> WebhookResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            WebhookError::ConfigError(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Checks the configuration for values the dispatcher cannot run with.
    pub fn validate(&self) -> WebhookResult<()> {
        if self.queue_capacity == 0 {
            return Err(WebhookError::ConfigError(
                "queue_capacity must be greater than zero".to_string(),
            ));
        }
        if self.request_timeout_ms == 0 {
            return Err(WebhookError::ConfigError(
                "request_timeout_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
