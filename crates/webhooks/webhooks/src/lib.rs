//! # Relay Webhooks
//!
//! Event-driven webhook dispatch for Relay providing:
//! - Webhook subscription management with validation
//! - Matching of finished events against subscription filters
//! - Best-effort HTTP delivery with per-method body rules
//! - A bounded dispatch queue with graceful shutdown
//! - Prometheus metrics for latency, queue depth and failures
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use std::time::Duration;
//! use relay_events::MemoryEventStore;
//! use relay_webhooks::{InMemoryWebhookStorage, WebHook, WebHookEventFilter, WebhookConfig, WebhookService};
//!
//! let events = Arc::new(MemoryEventStore::new());
//! let service = Arc::new(WebhookService::new(
//!     Arc::new(InMemoryWebhookStorage::new()),
//!     events.clone(),
//!     WebhookConfig::default(),
//! )?);
//!
//! // Register a hook for app deploys
//! service.create(
//!     WebHook::new("deploys", "https://example.com/webhook")
//!         .with_filter(WebHookEventFilter::new().kind_name("app.deploy")),
//! ).await?;
//!
//! // Every finished event is queued for dispatch
//! events.add_notifier(service.clone()).await;
//!
//! service.shutdown(Duration::from_secs(10)).await?;
//! ```

mod hook;
mod delivery;
mod matcher;
mod storage;
mod error;
mod service;
mod worker;
pub mod config;
pub mod metrics;
pub mod validation;

pub use hook::{WebHook, WebHookEventFilter, Headers};
pub use delivery::{DeliveryEngine, HookRequest, is_success_status};
pub use matcher::{build_filter, find_hooks};
pub use storage::{WebhookStorage, InMemoryWebhookStorage};
pub use error::{WebhookError, WebhookResult};
pub use service::{WebhookService, DispatcherState};
pub use config::WebhookConfig;
pub use metrics::WebhookMetrics;
