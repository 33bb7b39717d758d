//! # Relay Events
//!
//! Event records for Relay providing:
//! - Events with a primary target, extra targets, a kind and an error status
//! - Pluggable event stores with lookup by ID
//! - Completion notifications for downstream consumers such as webhooks
//!
//! ## Example
//!
//! ```rust,ignore
//! use relay_events::{Event, EventStore, Kind, MemoryEventStore, Target};
//!
//! let store = MemoryEventStore::new();
//!
//! let event = Event::new(Target::new("app", "myapp"), Kind::permission("app.deploy"))
//!     .with_owner("admin@example.com");
//! store.append(&event).await?;
//!
//! // Finishing the event fires every registered notifier
//! store.finish(&event.id, "").await?;
//! ```

mod event;
mod notifier;
mod error;
pub mod store;

pub use event::{Event, ExtraTarget, Kind, KindType, Target};
pub use notifier::EventNotifier;
pub use error::{EventError, EventResult};
pub use store::{EventStore, MemoryEventStore};
